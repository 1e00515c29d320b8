//! Receipt execution trees.
//!
//! A transaction on NEAR executes as a cascade of receipts: the transaction is
//! converted into a first receipt, and each receipt's outcome may schedule
//! more. The RPC returns them flat (`receipts_outcome` plus, for
//! `EXPERIMENTAL_tx_status`, `receipts`). This module links them back into a
//! tree in causal order.
//!
//! ```
//! use near_explorer::tree::{TransactionTree, Traversal};
//! use near_explorer::FinalExecutionOutcome;
//!
//! # fn show(outcome: &FinalExecutionOutcome) -> Result<(), near_explorer::Error> {
//! let tree = TransactionTree::build(outcome, Traversal::Eager)?;
//! for node in tree.iter() {
//!     println!("{}", node.receipt_id());
//! }
//! println!("{tree}");
//! # Ok(())
//! # }
//! ```
//!
//! Receipts referenced by an outcome but absent from the response become
//! [`ReceiptNode::Missing`] leaves instead of failing the build.

mod builder;
mod node;
mod render;

pub use builder::ReceiptIndex;
pub use node::{ExecutedReceipt, Iter, ReceiptNode, TransactionTree};

use serde::Serialize;

/// How far the builder resolves the tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Traversal {
    /// Resolve every descendant.
    #[default]
    Eager,
    /// Resolve only the requested node. Its children stay as ids in
    /// [`ExecutedReceipt::outgoing_receipt_ids`] and are expanded on demand with
    /// [`ReceiptIndex::expand`].
    Lazy,
}

/// What a transaction view shows for the receipt tree.
///
/// Fetch and build failures collapse into [`ReceiptTreeState::Unavailable`];
/// the view renders "no receipt available" rather than an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ReceiptTreeState {
    Ready { tree: Box<TransactionTree> },
    Unavailable { reason: String },
}

impl ReceiptTreeState {
    /// The tree, if one could be built.
    pub fn tree(&self) -> Option<&TransactionTree> {
        match self {
            ReceiptTreeState::Ready { tree } => Some(tree),
            ReceiptTreeState::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, ReceiptTreeState::Ready { .. })
    }
}

impl<E: std::fmt::Display> From<Result<TransactionTree, E>> for ReceiptTreeState {
    fn from(result: Result<TransactionTree, E>) -> Self {
        match result {
            Ok(tree) => ReceiptTreeState::Ready {
                tree: Box::new(tree),
            },
            Err(e) => ReceiptTreeState::Unavailable {
                reason: e.to_string(),
            },
        }
    }
}
