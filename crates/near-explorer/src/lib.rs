//! Transaction views for NEAR Protocol.
//!
//! **near-explorer** fetches a transaction from the chain's RPC and rebuilds
//! the tree of receipts it executed as, the way a block explorer's
//! transaction page shows it.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use near_explorer::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), near_explorer::Error> {
//!     let explorer = Explorer::mainnet().build()?;
//!     let hash: CryptoHash = "9FtHUFBQsZ2MG77K3x3MJ9wjX3UT8zE1TczCrhZEcG8U".parse()?;
//!
//!     let tree = explorer.receipt_tree(&hash, "alice.near").await?;
//!     for receipt in tree.executed() {
//!         println!("{} -> {}", receipt.receipt_id, receipt.receiver_id);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Components
//!
//! - [`tree`] - Receipt tree builder: links `receipts_outcome` back into causal order
//! - [`action`] - Action mapper: one [`Action`] shape for RPC and indexer data
//! - [`provider`] - Provider list with a persisted, shared selection
//! - [`client`] - JSON-RPC client, provider fallback and the [`Explorer`] facade
//!
//! # Missing data
//!
//! RPC responses are often incomplete: non-archival nodes prune old
//! receipts, and the plain `tx` call omits receipt payloads. None of this
//! fails a view. Missing receipts become [`ReceiptNode::Missing`] leaves and
//! missing payloads fall back to what the outcome records.

pub mod action;
pub mod client;
pub mod error;
pub mod provider;
pub mod tree;
pub mod types;

pub use error::{Error, RpcError, TreeError};
pub use types::*;

pub use action::{Action, ActionKind, RawAction};
pub use client::{Explorer, ExplorerBuilder, FallbackClient, RetryConfig, RpcClient};
pub use provider::{ProviderSelector, RpcProvider, SelectionStore};
pub use tree::{
    ExecutedReceipt, ReceiptIndex, ReceiptNode, ReceiptTreeState, TransactionTree, Traversal,
};
