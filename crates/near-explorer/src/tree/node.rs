//! Tree nodes and whole-tree queries.

use serde::Serialize;

use crate::action::Action;
use crate::types::{AccountId, CryptoHash, ExecutionStatus, Gas, NearToken};

/// One entry in a receipt tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum ReceiptNode {
    /// A receipt with a known outcome.
    Executed(ExecutedReceipt),
    /// A receipt referenced by an outcome but absent from the response.
    Missing { receipt_id: CryptoHash },
}

/// A receipt merged with its outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutedReceipt {
    pub receipt_id: CryptoHash,
    /// `None` when the outcome is known but its payload was not returned.
    pub predecessor_id: Option<AccountId>,
    pub receiver_id: AccountId,
    pub actions: Vec<Action>,
    pub status: ExecutionStatus,
    pub gas_burnt: Gas,
    pub tokens_burnt: NearToken,
    pub logs: Vec<String>,
    pub block_hash: CryptoHash,
    /// True for the root receipt reconstructed from the transaction itself.
    pub synthetic: bool,
    /// Receipts scheduled by this one, in outcome order.
    pub outgoing_receipt_ids: Vec<CryptoHash>,
    /// Resolved children. Empty until expanded under [`Traversal::Lazy`](super::Traversal::Lazy).
    pub outgoing_receipts: Vec<ReceiptNode>,
}

/// Children are torn down from a work stack, so dropping a deep chain does
/// not recurse once per level.
impl Drop for ExecutedReceipt {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.outgoing_receipts);
        while let Some(node) = stack.pop() {
            if let ReceiptNode::Executed(mut receipt) = node {
                stack.append(&mut receipt.outgoing_receipts);
            }
        }
    }
}

impl ExecutedReceipt {
    /// Whether every outgoing receipt has been resolved.
    pub fn is_expanded(&self) -> bool {
        self.outgoing_receipts.len() == self.outgoing_receipt_ids.len()
    }

    /// Gas refunds are issued by the protocol's `system` account.
    pub fn is_refund(&self) -> bool {
        self.predecessor_id
            .as_ref()
            .is_some_and(AccountId::is_system)
    }

    pub fn is_failure(&self) -> bool {
        self.status.is_failure()
    }

    /// Sum of deposits attached by this receipt's actions.
    pub fn deposit(&self) -> NearToken {
        self.actions.iter().map(Action::deposit).sum()
    }
}

impl ReceiptNode {
    pub fn missing(receipt_id: CryptoHash) -> Self {
        ReceiptNode::Missing { receipt_id }
    }

    pub fn receipt_id(&self) -> &CryptoHash {
        match self {
            ReceiptNode::Executed(r) => &r.receipt_id,
            ReceiptNode::Missing { receipt_id } => receipt_id,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, ReceiptNode::Missing { .. })
    }

    pub fn as_executed(&self) -> Option<&ExecutedReceipt> {
        match self {
            ReceiptNode::Executed(r) => Some(r),
            ReceiptNode::Missing { .. } => None,
        }
    }

    /// Resolved children (always empty for a missing receipt).
    pub fn children(&self) -> &[ReceiptNode] {
        match self {
            ReceiptNode::Executed(r) => &r.outgoing_receipts,
            ReceiptNode::Missing { .. } => &[],
        }
    }

    /// Pre-order iterator over this node and its resolved descendants.
    pub fn iter(&self) -> Iter<'_> {
        Iter { stack: vec![self] }
    }

    /// Number of nodes in this subtree, placeholders included.
    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    /// Depth of this subtree; a lone node has depth 1.
    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(self, 1usize)];
        while let Some((node, depth)) = stack.pop() {
            max = max.max(depth);
            stack.extend(node.children().iter().map(|c| (c, depth + 1)));
        }
        max
    }

    pub fn find(&self, receipt_id: &CryptoHash) -> Option<&ReceiptNode> {
        self.iter().find(|n| n.receipt_id() == receipt_id)
    }
}

/// Pre-order (execution order) iterator over a receipt tree.
pub struct Iter<'a> {
    stack: Vec<&'a ReceiptNode>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a ReceiptNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}

/// A transaction together with its receipt tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionTree {
    pub transaction_hash: Option<CryptoHash>,
    pub signer_id: Option<AccountId>,
    pub receiver_id: Option<AccountId>,
    pub status: Option<ExecutionStatus>,
    /// Gas burnt converting the transaction into its first receipt.
    pub conversion_gas_burnt: Gas,
    pub conversion_tokens_burnt: NearToken,
    pub root: ReceiptNode,
}

impl TransactionTree {
    pub fn iter(&self) -> Iter<'_> {
        self.root.iter()
    }

    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }

    /// Number of receipts that were referenced but not returned.
    pub fn missing_count(&self) -> usize {
        self.iter().filter(|n| n.is_missing()).count()
    }

    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    pub fn find(&self, receipt_id: &CryptoHash) -> Option<&ReceiptNode> {
        self.root.find(receipt_id)
    }

    pub fn executed(&self) -> impl Iterator<Item = &ExecutedReceipt> {
        self.iter().filter_map(ReceiptNode::as_executed)
    }

    /// Gas burnt by the conversion and every resolved receipt.
    pub fn total_gas_burnt(&self) -> Gas {
        self.conversion_gas_burnt + self.executed().map(|r| r.gas_burnt).sum::<Gas>()
    }

    pub fn total_tokens_burnt(&self) -> NearToken {
        self.conversion_tokens_burnt + self.executed().map(|r| r.tokens_burnt).sum::<NearToken>()
    }

    pub fn failed_receipts(&self) -> Vec<&ExecutedReceipt> {
        self.executed().filter(|r| r.is_failure()).collect()
    }

    pub fn refunds(&self) -> Vec<&ExecutedReceipt> {
        self.executed().filter(|r| r.is_refund()).collect()
    }

    /// Deposits attached across the tree, refunds excluded.
    pub fn total_deposit(&self) -> NearToken {
        self.executed()
            .filter(|r| !r.is_refund())
            .map(ExecutedReceipt::deposit)
            .sum()
    }

    /// Whether the root was reconstructed from the transaction.
    pub fn has_synthetic_root(&self) -> bool {
        self.root.as_executed().is_some_and(|r| r.synthetic)
    }
}
