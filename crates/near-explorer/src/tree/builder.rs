//! Receipt lookup and tree construction.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::{ExecutedReceipt, ReceiptNode, TransactionTree, Traversal};
use crate::action::{Action, normalize_actions};
use crate::error::TreeError;
use crate::types::{AccountId, CryptoHash, ExecutionOutcomeWithId, FinalExecutionOutcome};

/// Who sent a receipt, to whom, and what it carried.
#[derive(Debug, Clone)]
struct Payload {
    predecessor_id: AccountId,
    receiver_id: AccountId,
    actions: Vec<Action>,
    synthetic: bool,
}

/// Receipts and outcomes of one transaction, keyed by receipt id.
///
/// Owns its data so a view can keep it around and resolve nodes lazily.
#[derive(Debug, Clone)]
pub struct ReceiptIndex {
    outcomes: HashMap<CryptoHash, ExecutionOutcomeWithId>,
    payloads: HashMap<CryptoHash, Payload>,
    root: CryptoHash,
}

/// A node whose children are still being resolved.
struct Frame {
    node: ExecutedReceipt,
    next_child: usize,
}

impl ReceiptIndex {
    /// Index a transaction-status response.
    ///
    /// The transaction's own conversion receipt is missing from `receipts`
    /// (always for `tx`, and whenever the first receipt does not match the
    /// first outcome). It is rebuilt from the transaction: signer as
    /// predecessor, receiver as receiver, top-level actions as payload.
    pub fn new(outcome: &FinalExecutionOutcome) -> Result<Self, TreeError> {
        let first_outcome = match outcome.receipts_outcome.first() {
            Some(first) => first.id,
            None => {
                return Err(match outcome.transaction_hash() {
                    Some(hash) if outcome.is_pending() => TreeError::Pending(*hash),
                    _ => TreeError::NoReceipts,
                });
            }
        };
        let root = outcome.root_receipt_id().unwrap_or(first_outcome);

        let outcomes: HashMap<_, _> = outcome
            .receipts_outcome
            .iter()
            .map(|o| (o.id, o.clone()))
            .collect();

        let mut payloads: HashMap<_, _> = outcome
            .receipts
            .iter()
            .map(|r| {
                (
                    r.receipt_id,
                    Payload {
                        predecessor_id: r.predecessor_id.clone(),
                        receiver_id: r.receiver_id.clone(),
                        actions: normalize_actions(r.receipt.actions()),
                        synthetic: false,
                    },
                )
            })
            .collect();

        let needs_synthetic = outcome
            .receipts
            .first()
            .is_none_or(|r| r.receipt_id != first_outcome);

        if needs_synthetic {
            if let Some(tx) = &outcome.transaction {
                payloads.entry(first_outcome).or_insert_with(|| {
                    debug!(receipt_id = %first_outcome, "synthesizing root receipt from transaction");
                    Payload {
                        predecessor_id: tx.signer_id.clone(),
                        receiver_id: tx.receiver_id.clone(),
                        actions: normalize_actions(&tx.actions),
                        synthetic: true,
                    }
                });
            }
        }

        Ok(Self {
            outcomes,
            payloads,
            root,
        })
    }

    /// Id the tree is rooted at.
    pub fn root_id(&self) -> &CryptoHash {
        &self.root
    }

    /// Number of receipt outcomes in the response.
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn contains(&self, receipt_id: &CryptoHash) -> bool {
        self.outcomes.contains_key(receipt_id)
    }

    /// Resolve the root node.
    pub fn root(&self, traversal: Traversal) -> ReceiptNode {
        self.node(&self.root, traversal)
    }

    /// Resolve the node for `receipt_id`.
    ///
    /// Under [`Traversal::Eager`] the whole subtree is resolved. An id that
    /// reappears on its own ancestor path is cut off as a missing leaf.
    pub fn node(&self, receipt_id: &CryptoHash, traversal: Traversal) -> ReceiptNode {
        let Some(root) = self.shallow(receipt_id) else {
            return ReceiptNode::missing(*receipt_id);
        };
        if traversal == Traversal::Lazy {
            return ReceiptNode::Executed(root);
        }

        let mut path: HashSet<CryptoHash> = HashSet::from([root.receipt_id]);
        let mut stack = vec![Frame {
            node: root,
            next_child: 0,
        }];

        loop {
            let Some(top) = stack.last_mut() else {
                // Unreachable: the root frame returns below.
                return ReceiptNode::missing(*receipt_id);
            };

            if let Some(child_id) = top.node.outgoing_receipt_ids.get(top.next_child).copied() {
                top.next_child += 1;

                if path.contains(&child_id) {
                    debug!(receipt_id = %child_id, "receipt cycle, cutting branch");
                    top.node
                        .outgoing_receipts
                        .push(ReceiptNode::missing(child_id));
                    continue;
                }

                match self.shallow(&child_id) {
                    Some(child) => {
                        path.insert(child_id);
                        stack.push(Frame {
                            node: child,
                            next_child: 0,
                        });
                    }
                    None => top
                        .node
                        .outgoing_receipts
                        .push(ReceiptNode::missing(child_id)),
                }
                continue;
            }

            let Some(done) = stack.pop() else {
                return ReceiptNode::missing(*receipt_id);
            };
            path.remove(&done.node.receipt_id);
            let finished = ReceiptNode::Executed(done.node);
            match stack.last_mut() {
                Some(parent) => parent.node.outgoing_receipts.push(finished),
                None => return finished,
            }
        }
    }

    /// Resolve one level: the node itself with unresolved children.
    pub fn expand(&self, receipt_id: &CryptoHash) -> ReceiptNode {
        self.node(receipt_id, Traversal::Lazy)
    }

    /// Resolve the direct children of a lazily built node in place.
    pub fn expand_children(&self, node: &mut ExecutedReceipt) {
        if node.is_expanded() {
            return;
        }
        node.outgoing_receipts = node
            .outgoing_receipt_ids
            .iter()
            .map(|id| self.expand(id))
            .collect();
    }

    /// Merge payload and outcome for one id, without children.
    fn shallow(&self, receipt_id: &CryptoHash) -> Option<ExecutedReceipt> {
        let Some(outcome) = self.outcomes.get(receipt_id) else {
            debug!(receipt_id = %receipt_id, "receipt outcome not found");
            return None;
        };
        let payload = self.payloads.get(receipt_id);

        Some(ExecutedReceipt {
            receipt_id: *receipt_id,
            predecessor_id: payload.map(|p| p.predecessor_id.clone()),
            receiver_id: payload
                .map(|p| p.receiver_id.clone())
                .unwrap_or_else(|| outcome.outcome.executor_id.clone()),
            actions: payload.map(|p| p.actions.clone()).unwrap_or_default(),
            status: outcome.outcome.status.clone(),
            gas_burnt: outcome.outcome.gas_burnt,
            tokens_burnt: outcome.outcome.tokens_burnt,
            logs: outcome.outcome.logs.clone(),
            block_hash: outcome.block_hash,
            synthetic: payload.is_some_and(|p| p.synthetic),
            outgoing_receipt_ids: outcome.outcome.receipt_ids.clone(),
            outgoing_receipts: Vec::new(),
        })
    }
}

impl TransactionTree {
    /// Build the receipt tree of a transaction-status response.
    pub fn build(outcome: &FinalExecutionOutcome, traversal: Traversal) -> Result<Self, TreeError> {
        let index = ReceiptIndex::new(outcome)?;
        Ok(Self::from_index(outcome, &index, traversal))
    }

    /// Build from an existing index, e.g. one kept for lazy expansion.
    pub fn from_index(
        outcome: &FinalExecutionOutcome,
        index: &ReceiptIndex,
        traversal: Traversal,
    ) -> Self {
        let root = index.root(traversal);
        let tree = Self {
            transaction_hash: outcome.transaction_hash().copied(),
            signer_id: outcome.transaction.as_ref().map(|t| t.signer_id.clone()),
            receiver_id: outcome.transaction.as_ref().map(|t| t.receiver_id.clone()),
            status: outcome.status.clone(),
            conversion_gas_burnt: outcome
                .transaction_outcome
                .as_ref()
                .map(|o| o.outcome.gas_burnt)
                .unwrap_or_default(),
            conversion_tokens_burnt: outcome
                .transaction_outcome
                .as_ref()
                .map(|o| o.outcome.tokens_burnt)
                .unwrap_or_default(),
            root,
        };
        debug!(
            root = %index.root_id(),
            nodes = tree.node_count(),
            missing = tree.missing_count(),
            "built receipt tree"
        );
        tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionKind;
    use crate::types::{Gas, NearToken};
    use serde_json::json;

    fn h(n: u8) -> CryptoHash {
        CryptoHash::from_bytes([n; 32])
    }

    fn outcome_json(id: u8, executor: &str, children: &[u8]) -> serde_json::Value {
        json!({
            "id": h(id).to_string(),
            "block_hash": h(200).to_string(),
            "outcome": {
                "executor_id": executor,
                "gas_burnt": 1_000_000_000_000u64,
                "tokens_burnt": "100",
                "logs": [],
                "receipt_ids": children.iter().map(|c| h(*c).to_string()).collect::<Vec<_>>(),
                "status": { "SuccessValue": "" }
            }
        })
    }

    fn receipt_json(id: u8, from: &str, to: &str) -> serde_json::Value {
        json!({
            "predecessor_id": from,
            "receiver_id": to,
            "receipt_id": h(id).to_string(),
            "receipt": {
                "Action": {
                    "signer_id": "alice.near",
                    "signer_public_key": "ed25519:abc",
                    "gas_price": "100000000",
                    "output_data_receivers": [],
                    "input_data_ids": [],
                    "actions": [{ "FunctionCall": { "method_name": "step", "args": "", "gas": 1, "deposit": "0" } }]
                }
            }
        })
    }

    fn tx_json() -> serde_json::Value {
        json!({
            "signer_id": "alice.near",
            "public_key": "ed25519:abc",
            "nonce": 1,
            "receiver_id": "app.near",
            "hash": h(100).to_string(),
            "actions": [{ "Transfer": { "deposit": "5" } }],
            "signature": "ed25519:sig"
        })
    }

    fn response(
        outcomes: Vec<serde_json::Value>,
        receipts: Vec<serde_json::Value>,
        first: u8,
    ) -> FinalExecutionOutcome {
        serde_json::from_value(json!({
            "final_execution_status": "FINAL",
            "status": { "SuccessValue": "" },
            "transaction": tx_json(),
            "transaction_outcome": {
                "id": h(100).to_string(),
                "block_hash": h(200).to_string(),
                "outcome": {
                    "executor_id": "alice.near",
                    "gas_burnt": 2_000_000_000_000u64,
                    "tokens_burnt": "7",
                    "logs": [],
                    "receipt_ids": [h(first).to_string()],
                    "status": { "SuccessReceiptId": h(first).to_string() }
                }
            },
            "receipts_outcome": outcomes,
            "receipts": receipts
        }))
        .unwrap()
    }

    // ========================================================================
    // Chain and root tests
    // ========================================================================

    #[test]
    fn test_chain_a_b_c() {
        let outcome = response(
            vec![
                outcome_json(1, "a.near", &[2]),
                outcome_json(2, "b.near", &[3]),
                outcome_json(3, "c.near", &[]),
            ],
            vec![
                receipt_json(1, "alice.near", "a.near"),
                receipt_json(2, "a.near", "b.near"),
                receipt_json(3, "b.near", "c.near"),
            ],
            1,
        );

        let tree = TransactionTree::build(&outcome, Traversal::Eager).unwrap();
        assert!(!tree.has_synthetic_root());
        assert_eq!(tree.node_count(), 3);
        assert_eq!(tree.depth(), 3);

        let ids: Vec<_> = tree.iter().map(|n| *n.receipt_id()).collect();
        assert_eq!(ids, vec![h(1), h(2), h(3)]);

        let c = tree.find(&h(3)).unwrap().as_executed().unwrap();
        assert_eq!(c.predecessor_id.as_ref().unwrap().as_str(), "b.near");
        assert!(c.outgoing_receipts.is_empty());
    }

    #[test]
    fn test_synthetic_root_when_receipts_empty() {
        let outcome = response(
            vec![outcome_json(1, "app.near", &[2]), outcome_json(2, "alice.near", &[])],
            vec![],
            1,
        );

        let tree = TransactionTree::build(&outcome, Traversal::Eager).unwrap();
        let root = tree.root.as_executed().unwrap();
        assert!(root.synthetic);
        assert_eq!(root.receipt_id, h(1));
        assert_eq!(root.predecessor_id.as_ref().unwrap().as_str(), "alice.near");
        assert_eq!(root.receiver_id.as_str(), "app.near");
        assert_eq!(root.actions.len(), 1);
        assert_eq!(root.actions[0].kind, ActionKind::Transfer);

        // Child without a payload falls back to the executor.
        let child = root.outgoing_receipts[0].as_executed().unwrap();
        assert_eq!(child.receiver_id.as_str(), "alice.near");
        assert!(child.predecessor_id.is_none());
        assert!(child.actions.is_empty());
    }

    #[test]
    fn test_synthetic_root_when_first_receipt_differs() {
        let outcome = response(
            vec![outcome_json(1, "app.near", &[2]), outcome_json(2, "b.near", &[])],
            vec![receipt_json(2, "app.near", "b.near")],
            1,
        );

        let tree = TransactionTree::build(&outcome, Traversal::Eager).unwrap();
        assert!(tree.has_synthetic_root());
        let child = tree.find(&h(2)).unwrap().as_executed().unwrap();
        assert!(!child.synthetic);
        assert_eq!(child.predecessor_id.as_ref().unwrap().as_str(), "app.near");
    }

    #[test]
    fn test_root_receiver_is_tx_receiver_without_synthetic() {
        let outcome = response(
            vec![outcome_json(1, "app.near", &[])],
            vec![receipt_json(1, "alice.near", "app.near")],
            1,
        );
        let tree = TransactionTree::build(&outcome, Traversal::Eager).unwrap();
        assert!(!tree.has_synthetic_root());
        assert_eq!(
            tree.root.as_executed().unwrap().receiver_id,
            tree.receiver_id.clone().unwrap()
        );
    }

    // ========================================================================
    // Missing receipts and malformed input
    // ========================================================================

    #[test]
    fn test_missing_child_is_placeholder() {
        let outcome = response(
            vec![outcome_json(1, "a.near", &[2, 9]), outcome_json(2, "b.near", &[])],
            vec![
                receipt_json(1, "alice.near", "a.near"),
                receipt_json(2, "a.near", "b.near"),
            ],
            1,
        );

        let tree = TransactionTree::build(&outcome, Traversal::Eager).unwrap();
        assert_eq!(tree.node_count(), 3);
        assert_eq!(tree.missing_count(), 1);
        let root = tree.root.as_executed().unwrap();
        assert!(!root.outgoing_receipts[0].is_missing());
        assert_eq!(root.outgoing_receipts[1], ReceiptNode::missing(h(9)));
    }

    #[test]
    fn test_missing_root_is_placeholder() {
        // The transaction outcome points at a receipt that was not returned.
        let outcome = response(vec![outcome_json(1, "a.near", &[])], vec![], 5);
        let tree = TransactionTree::build(&outcome, Traversal::Eager).unwrap();
        assert_eq!(tree.root, ReceiptNode::missing(h(5)));
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_cycle_terminates() {
        let outcome = response(
            vec![outcome_json(1, "a.near", &[2]), outcome_json(2, "b.near", &[1])],
            vec![
                receipt_json(1, "alice.near", "a.near"),
                receipt_json(2, "a.near", "b.near"),
            ],
            1,
        );
        let tree = TransactionTree::build(&outcome, Traversal::Eager).unwrap();
        assert_eq!(tree.node_count(), 3);
        assert_eq!(tree.missing_count(), 1);
    }

    #[test]
    fn test_deep_chain_does_not_overflow() {
        let depth = 100_000u32;
        let id = |n: u32| {
            let mut bytes = [0u8; 32];
            bytes[..4].copy_from_slice(&n.to_be_bytes());
            bytes[31] = 1;
            CryptoHash::from_bytes(bytes)
        };
        let outcomes: Vec<_> = (0..depth)
            .map(|n| {
                let children: Vec<String> = if n + 1 < depth {
                    vec![id(n + 1).to_string()]
                } else {
                    vec![]
                };
                json!({
                    "id": id(n).to_string(),
                    "block_hash": h(200).to_string(),
                    "outcome": {
                        "executor_id": "a.near",
                        "gas_burnt": 1,
                        "tokens_burnt": "0",
                        "logs": [],
                        "receipt_ids": children,
                        "status": { "SuccessValue": "" }
                    }
                })
            })
            .collect();
        let outcome: FinalExecutionOutcome =
            serde_json::from_value(json!({ "receipts_outcome": outcomes })).unwrap();

        let index = ReceiptIndex::new(&outcome).unwrap();
        let root = index.root(Traversal::Eager);
        assert_eq!(root.depth(), depth as usize);
        assert_eq!(root.node_count(), depth as usize);
        drop(root);
    }

    #[test]
    fn test_no_receipts_error() {
        let outcome: FinalExecutionOutcome = serde_json::from_value(json!({})).unwrap();
        assert_eq!(
            ReceiptIndex::new(&outcome).unwrap_err(),
            TreeError::NoReceipts
        );
    }

    #[test]
    fn test_pending_error() {
        let outcome: FinalExecutionOutcome = serde_json::from_value(json!({
            "final_execution_status": "INCLUDED",
            "transaction": tx_json()
        }))
        .unwrap();
        assert_eq!(
            ReceiptIndex::new(&outcome).unwrap_err(),
            TreeError::Pending(h(100))
        );
    }

    // ========================================================================
    // Traversal and queries
    // ========================================================================

    #[test]
    fn test_lazy_then_expand() {
        let outcome = response(
            vec![
                outcome_json(1, "a.near", &[2, 3]),
                outcome_json(2, "b.near", &[]),
                outcome_json(3, "c.near", &[4]),
                outcome_json(4, "d.near", &[]),
            ],
            vec![],
            1,
        );
        let index = ReceiptIndex::new(&outcome).unwrap();

        let ReceiptNode::Executed(mut root) = index.root(Traversal::Lazy) else {
            panic!("root should resolve");
        };
        assert_eq!(root.outgoing_receipt_ids, vec![h(2), h(3)]);
        assert!(root.outgoing_receipts.is_empty());
        assert!(!root.is_expanded());

        index.expand_children(&mut root);
        assert!(root.is_expanded());
        let third = root.outgoing_receipts[1].as_executed().unwrap();
        assert_eq!(third.outgoing_receipt_ids, vec![h(4)]);
        assert!(third.outgoing_receipts.is_empty());

        assert!(index.expand(&h(42)).is_missing());
    }

    #[test]
    fn test_rebuild_is_identical() {
        let outcome = response(
            vec![outcome_json(1, "a.near", &[2, 3]), outcome_json(2, "b.near", &[])],
            vec![receipt_json(2, "a.near", "b.near")],
            1,
        );
        let first = TransactionTree::build(&outcome, Traversal::Eager).unwrap();
        let second = TransactionTree::build(&outcome, Traversal::Eager).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_totals_include_conversion() {
        let outcome = response(
            vec![outcome_json(1, "a.near", &[2]), outcome_json(2, "b.near", &[])],
            vec![],
            1,
        );
        let tree = TransactionTree::build(&outcome, Traversal::Eager).unwrap();
        assert_eq!(tree.total_gas_burnt(), Gas::from_tgas(4));
        assert_eq!(tree.total_tokens_burnt(), NearToken::from_yoctonear(207));
        assert_eq!(tree.total_gas_burnt(), outcome.total_gas_burnt());
        // Synthetic root carries the transaction's transfer.
        assert_eq!(tree.total_deposit(), NearToken::from_yoctonear(5));
    }

    #[test]
    fn test_refunds_and_failures() {
        let mut failing = outcome_json(2, "b.near", &[3]);
        failing["outcome"]["status"] = json!({ "Failure": { "ActionError": { "index": 0, "kind": "LackBalanceForState" } } });
        let outcome = response(
            vec![
                outcome_json(1, "a.near", &[2]),
                failing,
                outcome_json(3, "alice.near", &[]),
            ],
            vec![
                receipt_json(1, "alice.near", "a.near"),
                receipt_json(2, "a.near", "b.near"),
                json!({
                    "predecessor_id": "system",
                    "receiver_id": "alice.near",
                    "receipt_id": h(3).to_string(),
                    "receipt": { "Action": {
                        "signer_id": "system",
                        "signer_public_key": "ed25519:11111111111111111111111111111111",
                        "gas_price": "0",
                        "output_data_receivers": [],
                        "input_data_ids": [],
                        "actions": [{ "Transfer": { "deposit": "999" } }]
                    } }
                }),
            ],
            1,
        );

        let tree = TransactionTree::build(&outcome, Traversal::Eager).unwrap();
        let failed = tree.failed_receipts();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].receipt_id, h(2));

        let refunds = tree.refunds();
        assert_eq!(refunds.len(), 1);
        assert_eq!(refunds[0].receiver_id.as_str(), "alice.near");
        assert_eq!(tree.total_deposit(), NearToken::ZERO);
    }
}
