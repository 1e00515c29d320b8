//! Plain-text rendering of receipt trees.

use std::fmt::{self, Write};

use super::{ExecutedReceipt, ReceiptNode, TransactionTree};
use crate::types::ExecutionStatus;

fn status_label(status: &ExecutionStatus) -> &'static str {
    match status {
        ExecutionStatus::SuccessValue(_) | ExecutionStatus::SuccessReceiptId(_) => "ok",
        ExecutionStatus::Failure(_) => "failed",
        ExecutionStatus::Pending => "pending",
        ExecutionStatus::Unknown => "unknown",
    }
}

fn write_receipt<W: Write>(out: &mut W, r: &ExecutedReceipt) -> fmt::Result {
    let from = r.predecessor_id.as_ref().map_or("?", |p| p.as_str());
    write!(
        out,
        "{} {} -> {} [{}] {}",
        r.receipt_id,
        from,
        r.receiver_id,
        status_label(&r.status),
        r.gas_burnt
    )?;
    if r.is_refund() {
        out.write_str(" (refund)")?;
    }
    Ok(())
}

impl TransactionTree {
    /// Write the tree as indented text, one receipt per line followed by its
    /// actions, logs and failure message.
    pub fn render<W: Write>(&self, out: &mut W) -> fmt::Result {
        match &self.transaction_hash {
            Some(hash) => write!(out, "Transaction {hash}")?,
            None => out.write_str("Transaction")?,
        }
        if let (Some(signer), Some(receiver)) = (&self.signer_id, &self.receiver_id) {
            write!(out, " {signer} -> {receiver}")?;
        }
        if let Some(status) = &self.status {
            write!(out, " [{}]", status_label(status))?;
        }
        writeln!(out)?;
        writeln!(
            out,
            "Gas burnt: {}, tokens burnt: {}",
            self.total_gas_burnt(),
            self.total_tokens_burnt()
        )?;

        let mut stack: Vec<(&ReceiptNode, String, bool)> = vec![(&self.root, String::new(), true)];
        while let Some((node, prefix, last)) = stack.pop() {
            let branch = if last { "└─ " } else { "├─ " };
            let child_prefix = format!("{prefix}{}", if last { "   " } else { "│  " });

            out.write_str(&prefix)?;
            out.write_str(branch)?;

            let r = match node {
                ReceiptNode::Executed(r) => r,
                ReceiptNode::Missing { receipt_id } => {
                    writeln!(out, "{receipt_id} failed to find receipt")?;
                    continue;
                }
            };
            write_receipt(out, r)?;
            writeln!(out)?;

            let unresolved = r
                .outgoing_receipt_ids
                .len()
                .saturating_sub(r.outgoing_receipts.len());
            let detail = format!(
                "{child_prefix}{}",
                if r.outgoing_receipts.is_empty() && unresolved == 0 { "  " } else { "│ " }
            );
            for action in &r.actions {
                writeln!(out, "{detail}{action}")?;
            }
            for log in &r.logs {
                writeln!(out, "{detail}log: {log}")?;
            }
            if let Some(message) = r.status.failure_message() {
                writeln!(out, "{detail}error: {message}")?;
            }
            if r.outgoing_receipts.is_empty() && unresolved > 0 {
                writeln!(out, "{child_prefix}└─ {unresolved} receipts not expanded")?;
            }

            let count = r.outgoing_receipts.len();
            for (i, child) in r.outgoing_receipts.iter().enumerate().rev() {
                stack.push((child, child_prefix.clone(), i + 1 == count));
            }
        }
        Ok(())
    }
}

impl fmt::Display for TransactionTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f)
    }
}

#[cfg(test)]
mod tests {
    use crate::tree::{ReceiptIndex, TransactionTree, Traversal};
    use crate::types::{CryptoHash, FinalExecutionOutcome};
    use serde_json::json;

    fn h(n: u8) -> CryptoHash {
        CryptoHash::from_bytes([n; 32])
    }

    fn sample() -> FinalExecutionOutcome {
        let outcome = |id: u8, executor: &str, children: Vec<u8>, logs: Vec<&str>| {
            json!({
                "id": h(id).to_string(),
                "block_hash": h(200).to_string(),
                "outcome": {
                    "executor_id": executor,
                    "gas_burnt": 2_428_000_000_000u64,
                    "tokens_burnt": "0",
                    "logs": logs,
                    "receipt_ids": children.iter().map(|c| h(*c).to_string()).collect::<Vec<_>>(),
                    "status": { "SuccessValue": "" }
                }
            })
        };
        serde_json::from_value(json!({
            "status": { "SuccessValue": "" },
            "transaction": {
                "signer_id": "alice.near",
                "public_key": "ed25519:abc",
                "nonce": 1,
                "receiver_id": "app.near",
                "hash": h(100).to_string(),
                "actions": [{ "FunctionCall": { "method_name": "go", "args": "", "gas": 1, "deposit": "0" } }]
            },
            "receipts_outcome": [
                outcome(1, "app.near", vec![2, 9], vec!["hello"]),
                outcome(2, "alice.near", vec![], vec![])
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_render_eager() {
        let tree = TransactionTree::build(&sample(), Traversal::Eager).unwrap();
        let text = tree.to_string();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            format!("Transaction {} alice.near -> app.near [ok]", h(100))
        );
        assert_eq!(lines[1], "Gas burnt: 4.85 Tgas, tokens burnt: 0 NEAR");
        assert_eq!(
            lines[2],
            format!("└─ {} alice.near -> app.near [ok] 2.42 Tgas", h(1))
        );
        assert_eq!(lines[3], "   │ FunctionCall go");
        assert_eq!(lines[4], "   │ log: hello");
        assert_eq!(lines[5], format!("   ├─ {} ? -> alice.near [ok] 2.42 Tgas", h(2)));
        assert_eq!(lines[6], format!("   └─ {} failed to find receipt", h(9)));
        assert_eq!(lines.len(), 7);
    }

    #[test]
    fn test_render_lazy_shows_unexpanded() {
        let outcome = sample();
        let index = ReceiptIndex::new(&outcome).unwrap();
        let tree = TransactionTree::from_index(&outcome, &index, Traversal::Lazy);
        let text = tree.to_string();
        assert!(text.contains("2 receipts not expanded"));
        assert!(!text.contains("failed to find receipt"));
    }
}
