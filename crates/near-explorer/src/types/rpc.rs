//! RPC response types.

use serde::{Deserialize, Serialize};

use super::{AccountId, CryptoHash, Gas, NearToken, TxExecutionStatus};
use crate::action::RawAction;

// ============================================================================
// Transaction outcome types
// ============================================================================

/// Final execution outcome from `tx` / `EXPERIMENTAL_tx_status`.
///
/// `receipts` is only populated by `EXPERIMENTAL_tx_status`; the plain `tx`
/// call leaves it empty and the tree builder synthesizes the root receipt.
#[derive(Debug, Clone, Deserialize)]
pub struct FinalExecutionOutcome {
    /// The execution level that was reached (absent on older nodes).
    #[serde(default)]
    pub final_execution_status: Option<TxExecutionStatus>,
    /// Overall transaction status.
    #[serde(default)]
    pub status: Option<ExecutionStatus>,
    /// The signed transaction.
    #[serde(default)]
    pub transaction: Option<TransactionView>,
    /// Outcome of converting the transaction into its first receipt.
    #[serde(default)]
    pub transaction_outcome: Option<ExecutionOutcomeWithId>,
    /// One outcome per executed receipt.
    #[serde(default)]
    pub receipts_outcome: Vec<ExecutionOutcomeWithId>,
    /// Receipt payloads, parallel to `receipts_outcome` by id.
    #[serde(default)]
    pub receipts: Vec<Receipt>,
}

impl FinalExecutionOutcome {
    pub fn is_success(&self) -> bool {
        self.status.as_ref().is_some_and(ExecutionStatus::is_success)
    }

    pub fn is_failure(&self) -> bool {
        self.status.as_ref().is_some_and(ExecutionStatus::is_failure)
    }

    /// Check if the transaction has not executed yet.
    pub fn is_pending(&self) -> bool {
        match self.final_execution_status {
            Some(status) => status.is_pending(),
            None => self.receipts_outcome.is_empty(),
        }
    }

    /// Get the transaction hash.
    pub fn transaction_hash(&self) -> Option<&CryptoHash> {
        self.transaction_outcome
            .as_ref()
            .map(|o| &o.id)
            .or_else(|| self.transaction.as_ref().map(|t| &t.hash))
    }

    /// The id the receipt tree is rooted at.
    ///
    /// This is the first receipt the transaction was converted into, or the
    /// first receipt outcome when the transaction outcome is missing.
    pub fn root_receipt_id(&self) -> Option<CryptoHash> {
        self.transaction_outcome
            .as_ref()
            .and_then(|o| o.outcome.receipt_ids.first().copied())
            .or_else(|| self.receipts_outcome.first().map(|o| o.id))
    }

    /// Get the failure description if present.
    pub fn failure_message(&self) -> Option<String> {
        self.status.as_ref().and_then(ExecutionStatus::failure_message)
    }

    /// Total gas burnt by the transaction and all its receipts.
    pub fn total_gas_burnt(&self) -> Gas {
        self.transaction_outcome
            .iter()
            .chain(&self.receipts_outcome)
            .map(|o| o.outcome.gas_burnt)
            .sum()
    }

    /// Total tokens burnt by the transaction and all its receipts.
    pub fn total_tokens_burnt(&self) -> NearToken {
        self.transaction_outcome
            .iter()
            .chain(&self.receipts_outcome)
            .map(|o| o.outcome.tokens_burnt)
            .sum()
    }
}

/// Execution status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ExecutionStatus {
    /// Unknown status.
    Unknown,
    /// Execution is pending.
    Pending,
    /// Execution failed. Kept as raw JSON since the error tree grows with
    /// every protocol version.
    Failure(serde_json::Value),
    /// Execution succeeded with a value (base64 encoded).
    SuccessValue(String),
    /// Execution succeeded with a receipt ID.
    SuccessReceiptId(CryptoHash),
}

impl ExecutionStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::SuccessValue(_) | Self::SuccessReceiptId(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// Human readable failure description, e.g.
    /// `ActionError: FunctionCallError: ExecutionError: Smart contract panicked: x`.
    pub fn failure_message(&self) -> Option<String> {
        match self {
            Self::Failure(err) => {
                let mut parts = Vec::new();
                describe_failure(err, &mut parts);
                Some(parts.join(": "))
            }
            _ => None,
        }
    }
}

/// Flatten the nested single-key error objects NEAR RPC returns.
fn describe_failure(value: &serde_json::Value, parts: &mut Vec<String>) {
    use serde_json::Value;

    match value {
        Value::Null => {}
        Value::String(s) => parts.push(s.clone()),
        Value::Object(map) => {
            if let Some(kind) = map.get("kind") {
                describe_failure(kind, parts);
            } else if map.len() == 1 {
                if let Some((key, inner)) = map.iter().next() {
                    parts.push(key.clone());
                    describe_failure(inner, parts);
                }
            } else {
                parts.push(value.to_string());
            }
        }
        other => parts.push(other.to_string()),
    }
}

/// Transaction view in outcome.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionView {
    /// Signer account.
    pub signer_id: AccountId,
    /// Signer public key.
    #[serde(default)]
    pub public_key: String,
    /// Transaction nonce.
    #[serde(default)]
    pub nonce: u64,
    /// Receiver account.
    pub receiver_id: AccountId,
    /// Transaction hash.
    pub hash: CryptoHash,
    /// Actions in the transaction.
    #[serde(default)]
    pub actions: Vec<RawAction>,
    /// Transaction signature.
    #[serde(default)]
    pub signature: Option<String>,
    /// Priority fee (optional, for congestion pricing).
    #[serde(default)]
    pub priority_fee: Option<u64>,
}

/// Execution outcome with ID.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionOutcomeWithId {
    /// Receipt or transaction ID.
    pub id: CryptoHash,
    /// Outcome details.
    pub outcome: ExecutionOutcome,
    /// Block hash where this was executed.
    pub block_hash: CryptoHash,
}

/// Execution outcome details.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionOutcome {
    /// Executor account.
    pub executor_id: AccountId,
    /// Gas burnt during execution.
    pub gas_burnt: Gas,
    /// Tokens burnt for gas.
    pub tokens_burnt: NearToken,
    /// Logs emitted.
    #[serde(default)]
    pub logs: Vec<String>,
    /// Receipt IDs generated.
    #[serde(default)]
    pub receipt_ids: Vec<CryptoHash>,
    /// Execution status.
    pub status: ExecutionStatus,
}

// ============================================================================
// Receipt types (for EXPERIMENTAL_tx_status)
// ============================================================================

/// Receipt from EXPERIMENTAL_tx_status.
#[derive(Debug, Clone, Deserialize)]
pub struct Receipt {
    /// Predecessor account that created this receipt.
    pub predecessor_id: AccountId,
    /// Receiver account for this receipt.
    pub receiver_id: AccountId,
    /// Receipt ID.
    pub receipt_id: CryptoHash,
    /// Receipt content (action or data).
    pub receipt: ReceiptContent,
    /// Priority (optional, for congestion pricing).
    #[serde(default)]
    pub priority: Option<u64>,
}

/// Receipt content.
///
/// Receipt kinds this crate does not know are kept as raw JSON instead of
/// failing the whole response.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "serde_json::Value")]
pub enum ReceiptContent {
    /// Action receipt.
    Action(ActionReceiptData),
    /// Data receipt.
    Data(DataReceiptData),
    /// Any other receipt kind.
    Other(serde_json::Value),
}

impl From<serde_json::Value> for ReceiptContent {
    fn from(value: serde_json::Value) -> Self {
        if let Some(action) = value.get("Action") {
            if let Ok(data) = serde_json::from_value(action.clone()) {
                return ReceiptContent::Action(data);
            }
        }
        if let Some(data) = value.get("Data") {
            if let Ok(data) = serde_json::from_value(data.clone()) {
                return ReceiptContent::Data(data);
            }
        }
        ReceiptContent::Other(value)
    }
}

impl ReceiptContent {
    /// Actions carried by this receipt (empty for data receipts).
    pub fn actions(&self) -> &[RawAction] {
        match self {
            ReceiptContent::Action(data) => &data.actions,
            _ => &[],
        }
    }
}

/// Action receipt data.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionReceiptData {
    /// Signer account ID.
    pub signer_id: AccountId,
    /// Signer public key.
    #[serde(default)]
    pub signer_public_key: String,
    /// Gas price for this receipt.
    #[serde(default)]
    pub gas_price: NearToken,
    /// Output data receivers.
    #[serde(default)]
    pub output_data_receivers: Vec<serde_json::Value>,
    /// Input data IDs.
    #[serde(default)]
    pub input_data_ids: Vec<CryptoHash>,
    /// Actions in this receipt.
    #[serde(default)]
    pub actions: Vec<RawAction>,
    /// Whether this is a promise yield.
    #[serde(default)]
    pub is_promise_yield: Option<bool>,
}

/// Data receipt data.
#[derive(Debug, Clone, Deserialize)]
pub struct DataReceiptData {
    /// Data ID.
    pub data_id: CryptoHash,
    /// Data content (optional, base64).
    #[serde(default)]
    pub data: Option<String>,
}

// ============================================================================
// Block types
// ============================================================================

/// Block information from the `block` RPC.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockView {
    /// Block producer.
    pub author: AccountId,
    /// Block header.
    pub header: BlockHeaderView,
    /// Chunk headers.
    #[serde(default)]
    pub chunks: Vec<ChunkHeaderView>,
}

/// Block header (the fields an explorer renders).
#[derive(Debug, Clone, Deserialize)]
pub struct BlockHeaderView {
    /// Block height.
    pub height: u64,
    /// Block hash.
    pub hash: CryptoHash,
    /// Previous block hash.
    pub prev_hash: CryptoHash,
    /// Timestamp in nanoseconds (as string).
    pub timestamp_nanosec: String,
    /// Gas price for this block.
    pub gas_price: NearToken,
    /// Total supply.
    #[serde(default)]
    pub total_supply: Option<NearToken>,
}

/// Chunk header.
#[derive(Debug, Clone, Deserialize)]
pub struct ChunkHeaderView {
    /// Chunk hash.
    pub chunk_hash: CryptoHash,
    /// Shard ID.
    pub shard_id: u64,
    /// Gas used.
    pub gas_used: Gas,
    /// Gas limit.
    pub gas_limit: Gas,
    /// Height at which this chunk was included.
    pub height_included: u64,
}

// ============================================================================
// Node status types
// ============================================================================

/// Node status response.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    /// Protocol version.
    pub protocol_version: u32,
    /// Latest protocol version supported.
    pub latest_protocol_version: u32,
    /// Chain ID.
    pub chain_id: String,
    /// Sync information.
    pub sync_info: SyncInfo,
    /// Node version.
    pub version: NodeVersion,
}

/// Sync information.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncInfo {
    /// Latest block hash.
    pub latest_block_hash: CryptoHash,
    /// Latest block height.
    pub latest_block_height: u64,
    /// Latest block timestamp.
    pub latest_block_time: String,
    /// Whether the node is syncing.
    pub syncing: bool,
    /// Earliest block height kept by the node; `None` or 0 on archival nodes.
    #[serde(default)]
    pub earliest_block_height: Option<u64>,
}

/// Node version information.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeVersion {
    /// Version string.
    pub version: String,
    /// Build string.
    pub build: String,
}
