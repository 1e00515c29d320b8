//! Core types for reading NEAR Protocol transactions.
//!
//! Hand-rolled views of the RPC responses the explorer consumes. Fields the
//! explorer does not render are either skipped or kept as raw JSON so that
//! newer node versions do not break deserialization.

mod account;
mod hash;
mod network;
mod query;
mod rpc;
mod units;

pub use account::{AccountId, SYSTEM_ACCOUNT};
pub use hash::CryptoHash;
pub use network::Network;
pub use query::{BlockReference, Finality, TxExecutionStatus};
pub use rpc::{
    ActionReceiptData, BlockHeaderView, BlockView, ChunkHeaderView, DataReceiptData,
    ExecutionOutcome, ExecutionOutcomeWithId, ExecutionStatus, FinalExecutionOutcome,
    NodeVersion, Receipt, ReceiptContent, StatusResponse, SyncInfo,
    TransactionView,
};
pub use units::{Gas, NearToken};
