//! Error types for near-explorer.
//!
//! # Error Hierarchy
//!
//! - [`Error`](enum@Error) - Main error type, returned by the [`Explorer`](crate::Explorer) facade
//!   - [`RpcError`] - RPC-specific errors (network, unknown transaction, etc.)
//!   - [`TreeError`] - Receipt tree construction failures
//!   - [`ParseAccountIdError`] - Invalid account ID format
//!   - [`ParseHashError`] - Invalid base58 hash
//!   - [`StoreError`] - Provider selection persistence failures
//!
//! Missing receipts are never errors: the tree builder renders them as
//! placeholder nodes. Transport failures trigger provider fallback before they
//! surface as [`Error::AllProvidersFailed`].
//!
//! ```rust,no_run
//! use near_explorer::*;
//!
//! # async fn example() -> Result<(), Error> {
//! let explorer = Explorer::mainnet().build()?;
//! let hash: CryptoHash = "9FtHUFBQsZ2MG77K3x3MJ9wjX3UT8zE1TczCrhZEcG8U".parse()?;
//!
//! match explorer.receipt_tree(&hash, "alice.near").await {
//!     Ok(tree) => println!("{} receipts", tree.node_count()),
//!     Err(Error::AllProvidersFailed { last, .. }) => {
//!         println!("Unable to locate transaction, try a different RPC ({last})");
//!     }
//!     Err(e) => return Err(e),
//! }
//! # Ok(())
//! # }
//! ```

use thiserror::Error;

use crate::types::CryptoHash;

/// Error parsing an account ID.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseAccountIdError {
    #[error("Account ID is empty")]
    Empty,

    #[error("Account ID '{0}' is too long (max 64 characters)")]
    TooLong(String),

    #[error("Account ID '{0}' is too short (min 2 characters for named accounts)")]
    TooShort(String),

    #[error("Account ID '{0}' contains invalid character '{1}'")]
    InvalidChar(String, char),

    #[error("Account ID '{0}' has invalid format")]
    InvalidFormat(String),
}

/// Error parsing a crypto hash.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseHashError {
    #[error("Invalid base58 encoding: {0}")]
    InvalidBase58(String),

    #[error("Invalid hash length: expected 32 bytes, got {0}")]
    InvalidLength(usize),
}

/// Error reading or writing the selected-provider state.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Path error: {0}")]
    PathError(String),
}

/// Error building a receipt tree.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("Transaction has no receipt outcomes")]
    NoReceipts,

    #[error("Transaction {0} is still pending")]
    Pending(CryptoHash),
}

// ============================================================================
// RPC Errors
// ============================================================================

/// RPC-specific errors.
#[derive(Debug, Error)]
pub enum RpcError {
    // ─── Network/Transport ───
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Network error: {message}")]
    Network {
        message: String,
        status_code: Option<u16>,
        retryable: bool,
    },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    // ─── Generic RPC Error ───
    #[error("RPC error: {message} (code: {code})")]
    Rpc {
        code: i64,
        message: String,
        data: Option<serde_json::Value>,
    },

    // ─── Lookup Errors ───
    #[error("Transaction not found: {0}. The provider may not be archival, try a different RPC.")]
    UnknownTransaction(String),

    #[error("Block not found: {0}. It may have been garbage-collected. Try an archival node for blocks older than 5 epochs.")]
    UnknownBlock(String),

    #[error("Receipt not found: {0}")]
    UnknownReceipt(String),

    #[error("Invalid account ID: {0}")]
    InvalidAccount(String),

    // ─── Node Errors ───
    #[error("Shard unavailable: {0}")]
    ShardUnavailable(String),

    #[error("Node not synced: {0}")]
    NodeNotSynced(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    // ─── Request Errors ───
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Request timeout: {message}")]
    RequestTimeout {
        message: String,
        transaction_hash: Option<String>,
    },
}

impl RpcError {
    /// Check if this error is retryable against the same provider.
    pub fn is_retryable(&self) -> bool {
        match self {
            RpcError::Http(e) => e.is_timeout() || e.is_connect(),
            RpcError::Network { retryable, .. } => *retryable,
            RpcError::ShardUnavailable(_) => true,
            RpcError::NodeNotSynced(_) => true,
            RpcError::InternalError(_) => true,
            RpcError::RequestTimeout { .. } => true,
            RpcError::Rpc { code, .. } => {
                // Retry on server errors
                *code == -32000 || *code == -32603
            }
            _ => false,
        }
    }

    /// Check if this error should move the call to the next provider.
    ///
    /// Transport failures, malformed responses and unhealthy nodes qualify, as
    /// does an unknown transaction since the provider may have pruned it.
    pub fn should_fallback(&self) -> bool {
        match self {
            RpcError::Http(_)
            | RpcError::Network { .. }
            | RpcError::Json(_)
            | RpcError::InvalidResponse(_)
            | RpcError::UnknownTransaction(_)
            | RpcError::ShardUnavailable(_)
            | RpcError::NodeNotSynced(_)
            | RpcError::InternalError(_)
            | RpcError::RequestTimeout { .. } => true,
            RpcError::Rpc { .. } => self.is_retryable(),
            _ => false,
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>, status_code: Option<u16>, retryable: bool) -> Self {
        RpcError::Network {
            message: message.into(),
            status_code,
            retryable,
        }
    }

    /// Returns true if the transaction could not be located.
    pub fn is_unknown_transaction(&self) -> bool {
        matches!(self, RpcError::UnknownTransaction(_))
    }
}

// ============================================================================
// Main Error Type
// ============================================================================

/// Main error type for near-explorer operations.
#[derive(Debug, Error)]
pub enum Error {
    // ─── Configuration ───
    #[error("Invalid configuration: {0}")]
    Config(String),

    // ─── Parsing ───
    #[error(transparent)]
    ParseAccountId(#[from] ParseAccountIdError),

    #[error(transparent)]
    ParseHash(#[from] ParseHashError),

    // ─── RPC ───
    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error("Unable to locate transaction, try a different RPC. All {attempts} providers failed, last error: {last}")]
    AllProvidersFailed { attempts: usize, last: RpcError },

    // ─── Receipt tree ───
    #[error(transparent)]
    Tree(#[from] TreeError),

    // ─── Provider state ───
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_account_id_error_display() {
        assert_eq!(
            ParseAccountIdError::Empty.to_string(),
            "Account ID is empty"
        );
        assert_eq!(
            ParseAccountIdError::InvalidChar("test@acc".to_string(), '@').to_string(),
            "Account ID 'test@acc' contains invalid character '@'"
        );
    }

    #[test]
    fn test_parse_hash_error_display() {
        assert_eq!(
            ParseHashError::InvalidLength(5).to_string(),
            "Invalid hash length: expected 32 bytes, got 5"
        );
    }

    #[test]
    fn test_tree_error_display() {
        assert_eq!(
            TreeError::NoReceipts.to_string(),
            "Transaction has no receipt outcomes"
        );
    }

    // ========================================================================
    // RpcError classification
    // ========================================================================

    #[test]
    fn test_retryable_errors() {
        assert!(
            RpcError::RequestTimeout {
                message: "timeout".into(),
                transaction_hash: None,
            }
            .is_retryable()
        );
        assert!(RpcError::NodeNotSynced("x".into()).is_retryable());
        assert!(RpcError::network("HTTP 503", Some(503), true).is_retryable());
        assert!(!RpcError::network("HTTP 400", Some(400), false).is_retryable());
        assert!(!RpcError::UnknownTransaction("abc".into()).is_retryable());
        assert!(!RpcError::InvalidResponse("missing".into()).is_retryable());
    }

    #[test]
    fn test_fallback_errors() {
        assert!(RpcError::UnknownTransaction("abc".into()).should_fallback());
        assert!(RpcError::InvalidResponse("missing".into()).should_fallback());
        assert!(RpcError::network("HTTP 400", Some(400), false).should_fallback());
        assert!(RpcError::ShardUnavailable("shard 3".into()).should_fallback());

        assert!(!RpcError::InvalidAccount("A@B".into()).should_fallback());
        assert!(!RpcError::UnknownBlock("1".into()).should_fallback());
        assert!(
            !RpcError::Rpc {
                code: -32600,
                message: "Invalid request".into(),
                data: None,
            }
            .should_fallback()
        );
    }

    #[test]
    fn test_all_providers_failed_display() {
        let err = Error::AllProvidersFailed {
            attempts: 2,
            last: RpcError::UnknownTransaction("abc".into()),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Unable to locate transaction"));
        assert!(msg.contains("2 providers"));
    }
}
