//! What a query asks the node for: which block, and how far a transaction
//! must have executed.

use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use super::CryptoHash;
use crate::error::ParseHashError;

/// Block selector for `block` queries.
///
/// Serializes to the RPC params directly: `{"finality": "final"}` or
/// `{"block_id": 123}` / `{"block_id": "<hash>"}`.
///
/// Parses from the forms a user types: `final`, `optimistic`, `near-final`, a
/// height, or a base58 block hash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlockReference {
    Latest(Finality),
    Height(u64),
    Hash(CryptoHash),
}

impl Default for BlockReference {
    fn default() -> Self {
        Self::Latest(Finality::Final)
    }
}

impl Serialize for BlockReference {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let mut map = s.serialize_map(Some(1))?;
        match self {
            Self::Latest(finality) => map.serialize_entry("finality", finality)?,
            Self::Height(height) => map.serialize_entry("block_id", height)?,
            Self::Hash(hash) => map.serialize_entry("block_id", hash)?,
        }
        map.end()
    }
}

impl FromStr for BlockReference {
    type Err = ParseHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "final" => Ok(Self::Latest(Finality::Final)),
            "optimistic" => Ok(Self::Latest(Finality::Optimistic)),
            "near-final" => Ok(Self::Latest(Finality::NearFinal)),
            _ => match s.parse::<u64>() {
                Ok(height) => Ok(Self::Height(height)),
                Err(_) => s.parse().map(Self::Hash),
            },
        }
    }
}

impl From<Finality> for BlockReference {
    fn from(f: Finality) -> Self {
        Self::Latest(f)
    }
}

impl From<u64> for BlockReference {
    fn from(height: u64) -> Self {
        Self::Height(height)
    }
}

impl From<CryptoHash> for BlockReference {
    fn from(hash: CryptoHash) -> Self {
        Self::Hash(hash)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Finality {
    Optimistic,
    NearFinal,
    #[default]
    Final,
}

/// Execution level of a transaction.
///
/// Sent as `wait_until` on transaction lookups and reported back as
/// `final_execution_status`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxExecutionStatus {
    /// Not yet seen by the node.
    None,
    Included,
    /// Executed, block not yet final. Enough for an explorer view.
    #[default]
    ExecutedOptimistic,
    IncludedFinal,
    Executed,
    /// Every non-refund receipt is in a final block.
    Final,
}

impl TxExecutionStatus {
    /// Whether receipts may still be missing because they have not run yet.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::None | Self::Included | Self::IncludedFinal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_block_reference_params() {
        let params = serde_json::to_value(BlockReference::default()).unwrap();
        assert_eq!(params, json!({ "finality": "final" }));

        let params = serde_json::to_value(BlockReference::Height(12345)).unwrap();
        assert_eq!(params, json!({ "block_id": 12345 }));

        let hash = CryptoHash::from_bytes([3u8; 32]);
        let params = serde_json::to_value(BlockReference::from(hash)).unwrap();
        assert_eq!(params, json!({ "block_id": hash.to_string() }));

        let params = serde_json::to_value(BlockReference::from(Finality::NearFinal)).unwrap();
        assert_eq!(params, json!({ "finality": "near-final" }));
    }

    #[test]
    fn test_block_reference_from_str() {
        assert_eq!(
            "optimistic".parse::<BlockReference>(),
            Ok(BlockReference::Latest(Finality::Optimistic))
        );
        assert_eq!("150000000".parse::<BlockReference>(), Ok(BlockReference::Height(150_000_000)));

        let hash = CryptoHash::from_bytes([8u8; 32]);
        assert_eq!(
            hash.to_string().parse::<BlockReference>(),
            Ok(BlockReference::Hash(hash))
        );
        assert!("latest".parse::<BlockReference>().is_err());
    }

    #[test]
    fn test_tx_execution_status() {
        assert_eq!(serde_json::to_value(TxExecutionStatus::Final).unwrap(), "FINAL");
        assert_eq!(
            serde_json::to_value(TxExecutionStatus::default()).unwrap(),
            "EXECUTED_OPTIMISTIC"
        );

        let parsed: TxExecutionStatus = serde_json::from_str("\"INCLUDED_FINAL\"").unwrap();
        assert!(parsed.is_pending());
        assert!(!TxExecutionStatus::Executed.is_pending());
    }
}
