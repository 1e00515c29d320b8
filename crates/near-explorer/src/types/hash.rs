use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::error::ParseHashError;

/// Id of a transaction, receipt or block: 32 bytes, base58 on the wire.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct CryptoHash([u8; 32]);

impl CryptoHash {
    pub const ZERO: Self = Self([0; 32]);

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl FromStr for CryptoHash {
    type Err = ParseHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| ParseHashError::InvalidBase58(e.to_string()))?;
        let len = bytes.len();
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ParseHashError::InvalidLength(len))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for CryptoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(&self.0).into_string())
    }
}

impl fmt::Debug for CryptoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CryptoHash({self})")
    }
}

impl Serialize for CryptoHash {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CryptoHash {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        String::deserialize(d)?.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_id_from_rpc() {
        let id: CryptoHash = "9pBigwAoNur7yAr4Rvy4WRg3fp1gm1nNhv2QVRXsBGWB".parse().unwrap();
        assert_eq!(id.to_string(), "9pBigwAoNur7yAr4Rvy4WRg3fp1gm1nNhv2QVRXsBGWB");
        assert_eq!(CryptoHash::ZERO.to_string(), "11111111111111111111111111111111");
    }

    #[test]
    fn test_invalid_length() {
        let short = bs58::encode([1u8; 5]).into_string();
        assert_eq!(
            short.parse::<CryptoHash>(),
            Err(ParseHashError::InvalidLength(5))
        );
    }

    #[test]
    fn test_invalid_base58() {
        assert!(matches!(
            "0OIl".parse::<CryptoHash>(),
            Err(ParseHashError::InvalidBase58(_))
        ));
    }

    #[test]
    fn test_json_string() {
        let hash = CryptoHash::from_bytes([9u8; 32]);
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{hash}\""));
        assert_eq!(serde_json::from_str::<CryptoHash>(&json).unwrap(), hash);
        assert!(serde_json::from_str::<CryptoHash>("42").is_err());
    }
}
