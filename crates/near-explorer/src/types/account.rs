use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseAccountIdError;

/// Predecessor of gas refund receipts.
pub const SYSTEM_ACCOUNT: &str = "system";

/// A NEAR account id.
///
/// Ids typed by a user (the signer of a looked-up transaction) are validated
/// by [`AccountId::new`]. Ids inside RPC responses are taken as received.
///
/// ```
/// use near_explorer::AccountId;
///
/// assert!("usdt.tether-token.near".parse::<AccountId>().is_ok());
/// assert!("Alice.near".parse::<AccountId>().is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(s: impl Into<String>) -> Result<Self, ParseAccountIdError> {
        let s = s.into();
        validate(&s)?;
        Ok(Self(s))
    }

    pub fn is_system(&self) -> bool {
        self.0 == SYSTEM_ACCOUNT
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn validate(s: &str) -> Result<(), ParseAccountIdError> {
    match s.len() {
        0 => return Err(ParseAccountIdError::Empty),
        65.. => return Err(ParseAccountIdError::TooLong(s.to_string())),
        _ => {}
    }

    // 0x-prefixed Ethereum-style implicit accounts.
    if let Some(hex) = s.strip_prefix("0x") {
        return match hex.chars().find(|c| !c.is_ascii_hexdigit()) {
            Some(c) => Err(ParseAccountIdError::InvalidChar(s.to_string(), c)),
            None if hex.len() == 40 => Ok(()),
            None => Err(ParseAccountIdError::InvalidFormat(s.to_string())),
        };
    }

    // 64 hex chars: an implicit account named by its public key.
    if s.len() == 64 && s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Ok(());
    }

    if s.len() < 2 {
        return Err(ParseAccountIdError::TooShort(s.to_string()));
    }
    if let Some(c) = s
        .chars()
        .find(|c| !matches!(c, 'a'..='z' | '0'..='9' | '_' | '-' | '.'))
    {
        return Err(ParseAccountIdError::InvalidChar(s.to_string(), c));
    }
    if s.split('.').any(|part| !is_valid_part(part)) {
        return Err(ParseAccountIdError::InvalidFormat(s.to_string()));
    }
    Ok(())
}

/// A dot-separated part: non-empty, separators only between alphanumerics.
fn is_valid_part(part: &str) -> bool {
    let bytes = part.as_bytes();
    match (bytes.first(), bytes.last()) {
        (Some(first), Some(last)) => {
            first.is_ascii_alphanumeric()
                && last.is_ascii_alphanumeric()
                && !bytes
                    .windows(2)
                    .any(|w| matches!(w, [b'-' | b'_', b'-' | b'_']))
        }
        _ => false,
    }
}

impl FromStr for AccountId {
    type Err = ParseAccountIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AccountId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
