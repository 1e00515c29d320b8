//! Deposit and gas amounts as they appear in outcomes and action payloads.

use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

const YOCTO_PER_NEAR: u128 = 10u128.pow(24);
const GAS_PER_TGAS: u64 = 10u64.pow(12);

/// Decimals shown for token amounts.
const NEAR_DECIMALS: usize = 5;

/// RPC sends deposits as decimal strings and gas as numbers. Indexer rows
/// are not consistent about either.
fn number_or_string<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + From<u64>,
    T::Err: fmt::Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        String(String),
    }

    match Raw::deserialize(d)? {
        Raw::Number(n) => Ok(T::from(n)),
        Raw::String(s) => s.parse().map_err(de::Error::custom),
    }
}

/// Saturating `Add` and `Sum` for a newtype over an unsigned integer.
macro_rules! saturating_sum {
    ($ty:ident) => {
        impl Add for $ty {
            type Output = Self;

            fn add(self, other: Self) -> Self {
                Self(self.0.saturating_add(other.0))
            }
        }

        impl Sum for $ty {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                iter.fold(Self(0), Add::add)
            }
        }
    };
}

/// An amount of NEAR in yoctoNEAR.
///
/// ```
/// use near_explorer::NearToken;
///
/// assert_eq!(NearToken::from_near(5).to_string(), "5 NEAR");
/// assert_eq!(NearToken::from_yoctonear(1).to_string(), "<0.00001 NEAR");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct NearToken(u128);

impl NearToken {
    pub const ZERO: Self = Self(0);
    pub const ONE_NEAR: Self = Self(YOCTO_PER_NEAR);

    pub const fn from_yoctonear(yocto: u128) -> Self {
        Self(yocto)
    }

    pub const fn from_near(near: u128) -> Self {
        Self(near.saturating_mul(YOCTO_PER_NEAR))
    }

    pub const fn as_yoctonear(&self) -> u128 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

saturating_sum!(NearToken);

impl From<u64> for NearToken {
    fn from(yocto: u64) -> Self {
        Self(u128::from(yocto))
    }
}

impl FromStr for NearToken {
    type Err = std::num::ParseIntError;

    /// Parses a yoctoNEAR amount.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// Whole NEAR plus at most five decimals. Dust below that prints as
/// `<N.00001 NEAR`.
impl fmt::Display for NearToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / YOCTO_PER_NEAR;
        let fraction = self.0 % YOCTO_PER_NEAR;
        if fraction == 0 {
            return write!(f, "{whole} NEAR");
        }

        let digits = format!("{fraction:024}");
        match digits[..NEAR_DECIMALS].trim_end_matches('0') {
            "" => write!(f, "<{whole}.00001 NEAR"),
            shown => write!(f, "{whole}.{shown} NEAR"),
        }
    }
}

impl Serialize for NearToken {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for NearToken {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        number_or_string(d)
    }
}

/// Raw gas units.
///
/// ```
/// use near_explorer::Gas;
///
/// assert_eq!(Gas::from_tgas(30).to_string(), "30 Tgas");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Gas(u64);

impl Gas {
    pub const ZERO: Self = Self(0);

    pub const fn from_gas(gas: u64) -> Self {
        Self(gas)
    }

    pub const fn from_tgas(tgas: u64) -> Self {
        Self(tgas.saturating_mul(GAS_PER_TGAS))
    }

    pub const fn as_gas(&self) -> u64 {
        self.0
    }
}

saturating_sum!(Gas);

impl From<u64> for Gas {
    fn from(gas: u64) -> Self {
        Self(gas)
    }
}

impl FromStr for Gas {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// Teragas with two truncated decimals, or plain gas below one Tgas.
impl fmt::Display for Gas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < GAS_PER_TGAS {
            return write!(f, "{} gas", self.0);
        }
        let tgas = self.0 / GAS_PER_TGAS;
        match (self.0 % GAS_PER_TGAS) / (GAS_PER_TGAS / 100) {
            0 => write!(f, "{tgas} Tgas"),
            hundredths => write!(f, "{tgas}.{hundredths:02} Tgas"),
        }
    }
}

impl Serialize for Gas {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for Gas {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        number_or_string(d)
    }
}
