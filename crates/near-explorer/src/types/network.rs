use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The chain the explorer reads from.
///
/// Picks the built-in provider list and namespaces the persisted provider
/// choice, so a testnet selection is never applied to mainnet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
    /// User-supplied providers only.
    Custom,
}

impl Network {
    /// File name the provider selection is saved under.
    pub fn selection_file_name(&self) -> String {
        format!("{self}-provider.json")
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Custom => "custom",
        })
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "custom" => Ok(Network::Custom),
            other => Err(format!(
                "invalid network '{other}': expected 'mainnet', 'testnet' or 'custom'"
            )),
        }
    }
}
