//! Action normalization.
//!
//! Actions reach the explorer in two shapes:
//!
//! - RPC views: a bare kind name (`"CreateAccount"`) or a single-key object
//!   keyed by kind (`{"Transfer": {"deposit": "1"}}`).
//! - Indexer rows: `{"action_kind": "FUNCTION_CALL", "args": {...}}`.
//!
//! [`RawAction`] keeps the source apart, [`RawAction::normalize`] maps both into
//! one [`Action`] with a consistent [`ActionKind`] and `args` object. Kinds this
//! crate does not know pass through unchanged as [`ActionKind::Other`].
//!
//! ```
//! use near_explorer::{ActionKind, RawAction};
//!
//! let raw: RawAction = serde_json::from_value(serde_json::json!({
//!     "FunctionCall": {
//!         "method_name": "ft_transfer",
//!         "args": "e30=",
//!         "gas": 30000000000000u64,
//!         "deposit": "1"
//!     }
//! })).unwrap();
//!
//! let action = raw.normalize();
//! assert_eq!(action.kind, ActionKind::FunctionCall);
//! assert_eq!(action.method_name(), Some("ft_transfer"));
//! ```

use std::fmt;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize, Serializer};

use crate::types::NearToken;

/// An action as received from a data source.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawAction {
    /// Indexer API row.
    Indexer {
        action_kind: String,
        #[serde(default)]
        args: serde_json::Value,
    },
    /// RPC action view.
    Rpc(serde_json::Value),
}

/// The kind of a normalized action.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionKind {
    CreateAccount,
    DeployContract,
    FunctionCall,
    Transfer,
    Stake,
    AddKey,
    DeleteKey,
    DeleteAccount,
    Delegate,
    DeployGlobalContract,
    DeployGlobalContractByAccountId,
    UseGlobalContract,
    UseGlobalContractByAccountId,
    DeterministicStateInit,
    /// A kind this crate does not know, with its name as received.
    Other(String),
}

impl ActionKind {
    /// Resolve a kind from either the RPC (`FunctionCall`) or the indexer
    /// (`FUNCTION_CALL`) spelling.
    pub fn from_name(name: &str) -> Self {
        let key: String = name
            .chars()
            .filter(|c| *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match key.as_str() {
            "createaccount" => Self::CreateAccount,
            "deploycontract" => Self::DeployContract,
            "functioncall" => Self::FunctionCall,
            "transfer" => Self::Transfer,
            "stake" => Self::Stake,
            "addkey" => Self::AddKey,
            "deletekey" => Self::DeleteKey,
            "deleteaccount" => Self::DeleteAccount,
            "delegate" | "delegateaction" => Self::Delegate,
            "deployglobalcontract" => Self::DeployGlobalContract,
            "deployglobalcontractbyaccountid" => Self::DeployGlobalContractByAccountId,
            "useglobalcontract" => Self::UseGlobalContract,
            "useglobalcontractbyaccountid" => Self::UseGlobalContractByAccountId,
            "deterministicstateinit" => Self::DeterministicStateInit,
            _ => Self::Other(name.to_string()),
        }
    }

    /// The RPC spelling of this kind.
    pub fn as_str(&self) -> &str {
        match self {
            Self::CreateAccount => "CreateAccount",
            Self::DeployContract => "DeployContract",
            Self::FunctionCall => "FunctionCall",
            Self::Transfer => "Transfer",
            Self::Stake => "Stake",
            Self::AddKey => "AddKey",
            Self::DeleteKey => "DeleteKey",
            Self::DeleteAccount => "DeleteAccount",
            Self::Delegate => "Delegate",
            Self::DeployGlobalContract => "DeployGlobalContract",
            Self::DeployGlobalContractByAccountId => "DeployGlobalContractByAccountId",
            Self::UseGlobalContract => "UseGlobalContract",
            Self::UseGlobalContractByAccountId => "UseGlobalContractByAccountId",
            Self::DeterministicStateInit => "DeterministicStateInit",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ActionKind {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

/// A normalized action: one kind, one `args` object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Action {
    pub kind: ActionKind,
    pub args: serde_json::Value,
}

impl RawAction {
    /// Map into the uniform [`Action`] shape.
    pub fn normalize(&self) -> Action {
        match self {
            RawAction::Indexer { action_kind, args } => {
                let kind = ActionKind::from_name(action_kind);
                let mut args = non_null(args.clone());
                // Indexers name the base64 payload `args_base64`; RPC calls it `args`.
                if kind == ActionKind::FunctionCall {
                    if let Some(map) = args.as_object_mut() {
                        if !map.contains_key("args") {
                            if let Some(payload) = map.remove("args_base64") {
                                map.insert("args".to_string(), payload);
                            }
                        }
                    }
                }
                Action { kind, args }
            }
            RawAction::Rpc(value) => normalize_rpc(value),
        }
    }
}

fn normalize_rpc(value: &serde_json::Value) -> Action {
    match value {
        serde_json::Value::String(name) => {
            return Action {
                kind: ActionKind::from_name(name),
                args: empty_args(),
            };
        }
        serde_json::Value::Object(map) if map.len() == 1 => {
            if let Some((name, args)) = map.iter().next() {
                return Action {
                    kind: ActionKind::from_name(name),
                    args: non_null(args.clone()),
                };
            }
        }
        _ => {}
    }
    Action {
        kind: ActionKind::Other("Unknown".to_string()),
        args: value.clone(),
    }
}

impl From<serde_json::Value> for RawAction {
    fn from(value: serde_json::Value) -> Self {
        match &value {
            serde_json::Value::Object(map) => match map.get("action_kind") {
                Some(serde_json::Value::String(kind)) => RawAction::Indexer {
                    action_kind: kind.clone(),
                    args: map.get("args").cloned().unwrap_or_default(),
                },
                _ => RawAction::Rpc(value),
            },
            _ => RawAction::Rpc(value),
        }
    }
}

/// Normalize a list of actions, preserving order.
pub fn normalize_actions(raw: &[RawAction]) -> Vec<Action> {
    raw.iter().map(RawAction::normalize).collect()
}

fn empty_args() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

fn non_null(value: serde_json::Value) -> serde_json::Value {
    if value.is_null() { empty_args() } else { value }
}

fn amount_field(args: &serde_json::Value, field: &str) -> Option<NearToken> {
    let value = args.get(field)?;
    serde_json::from_value(value.clone()).ok()
}

impl Action {
    /// Deposit attached to a transfer or function call.
    pub fn deposit(&self) -> NearToken {
        match self.kind {
            ActionKind::Transfer | ActionKind::FunctionCall => {
                amount_field(&self.args, "deposit").unwrap_or_default()
            }
            _ => NearToken::ZERO,
        }
    }

    /// Amount staked by a stake action.
    pub fn stake(&self) -> Option<NearToken> {
        match self.kind {
            ActionKind::Stake => amount_field(&self.args, "stake"),
            _ => None,
        }
    }

    /// Method name of a function call.
    pub fn method_name(&self) -> Option<&str> {
        match self.kind {
            ActionKind::FunctionCall => self.args.get("method_name")?.as_str(),
            _ => None,
        }
    }

    /// Function-call arguments decoded into JSON.
    ///
    /// Returns `None` for other kinds and for payloads that are not JSON
    /// (e.g. borsh-encoded arguments).
    pub fn decoded_args(&self) -> Option<serde_json::Value> {
        if self.kind != ActionKind::FunctionCall {
            return None;
        }
        if let Some(json) = self.args.get("args_json") {
            if !json.is_null() {
                return Some(json.clone());
            }
        }
        let encoded = self.args.get("args")?.as_str()?;
        let bytes = STANDARD.decode(encoded).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    /// Inner actions of a meta transaction.
    pub fn delegate_actions(&self) -> Vec<Action> {
        if self.kind != ActionKind::Delegate {
            return Vec::new();
        }
        self.args
            .get("delegate_action")
            .and_then(|d| d.get("actions"))
            .and_then(|a| a.as_array())
            .map(|actions| {
                actions
                    .iter()
                    .cloned()
                    .map(|a| RawAction::from(a).normalize())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ActionKind::FunctionCall => {
                write!(f, "FunctionCall {}", self.method_name().unwrap_or("?"))?;
                let deposit = self.deposit();
                if !deposit.is_zero() {
                    write!(f, " ({})", deposit)?;
                }
                Ok(())
            }
            ActionKind::Transfer => write!(f, "Transfer {}", self.deposit()),
            ActionKind::Stake => match self.stake() {
                Some(stake) => write!(f, "Stake {}", stake),
                None => f.write_str("Stake"),
            },
            ActionKind::DeleteAccount => match self
                .args
                .get("beneficiary_id")
                .and_then(|b| b.as_str())
            {
                Some(beneficiary) => write!(f, "DeleteAccount -> {}", beneficiary),
                None => f.write_str("DeleteAccount"),
            },
            ActionKind::AddKey | ActionKind::DeleteKey => {
                match self.args.get("public_key").and_then(|k| k.as_str()) {
                    Some(key) => write!(f, "{} {}", self.kind, key),
                    None => write!(f, "{}", self.kind),
                }
            }
            ActionKind::Delegate => {
                write!(f, "Delegate [{} actions]", self.delegate_actions().len())
            }
            kind => write!(f, "{}", kind),
        }
    }
}
