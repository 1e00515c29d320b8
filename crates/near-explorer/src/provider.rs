//! RPC provider selection.
//!
//! The explorer reads from one of a fixed list of RPC providers. The selected
//! index is shared by every request, survives restarts through a
//! [`SelectionStore`], and moves to the next provider (wrapping) when the
//! current one fails.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use near_explorer::provider::{MemoryStore, ProviderSelector, mainnet_providers};
//! use near_explorer::Network;
//!
//! let selector = ProviderSelector::new(
//!     Network::Mainnet,
//!     mainnet_providers(),
//!     Arc::new(MemoryStore::new()),
//! ).unwrap();
//!
//! let first = selector.selected_index();
//! selector.advance(first);
//! assert_eq!(selector.selected_index(), first + 1);
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, StoreError};
use crate::types::Network;

// ============================================================================
// Providers
// ============================================================================

/// A JSON-RPC endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcProvider {
    /// Display name.
    pub name: String,
    pub url: String,
}

impl RpcProvider {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// A provider named after its URL's host.
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        let name = url
            .split("://")
            .nth(1)
            .unwrap_or(&url)
            .split(['/', ':'])
            .next()
            .unwrap_or(&url)
            .to_string();
        Self { name, url }
    }
}

/// Public mainnet providers.
pub fn mainnet_providers() -> Vec<RpcProvider> {
    vec![
        RpcProvider::new("FastNEAR", "https://free.rpc.fastnear.com"),
        RpcProvider::new("NEAR", "https://rpc.mainnet.near.org"),
        RpcProvider::new("Lava", "https://near.lava.build"),
        RpcProvider::new("dRPC", "https://near.drpc.org"),
    ]
}

/// Public testnet providers.
pub fn testnet_providers() -> Vec<RpcProvider> {
    vec![
        RpcProvider::new("FastNEAR", "https://test.rpc.fastnear.com"),
        RpcProvider::new("NEAR", "https://rpc.testnet.near.org"),
        RpcProvider::new("Lava", "https://neart.lava.build"),
        RpcProvider::new("dRPC", "https://near-testnet.drpc.org"),
    ]
}

/// Built-in providers for a network (empty for [`Network::Custom`]).
pub fn default_providers(network: Network) -> Vec<RpcProvider> {
    match network {
        Network::Mainnet => mainnet_providers(),
        Network::Testnet => testnet_providers(),
        Network::Custom => Vec::new(),
    }
}

// ============================================================================
// Selection persistence
// ============================================================================

/// A persisted provider choice.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub network: Network,
    pub selected: usize,
    /// URL at `selected` when saved, used to re-locate it if the list changes.
    pub url: String,
}

/// Where the selected provider is remembered between runs.
///
/// Writes are not coordinated; the last one wins.
pub trait SelectionStore: Send + Sync {
    fn load(&self, network: Network) -> Result<Option<Selection>, StoreError>;

    fn save(&self, selection: &Selection) -> Result<(), StoreError>;
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    selections: Mutex<HashMap<Network, Selection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SelectionStore for MemoryStore {
    fn load(&self, network: Network) -> Result<Option<Selection>, StoreError> {
        let selections = self.selections.lock().unwrap_or_else(|e| e.into_inner());
        Ok(selections.get(&network).cloned())
    }

    fn save(&self, selection: &Selection) -> Result<(), StoreError> {
        let mut selections = self.selections.lock().unwrap_or_else(|e| e.into_inner());
        selections.insert(selection.network, selection.clone());
        Ok(())
    }
}

/// JSON file store.
///
/// The file holds a single [`Selection`]; a selection saved for another
/// network is ignored on load.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store under the user's config directory:
    /// `{config_dir}/near-explorer/{network}-provider.json`.
    pub fn default_for(network: Network) -> Result<Self, StoreError> {
        let dir = dirs::config_dir().ok_or_else(|| {
            StoreError::PathError("Could not determine config directory".to_string())
        })?;
        Ok(Self::new(
            dir.join("near-explorer").join(network.selection_file_name()),
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SelectionStore for FileStore {
    fn load(&self, network: Network) -> Result<Option<Selection>, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let selection: Selection = serde_json::from_str(&content)?;
        Ok((selection.network == network).then_some(selection))
    }

    fn save(&self, selection: &Selection) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(selection)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

// ============================================================================
// ProviderSelector
// ============================================================================

/// The shared "selected provider" index over a fixed provider list.
pub struct ProviderSelector {
    network: Network,
    providers: Vec<RpcProvider>,
    selected: AtomicUsize,
    store: Arc<dyn SelectionStore>,
}

impl ProviderSelector {
    /// Create a selector, restoring the stored choice.
    ///
    /// A stored index is trusted only if it still points at the stored URL;
    /// otherwise the URL is looked up in the list, and failing that the first
    /// provider is used.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `providers` is empty.
    pub fn new(
        network: Network,
        providers: Vec<RpcProvider>,
        store: Arc<dyn SelectionStore>,
    ) -> Result<Self, Error> {
        if providers.is_empty() {
            return Err(Error::Config(format!(
                "No RPC providers configured for {}",
                network
            )));
        }

        let restored = match store.load(network) {
            Ok(Some(selection)) => resolve_selection(&providers, &selection),
            Ok(None) => 0,
            Err(e) => {
                warn!(error = %e, "failed to load provider selection, using first provider");
                0
            }
        };
        debug!(
            %network,
            provider = %providers[restored].url,
            "restored provider selection"
        );

        Ok(Self {
            network,
            providers,
            selected: AtomicUsize::new(restored),
            store,
        })
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn providers(&self) -> &[RpcProvider] {
        &self.providers
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn selected_index(&self) -> usize {
        self.selected.load(Ordering::SeqCst)
    }

    pub fn selected(&self) -> &RpcProvider {
        &self.providers[self.selected_index()]
    }

    /// Choose a provider explicitly.
    pub fn select(&self, index: usize) -> Result<(), Error> {
        if index >= self.providers.len() {
            return Err(Error::Config(format!(
                "Provider index {} out of range (have {})",
                index,
                self.providers.len()
            )));
        }
        self.selected.store(index, Ordering::SeqCst);
        info!(provider = %self.providers[index].url, "selected RPC provider");
        self.persist(index);
        Ok(())
    }

    /// Move past a provider that just failed and return the new index.
    ///
    /// `failed` is the index the caller used. If another caller already moved
    /// the selection away from it, the current selection is kept.
    pub fn advance(&self, failed: usize) -> usize {
        let next = (failed + 1) % self.providers.len();
        match self
            .selected
            .compare_exchange(failed, next, Ordering::SeqCst, Ordering::SeqCst)
        {
            Ok(_) => {
                warn!(
                    from = %self.providers[failed].url,
                    to = %self.providers[next].url,
                    "switching RPC provider"
                );
                self.persist(next);
                next
            }
            Err(current) => current,
        }
    }

    fn persist(&self, index: usize) {
        let selection = Selection {
            network: self.network,
            selected: index,
            url: self.providers[index].url.clone(),
        };
        if let Err(e) = self.store.save(&selection) {
            warn!(error = %e, "failed to save provider selection");
        }
    }
}

impl std::fmt::Debug for ProviderSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSelector")
            .field("network", &self.network)
            .field("providers", &self.providers)
            .field("selected", &self.selected_index())
            .finish()
    }
}

fn resolve_selection(providers: &[RpcProvider], selection: &Selection) -> usize {
    if providers
        .get(selection.selected)
        .is_some_and(|p| p.url == selection.url)
    {
        return selection.selected;
    }
    providers
        .iter()
        .position(|p| p.url == selection.url)
        .unwrap_or(0)
}
