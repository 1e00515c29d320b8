//! The explorer facade.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};

use super::fallback::FallbackClient;
use super::rpc::RetryConfig;
use crate::error::{Error, RpcError, StoreError};
use crate::provider::{
    FileStore, MemoryStore, ProviderSelector, RpcProvider, SelectionStore, default_providers,
};
use crate::tree::{ReceiptTreeState, TransactionTree, Traversal};
use crate::types::{
    AccountId, BlockReference, BlockView, CryptoHash, FinalExecutionOutcome, Network,
    StatusResponse, TxExecutionStatus,
};

/// JSON-RPC "method not found".
const METHOD_NOT_FOUND: i64 = -32601;

/// Read-only entry point for transaction views.
///
/// Configured once with a network, its providers and where to remember the
/// selected provider. Every call goes through provider fallback.
///
/// # Example
///
/// ```rust,no_run
/// use near_explorer::*;
///
/// #[tokio::main]
/// async fn main() -> Result<(), near_explorer::Error> {
///     let explorer = Explorer::testnet().build()?;
///     let hash: CryptoHash = "9FtHUFBQsZ2MG77K3x3MJ9wjX3UT8zE1TczCrhZEcG8U".parse()?;
///
///     let tree = explorer.receipt_tree(&hash, "alice.testnet").await?;
///     println!("{tree}");
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Explorer {
    rpc: Arc<FallbackClient>,
    network: Network,
    wait_until: TxExecutionStatus,
}

impl Explorer {
    /// Create a builder for mainnet.
    pub fn mainnet() -> ExplorerBuilder {
        ExplorerBuilder::new(Network::Mainnet, default_providers(Network::Mainnet))
    }

    /// Create a builder for testnet.
    pub fn testnet() -> ExplorerBuilder {
        ExplorerBuilder::new(Network::Testnet, default_providers(Network::Testnet))
    }

    /// Create a builder for a custom network with one RPC URL.
    ///
    /// Add more with [`ExplorerBuilder::provider`].
    pub fn custom(rpc_url: impl Into<String>) -> ExplorerBuilder {
        ExplorerBuilder::new(Network::Custom, vec![RpcProvider::from_url(rpc_url)])
    }

    /// Create a builder from a network setting: `mainnet`, `testnet`, or the
    /// URL of a custom RPC node.
    pub fn for_network(setting: &str) -> Result<ExplorerBuilder, Error> {
        if setting.contains("://") {
            return Ok(Explorer::custom(setting));
        }
        match setting.parse::<Network>().map_err(Error::Config)? {
            Network::Mainnet => Ok(Explorer::mainnet()),
            Network::Testnet => Ok(Explorer::testnet()),
            Network::Custom => Err(Error::Config(
                "a custom network is given by its RPC URL".to_string(),
            )),
        }
    }

    /// Create an explorer from environment variables.
    ///
    /// - `NEAR_NETWORK` (optional): `"mainnet"`, `"testnet"`, or a custom RPC
    ///   URL. Defaults to `"mainnet"`.
    /// - `NEAR_RPC_URLS` (optional): comma-separated provider URLs replacing
    ///   the network's built-in list.
    /// - `NEAR_EXPLORER_STATE` (optional): file remembering the selected
    ///   provider. Without it the selection lives in memory.
    pub fn from_env() -> Result<Explorer, Error> {
        let network = std::env::var("NEAR_NETWORK").ok();
        let urls = std::env::var("NEAR_RPC_URLS").ok();
        let state = std::env::var("NEAR_EXPLORER_STATE").ok();

        let mut builder = match network.as_deref() {
            Some(setting) => Explorer::for_network(setting)?,
            None => Explorer::mainnet(),
        };

        if let Some(urls) = urls {
            let providers: Vec<RpcProvider> = urls
                .split(',')
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(RpcProvider::from_url)
                .collect();
            if providers.is_empty() {
                return Err(Error::Config("NEAR_RPC_URLS is set but empty".into()));
            }
            builder = builder.providers(providers);
        }

        if let Some(path) = state {
            builder = builder.state_file(path);
        }

        builder.build()
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// The fallback client all calls go through.
    pub fn rpc(&self) -> &FallbackClient {
        &self.rpc
    }

    pub fn providers(&self) -> &[RpcProvider] {
        self.rpc.selector().providers()
    }

    pub fn selected_provider(&self) -> &RpcProvider {
        self.rpc.selected()
    }

    /// Choose a provider explicitly (persisted like a fallback switch).
    pub fn select_provider(&self, index: usize) -> Result<(), Error> {
        self.rpc.selector().select(index)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Node status of the selected provider.
    pub async fn status(&self) -> Result<StatusResponse, Error> {
        self.rpc.run(|rpc| rpc.status()).await
    }

    pub async fn block(&self, block: impl Into<BlockReference>) -> Result<BlockView, Error> {
        let block = block.into();
        self.rpc.run(|rpc| rpc.block(block.clone())).await
    }

    /// Full transaction status, receipts included.
    ///
    /// Providers without `EXPERIMENTAL_tx_status` are asked with `tx`; the
    /// tree builder then reconstructs the root receipt from the transaction.
    pub async fn transaction_status(
        &self,
        tx_hash: &CryptoHash,
        signer_id: impl AsRef<str>,
    ) -> Result<FinalExecutionOutcome, Error> {
        let signer_id = AccountId::new(signer_id.as_ref())?;
        let wait_until = self.wait_until;

        self.rpc
            .run(|rpc| {
                let signer_id = &signer_id;
                async move {
                    match rpc.tx_status(tx_hash, signer_id, wait_until).await {
                        Err(RpcError::Rpc {
                            code: METHOD_NOT_FOUND,
                            ..
                        }) => {
                            debug!(provider = %rpc.url(), "EXPERIMENTAL_tx_status unsupported, using tx");
                            rpc.tx(tx_hash, signer_id, wait_until).await
                        }
                        other => other,
                    }
                }
            })
            .await
    }

    /// Fetch a transaction and build its full receipt tree.
    pub async fn receipt_tree(
        &self,
        tx_hash: &CryptoHash,
        signer_id: impl AsRef<str>,
    ) -> Result<TransactionTree, Error> {
        self.receipt_tree_with(tx_hash, signer_id, Traversal::Eager)
            .await
    }

    pub async fn receipt_tree_with(
        &self,
        tx_hash: &CryptoHash,
        signer_id: impl AsRef<str>,
        traversal: Traversal,
    ) -> Result<TransactionTree, Error> {
        let outcome = self.transaction_status(tx_hash, signer_id).await?;
        Ok(TransactionTree::build(&outcome, traversal)?)
    }

    /// Like [`receipt_tree`](Self::receipt_tree), with every failure folded
    /// into [`ReceiptTreeState::Unavailable`].
    pub async fn receipt_tree_state(
        &self,
        tx_hash: &CryptoHash,
        signer_id: impl AsRef<str>,
    ) -> ReceiptTreeState {
        let result = self.receipt_tree(tx_hash, signer_id).await;
        if let Err(e) = &result {
            debug!(tx_hash = %tx_hash, error = %e, "receipt tree unavailable");
        }
        result.into()
    }
}

impl std::fmt::Debug for Explorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Explorer")
            .field("network", &self.network)
            .field("rpc", &self.rpc)
            .finish()
    }
}

/// Builder for creating an [`Explorer`].
pub struct ExplorerBuilder {
    network: Network,
    providers: Vec<RpcProvider>,
    retry_config: RetryConfig,
    store: Option<Arc<dyn SelectionStore>>,
    wait_until: TxExecutionStatus,
}

impl ExplorerBuilder {
    fn new(network: Network, providers: Vec<RpcProvider>) -> Self {
        Self {
            network,
            providers,
            retry_config: RetryConfig::default(),
            store: None,
            wait_until: TxExecutionStatus::default(),
        }
    }

    /// Append a provider to the list.
    pub fn provider(mut self, provider: RpcProvider) -> Self {
        self.providers.push(provider);
        self
    }

    /// Replace the provider list.
    pub fn providers(mut self, providers: Vec<RpcProvider>) -> Self {
        self.providers = providers;
        self
    }

    /// Set the per-provider retry configuration.
    pub fn retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    /// Remember the selected provider with a custom store.
    pub fn store(mut self, store: Arc<dyn SelectionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Remember the selected provider in a JSON file.
    pub fn state_file(self, path: impl Into<PathBuf>) -> Self {
        self.store(Arc::new(FileStore::new(path)))
    }

    /// Remember the selected provider under the user's config directory.
    pub fn persist(self) -> Result<Self, Error> {
        let store = FileStore::default_for(self.network)?;
        Ok(self.store(Arc::new(store)))
    }

    /// Like [`persist`](Self::persist), but keeps the selection in memory for
    /// this process when there is no config directory.
    pub fn persist_or_memory(self) -> Self {
        let store = FileStore::default_for(self.network);
        self.file_store_or_memory(store)
    }

    fn file_store_or_memory(self, store: Result<FileStore, StoreError>) -> Self {
        match store {
            Ok(store) => self.store(Arc::new(store)),
            Err(e) => {
                warn!(error = %e, "provider selection will not be remembered");
                self.store(Arc::new(MemoryStore::new()))
            }
        }
    }

    /// Execution level transaction lookups wait for.
    pub fn wait_until(mut self, status: TxExecutionStatus) -> Self {
        self.wait_until = status;
        self
    }

    /// Build the explorer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the provider list is empty.
    pub fn build(self) -> Result<Explorer, Error> {
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()));
        let selector = ProviderSelector::new(self.network, self.providers, store)?;

        Ok(Explorer {
            rpc: Arc::new(FallbackClient::new(Arc::new(selector), self.retry_config)),
            network: self.network,
            wait_until: self.wait_until,
        })
    }
}
