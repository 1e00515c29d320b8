//! Provider fallback.

use std::future::Future;
use std::sync::Arc;

use tracing::{info, warn};

use super::rpc::{RetryConfig, RpcClient};
use crate::error::{Error, RpcError};
use crate::provider::{ProviderSelector, RpcProvider};

/// Runs RPC calls through the selected provider, moving down the list on
/// failure.
///
/// Each provider is tried at most once per call. Errors that are not
/// provider-specific (see [`RpcError::should_fallback`]) are returned as is.
pub struct FallbackClient {
    selector: Arc<ProviderSelector>,
    clients: Vec<RpcClient>,
}

impl FallbackClient {
    pub fn new(selector: Arc<ProviderSelector>, retry_config: RetryConfig) -> Self {
        let http = reqwest::Client::new();
        let clients = selector
            .providers()
            .iter()
            .map(|p| RpcClient::with_http_client(&p.url, http.clone(), retry_config.clone()))
            .collect();
        Self { selector, clients }
    }

    pub fn selector(&self) -> &ProviderSelector {
        &self.selector
    }

    pub fn selected(&self) -> &RpcProvider {
        self.selector.selected()
    }

    /// Client for the provider at `index`.
    pub fn client(&self, index: usize) -> Option<&RpcClient> {
        self.clients.get(index)
    }

    /// Run `f` against the selected provider, falling back through the rest.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllProvidersFailed`] with the last error once every
    /// provider has failed.
    pub async fn run<'a, F, Fut, R>(&'a self, f: F) -> Result<R, Error>
    where
        F: Fn(&'a RpcClient) -> Fut,
        Fut: Future<Output = Result<R, RpcError>>,
    {
        let mut index = self.selector.selected_index();
        let mut tried = vec![false; self.clients.len()];
        let mut attempts = 0;

        loop {
            let client = &self.clients[index];
            let error = match f(client).await {
                Ok(result) => {
                    if attempts > 0 {
                        info!(provider = %client.url(), attempts, "RPC call succeeded after fallback");
                    }
                    return Ok(result);
                }
                Err(e) if e.should_fallback() => e,
                Err(e) => return Err(e.into()),
            };

            attempts += 1;
            tried[index] = true;
            warn!(provider = %client.url(), error = %error, "RPC provider failed");

            // The shared selection may have been moved by a concurrent call,
            // so continue from it but skip anything this call already tried.
            let from = self.selector.advance(index);
            match next_untried(&tried, from) {
                Some(next) => index = next,
                None => {
                    return Err(Error::AllProvidersFailed {
                        attempts,
                        last: error,
                    });
                }
            }
        }
    }
}

/// First untried index at or after `from`, wrapping around.
fn next_untried(tried: &[bool], from: usize) -> Option<usize> {
    let n = tried.len();
    (0..n).map(|offset| (from + offset) % n).find(|&i| !tried[i])
}

impl std::fmt::Debug for FallbackClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackClient")
            .field("selector", &self.selector)
            .finish()
    }
}
