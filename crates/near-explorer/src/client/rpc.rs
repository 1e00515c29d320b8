//! Low-level JSON-RPC client for a single NEAR RPC provider.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, trace};

use crate::error::RpcError;
use crate::types::{
    AccountId, BlockReference, BlockView, CryptoHash, FinalExecutionOutcome, StatusResponse,
    TxExecutionStatus,
};

/// Retry configuration for RPC calls against one provider.
#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Maximum number of retries.
    pub max_retries: u32,
    /// Initial delay in milliseconds.
    pub initial_delay_ms: u64,
    /// Maximum delay in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay_ms: 300,
            max_delay_ms: 3000,
        }
    }
}

impl RetryConfig {
    /// No retries: fail over to the next provider immediately.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_delay_ms: 0,
            max_delay_ms: 0,
        }
    }

    fn delay(&self, attempt: u32) -> Duration {
        let delay = self
            .initial_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt))
            .min(self.max_delay_ms);
        Duration::from_millis(delay)
    }
}

#[derive(Serialize)]
struct JsonRpcRequest<'a, P: Serialize> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

/// NEAR RPC errors carry a `cause` with a machine-readable name.
#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(default)]
    cause: Option<ErrorCause>,
}

#[derive(Debug, Deserialize)]
struct ErrorCause {
    name: String,
    #[serde(default)]
    info: Option<serde_json::Value>,
}

/// JSON-RPC client bound to one provider URL.
pub struct RpcClient {
    url: String,
    client: reqwest::Client,
    retry_config: RetryConfig,
    request_id: AtomicU64,
}

impl RpcClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_retry_config(url, RetryConfig::default())
    }

    pub fn with_retry_config(url: impl Into<String>, retry_config: RetryConfig) -> Self {
        Self::with_http_client(url, reqwest::Client::new(), retry_config)
    }

    /// Share one connection pool between clients.
    pub fn with_http_client(
        url: impl Into<String>,
        client: reqwest::Client,
        retry_config: RetryConfig,
    ) -> Self {
        Self {
            url: url.into(),
            client,
            retry_config,
            request_id: AtomicU64::new(0),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Make a raw RPC call with retries.
    pub async fn call<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<R, RpcError> {
        let mut attempt = 0;

        loop {
            let request = JsonRpcRequest {
                jsonrpc: "2.0",
                id: self.request_id.fetch_add(1, Ordering::Relaxed),
                method,
                params: &params,
            };

            match self.try_call::<R>(&request).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.retry_config.max_retries => {
                    let delay = self.retry_config.delay(attempt);
                    debug!(
                        url = %self.url,
                        method,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retrying RPC call"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn try_call<R: DeserializeOwned>(
        &self,
        request: &JsonRpcRequest<'_, impl Serialize>,
    ) -> Result<R, RpcError> {
        trace!(url = %self.url, method = request.method, "sending RPC request");

        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(RpcError::network(
                format!("HTTP {}: {}", status, body),
                Some(status.as_u16()),
                is_retryable_status(status.as_u16()),
            ));
        }

        let rpc_response: JsonRpcResponse<R> = serde_json::from_str(&body)?;

        if let Some(error) = rpc_response.error {
            return Err(error.into());
        }

        rpc_response
            .result
            .ok_or_else(|| RpcError::InvalidResponse("Missing result in response".to_string()))
    }

    // ========================================================================
    // Read-only RPC methods
    // ========================================================================

    /// Get node status.
    pub async fn status(&self) -> Result<StatusResponse, RpcError> {
        self.call("status", serde_json::json!([])).await
    }

    /// Get block information.
    pub async fn block(&self, block: BlockReference) -> Result<BlockView, RpcError> {
        self.call("block", block).await
    }

    /// Get transaction status without receipt payloads.
    pub async fn tx(
        &self,
        tx_hash: &CryptoHash,
        sender_id: &AccountId,
        wait_until: TxExecutionStatus,
    ) -> Result<FinalExecutionOutcome, RpcError> {
        self.call("tx", tx_params(tx_hash, sender_id, wait_until))
            .await
    }

    /// Get transaction status with receipt payloads.
    pub async fn tx_status(
        &self,
        tx_hash: &CryptoHash,
        sender_id: &AccountId,
        wait_until: TxExecutionStatus,
    ) -> Result<FinalExecutionOutcome, RpcError> {
        self.call(
            "EXPERIMENTAL_tx_status",
            tx_params(tx_hash, sender_id, wait_until),
        )
        .await
    }
}

impl Clone for RpcClient {
    fn clone(&self) -> Self {
        Self {
            url: self.url.clone(),
            client: self.client.clone(),
            retry_config: self.retry_config.clone(),
            request_id: AtomicU64::new(0),
        }
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("url", &self.url)
            .field("retry_config", &self.retry_config)
            .finish()
    }
}

// ============================================================================
// Helper functions
// ============================================================================

fn tx_params(
    tx_hash: &CryptoHash,
    sender_id: &AccountId,
    wait_until: TxExecutionStatus,
) -> serde_json::Value {
    serde_json::json!({
        "tx_hash": tx_hash.to_string(),
        "sender_account_id": sender_id.to_string(),
        "wait_until": wait_until,
    })
}

impl JsonRpcError {
    fn info(&self, key: &str) -> Option<&str> {
        self.cause.as_ref()?.info.as_ref()?.get(key)?.as_str()
    }

    /// Older nodes report a missing transaction only in `data`.
    fn is_legacy_missing_transaction(&self) -> bool {
        self.data.as_ref().and_then(|d| d.as_str()).is_some_and(|data| {
            data.contains("Transaction")
                && (data.contains("doesn't exist") || data.contains("does not exist"))
        })
    }
}

/// Classifies a node error by its cause name.
impl From<JsonRpcError> for RpcError {
    fn from(error: JsonRpcError) -> Self {
        let cause = error.cause.as_ref().map(|c| c.name.as_str());
        match cause {
            Some("UNKNOWN_TRANSACTION") => RpcError::UnknownTransaction(
                error
                    .info("requested_transaction_hash")
                    .unwrap_or(&error.message)
                    .to_string(),
            ),
            Some("UNKNOWN_BLOCK") => RpcError::UnknownBlock(
                error
                    .data
                    .as_ref()
                    .and_then(|d| d.as_str())
                    .unwrap_or(&error.message)
                    .to_string(),
            ),
            Some("UNKNOWN_RECEIPT") => {
                RpcError::UnknownReceipt(error.info("receipt_id").unwrap_or("unknown").to_string())
            }
            Some("INVALID_ACCOUNT") => RpcError::InvalidAccount(
                error
                    .info("requested_account_id")
                    .unwrap_or("unknown")
                    .to_string(),
            ),
            Some("UNAVAILABLE_SHARD") => RpcError::ShardUnavailable(error.message),
            Some("NO_SYNCED_BLOCKS" | "NOT_SYNCED_YET") => RpcError::NodeNotSynced(error.message),
            Some("TIMEOUT_ERROR") => RpcError::RequestTimeout {
                transaction_hash: error.info("transaction_hash").map(String::from),
                message: error.message,
            },
            Some("PARSE_ERROR") => RpcError::ParseError(error.message),
            Some("INTERNAL_ERROR") => RpcError::InternalError(error.message),
            _ if error.is_legacy_missing_transaction() => RpcError::UnknownTransaction(
                error.data.as_ref().and_then(|d| d.as_str()).unwrap_or_default().to_string(),
            ),
            _ => RpcError::Rpc {
                code: error.code,
                message: error.message,
                data: error.data,
            },
        }
    }
}

/// 408, 429 and 5xx are worth another try on the same provider.
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500..=599)
}
