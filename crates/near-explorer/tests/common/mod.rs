//! Shared helpers for integration tests: recorded RPC responses and a local
//! JSON-RPC stub server.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use near_explorer::FinalExecutionOutcome;
use serde_json::Value;
use tokio::net::TcpListener;

pub const FT_TRANSFER_CALL: &str = include_str!("../fixtures/ft_transfer_call.json");
pub const NFT_MINT_FAILURE: &str = include_str!("../fixtures/nft_mint_failure.json");
pub const INDEXER_ACTIONS: &str = include_str!("../fixtures/indexer_actions.json");

/// Transaction hash of the `ft_transfer_call` fixture.
pub const FT_TX_HASH: &str = "8aa3PPhXJkUJzgYy7wLaTsnKG5hGbyt6kyGPFkq2ev5g";
/// Transaction hash of the `nft_mint` fixture.
pub const NFT_TX_HASH: &str = "3gKu6EJAgtcudQtcfASjvPnfyETmjqnmcLEALrreFSsk";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// The `result` of a recorded JSON-RPC response.
pub fn outcome(fixture: &str) -> FinalExecutionOutcome {
    let response: Value = serde_json::from_str(fixture).unwrap();
    serde_json::from_value(response["result"].clone()).unwrap()
}

pub fn rpc_error(cause: &str, code: i64, message: &str) -> String {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": 0,
        "error": {
            "name": "HANDLER_ERROR",
            "cause": { "name": cause, "info": {} },
            "code": code,
            "message": message,
            "data": message
        }
    })
    .to_string()
}

pub fn method_not_found() -> String {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": 0,
        "error": { "code": -32601, "message": "Method not found" }
    })
    .to_string()
}

/// A running stub provider.
pub struct Stub {
    pub url: String,
    hits: Arc<AtomicUsize>,
}

impl Stub {
    /// Number of requests served.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

type Respond = dyn Fn(&Value) -> (u16, String) + Send + Sync;

#[derive(Clone)]
struct StubState {
    hits: Arc<AtomicUsize>,
    respond: Arc<Respond>,
}

async fn handle_rpc(
    State(stub): State<StubState>,
    Json(request): Json<Value>,
) -> (StatusCode, String) {
    stub.hits.fetch_add(1, Ordering::SeqCst);
    let (status, body) = (stub.respond)(&request);
    let status = StatusCode::from_u16(status).expect("valid stub status");
    (status, body)
}

/// Serve JSON-RPC requests with `respond(request) -> (http status, body)`.
pub async fn spawn_stub<F>(respond: F) -> Stub
where
    F: Fn(&Value) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub provider");
    let url = format!("http://{}", listener.local_addr().expect("stub address"));
    let hits = Arc::new(AtomicUsize::new(0));

    let app = Router::new()
        .route("/", post(handle_rpc))
        .with_state(StubState {
            hits: hits.clone(),
            respond: Arc::new(respond),
        });

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub provider");
    });

    Stub { url, hits }
}

/// A URL nothing listens on.
pub async fn closed_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    url
}
