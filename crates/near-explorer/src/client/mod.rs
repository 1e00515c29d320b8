//! Client module for reading NEAR Protocol through a list of RPC providers.
//!
//! - [`Explorer`] - The facade, the single entry point for transaction views
//! - [`ExplorerBuilder`] - Fluent builder for configuring the explorer
//! - [`FallbackClient`] - Runs calls through the selected provider with fallback
//! - [`RpcClient`] - Low-level JSON-RPC client with retry logic

mod explorer;
mod fallback;
mod rpc;

pub use explorer::{Explorer, ExplorerBuilder};
pub use fallback::FallbackClient;
pub use rpc::{RetryConfig, RpcClient};
