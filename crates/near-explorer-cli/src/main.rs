//! Receipt trees for NEAR transactions from the command line.
//!
//! ```text
//! near-explorer-cli tx <hash> <signer>            # text tree
//! near-explorer-cli --network testnet tx <hash> <signer> --json
//! near-explorer-cli providers                     # probe every provider
//! near-explorer-cli block 150000000
//! ```
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::future::join_all;
use near_explorer::{BlockReference, CryptoHash, Explorer, Gas, RpcProvider, Traversal};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "near-explorer-cli")]
#[command(about = "Inspect NEAR transactions as receipt trees")]
#[command(version)]
struct Cli {
    /// `mainnet`, `testnet`, or the URL of a custom RPC node
    #[arg(long, env = "NEAR_NETWORK", default_value = "mainnet")]
    network: String,

    /// RPC providers to use instead of the network's defaults, in fallback order
    #[arg(long = "rpc", env = "NEAR_RPC_URLS", value_delimiter = ',')]
    rpc: Vec<String>,

    /// File remembering the selected provider [default: user config dir]
    #[arg(long, env = "NEAR_EXPLORER_STATE")]
    state_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the receipt tree of a transaction
    Tx {
        hash: String,
        /// Account that signed the transaction
        signer: String,
        /// Print the tree as JSON
        #[arg(long)]
        json: bool,
        /// Resolve only the root receipt
        #[arg(long)]
        lazy: bool,
    },
    /// List providers with their status; `*` marks the selected one
    Providers,
    /// Print node status of the selected provider
    Status,
    /// Print a block header: `final`, `optimistic`, a height or a hash
    Block {
        #[arg(default_value = "final")]
        block: BlockReference,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let explorer = explorer(&cli)?;

    match cli.command {
        Command::Tx {
            hash,
            signer,
            json,
            lazy,
        } => {
            let hash: CryptoHash = hash.parse().context("invalid transaction hash")?;
            let traversal = if lazy {
                Traversal::Lazy
            } else {
                Traversal::Eager
            };
            let tree = explorer
                .receipt_tree_with(&hash, &signer, traversal)
                .await
                .with_context(|| format!("failed to load transaction {hash}"))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&tree)?);
            } else {
                print!("{tree}");
            }
        }
        Command::Providers => providers(&explorer).await,
        Command::Status => {
            let status = explorer.status().await?;
            println!("provider: {}", explorer.selected_provider().url);
            println!("chain:    {}", status.chain_id);
            println!(
                "head:     #{} {}",
                status.sync_info.latest_block_height, status.sync_info.latest_block_hash
            );
            println!("syncing:  {}", status.sync_info.syncing);
            println!("version:  {}", status.version.version);
        }
        Command::Block { block } => {
            let block = explorer.block(block).await?;
            let gas_used: Gas = block.chunks.iter().map(|c| c.gas_used).sum();
            println!("block:    #{} {}", block.header.height, block.header.hash);
            println!("author:   {}", block.author);
            println!("chunks:   {}", block.chunks.len());
            println!("gas used: {gas_used}");
        }
    }

    Ok(())
}

fn explorer(cli: &Cli) -> Result<Explorer> {
    let mut builder = Explorer::for_network(&cli.network)?;

    if !cli.rpc.is_empty() {
        builder = builder.providers(cli.rpc.iter().map(RpcProvider::from_url).collect());
    }

    builder = match &cli.state_file {
        Some(path) => builder.state_file(path),
        None => builder.persist_or_memory(),
    };

    Ok(builder.build()?)
}

async fn providers(explorer: &Explorer) {
    let selected = explorer.rpc().selector().selected_index();
    let probes = (0..explorer.providers().len()).filter_map(|i| {
        let rpc = explorer.rpc().client(i)?;
        Some(async move { (i, rpc.status().await) })
    });

    for (i, status) in join_all(probes).await {
        let provider = &explorer.providers()[i];
        let marker = if i == selected { "*" } else { " " };
        match status {
            Ok(status) => println!(
                "{marker} {:<12} {:<40} #{}",
                provider.name, provider.url, status.sync_info.latest_block_height
            ),
            Err(e) => {
                warn!(provider = %provider.url, error = %e, "status probe failed");
                println!("{marker} {:<12} {:<40} unavailable", provider.name, provider.url);
            }
        }
    }
}
