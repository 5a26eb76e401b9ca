#![forbid(unsafe_code)]
//! Ledger node: loads configuration, creates the ledger and serves the HTTP API.

use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use powledger::api::run_api_server;
use powledger::config::{Config, DEFAULT_CONFIG_PATH};
use powledger::node::LedgerNode;

#[derive(Parser, Debug)]
#[command(name = "ledger-node", about = "Run a single proof-of-work ledger node")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Port to listen on (overrides config and PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Start background mining right away
    #[arg(long)]
    mine: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let mut config = Config::load(&args.config)?;
    config.apply_env_overrides();
    if let Some(port) = args.port {
        config.network.api_port = port;
    }

    let ip: IpAddr = config.network.bind_address.parse()?;
    let addr = SocketAddr::new(ip, config.network.api_port);

    let node = Arc::new(LedgerNode::from_config(&config));
    info!(
        node = node.node_identifier(),
        max_iterations = ?config.miner.max_iterations,
        "ledger node initialised"
    );

    if args.mine {
        node.start_mining().await?;
    }

    run_api_server(node, addr).await
}
