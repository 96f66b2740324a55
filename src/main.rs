//! FaucetDrops service backend.
//!
//! Serves the referral proxy, verification status, WalletConnect pairing
//! redirect and network listing over HTTP.

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use faucet_drops::config::{load_config, watcher::ConfigWatcher, DropsConfig};
use faucet_drops::lifecycle::{build_state, signals, Shutdown};
use faucet_drops::observability::{logging, metrics};
use faucet_drops::HttpServer;

#[derive(Parser)]
#[command(name = "faucet-drops")]
#[command(about = "FaucetDrops service backend", long_about = None)]
struct Args {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => DropsConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "faucet-drops starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        required_chain_id = config.wallet.required_chain_id,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Keep the watcher alive for the life of the server.
    let (_watcher, config_updates) = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            match watcher.run() {
                Ok(handle) => (Some(handle), Some(updates)),
                Err(e) => {
                    tracing::warn!(error = %e, "Config hot reload disabled");
                    (None, None)
                }
            }
        }
        None => (None, None),
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let state = build_state(config)?;
    let verification = state.verification.clone();

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    HttpServer::new(state)
        .run(listener, config_updates, shutdown.subscribe())
        .await?;

    if let Err(e) = verification.cache().save_to_file() {
        tracing::error!(error = %e, "Failed to save verification cache");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
