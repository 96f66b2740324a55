use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use faucet_drops::config::ObservabilityConfig;
use faucet_drops::network::{NetworkContext, NetworkRegistry};
use faucet_drops::observability::logging;
use faucet_drops::wallet::{RpcWalletProvider, WalletContext, WalletProvider};

#[derive(Parser)]
#[command(name = "drops-cli")]
#[command(about = "Management CLI for the FaucetDrops backend", long_about = None)]
struct Cli {
    /// Base URL of a running faucet-drops server.
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported networks
    Networks,
    /// Check server health
    Health,
    /// Look up the verification status of an address
    Verify { address: String },
    /// Submit a referral for a transaction
    Referral {
        #[arg(long)]
        tx_hash: String,
        #[arg(long)]
        chain_id: u64,
    },
    /// Connect to a wallet over JSON-RPC and enforce the required chain
    Connect {
        #[arg(long, default_value = "http://localhost:8545")]
        rpc_url: String,
        #[arg(long, default_value_t = 42220)]
        required_chain_id: u64,
        /// Keep following account and chain changes for this many seconds.
        #[arg(long, default_value_t = 0)]
        watch_secs: u64,
        #[arg(long, default_value_t = 4000)]
        poll_interval_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Networks => {
            let res = client.get(format!("{}/networks", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Health => {
            let res = client.get(format!("{}/health", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Verify { address } => {
            let res = client
                .get(format!("{}/verify/status/{}", cli.url, address))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Referral { tx_hash, chain_id } => {
            let res = client
                .post(format!("{}/api/referral", cli.url))
                .json(&json!({ "txHash": tx_hash, "chainId": chain_id }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Connect {
            rpc_url,
            required_chain_id,
            watch_secs,
            poll_interval_ms,
        } => {
            logging::init_logging(&ObservabilityConfig {
                log_targets: false,
                ..ObservabilityConfig::default()
            });
            connect(&rpc_url, required_chain_id, watch_secs, poll_interval_ms).await?;
        }
    }

    Ok(())
}

async fn connect(
    rpc_url: &str,
    required_chain_id: u64,
    watch_secs: u64,
    poll_interval_ms: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let provider: Arc<dyn WalletProvider> = Arc::new(RpcWalletProvider::connect(
        rpc_url,
        Duration::from_millis(poll_interval_ms),
        Duration::from_secs(5),
    )?);
    let registry = Arc::new(NetworkRegistry::builtin());
    let network = Arc::new(NetworkContext::new(registry, Some(provider.clone())));
    let wallet = WalletContext::new(Some(provider), network.clone(), required_chain_id);
    let _events = wallet.listen();

    let address = wallet.connect().await?;
    println!("Connected {}", address);
    print_state(&wallet)?;

    if watch_secs > 0 {
        let mut changes = wallet.subscribe();
        let deadline = tokio::time::sleep(Duration::from_secs(watch_secs));
        tokio::pin!(deadline);
        loop {
            tokio::select! {
                _ = &mut deadline => break,
                changed = changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    print_state(&wallet)?;
                }
            }
        }
    }

    wallet.disconnect();
    Ok(())
}

fn print_state(wallet: &WalletContext) -> Result<(), Box<dyn std::error::Error>> {
    let active = wallet.network().active().map(|n| n.name.clone());
    let state: Value = json!({
        "connection": wallet.state(),
        "activeNetwork": active,
    });
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: server returned status {}", status);
    }
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
