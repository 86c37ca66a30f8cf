//! Headless wallet signing daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!   stdin (JSON lines)                                     stdout (JSON lines)
//!   ────────────────▶ bridge::stdio ──▶ bridge::listener          ▲
//!                                            │                    │
//!                                            ▼                    │
//!                                    bridge::RequestBridge ───────┘
//!                                            │
//!                          ┌─────────────────┼──────────────────┐
//!                          ▼                 ▼                  ▼
//!                   lifecycle::TxEngine  consolidation   bridge::approval
//!                          │
//!                          ▼
//!                   client::NodeClient ──▶ full node REST API
//! ```
//!
//! Signing keys are read from `TXFLOW_SIGNER_KEYS`. When the wallet requires
//! a password, auto-approved requests unlock with `TXFLOW_WALLET_PASSWORD`.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::io::BufReader;

use wallet_txflow::amount::to_minor_units;
use wallet_txflow::bridge::{self, AutoApprovePolicy, JsonLinesTransport, RequestBridge, SessionTransport};
use wallet_txflow::config::{load_config, WalletConfig};
use wallet_txflow::observability::{init_logging, metrics};
use wallet_txflow::runtime::{spawn_signal_handler, Shutdown, WalletContext};

const PASSWORD_ENV_VAR: &str = "TXFLOW_WALLET_PASSWORD";

#[derive(Parser)]
#[command(name = "wallet-txflow")]
#[command(about = "Headless transaction signing daemon", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "txflow.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config: WalletConfig = load_config(&args.config)?;

    init_logging(&config.observability);
    tracing::info!(config = %args.config.display(), "wallet-txflow v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    if !config.bridge.enabled {
        tracing::warn!("Request bridge disabled in configuration, nothing to do");
        return Ok(());
    }

    let bridge_config = config.bridge.clone();
    let context = WalletContext::from_config(config)?;
    context.refresh_balances().await;

    let max_amount = bridge_config
        .max_auto_approve_amount
        .as_deref()
        .map(to_minor_units)
        .transpose()?;
    let mut policy = AutoApprovePolicy::new(bridge_config.auto_approve, max_amount);
    if let Ok(password) = std::env::var(PASSWORD_ENV_VAR) {
        policy = policy.with_password(password);
    }
    tracing::info!(auto_approve = bridge_config.auto_approve, "Approval policy configured");

    let transport: Arc<dyn SessionTransport> = Arc::new(JsonLinesTransport::new(tokio::io::stdout()));
    let mut request_bridge = RequestBridge::new(
        context.client(),
        context.addresses.clone(),
        Arc::new(policy),
        transport.clone(),
    );
    if let Some(gate) = &context.password_gate {
        request_bridge = request_bridge.with_password_gate(gate.clone());
    }

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    let listener = bridge::subscribe(Arc::new(request_bridge), bridge_config.queue_capacity, shutdown.clone());
    let stdin = BufReader::new(tokio::io::stdin());
    if let Err(e) = bridge::read_requests(stdin, listener.sender(), transport.as_ref(), shutdown.signal()).await {
        tracing::error!(error = %e, "Session input failed");
    }

    // Requests already queued are still processed after input closes.
    listener.join().await;

    let pending = context.node.pending_transactions();
    if !pending.is_empty() {
        tracing::info!(count = pending.len(), "Transactions submitted this session are awaiting confirmation");
    }
    tracing::info!("Shutdown complete");
    Ok(())
}
