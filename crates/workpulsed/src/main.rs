//! workpulsed - The workpulse background service
//!
//! This is the main entry point for the workpulsed service.
//! It wires together all the components:
//! - Configuration loading
//! - Ledger initialization
//! - Work timer
//! - HTTP status ingress
//! - WebSocket push channel

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use workpulse_config::load_or_default;
use workpulse_store::{JsonLedger, Ledger};
use workpulse_util::{SystemClock, default_config_path};
use workpulsed::Service;

/// workpulsed - Work session timer and live status relay
#[derive(Parser, Debug)]
#[command(name = "workpulsed")]
#[command(about = "Work session timer and live status relay", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/workpulse/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Data directory override (or set WORKPULSE_DATA_DIR env var)
    #[arg(short, long, env = "WORKPULSE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// HTTP ingress address override
    #[arg(long, env = "WORKPULSE_HTTP_ADDR")]
    http_addr: Option<SocketAddr>,

    /// Push channel address override
    #[arg(long, env = "WORKPULSE_PUSH_ADDR")]
    push_addr: Option<SocketAddr>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    if args.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "workpulsed starting"
    );

    // Load configuration
    let mut settings = load_or_default(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;

    if let Some(data_dir) = args.data_dir {
        settings.service.data_dir = data_dir;
    }
    if let Some(addr) = args.http_addr {
        settings.service.http_addr = addr;
    }
    if let Some(addr) = args.push_addr {
        settings.service.push_addr = addr;
    }

    info!(
        config_path = %args.config.display(),
        http_addr = %settings.service.http_addr,
        push_addr = %settings.service.push_addr,
        "Configuration loaded"
    );

    std::fs::create_dir_all(&settings.service.data_dir).with_context(|| {
        format!(
            "Failed to create data directory {:?}",
            settings.service.data_dir
        )
    })?;

    let ledger_path = settings.service.ledger_path();
    let ledger: Arc<dyn Ledger> = Arc::new(JsonLedger::open(&ledger_path));
    info!(ledger_path = %ledger_path.display(), "Ledger initialized");

    let service = Service::new(settings, ledger, Arc::new(SystemClock)).await?;
    service.run().await
}
