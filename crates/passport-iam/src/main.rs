//! Passport IAM: entry point.
//!
//! Starts the IAM HTTP service with configuration from a TOML file or defaults.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use passport_iam::api::start_api_server;
use passport_iam::{AppState, IamConfig};

/// Passport IAM service
#[derive(Parser, Debug)]
#[command(name = "passport-iam", version, about = "Passport IAM service")]
struct Args {
    /// Path to the configuration file (TOML).
    #[arg(short, long, default_value = "iam.toml")]
    config: PathBuf,

    /// Override the API port.
    #[arg(long)]
    port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Override the log format (text, json).
    #[arg(long)]
    log_format: Option<String>,

    /// Generate a default config file and exit.
    #[arg(long)]
    init: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Handle --init flag
    if args.init {
        let config = IamConfig::default();
        config.save(&args.config)?;
        println!("wrote default config to {}", args.config.display());
        return Ok(());
    }

    // Load configuration
    let mut config = IamConfig::load(&args.config)?;

    // Apply CLI overrides
    if let Some(port) = args.port {
        config.api.port = port;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    if let Some(format) = args.log_format {
        config.logging.format = format;
    }

    init_tracing(&config.logging.level, &config.logging.format);

    tracing::info!("Passport IAM v{}", env!("CARGO_PKG_VERSION"));

    let state = Arc::new(AppState::from_config(&config)?);
    let listen_addr: SocketAddr = config.listen_addr().parse()?;

    start_api_server(listen_addr, state, shutdown_signal()).await?;
    tracing::info!("Passport IAM exited cleanly");
    Ok(())
}

fn init_tracing(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if format.eq_ignore_ascii_case("json") {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("received shutdown signal, initiating graceful shutdown");
}
