//! Passport CLI: issuer key generation and IAM client commands.
//!
//! Subcommands: keygen, issuers, challenge, verify.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Passport: stamp credential tooling.
#[derive(Parser, Debug)]
#[command(name = "passport", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate fresh issuer and service keys.
    Keygen(commands::keygen::KeygenArgs),
    /// Show the issuer DIDs of a running IAM.
    Issuers(commands::issuers::IssuersArgs),
    /// Request a challenge credential.
    Challenge(commands::challenge::ChallengeArgs),
    /// Verify one or more credentials.
    Verify(commands::verify::VerifyArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Keygen(args) => commands::keygen::run(args),
        Commands::Issuers(args) => commands::issuers::run(args).await,
        Commands::Challenge(args) => commands::challenge::run(args).await,
        Commands::Verify(args) => commands::verify::run(args).await,
    }
}
