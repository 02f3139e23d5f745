use crate::errors::AppResult;
use clap::{Parser, Subcommand};
use tracing_subscriber;

pub mod commands;

/// Bitcoin Wallet Fingerprinting
#[derive(Parser)]
#[command(name = "wallet-fingerprinting")]
#[command(about = "Infer the wallet software behind Bitcoin transactions")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Fingerprint a single transaction and print the reasoning
    Detect(commands::detect::DetectCommand),
    /// Tally wallet verdicts over a block, coinbase excluded
    AnalyseBlock(commands::analyse_block::AnalyseBlockCommand),
    /// Test connectivity to the configured data source
    TestSource(commands::test_source::TestSourceCommand),
}

pub async fn run() -> AppResult<()> {
    // Initialise tracing subscriber to capture info!() macros
    // Uses RUST_LOG environment variable (defaults to "error" if not set)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("error")),
        )
        .try_init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Detect(command) => command.run().await,
        Commands::AnalyseBlock(command) => command.run().await,
        Commands::TestSource(command) => command.run().await,
    }
}
