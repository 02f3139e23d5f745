use super::{write_output_to_file, SourceArgs};
use crate::analysis::{Analyser, OutputFormat, ReportFormatter};
use crate::config::Backend;
use crate::errors::AppResult;
use crate::source::{BitcoinCoreClient, ChainSource, EsploraClient, HeightLookup};
use clap::Args;
use std::path::PathBuf;
use tracing::info;

/// Tally wallet verdicts over the transactions of a block
#[derive(Args)]
pub struct AnalyseBlockCommand {
    /// Block hash (defaults to the current tip)
    #[arg(long)]
    pub block_hash: Option<String>,

    /// Analyse only the first N non-coinbase transactions (overrides config.toml, 0 for all)
    #[arg(long)]
    pub limit: Option<usize>,

    /// Transactions fingerprinted in parallel (overrides config.toml)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Output format: console, json or csv
    #[arg(long, default_value = "console")]
    pub format: String,

    /// Write the report to a file instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub source: SourceArgs,
}

impl AnalyseBlockCommand {
    pub async fn run(&self) -> AppResult<()> {
        let config = self.source.resolve()?;
        let concurrency = self
            .concurrency
            .unwrap_or(config.analysis.concurrent_transactions);
        let limit = self.limit.unwrap_or(config.analysis.first_n_txs);

        info!("=== Analysing block via {} ===", config.source.backend);

        match config.source.backend {
            Backend::BitcoinCore => {
                let client = BitcoinCoreClient::new(&config.bitcoin_rpc).await?;
                let analyser = Analyser::new(client.clone(), client.clone(), concurrency);
                self.execute(&analyser, limit).await?;
                info!(
                    "RPC errors: {}, prevout cache hit rate: {:.1}%",
                    client.get_error_count(),
                    client.get_cache_stats().hit_rate()
                );
            }
            Backend::Esplora => {
                let client = EsploraClient::new(&config.esplora)?;
                let analyser = Analyser::new(client.clone(), client.clone(), concurrency);
                self.execute(&analyser, limit).await?;
                info!(
                    "HTTP errors: {}, prevout cache hit rate: {:.1}%",
                    client.get_error_count(),
                    client.get_cache_stats().hit_rate()
                );
            }
        }
        Ok(())
    }

    async fn execute<S, H>(&self, analyser: &Analyser<S, H>, limit: usize) -> AppResult<()>
    where
        S: ChainSource,
        H: HeightLookup,
    {
        let analysis = analyser
            .analyze_block(self.block_hash.as_deref(), Some(limit))
            .await?;

        let output =
            ReportFormatter::format_block_analysis(&analysis, &OutputFormat::parse(&self.format))?;

        match &self.output {
            Some(path) => write_output_to_file(path, &output, "Wallet fingerprint report")?,
            None => print!("{}", output),
        }
        Ok(())
    }
}
