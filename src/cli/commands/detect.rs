use super::{write_output_to_file, SourceArgs};
use crate::analysis::{Analyser, OutputFormat, ReportFormatter};
use crate::config::Backend;
use crate::detection::detect_wallet;
use crate::errors::AppResult;
use crate::source::{BitcoinCoreClient, ChainSource, EsploraClient, HeightLookup};
use clap::Args;
use std::path::PathBuf;
use tracing::info;

/// Fingerprint a single transaction
#[derive(Args)]
pub struct DetectCommand {
    /// Transaction id
    pub txid: String,

    /// Output format: console, json or csv
    #[arg(long, default_value = "console")]
    pub format: String,

    /// Write the result to a file instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub source: SourceArgs,
}

impl DetectCommand {
    pub async fn run(&self) -> AppResult<()> {
        let config = self.source.resolve()?;
        let concurrency = config.analysis.concurrent_transactions;
        info!("Fingerprinting {} via {}", self.txid, config.source.backend);

        match config.source.backend {
            Backend::BitcoinCore => {
                let client = BitcoinCoreClient::new(&config.bitcoin_rpc).await?;
                self.execute(&Analyser::new(client.clone(), client, concurrency))
                    .await
            }
            Backend::Esplora => {
                let client = EsploraClient::new(&config.esplora)?;
                self.execute(&Analyser::new(client.clone(), client, concurrency))
                    .await
            }
        }
    }

    async fn execute<S, H>(&self, analyser: &Analyser<S, H>) -> AppResult<()>
    where
        S: ChainSource,
        H: HeightLookup,
    {
        let tx = analyser.get_tx(&self.txid).await?;
        let heights = analyser.confirmation_heights(&tx).await;
        let detection = detect_wallet(&tx, &heights);

        let output =
            ReportFormatter::format_detection(&detection, &tx, &OutputFormat::parse(&self.format))?;
        match &self.output {
            Some(path) => write_output_to_file(path, &output, "Wallet detection")?,
            None => print!("{}", output),
        }
        Ok(())
    }
}
