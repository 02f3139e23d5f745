use super::SourceArgs;
use crate::config::Backend;
use crate::errors::{AppError, AppResult};
use crate::source::{BitcoinCoreClient, ChainSource, EsploraClient};
use clap::Args;
use tracing::{error, info};

/// Test connectivity to the configured data source
#[derive(Args)]
pub struct TestSourceCommand {
    #[command(flatten)]
    pub source: SourceArgs,
}

impl TestSourceCommand {
    pub async fn run(&self) -> AppResult<()> {
        info!("=== Testing Data Source Connection ===");
        let config = self.source.resolve()?;

        let tip = match config.source.backend {
            Backend::BitcoinCore => {
                info!("Testing connection to: {}", config.bitcoin_rpc.url);
                info!("Username: {}", config.bitcoin_rpc.username);
                match BitcoinCoreClient::new(&config.bitcoin_rpc).await {
                    Ok(client) => client.best_block_hash().await,
                    Err(e) => Err(e),
                }
            }
            Backend::Esplora => {
                info!("Testing connection to: {}", config.esplora.base_url);
                match EsploraClient::new(&config.esplora) {
                    Ok(client) => client.best_block_hash().await,
                    Err(e) => Err(e),
                }
            }
        };

        match tip {
            Ok(hash) => {
                println!("{} connection test PASSED", config.source.backend);
                println!("Best block: {}", hash);
                Ok(())
            }
            Err(e) => {
                error!("Data source test failed: {}", e);
                println!("{} connection test FAILED", config.source.backend);
                println!("Error: {}", e);
                println!("\nTroubleshooting tips:");
                match config.source.backend {
                    Backend::BitcoinCore => {
                        println!("1. Check that Bitcoin Core is running with txindex=1");
                        println!("2. Verify the RPC URL and credentials");
                        println!("3. Check that RPC server is enabled in bitcoin.conf");
                    }
                    Backend::Esplora => {
                        println!("1. Verify the Esplora base URL (e.g. https://mempool.space/api)");
                        println!("2. Check network access and rate limits");
                    }
                }
                Err(AppError::Config(format!("Data source test failed: {}", e)))
            }
        }
    }
}
