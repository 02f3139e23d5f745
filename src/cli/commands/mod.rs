pub mod analyse_block;
pub mod detect;
pub mod test_source;

use crate::config::{AppConfig, Backend};
use crate::errors::{AppError, AppResult};
use clap::Args;
use std::path::Path;

/// Data source selection shared by every command
///
/// Flags override `config.toml` and environment variables.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Data source backend: bitcoin-core or esplora
    #[arg(long)]
    pub backend: Option<Backend>,

    /// Bitcoin RPC URL
    #[arg(long)]
    pub rpc_url: Option<String>,

    /// Bitcoin RPC username
    #[arg(long)]
    pub rpc_username: Option<String>,

    /// Bitcoin RPC password
    #[arg(long)]
    pub rpc_password: Option<String>,

    /// Esplora API base URL
    #[arg(long)]
    pub esplora_url: Option<String>,
}

impl SourceArgs {
    /// Load configuration or use defaults, then apply the flags
    pub fn resolve(&self) -> AppResult<AppConfig> {
        let app_config = AppConfig::get_defaults().map_err(|e| AppError::Config(e.to_string()))?;
        Ok(self.apply(app_config))
    }

    pub fn apply(&self, mut config: AppConfig) -> AppConfig {
        if let Some(backend) = self.backend {
            config.source.backend = backend;
        }
        if let Some(url) = &self.rpc_url {
            config.bitcoin_rpc.url = url.clone();
        }
        if let Some(username) = &self.rpc_username {
            config.bitcoin_rpc.username = username.clone();
        }
        if let Some(password) = &self.rpc_password {
            config.bitcoin_rpc.password = password.clone();
        }
        if let Some(url) = &self.esplora_url {
            config.esplora.base_url = url.clone();
        }
        config
    }
}

/// Write output to file with safe directory creation
pub fn write_output_to_file(path: &Path, content: &str, description: &str) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    println!("{} written to: {}", description, path.display());
    Ok(())
}
