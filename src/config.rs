use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;

/// Application configuration loaded from config.toml or environment variables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub bitcoin_rpc: BitcoinRpcConfig,
    pub esplora: EsploraConfig,
    pub analysis: AnalysisConfig,
}

/// Which blockchain data source to analyse against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    BitcoinCore,
    #[default]
    Esplora,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bitcoin-core" | "bitcoin_core" | "core" | "rpc" => Ok(Backend::BitcoinCore),
            "esplora" | "mempool" | "mempool-space" => Ok(Backend::Esplora),
            other => Err(format!(
                "unknown backend '{}', expected 'bitcoin-core' or 'esplora'",
                other
            )),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::BitcoinCore => f.write_str("bitcoin-core"),
            Backend::Esplora => f.write_str("esplora"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    pub backend: Backend,
}

/// Bitcoin Core JSON-RPC connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BitcoinRpcConfig {
    pub url: String,
    pub username: String,
    pub password: String,
    pub timeout_seconds: u64,
    pub max_retries: usize,
    pub initial_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub max_backoff_seconds: u64,
    pub concurrent_requests: usize,
}

impl Default for BitcoinRpcConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8332".to_string(),
            username: "bitcoin".to_string(),
            password: "password".to_string(),
            timeout_seconds: 60,
            max_retries: 10,
            initial_backoff_ms: 100,
            backoff_multiplier: 2.0,
            max_backoff_seconds: 30,
            concurrent_requests: 10,
        }
    }
}

/// Esplora / mempool.space REST settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EsploraConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub max_retries: usize,
    pub initial_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub max_backoff_seconds: u64,
    pub concurrent_requests: usize,
}

impl Default for EsploraConfig {
    fn default() -> Self {
        Self {
            base_url: "https://mempool.space/api".to_string(),
            timeout_seconds: 30,
            max_retries: 5,
            initial_backoff_ms: 250,
            backoff_multiplier: 2.0,
            max_backoff_seconds: 10,
            concurrent_requests: 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Transactions analysed in parallel within a block
    pub concurrent_transactions: usize,
    /// Analyse only the first N non-coinbase transactions, 0 for all
    pub first_n_txs: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            concurrent_transactions: 8,
            first_n_txs: 0,
        }
    }
}

impl AppConfig {
    /// Load configuration from config.toml file and environment variables
    /// Environment variables take precedence over file configuration
    pub fn load() -> Result<Self, ConfigError> {
        let rpc = BitcoinRpcConfig::default();
        let esplora = EsploraConfig::default();
        let analysis = AnalysisConfig::default();
        let config = Config::builder()
            .set_default("source.backend", Backend::default().to_string())?
            // Bitcoin RPC defaults
            .set_default("bitcoin_rpc.url", rpc.url)?
            .set_default("bitcoin_rpc.username", rpc.username)?
            .set_default("bitcoin_rpc.password", rpc.password)?
            .set_default("bitcoin_rpc.timeout_seconds", rpc.timeout_seconds)?
            .set_default("bitcoin_rpc.max_retries", rpc.max_retries as i64)?
            .set_default("bitcoin_rpc.initial_backoff_ms", rpc.initial_backoff_ms)?
            .set_default("bitcoin_rpc.backoff_multiplier", rpc.backoff_multiplier)?
            .set_default("bitcoin_rpc.max_backoff_seconds", rpc.max_backoff_seconds)?
            .set_default(
                "bitcoin_rpc.concurrent_requests",
                rpc.concurrent_requests as i64,
            )?
            // Esplora defaults
            .set_default("esplora.base_url", esplora.base_url)?
            .set_default("esplora.timeout_seconds", esplora.timeout_seconds)?
            .set_default("esplora.max_retries", esplora.max_retries as i64)?
            .set_default("esplora.initial_backoff_ms", esplora.initial_backoff_ms)?
            .set_default("esplora.backoff_multiplier", esplora.backoff_multiplier)?
            .set_default("esplora.max_backoff_seconds", esplora.max_backoff_seconds)?
            .set_default(
                "esplora.concurrent_requests",
                esplora.concurrent_requests as i64,
            )?
            .set_default(
                "analysis.concurrent_transactions",
                analysis.concurrent_transactions as i64,
            )?
            .set_default("analysis.first_n_txs", analysis.first_n_txs as i64)?
            // Load from config.toml if it exists
            .add_source(File::with_name("config").required(false))
            // FINGERPRINT_SECTION__KEY overrides any nested setting
            .add_source(
                config::Environment::with_prefix("FINGERPRINT")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let mut app_config: AppConfig = config.try_deserialize()?;

        // Check for specific environment variables with custom names
        if let Ok(url) = env::var("BITCOIN_RPC_URL") {
            app_config.bitcoin_rpc.url = url;
        }
        if let Ok(username) = env::var("BITCOIN_RPC_USER") {
            app_config.bitcoin_rpc.username = username;
        }
        if let Ok(password) = env::var("BITCOIN_RPC_PASSWORD") {
            app_config.bitcoin_rpc.password = password;
        }
        if let Ok(base_url) = env::var("ESPLORA_URL") {
            app_config.esplora.base_url = base_url;
        }

        if app_config.analysis.concurrent_transactions == 0 {
            return Err(ConfigError::Message(
                "analysis.concurrent_transactions must be at least 1".to_string(),
            ));
        }

        Ok(app_config)
    }

    /// Get default config values for CLI argument defaults
    pub fn get_defaults() -> Result<Self, ConfigError> {
        // Try to load config for defaults, but don't fail if not found
        match Self::load() {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!("Falling back to built-in configuration: {}", e);
                Ok(Self {
                    source: SourceConfig::default(),
                    bitcoin_rpc: BitcoinRpcConfig::default(),
                    esplora: EsploraConfig::default(),
                    analysis: AnalysisConfig::default(),
                })
            }
        }
    }
}
