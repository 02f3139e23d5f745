use thiserror::Error;

/// Application-wide error type - single point of truth
#[derive(Error, Debug)]
pub enum AppError {
    /// Blockchain data source operations (RPC or REST)
    #[error("Data source error: {0}")]
    Source(#[from] SourceError),

    /// Per-transaction failures surfaced outside of batch analysis
    #[error("Transaction error: {0}")]
    Tx(#[from] TxError),

    /// File I/O operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV report output
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration issues
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation/parsing
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Errors raised by a blockchain data source or confirmation-height lookup
#[derive(Error, Debug)]
pub enum SourceError {
    /// Failed to establish a connection to the backend
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// TXID string format is invalid (not valid hex or wrong length)
    #[error("Invalid txid: {txid}")]
    InvalidTxid { txid: String },

    /// RPC method call failed (covers network errors, authentication, etc.)
    #[error("RPC call failed: {method} - {message}")]
    CallFailed { method: String, message: String },

    /// HTTP request against a REST backend failed
    #[error("HTTP request failed: {url} - {message}")]
    Http { url: String, message: String },

    /// Failed to deserialise backend response data into its native shape
    #[error("Deserialisation failed: {0}")]
    DeserialisationFailed(String),

    /// Retry limit exceeded for an operation
    #[error("Max retries exceeded: {operation}")]
    MaxRetriesExceeded { operation: String },

    /// Request timed out
    #[error("Request timeout: {timeout_seconds}s for {operation}")]
    Timeout {
        timeout_seconds: u64,
        operation: String,
    },

    /// Backend returned unexpected or malformed response data
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Requested transaction, output or block does not exist
    #[error("Not found: {resource}")]
    NotFound { resource: String },
}

impl SourceError {
    /// Whether another attempt could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SourceError::ConnectionFailed(_)
                | SourceError::CallFailed { .. }
                | SourceError::Http { .. }
                | SourceError::Timeout { .. }
        )
    }
}

/// Failure to obtain a canonical transaction, fatal for that transaction only
#[derive(Error, Debug)]
pub enum TxError {
    /// A required field is missing or has the wrong shape, or a previous
    /// output could not be resolved
    #[error("Malformed transaction {txid}: {reason}")]
    MalformedTransaction { txid: String, reason: String },

    /// The transaction itself could not be fetched
    #[error("Lookup unavailable for {txid}: {source}")]
    LookupUnavailable { txid: String, source: SourceError },
}

impl TxError {
    pub fn malformed(txid: impl Into<String>, reason: impl Into<String>) -> Self {
        TxError::MalformedTransaction {
            txid: txid.into(),
            reason: reason.into(),
        }
    }

    /// Map a raw-transaction fetch failure: shape errors are malformed data,
    /// everything else is an unavailable lookup
    pub fn from_fetch(txid: &str, err: SourceError) -> Self {
        match err {
            SourceError::DeserialisationFailed(reason) => TxError::malformed(txid, reason),
            source => TxError::LookupUnavailable {
                txid: txid.to_string(),
                source,
            },
        }
    }

    pub fn txid(&self) -> &str {
        match self {
            TxError::MalformedTransaction { txid, .. }
            | TxError::LookupUnavailable { txid, .. } => txid,
        }
    }
}

/// Application-wide result type - single point of truth
pub type AppResult<T> = Result<T, AppError>;

/// Result type for data source operations
pub type SourceResult<T> = Result<T, SourceError>;

// Additional From implementations for common error types
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidData(format!("JSON error: {}", err))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}
