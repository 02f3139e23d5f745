//! Retry logic utilities for data source operations
//!
//! This module provides helper functions for implementing exponential backoff
//! retry logic and timeout wrappers for RPC and REST client operations.

use crate::config::{BitcoinRpcConfig, EsploraConfig};
use crate::errors::{SourceError, SourceResult};
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinError;
use tokio::time::error::Elapsed;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, warn};

/// Retry and timeout settings shared by both backends
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub timeout_seconds: u64,
    pub max_retries: usize,
    pub initial_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub max_backoff_seconds: u64,
}

impl From<&BitcoinRpcConfig> for RetryPolicy {
    fn from(config: &BitcoinRpcConfig) -> Self {
        Self {
            timeout_seconds: config.timeout_seconds,
            max_retries: config.max_retries,
            initial_backoff_ms: config.initial_backoff_ms,
            backoff_multiplier: config.backoff_multiplier,
            max_backoff_seconds: config.max_backoff_seconds,
        }
    }
}

impl From<&EsploraConfig> for RetryPolicy {
    fn from(config: &EsploraConfig) -> Self {
        Self {
            timeout_seconds: config.timeout_seconds,
            max_retries: config.max_retries,
            initial_backoff_ms: config.initial_backoff_ms,
            backoff_multiplier: config.backoff_multiplier,
            max_backoff_seconds: config.max_backoff_seconds,
        }
    }
}

/// Calculate next backoff duration using exponential backoff with a maximum cap
///
/// This is a pure helper function that implements the exponential backoff formula:
/// `new_backoff = min(current_backoff * multiplier, max_backoff)`
///
/// # Example
/// ```
/// use std::time::Duration;
/// use wallet_fingerprinting::source::calculate_next_backoff;
///
/// let backoff = Duration::from_millis(100);
/// let next = calculate_next_backoff(backoff, 2.0, 30);
/// assert_eq!(next, Duration::from_millis(200));
/// ```
pub fn calculate_next_backoff(
    current_backoff: Duration,
    multiplier: f64,
    max_backoff_seconds: u64,
) -> Duration {
    Duration::from_millis((current_backoff.as_millis() as f64 * multiplier) as u64)
        .min(Duration::from_secs(max_backoff_seconds))
}

/// Execute a blocking RPC operation with timeout wrapper
///
/// # Returns
/// `Result<Result<SourceResult<T>, JoinError>, Elapsed>`
/// - Outer Result: Timeout result (Err = timeout elapsed)
/// - Middle Result: spawn_blocking result (Err = task panic/failure)
/// - Inner SourceResult<T>: RPC operation result
pub async fn execute_with_timeout<T, F>(
    timeout_seconds: u64,
    operation: F,
) -> Result<Result<SourceResult<T>, JoinError>, Elapsed>
where
    T: Send + 'static,
    F: FnOnce() -> SourceResult<T> + Send + 'static,
{
    timeout(
        Duration::from_secs(timeout_seconds),
        tokio::task::spawn_blocking(operation),
    )
    .await
}

/// Run `attempt` until it succeeds, fails permanently, or the retry budget is spent
///
/// Only errors for which [`SourceError::is_retryable`] holds are retried.
/// A timeout on the final attempt is returned as the timeout itself.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut attempt: F,
) -> SourceResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = SourceResult<T>>,
{
    let mut attempts = 0;
    let mut backoff = Duration::from_millis(policy.initial_backoff_ms);

    loop {
        match attempt().await {
            Ok(value) => {
                if attempts > 0 {
                    debug!("{} succeeded after {} attempts", operation, attempts + 1);
                }
                return Ok(value);
            }
            Err(e) if !e.is_retryable() => return Err(e),
            Err(e) => {
                attempts += 1;
                if attempts >= policy.max_retries.max(1) {
                    error!("{} failed after {} attempts: {}", operation, attempts, e);
                    return Err(match e {
                        SourceError::Timeout { .. } => e,
                        _ => SourceError::MaxRetriesExceeded {
                            operation: operation.to_string(),
                        },
                    });
                }

                warn!(
                    "Attempt {} failed for {}, retrying in {:?}: {}",
                    attempts, operation, backoff, e
                );
                sleep(backoff).await;
                backoff = calculate_next_backoff(
                    backoff,
                    policy.backoff_multiplier,
                    policy.max_backoff_seconds,
                );
            }
        }
    }
}
