use super::{
    check_txid, retry_with_backoff, CacheStats, ChainSource, HeightLookup, LookupCache,
    RetryPolicy,
};
use crate::config::EsploraConfig;
use crate::errors::{SourceError, SourceResult};
use crate::normalise::{EsploraTx, EsploraTxStatus};
use crate::types::{OutPointRef, TxOut};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info};

/// Esplora REST backend (mempool.space, blockstream.info or self-hosted)
///
/// Transactions carry their previous outputs inline, so normalisation rarely
/// needs a second request.
#[derive(Clone)]
pub struct EsploraClient {
    http: reqwest::Client,
    base_url: String,
    policy: RetryPolicy,
    semaphore: Arc<Semaphore>,
    error_count: Arc<AtomicU64>,
    prevouts: LookupCache<OutPointRef, TxOut>,
    heights: LookupCache<String, u32>,
}

impl EsploraClient {
    pub fn new(config: &EsploraConfig) -> SourceResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("wallet-fingerprinting/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                SourceError::ConnectionFailed(format!("Failed to create HTTP client: {}", e))
            })?;

        info!("Using Esplora API at {}", config.base_url);

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            policy: RetryPolicy::from(config),
            semaphore: Arc::new(Semaphore::new(config.concurrent_requests.max(1))),
            error_count: Arc::new(AtomicU64::new(0)),
            prevouts: LookupCache::new("prevout"),
            heights: LookupCache::new("height"),
        })
    }

    pub fn get_error_count(&self) -> u64 {
        self.error_count.load(Ordering::Relaxed)
    }

    pub fn get_cache_stats(&self) -> CacheStats {
        self.prevouts.get_stats()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET a path with bounded concurrency and retry, returning the body
    async fn get_text(&self, path: &str) -> SourceResult<String> {
        let _permit = self.semaphore.acquire().await.map_err(|e| {
            SourceError::ConnectionFailed(format!("Failed to acquire semaphore: {}", e))
        })?;

        let url = self.url(path);
        let timeout_seconds = self.policy.timeout_seconds;
        let this = self;
        let target = url.as_str();
        retry_with_backoff(&self.policy, &url, move || async move {
            let result = this.fetch_once(target, timeout_seconds).await;
            if result.is_err() {
                this.error_count.fetch_add(1, Ordering::Relaxed);
            }
            result
        })
        .await
    }

    async fn fetch_once(&self, url: &str, timeout_seconds: u64) -> SourceResult<String> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(url, timeout_seconds, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!("{} returned 404", url);
            return Err(SourceError::NotFound {
                resource: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(SourceError::Http {
                url: url.to_string(),
                message: format!("status {}", status),
            });
        }

        response
            .text()
            .await
            .map_err(|e| transport_error(url, timeout_seconds, e))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> SourceResult<T> {
        let body = self.get_text(path).await?;
        serde_json::from_str(&body)
            .map_err(|e| SourceError::DeserialisationFailed(format!("{}: {}", path, e)))
    }
}

fn transport_error(url: &str, timeout_seconds: u64, err: reqwest::Error) -> SourceError {
    if err.is_timeout() {
        SourceError::Timeout {
            timeout_seconds,
            operation: url.to_string(),
        }
    } else {
        SourceError::Http {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl ChainSource for EsploraClient {
    type RawTx = EsploraTx;

    async fn best_block_hash(&self) -> SourceResult<String> {
        let hash = self.get_text("blocks/tip/hash").await?;
        Ok(hash.trim().to_string())
    }

    async fn block_txids(&self, block_hash: &str) -> SourceResult<Vec<String>> {
        self.get_json(&format!("block/{}/txids", block_hash)).await
    }

    async fn raw_transaction(&self, txid: &str) -> SourceResult<EsploraTx> {
        check_txid(txid)?;
        self.get_json(&format!("tx/{}", txid)).await
    }

    async fn previous_output(&self, outpoint: &OutPointRef) -> SourceResult<TxOut> {
        if let Some(cached) = self.prevouts.get(outpoint) {
            return Ok(cached);
        }

        let funding = self.raw_transaction(&outpoint.txid).await?;
        let output = funding
            .vout
            .get(outpoint.vout as usize)
            .ok_or_else(|| SourceError::NotFound {
                resource: format!("output {}", outpoint),
            })?
            .to_txout(&outpoint.txid)
            .map_err(|e| SourceError::InvalidResponse(e.to_string()))?;

        self.prevouts.put(outpoint.clone(), output.clone());
        Ok(output)
    }
}

#[async_trait]
impl HeightLookup for EsploraClient {
    async fn confirmation_height(&self, txid: &str) -> SourceResult<Option<u32>> {
        let key = txid.to_string();
        if let Some(height) = self.heights.get(&key) {
            return Ok(Some(height));
        }

        check_txid(txid)?;
        let status: EsploraTxStatus = match self.get_json(&format!("tx/{}/status", txid)).await {
            Ok(status) => status,
            Err(SourceError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        match (status.confirmed, status.block_height) {
            (true, Some(height)) => {
                self.heights.put(key, height);
                Ok(Some(height))
            }
            _ => Ok(None),
        }
    }
}
