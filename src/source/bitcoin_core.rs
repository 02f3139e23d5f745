use super::{
    check_txid, execute_with_timeout, retry_with_backoff, CacheStats, ChainSource, HeightLookup,
    LookupCache, RetryPolicy,
};
use crate::config::BitcoinRpcConfig;
use crate::errors::{SourceError, SourceResult};
use crate::normalise::CoreTx;
use crate::types::{OutPointRef, TxOut};
use async_trait::async_trait;
use corepc_client::client_sync::{v28::Client, Auth};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info};

/// Messages Bitcoin Core returns for objects it does not have
const NOT_FOUND_MESSAGES: [&str; 3] = [
    "No such mempool or blockchain transaction",
    "Invalid or non-wallet transaction id",
    "Block not found",
];

/// Bitcoin Core JSON-RPC backend
///
/// Transactions are requested verbose (`getrawtransaction <txid> true`) so the
/// node does the decoding; previous outputs come from the funding transaction.
/// Requires `txindex=1` for arbitrary historical transactions.
#[derive(Clone)]
pub struct BitcoinCoreClient {
    client: Arc<Client>,
    policy: RetryPolicy,
    semaphore: Arc<Semaphore>,
    error_count: Arc<AtomicU64>,
    prevouts: LookupCache<OutPointRef, TxOut>,
    heights: LookupCache<String, u32>,
}

impl BitcoinCoreClient {
    /// Create a new RPC client and check the node is reachable
    pub async fn new(config: &BitcoinRpcConfig) -> SourceResult<Self> {
        let client = Self::create_sync_client(config)?;

        tokio::task::spawn_blocking({
            let client = Arc::clone(&client);
            move || -> SourceResult<()> {
                client.get_blockchain_info().map_err(|e| {
                    SourceError::ConnectionFailed(format!(
                        "Failed to connect to Bitcoin RPC - check URL, credentials, and that Bitcoin Core is running: {}",
                        e
                    ))
                })?;
                Ok(())
            }
        })
        .await
        .map_err(|e| {
            SourceError::ConnectionFailed(format!("Connection test task failed: {}", e))
        })??;

        info!("Bitcoin RPC connection established successfully");

        Ok(Self {
            client,
            policy: RetryPolicy::from(config),
            semaphore: Arc::new(Semaphore::new(config.concurrent_requests.max(1))),
            error_count: Arc::new(AtomicU64::new(0)),
            prevouts: LookupCache::new("prevout"),
            heights: LookupCache::new("height"),
        })
    }

    /// Get the current error count from RPC operations
    pub fn get_error_count(&self) -> u64 {
        self.error_count.load(Ordering::Relaxed)
    }

    pub fn get_cache_stats(&self) -> CacheStats {
        self.prevouts.get_stats()
    }

    pub async fn block_count(&self) -> SourceResult<u64> {
        self.call("getblockcount", vec![]).await
    }

    fn create_sync_client(config: &BitcoinRpcConfig) -> SourceResult<Arc<Client>> {
        let auth = Auth::UserPass(config.username.clone(), config.password.clone());
        let client = Client::new_with_auth(&config.url, auth).map_err(|e| {
            SourceError::ConnectionFailed(format!("Failed to create Bitcoin RPC client: {}", e))
        })?;

        Ok(Arc::new(client))
    }

    /// Issue one RPC with bounded concurrency, timeout and retry
    async fn call<T: DeserializeOwned>(&self, method: &str, params: Vec<Value>) -> SourceResult<T> {
        let _permit = self.semaphore.acquire().await.map_err(|e| {
            SourceError::ConnectionFailed(format!("Failed to acquire semaphore: {}", e))
        })?;

        let timeout_seconds = self.policy.timeout_seconds;
        let value = retry_with_backoff(&self.policy, method, || {
            let client = Arc::clone(&self.client);
            let error_count = Arc::clone(&self.error_count);
            let params = params.clone();
            let method = method.to_string();
            async move {
                let operation = method.clone();
                let result = match execute_with_timeout(timeout_seconds, move || {
                    client
                        .call::<Value>(&method, &params)
                        .map_err(|e| classify_rpc_error(&method, e.to_string()))
                })
                .await
                {
                    Ok(Ok(result)) => result,
                    Ok(Err(e)) => Err(SourceError::CallFailed {
                        method: "spawn_blocking".to_string(),
                        message: format!("Task execution error: {}", e),
                    }),
                    Err(_) => Err(SourceError::Timeout {
                        timeout_seconds,
                        operation,
                    }),
                };
                if result.is_err() {
                    error_count.fetch_add(1, Ordering::Relaxed);
                }
                result
            }
        })
        .await?;

        serde_json::from_value(value).map_err(|e| {
            SourceError::DeserialisationFailed(format!("{} response: {}", method, e))
        })
    }
}

/// Not-found responses are permanent; anything else may be transient
fn classify_rpc_error(method: &str, message: String) -> SourceError {
    if NOT_FOUND_MESSAGES.iter().any(|m| message.contains(m)) {
        debug!("{} reported missing object: {}", method, message);
        SourceError::NotFound { resource: message }
    } else {
        SourceError::CallFailed {
            method: method.to_string(),
            message,
        }
    }
}

#[async_trait]
impl ChainSource for BitcoinCoreClient {
    type RawTx = CoreTx;

    async fn best_block_hash(&self) -> SourceResult<String> {
        self.call("getbestblockhash", vec![]).await
    }

    async fn block_txids(&self, block_hash: &str) -> SourceResult<Vec<String>> {
        let block: Value = self.call("getblock", vec![json!(block_hash), json!(1)]).await?;
        let txids = block.get("tx").cloned().ok_or_else(|| {
            SourceError::InvalidResponse(format!("block {} has no tx list", block_hash))
        })?;
        serde_json::from_value(txids).map_err(|e| {
            SourceError::DeserialisationFailed(format!("block {} tx list: {}", block_hash, e))
        })
    }

    async fn raw_transaction(&self, txid: &str) -> SourceResult<CoreTx> {
        check_txid(txid)?;
        self.call("getrawtransaction", vec![json!(txid), json!(true)])
            .await
    }

    async fn previous_output(&self, outpoint: &OutPointRef) -> SourceResult<TxOut> {
        if let Some(cached) = self.prevouts.get(outpoint) {
            return Ok(cached);
        }

        let funding = self.raw_transaction(&outpoint.txid).await?;
        let output = funding
            .vout
            .iter()
            .find(|out| out.n == outpoint.vout)
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
impl HeightLookup for BitcoinCoreClient {
    async fn confirmation_height(&self, txid: &str) -> SourceResult<Option<u32>> {
        let key = txid.to_string();
        if let Some(height) = self.heights.get(&key) {
            return Ok(Some(height));
        }

        let tx = match self.raw_transaction(txid).await {
            Ok(tx) => tx,
            Err(SourceError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        let Some(block_hash) = tx.blockhash else {
            debug!("{} is unconfirmed", txid);
            return Ok(None);
        };

        let header: Value = self
            .call("getblockheader", vec![json!(block_hash), json!(true)])
            .await?;
        let height = header
            .get("height")
            .and_then(Value::as_u64)
            .and_then(|h| u32::try_from(h).ok())
            .ok_or_else(|| {
                SourceError::InvalidResponse(format!("block header {} has no height", block_hash))
            })?;

        // Only confirmed heights are cached, an unconfirmed tx may confirm later
        self.heights.put(key, height);
        Ok(Some(height))
    }
}
