//! Tests for the data source plumbing
//!
//! These tests exercise retry, caching and the trait seams without a live
//! node or network access.

use crate::common::{self, txid, MockChain};
use anyhow::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wallet_fingerprinting::config::{BitcoinRpcConfig, EsploraConfig};
use wallet_fingerprinting::errors::SourceError;
use wallet_fingerprinting::source::{
    calculate_next_backoff, retry_with_backoff, ChainSource, EsploraClient, HeightLookup,
    LookupCache, RetryPolicy,
};
use wallet_fingerprinting::types::OutPointRef;

#[test]
fn test_retry_policy_from_configs() {
    let rpc = RetryPolicy::from(&BitcoinRpcConfig::default());
    assert_eq!(rpc.timeout_seconds, 60);
    assert_eq!(rpc.max_retries, 10);

    let esplora = RetryPolicy::from(&EsploraConfig::default());
    assert_eq!(esplora.max_retries, 5);
    assert_eq!(esplora.initial_backoff_ms, 250);
}

#[test]
fn test_backoff_sequence_caps() {
    let mut backoff = Duration::from_millis(250);
    let mut seen = Vec::new();
    for _ in 0..8 {
        backoff = calculate_next_backoff(backoff, 2.0, 10);
        seen.push(backoff);
    }
    assert_eq!(seen[0], Duration::from_millis(500));
    assert_eq!(*seen.last().unwrap(), Duration::from_secs(10));
}

#[tokio::test]
async fn test_invalid_txid_is_not_retried() -> Result<()> {
    let policy = RetryPolicy {
        timeout_seconds: 1,
        max_retries: 4,
        initial_backoff_ms: 1,
        backoff_multiplier: 2.0,
        max_backoff_seconds: 1,
    };
    let calls = AtomicUsize::new(0);
    let counter = &calls;

    let result: Result<(), SourceError> = retry_with_backoff(&policy, "tx", move || async move {
        counter.fetch_add(1, Ordering::SeqCst);
        Err(SourceError::InvalidTxid {
            txid: "xyz".to_string(),
        })
    })
    .await;

    assert!(matches!(result, Err(SourceError::InvalidTxid { .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn test_prevout_cache_stats() {
    let cache: LookupCache<OutPointRef, u64> = LookupCache::new("prevout");
    let outpoint = OutPointRef::new(txid("aa"), 1);

    cache.get(&outpoint);
    cache.put(outpoint.clone(), 200_000);
    cache.get(&outpoint);
    cache.get(&outpoint);

    let stats = cache.get_stats();
    assert_eq!(stats.total_requests(), 3);
    assert!((stats.hit_rate() - 66.666).abs() < 0.01);
}

#[tokio::test]
async fn test_esplora_client_rejects_bad_txid_locally() -> Result<()> {
    let client = EsploraClient::new(&EsploraConfig {
        base_url: "http://127.0.0.1:9/api/".to_string(),
        ..EsploraConfig::default()
    })?;

    let err = client.confirmation_height("nope").await.unwrap_err();
    assert!(matches!(err, SourceError::InvalidTxid { .. }));
    assert_eq!(client.get_error_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_shared_source_through_arc() -> Result<()> {
    let mut chain = MockChain::new(&txid("0b"));
    chain.fund_fixtures();
    chain.add_tx(common::core_wallet_tx(&txid("c0")), Some(800_001));
    let chain = Arc::new(chain);

    assert_eq!(chain.best_block_hash().await?, txid("0b"));
    assert_eq!(chain.confirmation_height(&txid("c0")).await?, Some(800_001));
    assert_eq!(chain.confirmation_height(&txid("99")).await?, None);

    let prevout = chain.previous_output(&OutPointRef::new(txid("dd"), 3)).await?;
    assert_eq!(prevout.value, 600_000);
    Ok(())
}
