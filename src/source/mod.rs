//! Blockchain data sources
//!
//! This module provides the two backends transactions can be read from:
//! - **Bitcoin Core** - JSON-RPC via `corepc-client`, blocking calls run on the blocking pool
//! - **Esplora** - mempool.space style REST API via `reqwest`
//!
//! Both implement [`ChainSource`] for raw transactions and block contents and
//! [`HeightLookup`] for confirmation heights. They share the retry policy,
//! bounded concurrency and lookup caches defined here.

pub mod bitcoin_core;
pub mod cache;
pub mod esplora;
pub mod retry;

pub use bitcoin_core::BitcoinCoreClient;
pub use cache::{CacheStats, LookupCache};
pub use esplora::EsploraClient;
pub use retry::{calculate_next_backoff, execute_with_timeout, retry_with_backoff, RetryPolicy};

use crate::errors::{SourceError, SourceResult};
use crate::normalise::RawTransaction;
use crate::types::{OutPointRef, TxOut};
use async_trait::async_trait;
use bitcoin::Txid;
use std::str::FromStr;
use std::sync::Arc;

/// Read access to transactions and blocks
#[async_trait]
pub trait ChainSource: Send + Sync {
    /// Backend-native transaction shape
    type RawTx: RawTransaction + Send;

    async fn best_block_hash(&self) -> SourceResult<String>;

    /// Txids of a block in block order, coinbase first
    async fn block_txids(&self, block_hash: &str) -> SourceResult<Vec<String>>;

    async fn raw_transaction(&self, txid: &str) -> SourceResult<Self::RawTx>;

    /// The output an input spends, for shapes that do not embed it
    async fn previous_output(&self, outpoint: &OutPointRef) -> SourceResult<TxOut>;
}

/// Confirmation height of a transaction
///
/// `Ok(None)` means unconfirmed or unknown; callers treat both the same.
#[async_trait]
pub trait HeightLookup: Send + Sync {
    async fn confirmation_height(&self, txid: &str) -> SourceResult<Option<u32>>;
}

/// Reject a malformed txid before it costs a round trip
pub(crate) fn check_txid(txid: &str) -> SourceResult<()> {
    Txid::from_str(txid)
        .map(|_| ())
        .map_err(|_| SourceError::InvalidTxid {
            txid: txid.to_string(),
        })
}

#[async_trait]
impl<T: ChainSource + ?Sized> ChainSource for Arc<T> {
    type RawTx = T::RawTx;

    async fn best_block_hash(&self) -> SourceResult<String> {
        (**self).best_block_hash().await
    }

    async fn block_txids(&self, block_hash: &str) -> SourceResult<Vec<String>> {
        (**self).block_txids(block_hash).await
    }

    async fn raw_transaction(&self, txid: &str) -> SourceResult<Self::RawTx> {
        (**self).raw_transaction(txid).await
    }

    async fn previous_output(&self, outpoint: &OutPointRef) -> SourceResult<TxOut> {
        (**self).previous_output(outpoint).await
    }
}

#[async_trait]
impl<T: HeightLookup + ?Sized> HeightLookup for Arc<T> {
    async fn confirmation_height(&self, txid: &str) -> SourceResult<Option<u32>> {
        (**self).confirmation_height(txid).await
    }
}
