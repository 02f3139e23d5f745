//! Fetch, normalise and classify transactions against a data source
//!
//! ## Overview
//!
//! [`Analyser`] is built with explicit collaborators: a [`ChainSource`] for
//! transactions and previous outputs and a [`HeightLookup`] for confirmation
//! heights. It exposes the three caller-facing operations:
//!
//! - **get_tx** - fetch one transaction and normalise it into a canonical [`Tx`]
//! - **detect** - fingerprint one transaction
//! - **analyze_block** - tally verdicts over a block, coinbase excluded
//!
//! Transactions are independent. A failure is recorded against its txid in
//! the [`WalletAnalyzeResult`] and the batch carries on.
//!
//! ## Usage
//!
//! ```no_run
//! use wallet_fingerprinting::analysis::Analyser;
//! use wallet_fingerprinting::config::EsploraConfig;
//! use wallet_fingerprinting::errors::AppResult;
//! use wallet_fingerprinting::source::EsploraClient;
//!
//! async fn example() -> AppResult<()> {
//!     let esplora = EsploraClient::new(&EsploraConfig::default())?;
//!     let analyser = Analyser::new(esplora.clone(), esplora, 8);
//!
//!     let block = analyser.analyze_block(None, Some(50)).await?;
//!     println!("{} classified", block.result.total());
//!     Ok(())
//! }
//! ```

pub mod report;
pub mod result;

pub use report::{OutputFormat, ReportFormatter};
pub use result::{FailedTransaction, WalletAnalyzeResult, WalletTally};

use crate::detection::{detect_wallet, Detection};
use crate::errors::{SourceResult, TxError};
use crate::normalise::{PrevoutMap, RawTransaction};
use crate::source::{ChainSource, HeightLookup};
use crate::types::{ConfirmationHeights, Tx};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Outcome of [`Analyser::analyze_block`]
#[derive(Debug, Clone, Serialize)]
pub struct BlockAnalysis {
    pub block_hash: String,
    pub analysed_at: DateTime<Utc>,
    /// Transactions attempted, coinbase excluded
    pub transactions_analysed: usize,
    pub result: WalletAnalyzeResult,
}

pub struct Analyser<S, H> {
    source: S,
    heights: H,
    concurrency: usize,
}

impl<S, H> Analyser<S, H>
where
    S: ChainSource,
    H: HeightLookup,
{
    /// `concurrency` bounds the transactions in flight, zero is treated as one
    pub fn new(source: S, heights: H, concurrency: usize) -> Self {
        Self {
            source,
            heights,
            concurrency: concurrency.max(1),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn height_lookup(&self) -> &H {
        &self.heights
    }

    /// Fetch a transaction and normalise it, resolving any previous outputs
    /// the backend shape does not embed
    pub async fn get_tx(&self, txid: &str) -> Result<Tx, TxError> {
        let raw = self
            .source
            .raw_transaction(txid)
            .await
            .map_err(|e| TxError::from_fetch(txid, e))?;

        let missing = raw.missing_prevouts();
        let mut prevouts = PrevoutMap::with_capacity(missing.len());
        if !missing.is_empty() {
            debug!("{}: resolving {} previous outputs", txid, missing.len());
        }

        let resolved: Vec<_> = stream::iter(missing)
            .map(|outpoint| async move {
                let output = self.source.previous_output(&outpoint).await;
                (outpoint, output)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        for (outpoint, output) in resolved {
            match output {
                Ok(output) => {
                    prevouts.insert(outpoint, output);
                }
                Err(e) => {
                    return Err(TxError::malformed(
                        txid,
                        format!("unresolved prevout {}: {}", outpoint, e),
                    ))
                }
            }
        }

        raw.normalise(&prevouts)
    }

    /// Heights of `tx` and of every transaction it spends from
    ///
    /// Lookup failures are logged and leave the height unknown.
    pub async fn confirmation_heights(&self, tx: &Tx) -> ConfirmationHeights {
        let txids: BTreeSet<&str> = std::iter::once(tx.txid.as_str())
            .chain(tx.vin.iter().map(|input| input.txid.as_str()))
            .collect();

        let lookups: Vec<_> = stream::iter(txids)
            .map(|txid| async move { (txid, self.heights.confirmation_height(txid).await) })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut heights = ConfirmationHeights::new();
        for (txid, height) in lookups {
            match height {
                Ok(height) => heights.insert(txid, height),
                Err(e) => warn!("Height lookup failed for {}, treating as unknown: {}", txid, e),
            }
        }
        heights
    }

    /// Fingerprint one transaction
    pub async fn detect(&self, txid: &str) -> Result<Detection, TxError> {
        let tx = self.get_tx(txid).await?;
        let heights = self.confirmation_heights(&tx).await;
        let detection = detect_wallet(&tx, &heights);
        debug!("{} -> {}", txid, detection.verdict);
        Ok(detection)
    }

    /// Classify `txids` concurrently, tallying in input order
    pub async fn analyze_txs(&self, txids: &[String]) -> WalletAnalyzeResult {
        let mut result = WalletAnalyzeResult::new();
        let mut detections = stream::iter(txids)
            .map(|txid| self.detect(txid))
            .buffered(self.concurrency);

        while let Some(outcome) = detections.next().await {
            match outcome {
                Ok(detection) => result.record(detection.verdict, detection.txid),
                Err(e) => {
                    warn!("Skipping {}: {}", e.txid(), e);
                    result.record_failure(FailedTransaction::from(&e));
                }
            }
        }
        result
    }

    /// Classify the transactions of a block, the tip when `block_hash` is
    /// `None`, optionally only the first `limit` after the coinbase
    pub async fn analyze_block(
        &self,
        block_hash: Option<&str>,
        limit: Option<usize>,
    ) -> SourceResult<BlockAnalysis> {
        let block_hash = match block_hash {
            Some(hash) => hash.to_string(),
            None => self.source.best_block_hash().await?,
        };

        let mut txids = self.source.block_txids(&block_hash).await?;
        if !txids.is_empty() {
            txids.remove(0);
        }
        if let Some(limit) = limit.filter(|&limit| limit > 0) {
            txids.truncate(limit);
        }

        info!(
            "Analysing {} transactions from block {}",
            txids.len(),
            block_hash
        );
        let result = self.analyze_txs(&txids).await;
        info!(
            "Block {}: {} classified, {} failed",
            block_hash,
            result.total(),
            result.failures().len()
        );

        Ok(BlockAnalysis {
            block_hash,
            analysed_at: Utc::now(),
            transactions_analysed: txids.len(),
            result,
        })
    }
}
