//! Per-wallet tallies for a batch of transactions

use crate::errors::TxError;
use crate::types::Wallet;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::ops::AddAssign;

/// Transactions attributed to one wallet, in batch order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WalletTally {
    pub count: usize,
    pub txids: Vec<String>,
}

/// A transaction that could not be classified
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedTransaction {
    pub txid: String,
    pub error: String,
}

impl From<&TxError> for FailedTransaction {
    fn from(err: &TxError) -> Self {
        Self {
            txid: err.txid().to_string(),
            error: err.to_string(),
        }
    }
}

/// Wallet verdict counts for a batch
///
/// Every wallet, including `UNCLEAR` and `OTHER`, is always present so the
/// serialised report has a stable shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletAnalyzeResult {
    tallies: BTreeMap<Wallet, WalletTally>,
    failures: Vec<FailedTransaction>,
}

impl Default for WalletAnalyzeResult {
    fn default() -> Self {
        Self::new()
    }
}

impl WalletAnalyzeResult {
    pub fn new() -> Self {
        Self {
            tallies: Wallet::ALL
                .into_iter()
                .map(|wallet| (wallet, WalletTally::default()))
                .collect(),
            failures: Vec::new(),
        }
    }

    pub fn record(&mut self, wallet: Wallet, txid: impl Into<String>) {
        let tally = self.tallies.entry(wallet).or_default();
        tally.count += 1;
        tally.txids.push(txid.into());
    }

    pub fn record_failure(&mut self, failure: FailedTransaction) {
        self.failures.push(failure);
    }

    pub fn tally(&self, wallet: Wallet) -> &WalletTally {
        // Every wallet is inserted by new() and never removed
        &self.tallies[&wallet]
    }

    pub fn count(&self, wallet: Wallet) -> usize {
        self.tally(wallet).count
    }

    pub fn txids(&self, wallet: Wallet) -> &[String] {
        &self.tally(wallet).txids
    }

    pub fn counts(&self) -> BTreeMap<Wallet, usize> {
        self.tallies
            .iter()
            .map(|(wallet, tally)| (*wallet, tally.count))
            .collect()
    }

    pub fn tallies(&self) -> impl Iterator<Item = (&Wallet, &WalletTally)> {
        self.tallies.iter()
    }

    /// Classified transactions, `UNCLEAR` and `OTHER` included
    pub fn total(&self) -> usize {
        self.tallies.values().map(|tally| tally.count).sum()
    }

    pub fn failures(&self) -> &[FailedTransaction] {
        &self.failures
    }

    pub fn merge(&mut self, other: WalletAnalyzeResult) {
        for (wallet, tally) in other.tallies {
            let entry = self.tallies.entry(wallet).or_default();
            entry.count += tally.count;
            entry.txids.extend(tally.txids);
        }
        self.failures.extend(other.failures);
    }
}

impl AddAssign for WalletAnalyzeResult {
    fn add_assign(&mut self, other: Self) {
        self.merge(other);
    }
}

/// Serialises as `{"BITCOIN_CORE": {"count": .., "txids": [..]}, .., "failures": [..]}`
impl Serialize for WalletAnalyzeResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.tallies.len() + 1))?;
        for (wallet, tally) in &self.tallies {
            map.serialize_entry(wallet, tally)?;
        }
        map.serialize_entry("failures", &self.failures)?;
        map.end()
    }
}
