//! Canonical transaction model
//!
//! Every feature extractor consumes these types. They are produced by the
//! normaliser from whatever shape a data source returns, and the order of
//! `vin`/`vout` is preserved exactly as observed on-chain.

pub mod script_type;
pub mod wallet;

pub use script_type::ScriptPubKeyType;
pub use wallet::Wallet;

use bitcoin::{ScriptBuf, Witness};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Sequence number that opts out of replaceability
pub const SEQUENCE_FINAL: u32 = 0xFFFF_FFFF;

/// Reference to a spent output, rendered as `"{txid}:{vout}"`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutPointRef {
    pub txid: String,
    pub vout: u32,
}

impl OutPointRef {
    pub fn new(txid: impl Into<String>, vout: u32) -> Self {
        Self {
            txid: txid.into(),
            vout,
        }
    }
}

impl fmt::Display for OutPointRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.vout)
    }
}

/// A transaction output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOut {
    pub scriptpubkey: ScriptBuf,
    pub scriptpubkey_type: ScriptPubKeyType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scriptpubkey_address: Option<String>,
    /// Amount in satoshis
    pub value: u64,
}

/// A transaction input together with the output it spends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxIn {
    pub txid: String,
    pub vout: u32,
    pub sequence: u32,
    pub scriptsig: ScriptBuf,
    pub scriptsig_asm: String,
    #[serde(default)]
    pub witness: Witness,
    pub prevout: TxOut,
}

impl TxIn {
    pub fn outpoint(&self) -> OutPointRef {
        OutPointRef::new(self.txid.clone(), self.vout)
    }

    pub fn is_rbf(&self) -> bool {
        self.sequence < SEQUENCE_FINAL
    }
}

/// Canonical transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tx {
    pub txid: String,
    pub version: i64,
    pub locktime: u32,
    pub vin: Vec<TxIn>,
    pub vout: Vec<TxOut>,
}

/// Confirmation heights keyed by txid
///
/// A missing entry means the transaction is unconfirmed or its height could
/// not be looked up (the `-1` sentinel of the height service).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfirmationHeights {
    heights: HashMap<String, u32>,
}

impl ConfirmationHeights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, txid: impl Into<String>, height: Option<u32>) {
        if let Some(height) = height {
            self.heights.insert(txid.into(), height);
        }
    }

    pub fn get(&self, txid: &str) -> Option<u32> {
        self.heights.get(txid).copied()
    }

    pub fn len(&self) -> usize {
        self.heights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, u32)> for ConfirmationHeights {
    fn from_iter<I: IntoIterator<Item = (S, u32)>>(iter: I) -> Self {
        Self {
            heights: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
