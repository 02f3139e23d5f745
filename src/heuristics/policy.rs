//! Transaction-level policy signals: version, replaceability, locktime

use crate::types::{ConfirmationHeights, Tx};
use serde::{Deserialize, Serialize};
use std::fmt;

/// nLockTime values at or above this are UNIX timestamps, not heights
pub const LOCKTIME_THRESHOLD: u32 = 500_000_000;

/// A locktime this close to the confirmation height is treated as anti-fee-sniping
pub const ANTI_FEE_SNIPING_WINDOW: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AntiFeeSniping {
    NotUsed,
    Possible,
    Likely,
}

impl AntiFeeSniping {
    /// `-1` not used, `0` possible, `1` likely
    pub fn code(&self) -> i8 {
        match self {
            AntiFeeSniping::NotUsed => -1,
            AntiFeeSniping::Possible => 0,
            AntiFeeSniping::Likely => 1,
        }
    }

    pub fn is_used(&self) -> bool {
        !matches!(self, AntiFeeSniping::NotUsed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxVersion {
    One,
    Two,
    Unknown(i64),
}

impl From<i64> for TxVersion {
    fn from(version: i64) -> Self {
        match version {
            1 => TxVersion::One,
            2 => TxVersion::Two,
            other => TxVersion::Unknown(other),
        }
    }
}

impl fmt::Display for TxVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxVersion::One => f.write_str("1"),
            TxVersion::Two => f.write_str("2"),
            TxVersion::Unknown(version) => write!(f, "unknown ({})", version),
        }
    }
}

/// True iff any input opts in to replacement
pub fn signals_rbf(tx: &Tx) -> bool {
    tx.vin.iter().any(|input| input.is_rbf())
}

/// Classify the locktime against the transaction's confirmation height
///
/// An unknown height or a timestamp locktime cannot be compared, which
/// leaves the result at "possible".
pub fn anti_fee_sniping(tx: &Tx, heights: &ConfirmationHeights) -> AntiFeeSniping {
    if tx.locktime == 0 {
        return AntiFeeSniping::NotUsed;
    }
    if tx.locktime >= LOCKTIME_THRESHOLD {
        return AntiFeeSniping::Possible;
    }
    match heights.get(&tx.txid) {
        Some(height) if i64::from(height) - i64::from(tx.locktime) < ANTI_FEE_SNIPING_WINDOW => {
            AntiFeeSniping::Likely
        }
        _ => AntiFeeSniping::Possible,
    }
}
