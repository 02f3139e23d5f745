//! Input ordering and output structure

use super::change::ChangeIndex;
use crate::types::{ConfirmationHeights, Tx};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Orderings observed over a transaction's inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InputOrdering {
    Single,
    Ascending,
    Descending,
    Bip69,
    Historical,
    Unknown,
}

/// Shape of a transaction's outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutputStructure {
    Single,
    Double,
    Multi,
    ChangeLast,
    Bip69,
}

impl fmt::Display for InputOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InputOrdering::Single => "single",
            InputOrdering::Ascending => "ascending",
            InputOrdering::Descending => "descending",
            InputOrdering::Bip69 => "bip69",
            InputOrdering::Historical => "historical",
            InputOrdering::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

fn is_non_decreasing<T: PartialOrd>(items: &[T]) -> bool {
    items.windows(2).all(|pair| pair[0] <= pair[1])
}

fn is_non_increasing<T: PartialOrd>(items: &[T]) -> bool {
    items.windows(2).all(|pair| pair[0] >= pair[1])
}

/// Every ordering the inputs satisfy
///
/// Inputs whose funding transaction has no known confirmation height are
/// left out of the historical comparison.
pub fn input_ordering(tx: &Tx, heights: &ConfirmationHeights) -> BTreeSet<InputOrdering> {
    let mut orderings = BTreeSet::new();
    if tx.vin.len() == 1 {
        orderings.insert(InputOrdering::Single);
        return orderings;
    }

    let amounts: Vec<u64> = tx.vin.iter().map(|input| input.prevout.value).collect();
    if is_non_decreasing(&amounts) {
        orderings.insert(InputOrdering::Ascending);
    }
    if is_non_increasing(&amounts) {
        orderings.insert(InputOrdering::Descending);
    }

    let outpoints: Vec<String> = tx.vin.iter().map(|input| input.outpoint().to_string()).collect();
    if is_non_decreasing(&outpoints) {
        orderings.insert(InputOrdering::Bip69);
    }

    let known_heights: Vec<u32> = tx
        .vin
        .iter()
        .filter_map(|input| heights.get(&input.txid))
        .collect();
    if is_non_decreasing(&known_heights) {
        orderings.insert(InputOrdering::Historical);
    }

    if orderings.is_empty() {
        orderings.insert(InputOrdering::Unknown);
    }
    orderings
}

/// Structure of the outputs given the already-detected change position
pub fn output_structure(tx: &Tx, change: ChangeIndex) -> BTreeSet<OutputStructure> {
    let mut structure = BTreeSet::new();
    if tx.vout.len() == 1 {
        structure.insert(OutputStructure::Single);
        return structure;
    }

    structure.insert(if tx.vout.len() == 2 {
        OutputStructure::Double
    } else {
        OutputStructure::Multi
    });

    if change == ChangeIndex::Found(tx.vout.len() - 1) {
        structure.insert(OutputStructure::ChangeLast);
    }

    if bip69_outputs(tx) {
        structure.insert(OutputStructure::Bip69);
    }
    structure
}

/// Outputs sorted by amount, equal amounts by script bytes
fn bip69_outputs(tx: &Tx) -> bool {
    let keys: Vec<(u64, &[u8])> = tx
        .vout
        .iter()
        .map(|output| (output.value, output.scriptpubkey.as_bytes()))
        .collect();
    is_non_decreasing(&keys)
}
