//! Change output detection

use super::script::{sending_types, spending_types};
use crate::types::Tx;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Amounts that are a multiple of this are treated as user-chosen payments
const ROUND_AMOUNT_SATS: u64 = 100;

/// Position of the change output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeIndex {
    /// Single output, nothing returned to the sender
    NoChange,
    /// No heuristic singled out an output
    Inconclusive,
    Found(usize),
}

impl ChangeIndex {
    /// `-1` no change, `-2` inconclusive, otherwise the output index
    pub fn code(&self) -> i64 {
        match self {
            ChangeIndex::NoChange => -1,
            ChangeIndex::Inconclusive => -2,
            ChangeIndex::Found(index) => *index as i64,
        }
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            ChangeIndex::Found(index) => Some(*index),
            _ => None,
        }
    }
}

/// How the change output's script type relates to the other outputs and the inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeTypeMatch {
    /// Shared with another output only
    MatchedOutputs,
    /// Shared with another output and an input
    MatchedBoth,
    /// Shared with neither
    MatchedNeither,
    /// Shared with an input only
    MatchedInputs,
    /// No change output was identified
    NoChange,
}

impl ChangeTypeMatch {
    pub fn code(&self) -> i8 {
        match self {
            ChangeTypeMatch::MatchedOutputs => -1,
            ChangeTypeMatch::MatchedBoth | ChangeTypeMatch::MatchedNeither => 0,
            ChangeTypeMatch::MatchedInputs => 1,
            ChangeTypeMatch::NoChange => 2,
        }
    }
}

/// Locate the change output
///
/// In priority order: the only output sharing the inputs' common script
/// type, the only output paying back to a spent script, the only output
/// with a non-round amount.
pub fn change_index(tx: &Tx) -> ChangeIndex {
    if tx.vout.len() <= 1 {
        return ChangeIndex::NoChange;
    }

    let input_types = spending_types(tx);
    let output_types = sending_types(tx);

    let distinct_inputs: HashSet<_> = input_types.iter().collect();
    if distinct_inputs.len() == 1 {
        let common = &input_types[0];
        let matching: Vec<usize> = positions(&output_types, |t| t == common);
        if let [index] = matching.as_slice() {
            return ChangeIndex::Found(*index);
        }
    }

    let input_scripts: HashSet<&[u8]> = tx
        .vin
        .iter()
        .map(|input| input.prevout.scriptpubkey.as_bytes())
        .collect();
    let output_scripts: Vec<&[u8]> = tx
        .vout
        .iter()
        .map(|output| output.scriptpubkey.as_bytes())
        .collect();
    let shared: HashSet<&[u8]> = output_scripts
        .iter()
        .copied()
        .filter(|script| input_scripts.contains(script))
        .collect();
    if shared.len() == 1 {
        let matching = positions(&output_scripts, |script| shared.contains(script));
        if let [index] = matching.as_slice() {
            return ChangeIndex::Found(*index);
        }
    }

    let values: Vec<u64> = tx.vout.iter().map(|output| output.value).collect();
    match positions(&values, |value| value % ROUND_AMOUNT_SATS != 0).as_slice() {
        [index] => ChangeIndex::Found(*index),
        _ => ChangeIndex::Inconclusive,
    }
}

fn positions<T>(items: &[T], predicate: impl Fn(&T) -> bool) -> Vec<usize> {
    items
        .iter()
        .enumerate()
        .filter(|(_, item)| predicate(item))
        .map(|(index, _)| index)
        .collect()
}

/// Compare the change output's type with the remaining outputs and the inputs
pub fn change_type_match(tx: &Tx, change: ChangeIndex) -> ChangeTypeMatch {
    let Some(index) = change.index() else {
        return ChangeTypeMatch::NoChange;
    };
    let Some(change_output) = tx.vout.get(index) else {
        return ChangeTypeMatch::NoChange;
    };
    let change_type = &change_output.scriptpubkey_type;

    let in_outputs = tx
        .vout
        .iter()
        .enumerate()
        .any(|(i, output)| i != index && &output.scriptpubkey_type == change_type);
    let in_inputs = spending_types(tx).contains(change_type);

    match (in_outputs, in_inputs) {
        (true, true) => ChangeTypeMatch::MatchedBoth,
        (true, false) => ChangeTypeMatch::MatchedOutputs,
        (false, true) => ChangeTypeMatch::MatchedInputs,
        (false, false) => ChangeTypeMatch::MatchedNeither,
    }
}
