use crate::heuristics::{AntiFeeSniping, ChangeTypeMatch, TxVersion};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One evaluated signal and the value that was observed
///
/// `None` marks a signal that does not apply to the transaction, such as
/// input ordering on a single-input spend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "signal", content = "value", rename_all = "snake_case")]
pub enum Signal {
    AntiFeeSniping(AntiFeeSniping),
    UncompressedPublicKeys(bool),
    TxVersion(TxVersion),
    LowRSignatures(bool),
    SignalsRbf(bool),
    ToTaproot(bool),
    ToOpReturn(bool),
    FromTaproot(bool),
    FromP2wsh(bool),
    FromP2pkh(bool),
    MultiTypeInputs(bool),
    ChangeTypeMatch(ChangeTypeMatch),
    AddressReuse(bool),
    MultipleOutputs(bool),
    Bip69Outputs(bool),
    Bip69Inputs(Option<bool>),
    HistoricalInputs(Option<bool>),
    ChangeLast(Option<bool>),
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

fn optional(value: Option<bool>) -> &'static str {
    value.map_or("n/a", yes_no)
}

impl Signal {
    pub fn name(&self) -> &'static str {
        match self {
            Signal::AntiFeeSniping(_) => "Anti-fee-sniping",
            Signal::UncompressedPublicKeys(_) => "Uncompressed public key(s)",
            Signal::TxVersion(_) => "nVersion",
            Signal::LowRSignatures(_) => "Low-r signatures only",
            Signal::SignalsRbf(_) => "Signals RBF",
            Signal::ToTaproot(_) => "Sends to taproot",
            Signal::ToOpReturn(_) => "Creates OP_RETURN output",
            Signal::FromTaproot(_) => "Spends taproot output",
            Signal::FromP2wsh(_) => "Spends P2WSH output",
            Signal::FromP2pkh(_) => "Spends P2PKH output",
            Signal::MultiTypeInputs(_) => "Multi-type inputs",
            Signal::ChangeTypeMatch(_) => "Change type matched",
            Signal::AddressReuse(_) => "Address reuse between inputs and outputs",
            Signal::MultipleOutputs(_) => "More than two outputs",
            Signal::Bip69Outputs(_) => "BIP-69 followed by outputs",
            Signal::Bip69Inputs(_) => "BIP-69 followed by inputs",
            Signal::HistoricalInputs(_) => "Inputs ordered historically",
            Signal::ChangeLast(_) => "Change is last output",
        }
    }

    pub fn value(&self) -> String {
        match self {
            Signal::AntiFeeSniping(afs) => match afs {
                AntiFeeSniping::NotUsed => "No".to_string(),
                AntiFeeSniping::Possible => "Possible".to_string(),
                AntiFeeSniping::Likely => "Likely".to_string(),
            },
            Signal::TxVersion(version) => version.to_string(),
            Signal::ChangeTypeMatch(matched) => match matched {
                ChangeTypeMatch::MatchedOutputs => "outputs only",
                ChangeTypeMatch::MatchedBoth => "inputs and outputs",
                ChangeTypeMatch::MatchedNeither => "neither",
                ChangeTypeMatch::MatchedInputs => "inputs only",
                ChangeTypeMatch::NoChange => "no change",
            }
            .to_string(),
            Signal::UncompressedPublicKeys(value)
            | Signal::LowRSignatures(value)
            | Signal::SignalsRbf(value)
            | Signal::ToTaproot(value)
            | Signal::ToOpReturn(value)
            | Signal::FromTaproot(value)
            | Signal::FromP2wsh(value)
            | Signal::FromP2pkh(value)
            | Signal::MultiTypeInputs(value)
            | Signal::AddressReuse(value)
            | Signal::MultipleOutputs(value)
            | Signal::Bip69Outputs(value) => yes_no(*value).to_string(),
            Signal::Bip69Inputs(value)
            | Signal::HistoricalInputs(value)
            | Signal::ChangeLast(value) => optional(*value).to_string(),
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name(), self.value())
    }
}

/// Append-only record of signals in evaluation order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReasoningTrace(Vec<Signal>);

impl ReasoningTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, signal: Signal) {
        self.0.push(signal);
    }

    pub fn signals(&self) -> &[Signal] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// One "name: value" line per signal
    pub fn to_readable(&self) -> Vec<String> {
        self.0.iter().map(Signal::to_string).collect()
    }
}
