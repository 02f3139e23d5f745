//! Wallet inference
//!
//! [`detect_wallet`] starts from every modelled wallet and folds the
//! [`rules::RULES`] over the candidate set, recording one [`Signal`] per rule.
//! The surviving set decides the verdict: one wallet names it, several are
//! [`Wallet::Unclear`], none is [`Wallet::Other`].

pub mod reasoning;
pub mod rules;

pub use reasoning::{ReasoningTrace, Signal};
pub use rules::{Discard, Rule, RULES};

use crate::heuristics::Features;
use crate::types::{ConfirmationHeights, Tx, Wallet};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::trace;

/// Outcome of inference for one transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Detection {
    pub txid: String,
    /// Modelled wallets consistent with every signal
    pub candidates: BTreeSet<Wallet>,
    pub verdict: Wallet,
    pub trace: ReasoningTrace,
}

impl Detection {
    pub fn is_ambiguous(&self) -> bool {
        self.verdict == Wallet::Unclear
    }
}

/// Infer the wallet that produced `tx`
pub fn detect_wallet(tx: &Tx, heights: &ConfirmationHeights) -> Detection {
    let features = Features::extract(tx, heights);
    detect_with_features(&tx.txid, &features)
}

/// Run the rule fold over already-extracted features
pub fn detect_with_features(txid: &str, features: &Features) -> Detection {
    let mut candidates: BTreeSet<Wallet> = Wallet::KNOWN.into_iter().collect();
    let mut trace = ReasoningTrace::new();

    for rule in RULES {
        let (signal, discard) = rule(features);
        let before = candidates.len();
        discard.apply(&mut candidates);
        if candidates.len() != before {
            trace!(
                "{}: {} narrowed candidates {} -> {}",
                txid,
                signal,
                before,
                candidates.len()
            );
        }
        trace.push(signal);
    }

    let verdict = verdict(&candidates);
    Detection {
        txid: txid.to_string(),
        candidates,
        verdict,
        trace,
    }
}

pub fn verdict(candidates: &BTreeSet<Wallet>) -> Wallet {
    let mut iter = candidates.iter();
    match (iter.next(), iter.next()) {
        (None, _) => Wallet::Other,
        (Some(wallet), None) => *wallet,
        (Some(_), Some(_)) => Wallet::Unclear,
    }
}
