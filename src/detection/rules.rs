//! Discard rules, one per signal, in evaluation order
//!
//! A rule reads the extracted [`Features`] and returns the [`Signal`] it
//! observed together with the [`Discard`] it implies. Rules never add a
//! wallet back, so the final candidate set does not depend on their order;
//! the order only fixes the layout of the reasoning trace.

use super::reasoning::Signal;
use crate::heuristics::{
    ChangeIndex, ChangeTypeMatch, Features, InputOrdering, OutputStructure, TxVersion,
};
use crate::types::Wallet::{
    self, BitcoinCore, BlueWallet, Coinbase, Electrum, Exodus, Ledger, Trezor, Trust,
};
use std::collections::BTreeSet;

/// Effect of one rule on the candidate set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discard {
    Keep,
    Remove(&'static [Wallet]),
    /// Intersect with the given wallets
    RetainOnly(&'static [Wallet]),
    Clear,
}

impl Discard {
    pub fn apply(&self, candidates: &mut BTreeSet<Wallet>) {
        match self {
            Discard::Keep => {}
            Discard::Remove(wallets) => candidates.retain(|w| !wallets.contains(w)),
            Discard::RetainOnly(wallets) => candidates.retain(|w| wallets.contains(w)),
            Discard::Clear => candidates.clear(),
        }
    }
}

pub type Rule = fn(&Features) -> (Signal, Discard);

pub const RULES: [Rule; 18] = [
    anti_fee_sniping,
    uncompressed_keys,
    tx_version,
    low_r,
    rbf,
    to_taproot,
    to_op_return,
    from_taproot,
    from_p2wsh,
    from_p2pkh,
    multi_type_inputs,
    change_type,
    address_reuse,
    multiple_outputs,
    bip69_outputs,
    bip69_inputs,
    historical_inputs,
    change_last,
];

fn when(condition: bool, discard: Discard) -> Discard {
    if condition {
        discard
    } else {
        Discard::Keep
    }
}

/// Only Bitcoin Core and Electrum set a recent locktime
pub fn anti_fee_sniping(f: &Features) -> (Signal, Discard) {
    let discard = if f.anti_fee_sniping.is_used() {
        Discard::RetainOnly(&[BitcoinCore, Electrum])
    } else {
        Discard::Remove(&[BitcoinCore, Electrum])
    };
    (Signal::AntiFeeSniping(f.anti_fee_sniping), discard)
}

/// No modelled wallet produces uncompressed keys
pub fn uncompressed_keys(f: &Features) -> (Signal, Discard) {
    let uncompressed = !f.compressed_pubkeys_only;
    (
        Signal::UncompressedPublicKeys(uncompressed),
        when(uncompressed, Discard::Clear),
    )
}

pub fn tx_version(f: &Features) -> (Signal, Discard) {
    let discard = match f.tx_version {
        TxVersion::One => Discard::Remove(&[BitcoinCore, Electrum, BlueWallet, Exodus, Coinbase]),
        TxVersion::Two => Discard::Remove(&[Ledger, Trezor, Trust]),
        TxVersion::Unknown(_) => Discard::Clear,
    };
    (Signal::TxVersion(f.tx_version), discard)
}

pub fn low_r(f: &Features) -> (Signal, Discard) {
    (
        Signal::LowRSignatures(f.low_r_only),
        when(!f.low_r_only, Discard::Remove(&[BitcoinCore, Electrum])),
    )
}

pub fn rbf(f: &Features) -> (Signal, Discard) {
    let discard = if f.signals_rbf {
        Discard::Remove(&[Coinbase, Exodus])
    } else {
        Discard::Remove(&[BitcoinCore, Electrum, BlueWallet, Ledger, Trezor, Trust])
    };
    (Signal::SignalsRbf(f.signals_rbf), discard)
}

pub fn to_taproot(f: &Features) -> (Signal, Discard) {
    let observed = f.sends_to_taproot();
    (
        Signal::ToTaproot(observed),
        when(observed, Discard::Remove(&[Coinbase])),
    )
}

pub fn to_op_return(f: &Features) -> (Signal, Discard) {
    let observed = f.creates_op_return();
    (
        Signal::ToOpReturn(observed),
        when(
            observed,
            Discard::Remove(&[Coinbase, Exodus, BlueWallet, Ledger, Trust]),
        ),
    )
}

pub fn from_taproot(f: &Features) -> (Signal, Discard) {
    let observed = f.spends_taproot();
    (
        Signal::FromTaproot(observed),
        when(
            observed,
            Discard::Remove(&[Coinbase, Exodus, Electrum, BlueWallet, Ledger, Trust]),
        ),
    )
}

pub fn from_p2wsh(f: &Features) -> (Signal, Discard) {
    let observed = f.spends_p2wsh();
    (
        Signal::FromP2wsh(observed),
        when(observed, Discard::Remove(&[Coinbase, Exodus, Trust, Trezor])),
    )
}

pub fn from_p2pkh(f: &Features) -> (Signal, Discard) {
    let observed = f.spends_p2pkh();
    (
        Signal::FromP2pkh(observed),
        when(observed, Discard::Remove(&[Exodus, Trust])),
    )
}

pub fn multi_type_inputs(f: &Features) -> (Signal, Discard) {
    (
        Signal::MultiTypeInputs(f.multi_type_inputs),
        when(
            f.multi_type_inputs,
            Discard::Remove(&[Exodus, Electrum, BlueWallet, Ledger, Trezor, Trust]),
        ),
    )
}

/// Both and neither carry no discard
pub fn change_type(f: &Features) -> (Signal, Discard) {
    let discard = match f.change_type_match {
        ChangeTypeMatch::MatchedOutputs => Discard::RetainOnly(&[BitcoinCore]),
        ChangeTypeMatch::MatchedInputs => Discard::Remove(&[BitcoinCore]),
        ChangeTypeMatch::MatchedBoth
        | ChangeTypeMatch::MatchedNeither
        | ChangeTypeMatch::NoChange => Discard::Keep,
    };
    (Signal::ChangeTypeMatch(f.change_type_match), discard)
}

pub fn address_reuse(f: &Features) -> (Signal, Discard) {
    let discard = if f.address_reuse {
        Discard::Remove(&[Coinbase, BitcoinCore, Electrum, BlueWallet, Ledger, Trezor])
    } else {
        Discard::Remove(&[Exodus, Trust])
    };
    (Signal::AddressReuse(f.address_reuse), discard)
}

pub fn multiple_outputs(f: &Features) -> (Signal, Discard) {
    let multi = f.output_structure.contains(&OutputStructure::Multi);
    (
        Signal::MultipleOutputs(multi),
        when(multi, Discard::Remove(&[Coinbase, Exodus, Ledger, Trust])),
    )
}

/// A single output carries no BIP-69 marker and counts as not followed
pub fn bip69_outputs(f: &Features) -> (Signal, Discard) {
    let followed = f.output_structure.contains(&OutputStructure::Bip69);
    (
        Signal::Bip69Outputs(followed),
        when(!followed, Discard::Remove(&[Electrum, Trezor])),
    )
}

pub fn bip69_inputs(f: &Features) -> (Signal, Discard) {
    if f.input_ordering.contains(&InputOrdering::Single) {
        return (Signal::Bip69Inputs(None), Discard::Keep);
    }
    let followed = f.input_ordering.contains(&InputOrdering::Bip69);
    (
        Signal::Bip69Inputs(Some(followed)),
        when(!followed, Discard::Remove(&[Electrum, Trezor])),
    )
}

pub fn historical_inputs(f: &Features) -> (Signal, Discard) {
    if f.input_ordering.contains(&InputOrdering::Single) {
        return (Signal::HistoricalInputs(None), Discard::Keep);
    }
    let historical = f.input_ordering.contains(&InputOrdering::Historical);
    (
        Signal::HistoricalInputs(Some(historical)),
        when(!historical, Discard::Remove(&[Ledger])),
    )
}

pub fn change_last(f: &Features) -> (Signal, Discard) {
    let ChangeIndex::Found(index) = f.change_index else {
        return (Signal::ChangeLast(None), Discard::Keep);
    };
    let last = index + 1 == f.output_count;
    (
        Signal::ChangeLast(Some(last)),
        when(!last, Discard::Remove(&[Ledger, BlueWallet, Coinbase])),
    )
}
