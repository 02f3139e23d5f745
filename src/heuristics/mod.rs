//! Feature extractors over a canonical transaction
//!
//! Every extractor is a pure function of a [`Tx`], plus pre-fetched
//! [`ConfirmationHeights`] for the two that need chain context (historical
//! input ordering and anti-fee-sniping). [`Features::extract`] evaluates all
//! of them once so the detection rules read from a single snapshot.

pub mod change;
pub mod ordering;
pub mod policy;
pub mod script;

pub use change::{change_index, change_type_match, ChangeIndex, ChangeTypeMatch};
pub use ordering::{input_ordering, output_structure, InputOrdering, OutputStructure};
pub use policy::{anti_fee_sniping, signals_rbf, AntiFeeSniping, TxVersion};
pub use script::{
    address_reuse, compressed_pubkeys_only, low_r_only, multi_type_inputs, sending_types,
    spending_types,
};

use crate::types::{ConfirmationHeights, ScriptPubKeyType, Tx};
use std::collections::BTreeSet;

/// Every signal extracted from one transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Features {
    pub spending_types: Vec<ScriptPubKeyType>,
    pub sending_types: Vec<ScriptPubKeyType>,
    pub tx_version: TxVersion,
    pub compressed_pubkeys_only: bool,
    pub low_r_only: bool,
    pub signals_rbf: bool,
    pub anti_fee_sniping: AntiFeeSniping,
    pub multi_type_inputs: bool,
    pub address_reuse: bool,
    pub change_index: ChangeIndex,
    pub change_type_match: ChangeTypeMatch,
    pub input_ordering: BTreeSet<InputOrdering>,
    pub output_structure: BTreeSet<OutputStructure>,
    pub output_count: usize,
}

impl Features {
    pub fn extract(tx: &Tx, heights: &ConfirmationHeights) -> Self {
        let change = change_index(tx);
        Self {
            spending_types: spending_types(tx),
            sending_types: sending_types(tx),
            tx_version: TxVersion::from(tx.version),
            compressed_pubkeys_only: compressed_pubkeys_only(tx),
            low_r_only: low_r_only(tx),
            signals_rbf: signals_rbf(tx),
            anti_fee_sniping: anti_fee_sniping(tx, heights),
            multi_type_inputs: multi_type_inputs(tx),
            address_reuse: address_reuse(tx),
            change_index: change,
            change_type_match: change_type_match(tx, change),
            input_ordering: input_ordering(tx, heights),
            output_structure: output_structure(tx, change),
            output_count: tx.vout.len(),
        }
    }

    pub fn sends_to_taproot(&self) -> bool {
        self.sending_types.contains(&ScriptPubKeyType::P2tr)
    }

    pub fn creates_op_return(&self) -> bool {
        self.sending_types.contains(&ScriptPubKeyType::OpReturn)
    }

    pub fn spends_taproot(&self) -> bool {
        self.spending_types.contains(&ScriptPubKeyType::P2tr)
    }

    pub fn spends_p2wsh(&self) -> bool {
        self.spending_types.contains(&ScriptPubKeyType::P2wsh)
    }

    pub fn spends_p2pkh(&self) -> bool {
        self.spending_types.contains(&ScriptPubKeyType::P2pkh)
    }
}
