//! Strict normalisation of backend transaction shapes into the canonical model
//!
//! Each backend decodes transactions into its own native shape. A shape
//! implements [`RawTransaction`], reports which previous outputs it could not
//! embed, and is turned into a canonical [`Tx`] once those outputs have been
//! resolved. There is one path and it fails loudly: a missing or mistyped
//! field is a [`TxError::MalformedTransaction`], never a partial `Tx`.

pub mod bitcoin_core;
pub mod esplora;

pub use bitcoin_core::{CoreScriptPubKey, CoreScriptSig, CoreTx, CoreTxIn, CoreTxOut};
pub use esplora::{EsploraTx, EsploraTxIn, EsploraTxOut, EsploraTxStatus};

use crate::errors::TxError;
use crate::types::{OutPointRef, ScriptPubKeyType, Tx, TxIn, TxOut};
use bitcoin::script::Instruction;
use bitcoin::{Script, ScriptBuf, Witness};
use std::collections::HashMap;

/// Previous outputs resolved out-of-band, keyed by the spending input's outpoint
pub type PrevoutMap = HashMap<OutPointRef, TxOut>;

/// A backend-native transaction that can be normalised into a canonical [`Tx`]
pub trait RawTransaction {
    fn txid(&self) -> &str;

    /// Outpoints whose previous output is not carried by this shape and must
    /// be fetched before [`RawTransaction::normalise`] can succeed
    fn missing_prevouts(&self) -> Vec<OutPointRef>;

    fn normalise(&self, prevouts: &PrevoutMap) -> Result<Tx, TxError>;
}

/// Canonical transactions normalise to themselves after validation
impl RawTransaction for Tx {
    fn txid(&self) -> &str {
        &self.txid
    }

    fn missing_prevouts(&self) -> Vec<OutPointRef> {
        Vec::new()
    }

    fn normalise(&self, _prevouts: &PrevoutMap) -> Result<Tx, TxError> {
        validate(self.clone())
    }
}

/// Check the structural invariants every extractor relies on
pub fn validate(tx: Tx) -> Result<Tx, TxError> {
    if tx.vin.is_empty() {
        return Err(TxError::malformed(&tx.txid, "transaction has no inputs"));
    }
    if tx.vout.is_empty() {
        return Err(TxError::malformed(&tx.txid, "transaction has no outputs"));
    }

    for (index, input) in tx.vin.iter().enumerate() {
        let pushes = script_pushes(&input.scriptsig).map_err(|e| {
            TxError::malformed(
                &tx.txid,
                format!("input {} has an unparseable scriptSig: {}", index, e),
            )
        })?;

        match input.prevout.scriptpubkey_type {
            ScriptPubKeyType::P2wpkh if input.witness.len() != 2 => {
                return Err(TxError::malformed(
                    &tx.txid,
                    format!(
                        "input {} spends P2WPKH but carries {} witness items",
                        index,
                        input.witness.len()
                    ),
                ));
            }
            ScriptPubKeyType::P2pkh if pushes.len() < 2 => {
                return Err(TxError::malformed(
                    &tx.txid,
                    format!(
                        "input {} spends P2PKH without a signature and public key",
                        index
                    ),
                ));
            }
            _ => {}
        }
    }

    Ok(tx)
}

/// Data pushes of a script, in order
pub fn script_pushes(script: &Script) -> Result<Vec<&[u8]>, bitcoin::script::Error> {
    let mut pushes = Vec::new();
    for instruction in script.instructions() {
        if let Instruction::PushBytes(bytes) = instruction? {
            pushes.push(bytes.as_bytes());
        }
    }
    Ok(pushes)
}

pub(crate) fn decode_hex(txid: &str, field: &str, value: &str) -> Result<Vec<u8>, TxError> {
    hex::decode(value)
        .map_err(|e| TxError::malformed(txid, format!("{} is not valid hex: {}", field, e)))
}

pub(crate) fn decode_witness(txid: &str, items: &[String]) -> Result<Witness, TxError> {
    let decoded = items
        .iter()
        .map(|item| decode_hex(txid, "witness item", item))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Witness::from_slice(&decoded))
}

/// Backend disassembly when supplied, otherwise derived from the script
pub(crate) fn scriptsig_asm(asm: Option<&str>, script: &ScriptBuf) -> String {
    match asm {
        Some(asm) => asm.to_string(),
        None => script.to_asm_string(),
    }
}

/// Look up the resolved prevout for an input or fail the whole transaction
pub(crate) fn resolve_prevout(
    txid: &str,
    outpoint: &OutPointRef,
    prevouts: &PrevoutMap,
) -> Result<TxOut, TxError> {
    prevouts
        .get(outpoint)
        .cloned()
        .ok_or_else(|| TxError::malformed(txid, format!("unresolved prevout {}", outpoint)))
}

pub(crate) fn build_input(
    outpoint: OutPointRef,
    sequence: u32,
    scriptsig: ScriptBuf,
    asm: String,
    witness: Witness,
    prevout: TxOut,
) -> TxIn {
    TxIn {
        txid: outpoint.txid,
        vout: outpoint.vout,
        sequence,
        scriptsig,
        scriptsig_asm: asm,
        witness,
        prevout,
    }
}
