//! Script-level predicates: type mix, key encoding, signature grinding, reuse

use crate::normalise::script_pushes;
use crate::types::{ScriptPubKeyType, Tx, TxIn};
use std::collections::HashSet;

/// Highest `r` length a low-r grinding wallet produces
const LOW_R_MAX_LEN: u8 = 32;

/// Marker byte of an uncompressed SEC1 public key
const UNCOMPRESSED_KEY_PREFIX: u8 = 0x04;

/// Script types of the spent outputs, in input order
pub fn spending_types(tx: &Tx) -> Vec<ScriptPubKeyType> {
    tx.vin
        .iter()
        .map(|input| input.prevout.scriptpubkey_type.clone())
        .collect()
}

/// Script types of the created outputs, in output order
pub fn sending_types(tx: &Tx) -> Vec<ScriptPubKeyType> {
    tx.vout
        .iter()
        .map(|output| output.scriptpubkey_type.clone())
        .collect()
}

/// Signature and public key of a key-hash spend, when the input is one
fn key_hash_items(input: &TxIn) -> Option<(Vec<u8>, Vec<u8>)> {
    match input.prevout.scriptpubkey_type {
        ScriptPubKeyType::P2wpkh => {
            let signature = input.witness.nth(0)?;
            let pubkey = input.witness.nth(1)?;
            Some((signature.to_vec(), pubkey.to_vec()))
        }
        ScriptPubKeyType::P2pkh => {
            let pushes = script_pushes(&input.scriptsig).ok()?;
            match pushes.as_slice() {
                [signature, pubkey, ..] => Some((signature.to_vec(), pubkey.to_vec())),
                _ => None,
            }
        }
        _ => None,
    }
}

/// False iff any P2WPKH or P2PKH spend reveals an uncompressed public key
pub fn compressed_pubkeys_only(tx: &Tx) -> bool {
    !tx.vin.iter().filter_map(key_hash_items).any(|(_, pubkey)| {
        pubkey.first() == Some(&UNCOMPRESSED_KEY_PREFIX)
    })
}

/// False iff any P2WPKH or P2PKH signature carries an `r` longer than 32 bytes
///
/// Other input types are skipped. The DER layout is
/// `30 <len> 02 <r_len> <r> 02 <s_len> <s>` so `r_len` sits at byte 3.
pub fn low_r_only(tx: &Tx) -> bool {
    !tx.vin
        .iter()
        .filter_map(key_hash_items)
        .any(|(signature, _)| signature.get(3).is_some_and(|&r_len| r_len > LOW_R_MAX_LEN))
}

/// True iff the inputs spend more than one script type
pub fn multi_type_inputs(tx: &Tx) -> bool {
    let distinct: HashSet<&ScriptPubKeyType> = tx
        .vin
        .iter()
        .map(|input| &input.prevout.scriptpubkey_type)
        .collect();
    distinct.len() > 1
}

/// True iff an output pays back to a script one of the inputs spent
pub fn address_reuse(tx: &Tx) -> bool {
    let spent: HashSet<&[u8]> = tx
        .vin
        .iter()
        .map(|input| input.prevout.scriptpubkey.as_bytes())
        .collect();
    tx.vout
        .iter()
        .any(|output| spent.contains(output.scriptpubkey.as_bytes()))
}
