//! Bitcoin Core verbose `getrawtransaction` / `decoderawtransaction` shape
//!
//! Core does not embed previous outputs, so every input's prevout is listed by
//! [`RawTransaction::missing_prevouts`] and must be resolved by the caller.
//! Values are reported as floating-point BTC and converted to satoshis here.

use super::{
    build_input, decode_hex, decode_witness, resolve_prevout, scriptsig_asm, validate,
    PrevoutMap, RawTransaction,
};
use crate::errors::TxError;
use crate::types::{OutPointRef, ScriptPubKeyType, Tx, TxOut};
use bitcoin::{Amount, ScriptBuf};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreTx {
    pub txid: String,
    pub version: i64,
    pub locktime: u32,
    pub vin: Vec<CoreTxIn>,
    pub vout: Vec<CoreTxOut>,
    /// Present once the transaction is confirmed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blockhash: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreTxIn {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vout: Option<u32>,
    /// Coinbase data, only on the first input of a coinbase transaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coinbase: Option<String>,
    #[serde(rename = "scriptSig", default, skip_serializing_if = "Option::is_none")]
    pub script_sig: Option<CoreScriptSig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub txinwitness: Vec<String>,
    pub sequence: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreScriptSig {
    pub asm: String,
    pub hex: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreTxOut {
    /// Amount in BTC
    pub value: f64,
    pub n: u32,
    #[serde(rename = "scriptPubKey")]
    pub script_pub_key: CoreScriptPubKey,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreScriptPubKey {
    pub hex: String,
    #[serde(rename = "type")]
    pub script_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl CoreTxIn {
    fn outpoint(&self) -> Option<OutPointRef> {
        match (&self.txid, self.vout) {
            (Some(txid), Some(vout)) => Some(OutPointRef::new(txid.clone(), vout)),
            _ => None,
        }
    }
}

impl CoreTxOut {
    /// Convert to a canonical output, `txid` is only used for error context
    pub fn to_txout(&self, txid: &str) -> Result<TxOut, TxError> {
        let value = Amount::from_btc(self.value).map_err(|e| {
            TxError::malformed(
                txid,
                format!("output {} has an invalid value {}: {}", self.n, self.value, e),
            )
        })?;
        let script_bytes = decode_hex(txid, "scriptPubKey", &self.script_pub_key.hex)?;

        Ok(TxOut {
            scriptpubkey: ScriptBuf::from_bytes(script_bytes),
            scriptpubkey_type: self.script_pub_key.script_type.parse().unwrap_or_else(|_| {
                ScriptPubKeyType::Other(self.script_pub_key.script_type.clone())
            }),
            scriptpubkey_address: self.script_pub_key.address.clone(),
            value: value.to_sat(),
        })
    }
}

impl RawTransaction for CoreTx {
    fn txid(&self) -> &str {
        &self.txid
    }

    fn missing_prevouts(&self) -> Vec<OutPointRef> {
        self.vin.iter().filter_map(CoreTxIn::outpoint).collect()
    }

    fn normalise(&self, prevouts: &PrevoutMap) -> Result<Tx, TxError> {
        let mut vin = Vec::with_capacity(self.vin.len());
        for (index, input) in self.vin.iter().enumerate() {
            if input.coinbase.is_some() {
                return Err(TxError::malformed(
                    &self.txid,
                    "coinbase input has no previous output",
                ));
            }
            let outpoint = input.outpoint().ok_or_else(|| {
                TxError::malformed(&self.txid, format!("input {} is missing txid or vout", index))
            })?;
            let script_sig = input.script_sig.as_ref().ok_or_else(|| {
                TxError::malformed(&self.txid, format!("input {} is missing scriptSig", index))
            })?;

            let scriptsig =
                ScriptBuf::from_bytes(decode_hex(&self.txid, "scriptSig", &script_sig.hex)?);
            let asm = scriptsig_asm(Some(&script_sig.asm), &scriptsig);
            let witness = decode_witness(&self.txid, &input.txinwitness)?;
            let prevout = resolve_prevout(&self.txid, &outpoint, prevouts)?;

            vin.push(build_input(
                outpoint,
                input.sequence,
                scriptsig,
                asm,
                witness,
                prevout,
            ));
        }

        let vout = self
            .vout
            .iter()
            .map(|output| output.to_txout(&self.txid))
            .collect::<Result<Vec<_>, _>>()?;

        validate(Tx {
            txid: self.txid.clone(),
            version: self.version,
            locktime: self.locktime,
            vin,
            vout,
        })
    }
}
