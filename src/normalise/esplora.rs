//! Esplora / mempool.space `/tx/{txid}` shape
//!
//! Esplora embeds each input's previous output, so normally nothing needs to
//! be fetched. Values are integer satoshis.

use super::{
    build_input, decode_hex, decode_witness, resolve_prevout, scriptsig_asm, validate,
    PrevoutMap, RawTransaction,
};
use crate::errors::TxError;
use crate::types::{OutPointRef, ScriptPubKeyType, Tx, TxOut};
use bitcoin::ScriptBuf;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EsploraTx {
    pub txid: String,
    pub version: i64,
    pub locktime: u32,
    pub vin: Vec<EsploraTxIn>,
    pub vout: Vec<EsploraTxOut>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EsploraTxStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EsploraTxIn {
    pub txid: String,
    pub vout: u32,
    /// `null` for coinbase inputs
    #[serde(default)]
    pub prevout: Option<EsploraTxOut>,
    pub scriptsig: String,
    #[serde(default)]
    pub scriptsig_asm: Option<String>,
    #[serde(default)]
    pub witness: Option<Vec<String>>,
    #[serde(default)]
    pub is_coinbase: bool,
    pub sequence: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EsploraTxOut {
    pub scriptpubkey: String,
    pub scriptpubkey_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scriptpubkey_address: Option<String>,
    pub value: u64,
}

/// Confirmation status as returned by `/tx/{txid}/status`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EsploraTxStatus {
    pub confirmed: bool,
    #[serde(default)]
    pub block_height: Option<u32>,
    #[serde(default)]
    pub block_hash: Option<String>,
}

impl EsploraTxOut {
    pub fn to_txout(&self, txid: &str) -> Result<TxOut, TxError> {
        let script_bytes = decode_hex(txid, "scriptpubkey", &self.scriptpubkey)?;
        Ok(TxOut {
            scriptpubkey: ScriptBuf::from_bytes(script_bytes),
            scriptpubkey_type: self
                .scriptpubkey_type
                .parse()
                .unwrap_or_else(|_| ScriptPubKeyType::Other(self.scriptpubkey_type.clone())),
            scriptpubkey_address: self.scriptpubkey_address.clone(),
            value: self.value,
        })
    }
}

impl EsploraTxIn {
    fn outpoint(&self) -> OutPointRef {
        OutPointRef::new(self.txid.clone(), self.vout)
    }
}

impl RawTransaction for EsploraTx {
    fn txid(&self) -> &str {
        &self.txid
    }

    fn missing_prevouts(&self) -> Vec<OutPointRef> {
        self.vin
            .iter()
            .filter(|input| input.prevout.is_none() && !input.is_coinbase)
            .map(EsploraTxIn::outpoint)
            .collect()
    }

    fn normalise(&self, prevouts: &PrevoutMap) -> Result<Tx, TxError> {
        let mut vin = Vec::with_capacity(self.vin.len());
        for input in &self.vin {
            if input.is_coinbase {
                return Err(TxError::malformed(
                    &self.txid,
                    "coinbase input has no previous output",
                ));
            }
            let outpoint = input.outpoint();
            let prevout = match &input.prevout {
                Some(prevout) => prevout.to_txout(&self.txid)?,
                None => resolve_prevout(&self.txid, &outpoint, prevouts)?,
            };

            let scriptsig =
                ScriptBuf::from_bytes(decode_hex(&self.txid, "scriptsig", &input.scriptsig)?);
            let asm = scriptsig_asm(input.scriptsig_asm.as_deref(), &scriptsig);
            let witness = decode_witness(&self.txid, input.witness.as_deref().unwrap_or_default())?;

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
