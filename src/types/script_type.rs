//! Output script kinds
//!
//! Bitcoin Core and Esplora name the same script templates differently
//! (`witness_v0_keyhash` vs `v0_p2wpkh`). Both spellings parse to the same
//! variant; serialisation always uses the Bitcoin Core name.

use bitcoin::Script;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Output script type as reported by a data source
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScriptPubKeyType {
    /// Pay-to-PubKey-Hash (legacy)
    P2pkh,
    /// Pay-to-Script-Hash (legacy)
    P2sh,
    /// Pay-to-Witness-PubKey-Hash (SegWit v0)
    P2wpkh,
    /// Pay-to-Witness-Script-Hash (SegWit v0)
    P2wsh,
    /// Pay-to-Taproot (SegWit v1)
    P2tr,
    /// OP_RETURN data carrier
    OpReturn,
    /// Any other template, kept verbatim
    Other(String),
}

impl ScriptPubKeyType {
    /// Bitcoin Core representation
    pub fn as_str(&self) -> &str {
        match self {
            ScriptPubKeyType::P2pkh => "pubkeyhash",
            ScriptPubKeyType::P2sh => "scripthash",
            ScriptPubKeyType::P2wpkh => "witness_v0_keyhash",
            ScriptPubKeyType::P2wsh => "witness_v0_scripthash",
            ScriptPubKeyType::P2tr => "witness_v1_taproot",
            ScriptPubKeyType::OpReturn => "nulldata",
            ScriptPubKeyType::Other(name) => name,
        }
    }

    /// Classify a script from its bytes
    pub fn from_script(script: &Script) -> Self {
        if script.is_p2pkh() {
            ScriptPubKeyType::P2pkh
        } else if script.is_p2sh() {
            ScriptPubKeyType::P2sh
        } else if script.is_p2wpkh() {
            ScriptPubKeyType::P2wpkh
        } else if script.is_p2wsh() {
            ScriptPubKeyType::P2wsh
        } else if script.is_p2tr() {
            ScriptPubKeyType::P2tr
        } else if script.is_op_return() {
            ScriptPubKeyType::OpReturn
        } else if script.is_p2pk() {
            ScriptPubKeyType::Other("pubkey".to_string())
        } else {
            ScriptPubKeyType::Other("nonstandard".to_string())
        }
    }
}

impl FromStr for ScriptPubKeyType {
    type Err = std::convert::Infallible;

    /// Parse either naming scheme
    ///
    /// This implementation is infallible - unrecognised strings are kept as `Other`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "pubkeyhash" | "p2pkh" => ScriptPubKeyType::P2pkh,
            "scripthash" | "p2sh" => ScriptPubKeyType::P2sh,
            "witness_v0_keyhash" | "v0_p2wpkh" => ScriptPubKeyType::P2wpkh,
            "witness_v0_scripthash" | "v0_p2wsh" => ScriptPubKeyType::P2wsh,
            "witness_v1_taproot" | "v1_p2tr" => ScriptPubKeyType::P2tr,
            "nulldata" | "op_return" => ScriptPubKeyType::OpReturn,
            "pubkey" | "p2pk" => ScriptPubKeyType::Other("pubkey".to_string()),
            "nonstandard" | "unknown" => ScriptPubKeyType::Other("nonstandard".to_string()),
            other => ScriptPubKeyType::Other(other.to_string()),
        })
    }
}

impl fmt::Display for ScriptPubKeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ScriptPubKeyType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ScriptPubKeyType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        // Infallible
        Ok(name.parse().unwrap_or(ScriptPubKeyType::Other(name)))
    }
}
