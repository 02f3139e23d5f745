use serde::{Deserialize, Serialize};
use std::fmt;

/// Known wallet implementations plus the two terminal outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Wallet {
    BitcoinCore,
    Electrum,
    BlueWallet,
    Coinbase,
    Exodus,
    Trust,
    Trezor,
    Ledger,
    /// Several modelled wallets remain consistent with every signal
    Unclear,
    /// No modelled wallet is consistent with every signal
    Other,
}

impl Wallet {
    /// The modelled implementations, in canonical order
    pub const KNOWN: [Wallet; 8] = [
        Wallet::BitcoinCore,
        Wallet::Electrum,
        Wallet::BlueWallet,
        Wallet::Coinbase,
        Wallet::Exodus,
        Wallet::Trust,
        Wallet::Trezor,
        Wallet::Ledger,
    ];

    /// Every reportable outcome
    pub const ALL: [Wallet; 10] = [
        Wallet::BitcoinCore,
        Wallet::Electrum,
        Wallet::BlueWallet,
        Wallet::Coinbase,
        Wallet::Exodus,
        Wallet::Trust,
        Wallet::Trezor,
        Wallet::Ledger,
        Wallet::Unclear,
        Wallet::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Wallet::BitcoinCore => "Bitcoin Core",
            Wallet::Electrum => "Electrum",
            Wallet::BlueWallet => "Blue Wallet",
            Wallet::Coinbase => "Coinbase Wallet",
            Wallet::Exodus => "Exodus Wallet",
            Wallet::Trust => "Trust Wallet",
            Wallet::Trezor => "Trezor",
            Wallet::Ledger => "Ledger",
            Wallet::Unclear => "Unclear",
            Wallet::Other => "Other",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Wallet::Unclear | Wallet::Other)
    }
}

impl fmt::Display for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
