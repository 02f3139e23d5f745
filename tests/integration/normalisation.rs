//! Backend shapes normalise strictly into the canonical model

use crate::common::{self, scripts, txid, MockChain, RBF_SEQUENCE};
use anyhow::Result;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use wallet_fingerprinting::analysis::Analyser;
use wallet_fingerprinting::detection::detect_wallet;
use wallet_fingerprinting::errors::TxError;
use wallet_fingerprinting::normalise::{CoreTx, EsploraTx, PrevoutMap, RawTransaction};
use wallet_fingerprinting::types::{ConfirmationHeights, ScriptPubKeyType, Tx, Wallet};

fn analyser(chain: MockChain) -> (Arc<MockChain>, Analyser<Arc<MockChain>, Arc<MockChain>>) {
    let chain = Arc::new(chain);
    let analyser = Analyser::new(Arc::clone(&chain), Arc::clone(&chain), 4);
    (chain, analyser)
}

#[tokio::test]
async fn test_core_shape_resolves_prevouts() -> Result<()> {
    let mut chain = MockChain::new(&txid("0b"));
    chain.fund_fixtures();
    chain.add_tx(common::core_wallet_tx(&txid("d0")), None);
    let (chain, analyser) = analyser(chain);

    let tx = analyser.get_tx(&txid("d0")).await?;

    assert_eq!(chain.prevout_requests.load(Ordering::SeqCst), 2);
    assert_eq!(tx.vin.len(), 2);
    assert_eq!(tx.vin[0].prevout.value, 300_000);
    assert_eq!(tx.vin[1].prevout.value, 200_000);
    assert_eq!(tx.vin[0].prevout.scriptpubkey_type, ScriptPubKeyType::P2wpkh);
    assert_eq!(tx.vin[0].witness.len(), 2);
    assert_eq!(tx.vout[1].value, 99_123);
    assert!(tx.vin.iter().all(|input| input.sequence == RBF_SEQUENCE));
    Ok(())
}

#[tokio::test]
async fn test_normalisation_is_idempotent() -> Result<()> {
    let mut chain = MockChain::new(&txid("0b"));
    chain.fund_fixtures();
    chain.add_tx(common::blue_wallet_tx(&txid("d1")), None);
    let (_, analyser) = analyser(chain);

    let tx = analyser.get_tx(&txid("d1")).await?;
    let again = tx.normalise(&PrevoutMap::new())?;
    assert_eq!(again, tx);

    let round_tripped: Tx = serde_json::from_str(&serde_json::to_string(&tx)?)?;
    assert_eq!(round_tripped, tx);
    Ok(())
}

#[tokio::test]
async fn test_unresolved_prevout_is_malformed() -> Result<()> {
    let mut chain = MockChain::new(&txid("0b"));
    chain.add_tx(common::blue_wallet_tx(&txid("d2")), None);
    let (_, analyser) = analyser(chain);

    let err = analyser.get_tx(&txid("d2")).await.unwrap_err();

    assert!(matches!(err, TxError::MalformedTransaction { .. }));
    assert!(err.to_string().contains("unresolved prevout"));
    Ok(())
}

#[tokio::test]
async fn test_coinbase_cannot_be_normalised() -> Result<()> {
    let mut chain = MockChain::new(&txid("0b"));
    chain.add_tx(common::coinbase_tx(&txid("d3")), None);
    let (_, analyser) = analyser(chain);

    let err = analyser.get_tx(&txid("d3")).await.unwrap_err();
    assert!(matches!(err, TxError::MalformedTransaction { .. }));
    Ok(())
}

#[tokio::test]
async fn test_missing_transaction_is_lookup_unavailable() -> Result<()> {
    let (_, analyser) = analyser(MockChain::new(&txid("0b")));

    let err = analyser.get_tx(&txid("d4")).await.unwrap_err();
    assert!(matches!(err, TxError::LookupUnavailable { .. }));
    assert_eq!(err.txid(), txid("d4"));
    Ok(())
}

#[tokio::test]
async fn test_truncated_witness_is_malformed() -> Result<()> {
    let mut chain = MockChain::new(&txid("0b"));
    chain.fund_fixtures();
    let mut tx = common::blue_wallet_tx(&txid("d5"));
    tx.vin[0].txinwitness.truncate(1);
    chain.add_tx(tx, None);
    let (_, analyser) = analyser(chain);

    let err = analyser.get_tx(&txid("d5")).await.unwrap_err();
    assert!(err.to_string().contains("witness items"));
    Ok(())
}

#[tokio::test]
async fn test_esplora_and_core_shapes_agree() -> Result<()> {
    let mut chain = MockChain::new(&txid("0b"));
    chain.fund_fixtures();
    chain.add_tx(common::blue_wallet_tx(&txid("d6")), None);
    let (_, analyser) = analyser(chain);
    let from_core = analyser.get_tx(&txid("d6")).await?;

    let esplora: EsploraTx = serde_json::from_value(json!({
        "txid": txid("d6"),
        "version": 2,
        "locktime": 0,
        "vin": [{
            "txid": txid("cc"),
            "vout": 0,
            "prevout": {
                "scriptpubkey": scripts::p2wpkh(0x41),
                "scriptpubkey_type": "v0_p2wpkh",
                "value": 500_000
            },
            "scriptsig": "",
            "scriptsig_asm": "",
            "witness": [scripts::low_r_signature(), scripts::compressed_pubkey(0x41)],
            "is_coinbase": false,
            "sequence": RBF_SEQUENCE
        }],
        "vout": [
            {
                "scriptpubkey": scripts::p2pkh(0x61),
                "scriptpubkey_type": "p2pkh",
                "value": 100_000
            },
            {
                "scriptpubkey": scripts::p2wpkh(0x62),
                "scriptpubkey_type": "v0_p2wpkh",
                "value": 52_341
            }
        ],
        "status": { "confirmed": true, "block_height": 800_050 }
    }))?;

    assert!(esplora.missing_prevouts().is_empty());
    let from_esplora = esplora.normalise(&PrevoutMap::new())?;
    assert_eq!(from_esplora, from_core);
    Ok(())
}

fn esplora_with_version(version: u32) -> serde_json::Value {
    json!({
        "txid": txid("d7"),
        "version": version,
        "locktime": 0,
        "vin": [{
            "txid": txid("cc"),
            "vout": 0,
            "prevout": {
                "scriptpubkey": scripts::p2wpkh(0x41),
                "scriptpubkey_type": "v0_p2wpkh",
                "value": 500_000
            },
            "scriptsig": "",
            "witness": [scripts::low_r_signature(), scripts::compressed_pubkey(0x41)],
            "is_coinbase": false,
            "sequence": RBF_SEQUENCE
        }],
        "vout": [
            {
                "scriptpubkey": scripts::p2pkh(0x61),
                "scriptpubkey_type": "p2pkh",
                "value": 100_000
            },
            {
                "scriptpubkey": scripts::p2wpkh(0x62),
                "scriptpubkey_type": "v0_p2wpkh",
                "value": 52_341
            }
        ]
    })
}

#[test]
fn test_unsigned_version_normalises_and_is_other() -> Result<()> {
    for version in [3, u32::MAX] {
        let raw: EsploraTx = serde_json::from_value(esplora_with_version(version))?;
        let tx = raw.normalise(&PrevoutMap::new())?;
        assert_eq!(tx.version, i64::from(version));

        let detection = detect_wallet(&tx, &ConfirmationHeights::new());
        assert_eq!(detection.verdict, Wallet::Other, "version {}", version);
        assert!(detection.candidates.is_empty());
    }
    Ok(())
}

#[test]
fn test_core_shape_accepts_full_width_version() -> Result<()> {
    let mut raw = serde_json::to_value(common::blue_wallet_tx(&txid("d8")))?;
    raw["version"] = json!(u32::MAX);
    let core: CoreTx = serde_json::from_value(raw)?;
    assert_eq!(core.version, 4_294_967_295);
    Ok(())
}
