//! Known fixtures must reproduce fixed verdicts through the full pipeline

use crate::common::{self, scripts, txid, MockChain, RBF_SEQUENCE};
use anyhow::Result;
use std::sync::Arc;
use wallet_fingerprinting::analysis::Analyser;
use wallet_fingerprinting::detection::Signal;
use wallet_fingerprinting::heuristics::{AntiFeeSniping, TxVersion};
use wallet_fingerprinting::types::Wallet;

fn analyser(chain: MockChain) -> Analyser<Arc<MockChain>, Arc<MockChain>> {
    let chain = Arc::new(chain);
    Analyser::new(Arc::clone(&chain), chain, 4)
}

fn funded_chain() -> MockChain {
    let mut chain = MockChain::new(&txid("0b"));
    chain.fund_fixtures();
    chain
}

#[tokio::test]
async fn test_bitcoin_core_fixture() -> Result<()> {
    let mut chain = funded_chain();
    chain.add_tx(common::core_wallet_tx(&txid("c0")), Some(800_001));

    let detection = analyser(chain).detect(&txid("c0")).await?;

    assert_eq!(detection.verdict, Wallet::BitcoinCore);
    assert_eq!(detection.candidates.len(), 1);
    assert_eq!(
        detection.trace.signals()[0],
        Signal::AntiFeeSniping(AntiFeeSniping::Likely)
    );
    assert_eq!(detection.trace.signals()[3], Signal::LowRSignatures(true));
    assert_eq!(detection.trace.signals()[15], Signal::Bip69Inputs(Some(false)));
    Ok(())
}

#[tokio::test]
async fn test_blue_wallet_fixture() -> Result<()> {
    let mut chain = funded_chain();
    chain.add_tx(common::blue_wallet_tx(&txid("c1")), Some(800_050));

    let detection = analyser(chain).detect(&txid("c1")).await?;

    assert_eq!(detection.verdict, Wallet::BlueWallet);
    assert!(detection.trace.signals().contains(&Signal::SignalsRbf(true)));
    assert!(detection.trace.signals().contains(&Signal::ChangeLast(Some(true))));
    Ok(())
}

#[tokio::test]
async fn test_unclear_fixture_keeps_both_candidates() -> Result<()> {
    let mut chain = funded_chain();
    chain.add_tx(common::unclear_tx(&txid("c2")), Some(800_010));

    let detection = analyser(chain).detect(&txid("c2")).await?;

    assert_eq!(detection.verdict, Wallet::Unclear);
    assert_eq!(
        detection.candidates.into_iter().collect::<Vec<_>>(),
        vec![Wallet::BitcoinCore, Wallet::Electrum]
    );
    Ok(())
}

#[tokio::test]
async fn test_unknown_height_makes_anti_fee_sniping_possible() -> Result<()> {
    let mut chain = funded_chain();
    chain.add_tx(common::core_wallet_tx(&txid("c3")), None);

    let detection = analyser(chain).detect(&txid("c3")).await?;

    assert_eq!(
        detection.trace.signals()[0],
        Signal::AntiFeeSniping(AntiFeeSniping::Possible)
    );
    assert_eq!(detection.verdict, Wallet::BitcoinCore);
    Ok(())
}

#[tokio::test]
async fn test_height_lookup_failure_is_not_fatal() -> Result<()> {
    let mut chain = funded_chain();
    chain.add_tx(common::unclear_tx(&txid("c4")), Some(800_010));
    chain.fail_height_lookup(&txid("c4"));

    let detection = analyser(chain).detect(&txid("c4")).await?;

    assert_eq!(
        detection.trace.signals()[0],
        Signal::AntiFeeSniping(AntiFeeSniping::Possible)
    );
    assert_eq!(detection.verdict, Wallet::Unclear);
    Ok(())
}

#[tokio::test]
async fn test_high_r_signature_rules_out_every_wallet() -> Result<()> {
    let mut chain = funded_chain();
    let tx = common::core_tx(
        &txid("c5"),
        2,
        800_000,
        vec![
            common::witness_input(&txid("bb"), 0, 0x31, scripts::high_r_signature(), RBF_SEQUENCE),
            common::witness_input(&txid("aa"), 1, 0x32, scripts::high_r_signature(), RBF_SEQUENCE),
        ],
        vec![
            common::output(0, &scripts::p2wpkh(0x51), 400_000),
            common::output(1, &scripts::p2wpkh(0x52), 99_123),
        ],
        None,
    );
    chain.add_tx(tx, Some(800_001));

    let detection = analyser(chain).detect(&txid("c5")).await?;

    assert_eq!(detection.verdict, Wallet::Other);
    assert!(detection.candidates.is_empty());
    assert_eq!(detection.trace.signals()[3], Signal::LowRSignatures(false));
    Ok(())
}

#[tokio::test]
async fn test_uncompressed_legacy_key_is_other() -> Result<()> {
    let mut chain = funded_chain();
    chain.fund(&txid("ee"), 0, &scripts::p2pkh(0x90), 80_000, Some(600_000));
    let tx = common::core_tx(
        &txid("c6"),
        2,
        0,
        vec![common::legacy_input(
            &txid("ee"),
            0,
            scripts::uncompressed_pubkey(0x90),
            scripts::low_r_signature(),
            RBF_SEQUENCE,
        )],
        vec![common::output(0, &scripts::p2wpkh(0x91), 70_000)],
        None,
    );
    chain.add_tx(tx, None);

    let detection = analyser(chain).detect(&txid("c6")).await?;

    assert_eq!(detection.verdict, Wallet::Other);
    assert_eq!(detection.trace.signals()[1], Signal::UncompressedPublicKeys(true));
    Ok(())
}

#[tokio::test]
async fn test_version_one_drops_version_two_wallets() -> Result<()> {
    let mut chain = funded_chain();
    let mut tx = common::blue_wallet_tx(&txid("c7"));
    tx.version = 1;
    chain.add_tx(tx, None);

    let detection = analyser(chain).detect(&txid("c7")).await?;

    assert_eq!(detection.trace.signals()[2], Signal::TxVersion(TxVersion::One));
    assert!(!detection.candidates.contains(&Wallet::BitcoinCore));
    assert!(!detection.candidates.contains(&Wallet::BlueWallet));
    Ok(())
}

#[tokio::test]
async fn test_detection_is_deterministic() -> Result<()> {
    let mut chain = funded_chain();
    chain.add_tx(common::core_wallet_tx(&txid("c8")), Some(800_001));
    let analyser = analyser(chain);

    let first = analyser.detect(&txid("c8")).await?;
    let second = analyser.detect(&txid("c8")).await?;
    assert_eq!(first, second);
    assert_eq!(first.trace.len(), 18);
    Ok(())
}
