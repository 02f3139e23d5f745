//! Block tallies: coinbase skipped, failures isolated, totals add up

use crate::common::{self, txid, MockChain};
use anyhow::Result;
use std::sync::Arc;
use wallet_fingerprinting::analysis::{Analyser, OutputFormat, ReportFormatter};
use wallet_fingerprinting::cli::commands::write_output_to_file;
use wallet_fingerprinting::types::Wallet;

const BLOCK: &str = "000000000000000000024bead8df69990852c202db0e0097c1a12ea637d7e96d";

/// Coinbase, three classifiable transactions and one with an unfunded input
fn block_chain() -> MockChain {
    let mut chain = MockChain::new(BLOCK);
    chain.fund_fixtures();
    chain.add_tx(common::coinbase_tx(&txid("e0")), Some(800_000));
    chain.add_tx(common::core_wallet_tx(&txid("e1")), Some(800_001));
    chain.add_tx(common::blue_wallet_tx(&txid("e2")), Some(800_001));
    chain.add_tx(common::unclear_tx(&txid("e3")), Some(800_001));

    let mut orphan = common::blue_wallet_tx(&txid("e4"));
    orphan.vin[0].txid = Some(txid("ff"));
    chain.add_tx(orphan, Some(800_001));

    chain.add_block(
        BLOCK,
        vec![txid("e0"), txid("e1"), txid("e2"), txid("e3"), txid("e4")],
    );
    chain
}

fn analyser(chain: MockChain, concurrency: usize) -> Analyser<Arc<MockChain>, Arc<MockChain>> {
    let chain = Arc::new(chain);
    Analyser::new(Arc::clone(&chain), chain, concurrency)
}

#[tokio::test]
async fn test_block_tally_accounts_for_every_transaction() -> Result<()> {
    let analyser = analyser(block_chain(), 3);

    let block = analyser.analyze_block(None, None).await?;
    let result = &block.result;

    assert_eq!(block.block_hash, BLOCK);
    assert_eq!(block.transactions_analysed, 4);
    assert_eq!(result.total() + result.failures().len(), 4);
    assert_eq!(result.total(), 3);

    assert_eq!(result.txids(Wallet::BitcoinCore), [txid("e1")]);
    assert_eq!(result.txids(Wallet::BlueWallet), [txid("e2")]);
    assert_eq!(result.txids(Wallet::Unclear), [txid("e3")]);
    assert_eq!(result.failures()[0].txid, txid("e4"));
    assert!(result.failures()[0].error.contains("unresolved prevout"));

    let coinbase = txid("e0");
    assert!(result
        .tallies()
        .all(|(_, tally)| !tally.txids.contains(&coinbase)));
    Ok(())
}

#[tokio::test]
async fn test_limit_keeps_block_order() -> Result<()> {
    let analyser = analyser(block_chain(), 1);

    let block = analyser.analyze_block(Some(BLOCK), Some(2)).await?;

    assert_eq!(block.transactions_analysed, 2);
    assert_eq!(block.result.total(), 2);
    assert!(block.result.failures().is_empty());
    assert_eq!(block.result.count(Wallet::BitcoinCore), 1);
    assert_eq!(block.result.count(Wallet::BlueWallet), 1);
    Ok(())
}

#[tokio::test]
async fn test_zero_limit_means_whole_block() -> Result<()> {
    let analyser = analyser(block_chain(), 2);
    let block = analyser.analyze_block(Some(BLOCK), Some(0)).await?;
    assert_eq!(block.transactions_analysed, 4);
    Ok(())
}

#[tokio::test]
async fn test_unknown_block_is_an_error() {
    let analyser = analyser(block_chain(), 2);
    let result = analyser.analyze_block(Some(&txid("99")), None).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_json_report_written_to_file() -> Result<()> {
    let analyser = analyser(block_chain(), 4);
    let block = analyser.analyze_block(None, None).await?;

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("reports").join("block.json");
    let report = ReportFormatter::format_block_analysis(&block, &OutputFormat::Json)?;
    write_output_to_file(&path, &report, "Wallet fingerprint report")?;

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    for key in [
        "BITCOIN_CORE",
        "ELECTRUM",
        "BLUE_WALLET",
        "COINBASE",
        "EXODUS",
        "TRUST",
        "TREZOR",
        "LEDGER",
        "UNCLEAR",
        "OTHER",
    ] {
        assert!(json["result"][key]["count"].is_u64(), "missing {}", key);
    }
    assert_eq!(json["result"]["BITCOIN_CORE"]["count"], 1);
    assert_eq!(json["result"]["failures"].as_array().map(Vec::len), Some(1));
    Ok(())
}

#[tokio::test]
async fn test_csv_report_has_one_row_per_transaction() -> Result<()> {
    let analyser = analyser(block_chain(), 4);
    let block = analyser.analyze_block(None, None).await?;

    let report = ReportFormatter::format_block_analysis(&block, &OutputFormat::Csv)?;
    let mut reader = csv::Reader::from_reader(report.as_bytes());
    let rows = reader.records().collect::<Result<Vec<_>, _>>()?;

    assert_eq!(rows.len(), 4);
    assert!(rows
        .iter()
        .any(|row| &row[0] == txid("e4").as_str() && row[1].is_empty()));
    Ok(())
}
