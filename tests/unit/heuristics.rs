//! Extractor properties over normalised transactions

use crate::common::{self, scripts, txid, MockChain, RBF_SEQUENCE};
use anyhow::Result;
use std::collections::BTreeSet;
use std::sync::Arc;
use wallet_fingerprinting::analysis::Analyser;
use wallet_fingerprinting::heuristics::{
    change_index, input_ordering, output_structure, ChangeIndex, Features, InputOrdering,
    OutputStructure,
};
use wallet_fingerprinting::normalise::CoreTx;
use wallet_fingerprinting::types::{ConfirmationHeights, Tx};

async fn canonical(tx: CoreTx) -> Result<Tx> {
    let mut chain = MockChain::new(&txid("0b"));
    chain.fund_fixtures();
    let id = tx.txid.clone();
    chain.add_tx(tx, None);
    let chain = Arc::new(chain);
    let analyser = Analyser::new(Arc::clone(&chain), chain, 2);
    Ok(analyser.get_tx(&id).await?)
}

fn set<T: Ord>(items: impl IntoIterator<Item = T>) -> BTreeSet<T> {
    items.into_iter().collect()
}

#[tokio::test]
async fn test_single_input_is_only_single() -> Result<()> {
    let tx = canonical(common::blue_wallet_tx(&txid("f1"))).await?;
    let ordering = input_ordering(&tx, &ConfirmationHeights::new());
    assert_eq!(ordering, set([InputOrdering::Single]));
    Ok(())
}

#[tokio::test]
async fn test_single_output_is_only_single() -> Result<()> {
    let tx = canonical(common::core_tx(
        &txid("f2"),
        2,
        0,
        vec![common::witness_input(&txid("cc"), 0, 0x41, scripts::low_r_signature(), RBF_SEQUENCE)],
        vec![common::output(0, &scripts::p2tr(0x01), 499_000)],
        None,
    ))
    .await?;

    let change = change_index(&tx);
    assert_eq!(change, ChangeIndex::NoChange);
    assert_eq!(output_structure(&tx, change), set([OutputStructure::Single]));
    Ok(())
}

#[tokio::test]
async fn test_change_index_is_stable() -> Result<()> {
    let tx = canonical(common::unclear_tx(&txid("f3"))).await?;
    let first = change_index(&tx);
    assert_eq!(first, change_index(&tx));
    assert_eq!(first, ChangeIndex::Found(0));

    let features = Features::extract(&tx, &ConfirmationHeights::new());
    assert_eq!(features.change_index, first);
    Ok(())
}

#[tokio::test]
async fn test_unknown_heights_do_not_break_historical_order() -> Result<()> {
    let tx = canonical(common::core_wallet_tx(&txid("f4"))).await?;

    // Only the second input's funding height is known
    let partial: ConfirmationHeights = [(txid("aa"), 790_500u32)].into_iter().collect();
    assert!(input_ordering(&tx, &partial).contains(&InputOrdering::Historical));

    let reversed: ConfirmationHeights = [(txid("bb"), 791_000u32), (txid("aa"), 790_500u32)]
        .into_iter()
        .collect();
    let ordering = input_ordering(&tx, &reversed);
    assert!(!ordering.contains(&InputOrdering::Historical));
    assert!(ordering.contains(&InputOrdering::Descending));
    Ok(())
}

#[tokio::test]
async fn test_sorted_outpoints_follow_bip69() -> Result<()> {
    let tx = canonical(common::core_tx(
        &txid("f5"),
        2,
        0,
        vec![
            common::witness_input(&txid("aa"), 1, 0x32, scripts::low_r_signature(), RBF_SEQUENCE),
            common::witness_input(&txid("bb"), 0, 0x31, scripts::low_r_signature(), RBF_SEQUENCE),
        ],
        vec![
            common::output(0, &scripts::p2wpkh(0x52), 99_123),
            common::output(1, &scripts::p2wpkh(0x51), 400_000),
        ],
        None,
    ))
    .await?;

    let ordering = input_ordering(&tx, &ConfirmationHeights::new());
    assert!(ordering.contains(&InputOrdering::Bip69));
    assert!(ordering.contains(&InputOrdering::Ascending));

    let structure = output_structure(&tx, change_index(&tx));
    assert!(structure.contains(&OutputStructure::Bip69));
    assert!(structure.contains(&OutputStructure::Double));
    Ok(())
}
