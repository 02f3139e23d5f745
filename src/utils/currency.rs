//! Currency formatting for satoshi amounts

/// Satoshis per Bitcoin
const SATS_PER_BTC: f64 = 100_000_000.0;

/// Format a satoshi amount as dual BTC + sats display
///
/// # Examples
/// ```
/// use wallet_fingerprinting::utils::currency::format_sats_as_btc;
///
/// assert_eq!(
///     format_sats_as_btc(52_341),
///     "0.00052341 BTC (52341 sats)"
/// );
/// ```
pub fn format_sats_as_btc(sats: u64) -> String {
    let btc = sats as f64 / SATS_PER_BTC;
    format!("{:.8} BTC ({} sats)", btc, sats)
}

/// Total value spent by a set of previous outputs minus the value created
///
/// Returns `None` when outputs exceed inputs, which a valid transaction
/// never does.
pub fn fee_sats(
    input_values: impl IntoIterator<Item = u64>,
    output_values: impl IntoIterator<Item = u64>,
) -> Option<u64> {
    let spent: u64 = input_values.into_iter().sum();
    let created: u64 = output_values.into_iter().sum();
    spent.checked_sub(created)
}
