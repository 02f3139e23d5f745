//! Report formatting and output generation

use super::BlockAnalysis;
use crate::detection::Detection;
use crate::errors::{AppError, AppResult};
use crate::types::{Tx, Wallet};
use crate::utils::currency::{fee_sats, format_sats_as_btc};
use serde::Serialize;

/// Output format options for reports
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable console output
    #[default]
    Console,
    /// JSON format for programmatic use
    Json,
    /// One row per transaction
    Csv,
}

impl OutputFormat {
    /// Parse a `--format` value, unrecognised values fall back to console
    pub fn parse(format_str: &str) -> Self {
        match format_str.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "csv" => OutputFormat::Csv,
            _ => OutputFormat::Console,
        }
    }
}

#[derive(Serialize)]
struct CsvRow<'a> {
    txid: &'a str,
    wallet: Option<Wallet>,
    error: Option<&'a str>,
}

#[derive(Serialize)]
struct DetectionReport<'a> {
    #[serde(flatten)]
    detection: &'a Detection,
    fee_sats: Option<u64>,
    tx: &'a Tx,
}

/// Report formatter for fingerprinting results
pub struct ReportFormatter;

impl ReportFormatter {
    /// Format number with thousand separators for console output
    ///
    /// # Examples
    ///
    /// ```
    /// # use wallet_fingerprinting::analysis::ReportFormatter;
    /// assert_eq!(ReportFormatter::format_number(1234), "1,234");
    /// assert_eq!(ReportFormatter::format_number(904233), "904,233");
    /// ```
    pub fn format_number(n: usize) -> String {
        let s = n.to_string();
        let mut result = String::new();
        let chars: Vec<char> = s.chars().collect();

        for (i, c) in chars.iter().enumerate() {
            if i > 0 && (chars.len() - i) % 3 == 0 {
                result.push(',');
            }
            result.push(*c);
        }

        result
    }

    fn percentage(part: usize, whole: usize) -> f64 {
        if whole == 0 {
            0.0
        } else {
            part as f64 / whole as f64 * 100.0
        }
    }

    /// Format per-wallet tallies for a block
    pub fn format_block_analysis(
        analysis: &BlockAnalysis,
        format: &OutputFormat,
    ) -> AppResult<String> {
        match format {
            OutputFormat::Console => {
                let result = &analysis.result;
                let total = result.total();
                let mut output = String::new();

                output.push_str("=== WALLET FINGERPRINTS ===\n\n");
                output.push_str(&format!("Block: {}\n", analysis.block_hash));
                output.push_str(&format!(
                    "Analysed at: {}\n",
                    analysis.analysed_at.format("%Y-%m-%d %H:%M:%S UTC")
                ));
                output.push_str(&format!(
                    "Transactions: {} ({} classified, {} failed)\n\n",
                    Self::format_number(analysis.transactions_analysed),
                    Self::format_number(total),
                    Self::format_number(result.failures().len())
                ));

                output.push_str(&format!(
                    "{:<18} | {:>10} | {:>8} |\n",
                    "Wallet", "Count", "Share"
                ));
                output.push_str(&format!("{}\n", "-".repeat(44)));
                for (wallet, tally) in result.tallies() {
                    output.push_str(&format!(
                        "{:<18} | {:>10} | {:>7.2}% |\n",
                        wallet.as_str(),
                        Self::format_number(tally.count),
                        Self::percentage(tally.count, total)
                    ));
                }

                if !result.failures().is_empty() {
                    output.push_str("\nFailed transactions:\n");
                    for failure in result.failures() {
                        output.push_str(&format!("{}|{}\n", failure.txid, failure.error));
                    }
                }

                Ok(output)
            }
            OutputFormat::Json => Self::export_json(analysis),
            OutputFormat::Csv => {
                let result = &analysis.result;
                let mut writer = csv::Writer::from_writer(Vec::new());
                for (wallet, tally) in result.tallies() {
                    for txid in &tally.txids {
                        writer.serialize(CsvRow {
                            txid,
                            wallet: Some(*wallet),
                            error: None,
                        })?;
                    }
                }
                for failure in result.failures() {
                    writer.serialize(CsvRow {
                        txid: &failure.txid,
                        wallet: None,
                        error: Some(&failure.error),
                    })?;
                }
                Self::finish_csv(writer)
            }
        }
    }

    /// Format a single-transaction verdict with its reasoning
    pub fn format_detection(
        detection: &Detection,
        tx: &Tx,
        format: &OutputFormat,
    ) -> AppResult<String> {
        let fee = fee_sats(
            tx.vin.iter().map(|input| input.prevout.value),
            tx.vout.iter().map(|output| output.value),
        );

        match format {
            OutputFormat::Console => {
                let mut output = String::new();
                output.push_str(&format!("Transaction: {}\n", detection.txid));
                output.push_str(&format!(
                    "Inputs: {}  Outputs: {}  nVersion: {}  nLockTime: {}\n",
                    tx.vin.len(),
                    tx.vout.len(),
                    tx.version,
                    tx.locktime
                ));
                if let Some(fee) = fee {
                    output.push_str(&format!("Fee: {}\n", format_sats_as_btc(fee)));
                }
                for (index, out) in tx.vout.iter().enumerate() {
                    output.push_str(&format!(
                        "  #{} {:<22} {}\n",
                        index,
                        out.scriptpubkey_type.as_str(),
                        format_sats_as_btc(out.value)
                    ));
                }

                output.push_str("\nReasoning:\n");
                for line in detection.trace.to_readable() {
                    output.push_str(&format!("  {}\n", line));
                }

                let candidates: Vec<&str> =
                    detection.candidates.iter().map(Wallet::as_str).collect();
                output.push_str(&format!(
                    "\nCandidates: {}\n",
                    if candidates.is_empty() {
                        "none".to_string()
                    } else {
                        candidates.join(", ")
                    }
                ));
                output.push_str(&format!("Wallet: {}\n", detection.verdict));
                Ok(output)
            }
            OutputFormat::Json => Self::export_json(&DetectionReport {
                detection,
                fee_sats: fee,
                tx,
            }),
            OutputFormat::Csv => {
                let mut writer = csv::Writer::from_writer(Vec::new());
                writer.serialize(CsvRow {
                    txid: &detection.txid,
                    wallet: Some(detection.verdict),
                    error: None,
                })?;
                Self::finish_csv(writer)
            }
        }
    }

    fn finish_csv(writer: csv::Writer<Vec<u8>>) -> AppResult<String> {
        let bytes = writer
            .into_inner()
            .map_err(|e| AppError::InvalidData(format!("CSV export failed: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| AppError::InvalidData(format!("CSV export failed: {}", e)))
    }

    /// Export any serialisable report as pretty JSON
    pub fn export_json<T: Serialize>(data: &T) -> AppResult<String> {
        serde_json::to_string_pretty(data)
            .map_err(|e| AppError::InvalidData(format!("JSON export failed: {}", e)))
    }
}
