//! Normalized transaction ledger and amount backfilling

use crate::core::currency::{Currency, CurrencyConverter};
use crate::core::error::ConversionError;
use crate::core::rate_table::FetchWindow;
use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A transaction as produced by a statement parser.
///
/// Only the amount in `original_currency` is required; parsers fill other
/// columns when the statement itself shows them (e.g. card settlements in EUR
/// for a USD purchase).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementRecord {
    pub id: String,
    pub date: NaiveDate,
    pub description: String,
    pub amount_eur: Option<f64>,
    pub amount_usd: Option<f64>,
    pub amount_brl: Option<f64>,
    pub original_currency: Currency,
    pub source_id: String,
    #[serde(default)]
    pub category: Option<String>,
}

impl StatementRecord {
    pub fn amount_in(&self, currency: Currency) -> Option<f64> {
        match currency {
            Currency::Eur => self.amount_eur,
            Currency::Usd => self.amount_usd,
            Currency::Brl => self.amount_brl,
        }
    }

    pub fn native_amount(&self) -> Option<f64> {
        self.amount_in(self.original_currency)
    }
}

/// A ledger row with an amount in every supported currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: String,
    pub date: NaiveDate,
    pub description: String,
    pub amount_eur: f64,
    pub amount_usd: f64,
    pub amount_brl: f64,
    pub original_currency: Currency,
    pub source_id: String,
    pub category: Option<String>,
}

impl LedgerEntry {
    pub fn amount_in(&self, currency: Currency) -> f64 {
        match currency {
            Currency::Eur => self.amount_eur,
            Currency::Usd => self.amount_usd,
            Currency::Brl => self.amount_brl,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRecord {
    pub id: String,
    pub date: NaiveDate,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct LedgerReport {
    pub entries: Vec<LedgerEntry>,
    pub skipped: Vec<SkippedRecord>,
}

/// Window the rate feeds must cover for `records`.
pub fn ledger_window(records: &[StatementRecord], lookback_days: u32) -> Option<FetchWindow> {
    FetchWindow::covering(records.iter().map(|r| r.date), lookback_days)
}

/// Fills every missing currency column of a single record.
pub async fn backfill_record(
    record: &StatementRecord,
    converter: &(dyn CurrencyConverter + Send + Sync),
) -> Result<LedgerEntry, ConversionError> {
    let native = record.native_amount().ok_or_else(|| {
        ConversionError::unsupported(
            record.original_currency,
            format!("(no {} amount on record)", record.original_currency),
        )
    })?;

    let mut amounts = [0.0; 3];
    for (slot, currency) in amounts.iter_mut().zip(Currency::ALL) {
        *slot = match record.amount_in(currency) {
            Some(amount) => amount,
            None => {
                converter
                    .convert(record.date, native, record.original_currency, currency)
                    .await?
            }
        };
    }
    let [amount_eur, amount_usd, amount_brl] = amounts;

    Ok(LedgerEntry {
        id: record.id.clone(),
        date: record.date,
        description: record.description.clone(),
        amount_eur,
        amount_usd,
        amount_brl,
        original_currency: record.original_currency,
        source_id: record.source_id.clone(),
        category: record.category.clone(),
    })
}

/// Backfills `records` one at a time.
///
/// Records whose rate cannot be resolved are skipped and reported. A feed
/// that could not be fetched aborts the whole run.
pub async fn backfill(
    records: &[StatementRecord],
    converter: &(dyn CurrencyConverter + Send + Sync),
    mut on_progress: impl FnMut(&StatementRecord),
) -> Result<LedgerReport> {
    let mut report = LedgerReport::default();

    for record in records {
        match backfill_record(record, converter).await {
            Ok(entry) => {
                debug!(id = %entry.id, "Backfilled transaction");
                report.entries.push(entry);
            }
            Err(e) if e.is_terminal() => return Err(e.into()),
            Err(e) => {
                warn!(id = %record.id, date = %record.date, error = %e, "Skipping transaction");
                report.skipped.push(SkippedRecord {
                    id: record.id.clone(),
                    date: record.date,
                    reason: e.to_string(),
                });
            }
        }
        on_progress(record);
    }

    Ok(report)
}
