//! Failures of the rate resolution and conversion core

use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised while resolving a rate or converting an amount.
///
/// `UnsupportedCurrencyPair` and `NoRateAvailable` concern a single
/// transaction. `RateFetchFailed` poisons the provider that raised it: every
/// later conversion on that provider replays the same error, which is why the
/// type is `Clone`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    #[error("Unsupported currency pair: {from} -> {to}")]
    UnsupportedCurrencyPair { from: String, to: String },

    #[error("Failed to fetch {pair} rates: {reason}")]
    RateFetchFailed { pair: String, reason: String },

    #[error("No {pair} rate available on or before {date}")]
    NoRateAvailable { pair: String, date: NaiveDate },
}

impl ConversionError {
    pub fn unsupported(from: impl ToString, to: impl ToString) -> Self {
        ConversionError::UnsupportedCurrencyPair {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn fetch_failed(pair: impl ToString, reason: impl ToString) -> Self {
        ConversionError::RateFetchFailed {
            pair: pair.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether the error makes the whole provider unusable rather than one transaction.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConversionError::RateFetchFailed { .. })
    }
}
