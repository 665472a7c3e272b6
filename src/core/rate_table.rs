//! Date-indexed historical rates for a single currency pair

use crate::core::currency::Currency;
use crate::core::error::ConversionError;
use chrono::{Days, NaiveDate};
use std::collections::BTreeMap;
use std::fmt::Display;

pub const DEFAULT_LOOKBACK_DAYS: u32 = 5;
/// Largest lookback a config may ask for.
pub const MAX_LOOKBACK_DAYS: u32 = 366;

/// A (base, quote) currency combination backed by one historical table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RatePair {
    pub base: Currency,
    pub quote: Currency,
}

impl RatePair {
    pub fn new(base: Currency, quote: Currency) -> Self {
        Self { base, quote }
    }
}

impl Display for RatePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// Inclusive date range requested from a remote feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FetchWindow {
    /// Pads `[min, max]` backwards so the earliest date still has a prior quotation.
    ///
    /// The start saturates at the earliest representable date.
    pub fn padded(min: NaiveDate, max: NaiveDate, lookback_days: u32) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            start: min
                .checked_sub_days(Days::new(u64::from(lookback_days)))
                .unwrap_or(NaiveDate::MIN),
            end: max,
        }
    }

    /// Window covering every date in `dates`, or `None` when there are none.
    pub fn covering<I>(dates: I, lookback_days: u32) -> Option<Self>
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        let mut dates = dates.into_iter();
        let first = dates.next()?;
        let (min, max) = dates.fold((first, first), |(min, max), d| (min.min(d), max.max(d)));
        Some(Self::padded(min, max, lookback_days))
    }
}

/// Published rates for one pair, keyed by quotation date.
#[derive(Debug, Clone)]
pub struct RateTable {
    pair: RatePair,
    entries: BTreeMap<NaiveDate, f64>,
}

impl RateTable {
    pub fn new(pair: RatePair) -> Self {
        Self {
            pair,
            entries: BTreeMap::new(),
        }
    }

    pub fn pair(&self) -> RatePair {
        self.pair
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records the rate quoted on `date`. A later insert for the same date wins.
    pub fn insert(&mut self, date: NaiveDate, rate: f64) -> Result<(), ConversionError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(ConversionError::fetch_failed(
                self.pair,
                format!("rate must be positive, got {rate} on {date}"),
            ));
        }
        self.entries.insert(date, rate);
        Ok(())
    }

    /// The most recent rate quoted on or before `date`. Never a later quotation.
    pub fn nearest_rate_on_or_before(&self, date: NaiveDate) -> Result<f64, ConversionError> {
        self.entries
            .range(..=date)
            .next_back()
            .map(|(_, rate)| *rate)
            .ok_or_else(|| ConversionError::NoRateAvailable {
                pair: self.pair.to_string(),
                date,
            })
    }
}
