//! Canned rate feeds for tests

use crate::core::currency::Currency;
use crate::core::error::ConversionError;
use crate::core::rate_table::{FetchWindow, RatePair, RateTable};
use crate::providers::anchored::{Quotation, RateFeed};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub(crate) fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub(crate) struct FakeFeed {
    anchor: Currency,
    quotation: Quotation,
    rates: HashMap<Currency, Vec<(NaiveDate, f64)>>,
    fail: bool,
    delay: Option<Duration>,
    pub fetches: AtomicUsize,
    pub requested: Mutex<Vec<(RatePair, FetchWindow)>>,
}

impl FakeFeed {
    fn new(anchor: Currency, quotation: Quotation) -> Self {
        Self {
            anchor,
            quotation,
            rates: HashMap::new(),
            fail: false,
            delay: None,
            fetches: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn bacen() -> Self {
        Self::new(Currency::Brl, Quotation::AnchorPerForeign)
    }

    pub fn ecb() -> Self {
        Self::new(Currency::Eur, Quotation::ForeignPerAnchor)
    }

    pub fn with_rate(mut self, foreign: Currency, date: &str, rate: f64) -> Self {
        self.rates.entry(foreign).or_default().push((d(date), rate));
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl RateFeed for FakeFeed {
    fn anchor(&self) -> Currency {
        self.anchor
    }

    fn quotation(&self) -> Quotation {
        self.quotation
    }

    async fn fetch(&self, pair: RatePair, window: FetchWindow) -> Result<RateTable, ConversionError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push((pair, window));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(ConversionError::fetch_failed(pair, "connection refused"));
        }

        let mut table = RateTable::new(pair);
        for (date, rate) in self.rates.get(&pair.quote).into_iter().flatten() {
            table.insert(*date, *rate)?;
        }
        Ok(table)
    }
}
