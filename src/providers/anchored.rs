//! Rate provider anchored on a single currency
//!
//! Both central-bank feeds quote two foreign currencies against their own
//! currency. [`AnchoredRateProvider`] holds the logic they share: the pair
//! precondition, the lazy at-most-once table fetch and the nearest-prior
//! lookup. A [`RateFeed`] supplies the anchor, the quoting direction and the
//! remote fetch.

use crate::core::currency::{Currency, CurrencyConverter};
use crate::core::error::ConversionError;
use crate::core::rate_table::{FetchWindow, RatePair, RateTable};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// How a feed's rate relates the anchor to the foreign currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quotation {
    /// Units of anchor currency per unit of foreign currency (BRL per USD).
    AnchorPerForeign,
    /// Units of foreign currency per unit of anchor currency (USD per EUR).
    ForeignPerAnchor,
}

impl Quotation {
    pub fn apply(self, amount: f64, rate: f64, from_anchor: bool) -> f64 {
        match (self, from_anchor) {
            (Quotation::AnchorPerForeign, true) => amount / rate,
            (Quotation::AnchorPerForeign, false) => amount * rate,
            (Quotation::ForeignPerAnchor, true) => amount * rate,
            (Quotation::ForeignPerAnchor, false) => amount / rate,
        }
    }
}

/// Remote source of historical rates quoted against one anchor currency.
#[async_trait]
pub trait RateFeed: Send + Sync {
    fn anchor(&self) -> Currency;

    fn quotation(&self) -> Quotation;

    /// Fetches every quotation of `pair` within `window` in one round trip.
    async fn fetch(&self, pair: RatePair, window: FetchWindow) -> Result<RateTable, ConversionError>;
}

type Tables = HashMap<Currency, RateTable>;

pub struct AnchoredRateProvider<F: RateFeed> {
    feed: F,
    window: FetchWindow,
    // Outcome of the single fetch, failures included
    tables: OnceCell<Result<Tables, ConversionError>>,
}

impl<F: RateFeed> AnchoredRateProvider<F> {
    pub fn new(feed: F, window: FetchWindow) -> Self {
        Self {
            feed,
            window,
            tables: OnceCell::new(),
        }
    }

    pub fn anchor(&self) -> Currency {
        self.feed.anchor()
    }

    pub fn feed(&self) -> &F {
        &self.feed
    }

    /// The pairs this provider serves, anchor first.
    pub fn pairs(&self) -> Vec<RatePair> {
        let anchor = self.anchor();
        Currency::ALL
            .into_iter()
            .filter(|c| *c != anchor)
            .map(|foreign| RatePair::new(anchor, foreign))
            .collect()
    }

    /// Whether the tables were fetched, successfully or not.
    pub fn is_loaded(&self) -> bool {
        self.tables.initialized()
    }

    async fn tables(&self) -> Result<&Tables, ConversionError> {
        self.tables
            .get_or_init(|| self.load_tables())
            .await
            .as_ref()
            .map_err(Clone::clone)
    }

    async fn load_tables(&self) -> Result<Tables, ConversionError> {
        let mut tables = HashMap::new();
        for pair in self.pairs() {
            let table = self.feed.fetch(pair, self.window).await.inspect_err(|e| {
                warn!(%pair, error = %e, "Rate fetch failed");
            })?;
            if table.is_empty() {
                warn!(%pair, start = %self.window.start, end = %self.window.end, "Feed returned no rates");
            } else {
                info!(%pair, rates = table.len(), "Fetched rate table");
            }
            tables.insert(pair.quote, table);
        }
        Ok(tables)
    }
}

#[async_trait]
impl<F: RateFeed> CurrencyConverter for AnchoredRateProvider<F> {
    async fn convert(
        &self,
        date: NaiveDate,
        amount: f64,
        from: Currency,
        to: Currency,
    ) -> Result<f64, ConversionError> {
        let anchor = self.anchor();
        let from_anchor = from == anchor;
        let foreign = match (from_anchor, to == anchor) {
            (true, false) => to,
            (false, true) => from,
            _ => return Err(ConversionError::unsupported(from, to)),
        };

        let tables = self.tables().await?;
        let table = tables
            .get(&foreign)
            .ok_or_else(|| ConversionError::unsupported(from, to))?;
        let rate = table.nearest_rate_on_or_before(date)?;
        debug!(pair = %table.pair(), %date, rate, "Resolved rate");

        Ok(self.feed.quotation().apply(amount, rate, from_anchor))
    }
}
