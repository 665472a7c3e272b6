//! Picks the provider that serves a currency pair

use crate::core::config::AppConfig;
use crate::core::currency::{Currency, CurrencyConverter};
use crate::core::error::ConversionError;
use crate::core::rate_table::FetchWindow;
use crate::providers::bacen::{BacenFeed, BacenRateProvider};
use crate::providers::ecb::{EcbFeed, EcbRateProvider};
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt::Display;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateSource {
    Bacen,
    Ecb,
}

impl Display for RateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RateSource::Bacen => f.write_str("Bacen"),
            RateSource::Ecb => f.write_str("ECB"),
        }
    }
}

/// The source currency decides, except USD -> EUR which only the ECB quotes directly.
pub fn route(from: Currency, to: Currency) -> RateSource {
    match (from, to) {
        (Currency::Brl, _) => RateSource::Bacen,
        (Currency::Eur, _) => RateSource::Ecb,
        (Currency::Usd, Currency::Eur) => RateSource::Ecb,
        (Currency::Usd, _) => RateSource::Bacen,
    }
}

/// Rounds half away from zero to 2 decimal places.
pub fn round_cents(value: f64) -> f64 {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or_else(|| (value * 100.0).round() / 100.0)
}

pub struct ConversionRouter {
    bacen: Arc<dyn CurrencyConverter>,
    ecb: Arc<dyn CurrencyConverter>,
}

impl ConversionRouter {
    pub fn new(bacen: Arc<dyn CurrencyConverter>, ecb: Arc<dyn CurrencyConverter>) -> Self {
        Self { bacen, ecb }
    }

    /// Live Bacen and ECB providers covering `window`.
    pub fn from_config(config: &AppConfig, window: FetchWindow) -> Result<Self> {
        let bacen = BacenRateProvider::new(BacenFeed::new(&config.providers.bacen.base_url)?, window);
        let ecb = EcbRateProvider::new(EcbFeed::new(&config.providers.ecb.base_url)?, window);
        Ok(Self::new(Arc::new(bacen), Arc::new(ecb)))
    }

    fn provider(&self, source: RateSource) -> &dyn CurrencyConverter {
        match source {
            RateSource::Bacen => self.bacen.as_ref(),
            RateSource::Ecb => self.ecb.as_ref(),
        }
    }

    /// Converts between currency codes; unknown codes fail before any provider is used.
    pub async fn convert_codes(
        &self,
        date: NaiveDate,
        amount: f64,
        from: &str,
        to: &str,
    ) -> Result<f64, ConversionError> {
        let (Ok(from_currency), Ok(to_currency)) = (from.parse::<Currency>(), to.parse::<Currency>()) else {
            return Err(ConversionError::unsupported(from, to));
        };
        self.convert(date, amount, from_currency, to_currency).await
    }
}

#[async_trait]
impl CurrencyConverter for ConversionRouter {
    async fn convert(
        &self,
        date: NaiveDate,
        amount: f64,
        from: Currency,
        to: Currency,
    ) -> Result<f64, ConversionError> {
        if from == to {
            return Ok(amount);
        }

        let source = route(from, to);
        debug!(%from, %to, %date, %source, "Routing conversion");
        let converted = self.provider(source).convert(date, amount, from, to).await?;
        Ok(round_cents(converted))
    }
}
