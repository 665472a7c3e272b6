//! European Central Bank reference rate feed

use crate::core::currency::Currency;
use crate::core::error::ConversionError;
use crate::core::rate_table::{FetchWindow, RatePair, RateTable};
use crate::providers::anchored::{AnchoredRateProvider, Quotation, RateFeed};
use crate::providers::util::{fetch_text_or_no_data, http_client};
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Url};
use tracing::instrument;

pub type EcbRateProvider = AnchoredRateProvider<EcbFeed>;

const DATE_COLUMN: usize = 6;
const RATE_COLUMN: usize = 7;
const DATE_FORMAT: &str = "%Y-%m-%d";
// Body of the 404 the data API sends for a period without observations
const NO_RESULTS: &str = "No results found";

/// Daily reference rates in units of foreign currency per EUR.
pub struct EcbFeed {
    base_url: String,
    client: Client,
}

impl EcbFeed {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: http_client()?,
        })
    }

    fn url(&self, pair: RatePair, window: FetchWindow) -> Result<Url, ConversionError> {
        let series = format!("D.{}.{}.SP00.A", pair.quote, pair.base);
        let params = [
            ("startPeriod", window.start.format(DATE_FORMAT).to_string()),
            ("endPeriod", window.end.format(DATE_FORMAT).to_string()),
            ("format", "csvdata".to_string()),
        ];
        Url::parse_with_params(&format!("{}/data/EXR/{}", self.base_url, series), &params)
            .map_err(|e| ConversionError::fetch_failed(pair, format!("Invalid URL: {e}")))
    }
}

fn parse_csv(pair: RatePair, body: &str) -> Result<RateTable, ConversionError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(body.as_bytes());

    let mut table = RateTable::new(pair);
    for (index, record) in reader.records().enumerate() {
        let line = index + 2;
        let record = record
            .map_err(|e| ConversionError::fetch_failed(pair, format!("Malformed CSV: {e}")))?;

        let (Some(date), Some(rate)) = (record.get(DATE_COLUMN), record.get(RATE_COLUMN)) else {
            return Err(ConversionError::fetch_failed(
                pair,
                format!("Line {line} has {} columns", record.len()),
            ));
        };
        let date = NaiveDate::parse_from_str(date.trim(), DATE_FORMAT).map_err(|e| {
            ConversionError::fetch_failed(pair, format!("Invalid date '{date}' on line {line}: {e}"))
        })?;
        let rate: f64 = rate.trim().parse().map_err(|e| {
            ConversionError::fetch_failed(pair, format!("Invalid rate '{rate}' on line {line}: {e}"))
        })?;
        table.insert(date, rate)?;
    }
    Ok(table)
}

#[async_trait]
impl RateFeed for EcbFeed {
    fn anchor(&self) -> Currency {
        Currency::Eur
    }

    fn quotation(&self) -> Quotation {
        Quotation::ForeignPerAnchor
    }

    #[instrument(name = "EcbRateFetch", skip(self), fields(pair = %pair))]
    async fn fetch(&self, pair: RatePair, window: FetchWindow) -> Result<RateTable, ConversionError> {
        let url = self.url(pair, window)?;
        match fetch_text_or_no_data(&self.client, url, pair, NO_RESULTS).await? {
            Some(body) => parse_csv(pair, &body),
            None => Ok(RateTable::new(pair)),
        }
    }
}
