//! Banco Central do Brasil PTAX feed

use crate::core::currency::Currency;
use crate::core::error::ConversionError;
use crate::core::rate_table::{FetchWindow, RatePair, RateTable};
use crate::providers::anchored::{AnchoredRateProvider, Quotation, RateFeed};
use crate::providers::util::{fetch_text, http_client};
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::instrument;

pub type BacenRateProvider = AnchoredRateProvider<BacenFeed>;

const RESOURCE: &str = "CotacaoMoedaPeriodo(moeda=@moeda,dataInicial=@dataInicial,dataFinalCotacao=@dataFinalCotacao)";
const QUERY_DATE_FORMAT: &str = "%m-%d-%Y";

/// Closing buy quotations in BRL per unit of foreign currency.
pub struct BacenFeed {
    base_url: String,
    client: Client,
}

impl BacenFeed {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: http_client()?,
        })
    }

    fn url(&self, pair: RatePair, window: FetchWindow) -> Result<Url, ConversionError> {
        let params = [
            ("@moeda", format!("'{}'", pair.quote)),
            (
                "@dataInicial",
                format!("'{}'", window.start.format(QUERY_DATE_FORMAT)),
            ),
            (
                "@dataFinalCotacao",
                format!("'{}'", window.end.format(QUERY_DATE_FORMAT)),
            ),
            ("$filter", "tipoBoletim eq 'Fechamento'".to_string()),
            ("$select", "cotacaoCompra,dataHoraCotacao".to_string()),
            ("$format", "json".to_string()),
        ];
        Url::parse_with_params(&format!("{}/{}", self.base_url, RESOURCE), &params)
            .map_err(|e| ConversionError::fetch_failed(pair, format!("Invalid URL: {e}")))
    }
}

#[derive(Debug, Deserialize)]
struct BacenResponse {
    value: Vec<BacenQuote>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BacenQuote {
    cotacao_compra: f64,
    data_hora_cotacao: String,
}

fn parse_quotes(pair: RatePair, body: &str) -> Result<RateTable, ConversionError> {
    let response: BacenResponse = serde_json::from_str(body).map_err(|e| {
        ConversionError::fetch_failed(pair, format!("Failed to parse JSON response: {e}"))
    })?;

    let mut table = RateTable::new(pair);
    for quote in response.value {
        // "2024-03-01 13:04:29.143"
        let day = quote
            .data_hora_cotacao
            .split(' ')
            .next()
            .unwrap_or_default();
        let date = NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|e| {
            ConversionError::fetch_failed(
                pair,
                format!("Invalid quotation date '{}': {e}", quote.data_hora_cotacao),
            )
        })?;
        table.insert(date, quote.cotacao_compra)?;
    }
    Ok(table)
}

#[async_trait]
impl RateFeed for BacenFeed {
    fn anchor(&self) -> Currency {
        Currency::Brl
    }

    fn quotation(&self) -> Quotation {
        Quotation::AnchorPerForeign
    }

    #[instrument(name = "BacenRateFetch", skip(self), fields(pair = %pair))]
    async fn fetch(&self, pair: RatePair, window: FetchWindow) -> Result<RateTable, ConversionError> {
        let url = self.url(pair, window)?;
        let body = fetch_text(&self.client, url, pair).await?;
        parse_quotes(pair, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::CurrencyConverter;
    use crate::providers::fake::d;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RESOURCE_PATH: &str = "/CotacaoMoedaPeriodo(moeda=@moeda,dataInicial=@dataInicial,dataFinalCotacao=@dataFinalCotacao)";

    fn usd_pair() -> RatePair {
        RatePair::new(Currency::Brl, Currency::Usd)
    }

    fn window() -> FetchWindow {
        FetchWindow::padded(d("2024-03-04"), d("2024-03-08"), 5)
    }

    async fn mount_quotes(server: &MockServer, currency: &str, body: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(RESOURCE_PATH))
            .and(query_param("@moeda", format!("'{currency}'")))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(server)
            .await;
    }

    #[test]
    fn test_parse_quotes_uses_date_part_only() {
        let body = r#"{
            "@odata.context": "https://olinda.bcb.gov.br/olinda/servico/PTAX/versao/v1/odata$metadata",
            "value": [
                {"cotacaoCompra": 4.9701, "dataHoraCotacao": "2024-02-29 13:04:29.143"},
                {"cotacaoCompra": 4.9615, "dataHoraCotacao": "2024-03-01 13:09:25.588"}
            ]
        }"#;
        let table = parse_quotes(usd_pair(), body).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.nearest_rate_on_or_before(d("2024-03-03")).unwrap(), 4.9615);
        assert_eq!(table.nearest_rate_on_or_before(d("2024-02-29")).unwrap(), 4.9701);
    }

    #[test]
    fn test_parse_quotes_rejects_schema_deviation() {
        let missing_value = r#"{"values": []}"#;
        let err = parse_quotes(usd_pair(), missing_value).unwrap_err();
        assert!(matches!(err, ConversionError::RateFetchFailed { .. }));
        assert!(err.to_string().contains("Failed to parse JSON response"));

        let bad_date = r#"{"value": [{"cotacaoCompra": 5.0, "dataHoraCotacao": "01/03/2024 13:00"}]}"#;
        let err = parse_quotes(usd_pair(), bad_date).unwrap_err();
        assert!(err.to_string().contains("Invalid quotation date"));

        let string_rate = r#"{"value": [{"cotacaoCompra": "5,0", "dataHoraCotacao": "2024-03-01 13:00"}]}"#;
        assert!(parse_quotes(usd_pair(), string_rate).is_err());

        let zero_rate = r#"{"value": [{"cotacaoCompra": 0.0, "dataHoraCotacao": "2024-03-01 13:00"}]}"#;
        assert!(parse_quotes(usd_pair(), zero_rate).is_err());
    }

    #[test]
    fn test_url_encodes_window_and_filter() {
        let feed = BacenFeed::new("https://olinda.example/odata/").unwrap();
        let url = feed.url(usd_pair(), window()).unwrap();

        assert!(url.path().ends_with(RESOURCE_PATH));
        let params: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(params.contains(&("@moeda".to_string(), "'USD'".to_string())));
        assert!(params.contains(&("@dataInicial".to_string(), "'02-28-2024'".to_string())));
        assert!(params.contains(&("@dataFinalCotacao".to_string(), "'03-08-2024'".to_string())));
        assert!(params.contains(&(
            "$filter".to_string(),
            "tipoBoletim eq 'Fechamento'".to_string()
        )));
    }

    #[tokio::test]
    async fn test_successful_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(RESOURCE_PATH))
            .and(query_param("@moeda", "'USD'"))
            .and(query_param("@dataInicial", "'02-28-2024'"))
            .and(query_param("@dataFinalCotacao", "'03-08-2024'"))
            .and(query_param("$filter", "tipoBoletim eq 'Fechamento'"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"value": [{"cotacaoCompra": 5.0, "dataHoraCotacao": "2024-03-01 13:04:29.143"}]}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let feed = BacenFeed::new(&server.uri()).unwrap();
        let table = feed.fetch(usd_pair(), window()).await.unwrap();
        assert_eq!(table.pair(), usd_pair());
        assert_eq!(table.nearest_rate_on_or_before(d("2024-03-04")).unwrap(), 5.0);
    }

    #[tokio::test]
    async fn test_api_error_response() {
        let server = MockServer::start().await;
        mount_quotes(&server, "USD", "Server Error", 500).await;

        let feed = BacenFeed::new(&server.uri()).unwrap();
        let err = feed.fetch(usd_pair(), window()).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to fetch BRL/USD rates: HTTP error: 500 Internal Server Error"
        );
    }

    #[tokio::test]
    async fn test_api_empty_response() {
        let server = MockServer::start().await;
        mount_quotes(&server, "USD", "", 200).await;

        let feed = BacenFeed::new(&server.uri()).unwrap();
        let err = feed.fetch(usd_pair(), window()).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to fetch BRL/USD rates: Received empty response"
        );
    }

    #[tokio::test]
    async fn test_provider_converts_with_both_tables() {
        let server = MockServer::start().await;
        mount_quotes(
            &server,
            "USD",
            r#"{"value": [{"cotacaoCompra": 5.0, "dataHoraCotacao": "2024-03-01 13:04:29.143"}]}"#,
            200,
        )
        .await;
        mount_quotes(
            &server,
            "EUR",
            r#"{"value": [{"cotacaoCompra": 5.4, "dataHoraCotacao": "2024-03-01 13:04:29.143"}]}"#,
            200,
        )
        .await;

        let provider = BacenRateProvider::new(BacenFeed::new(&server.uri()).unwrap(), window());
        let usd = provider
            .convert(d("2024-03-04"), 50.0, Currency::Brl, Currency::Usd)
            .await
            .unwrap();
        assert_eq!(usd, 10.0);
        let brl = provider
            .convert(d("2024-03-04"), 10.0, Currency::Eur, Currency::Brl)
            .await
            .unwrap();
        assert!((brl - 54.0).abs() < 1e-9);

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
    }
}
