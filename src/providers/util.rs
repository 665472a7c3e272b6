use crate::core::error::ConversionError;
use crate::core::rate_table::RatePair;
use reqwest::{Client, Response, StatusCode, Url};
use tracing::debug;

const USER_AGENT: &str = concat!("fxledger/", env!("CARGO_PKG_VERSION"));

/// HTTP client shared by every request of one feed.
pub fn http_client() -> reqwest::Result<Client> {
    Client::builder().user_agent(USER_AGENT).build()
}

async fn send(client: &Client, url: Url, pair: RatePair) -> Result<Response, ConversionError> {
    debug!("Requesting {} rates from {}", pair, url);

    client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| ConversionError::fetch_failed(pair, format!("Request error: {e} URL: {url}")))
}

fn http_error(pair: RatePair, status: StatusCode) -> ConversionError {
    ConversionError::fetch_failed(pair, format!("HTTP error: {status}"))
}

async fn read_body(response: Response, pair: RatePair) -> Result<String, ConversionError> {
    let text = response
        .text()
        .await
        .map_err(|e| ConversionError::fetch_failed(pair, format!("Failed to read response: {e}")))?;

    if text.trim().is_empty() {
        return Err(ConversionError::fetch_failed(pair, "Received empty response"));
    }

    Ok(text)
}

/// Issues a GET for `pair` and returns the body of a successful, non-empty response.
///
/// Any failure is reported as `RateFetchFailed`; nothing is retried.
pub async fn fetch_text(client: &Client, url: Url, pair: RatePair) -> Result<String, ConversionError> {
    let response = send(client, url, pair).await?;
    if !response.status().is_success() {
        return Err(http_error(pair, response.status()));
    }
    read_body(response, pair).await
}

/// Like [`fetch_text`], but a 404 whose body starts with `no_data_marker` is an
/// empty result set and yields `None`. Any other 404 is still a failure.
pub async fn fetch_text_or_no_data(
    client: &Client,
    url: Url,
    pair: RatePair,
    no_data_marker: &str,
) -> Result<Option<String>, ConversionError> {
    let response = send(client, url, pair).await?;
    let status = response.status();

    if status == StatusCode::NOT_FOUND {
        let body = response.text().await.unwrap_or_default();
        if body.trim_start().starts_with(no_data_marker) {
            debug!("No {} rates in the requested period", pair);
            return Ok(None);
        }
        return Err(http_error(pair, status));
    }
    if !status.is_success() {
        return Err(http_error(pair, status));
    }
    read_body(response, pair).await.map(Some)
}
