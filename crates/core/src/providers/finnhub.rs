use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use crate::errors::CoreError;

use super::traits::{CompanyProfile, Decoded, MarketDataProvider, Quote};

const BASE_URL: &str = "https://finnhub.io/api/v1";

/// Finnhub API provider for company profiles, quotes, and symbol search.
///
/// - **Requires**: API key, sent as the `token` query parameter.
/// - **Free tier**: rejects some profile/quote combinations per-symbol with
///   an `error` field in an otherwise well-formed body. That is classified
///   as `Decoded::Denied` here, never as a transport failure.
pub struct FinnhubClient {
    client: Client,
    api_key: String,
}

impl FinnhubClient {
    pub fn new(api_key: String) -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(30));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            api_key,
        }
    }
}

// ── Finnhub API response types ──────────────────────────────────────

#[derive(Deserialize)]
struct ProfileResponse {
    error: Option<String>,
    name: Option<String>,
    logo: Option<String>,
    country: Option<String>,
    currency: Option<String>,
    exchange: Option<String>,
    ipo: Option<String>,
    #[serde(rename = "marketCapitalization")]
    market_capitalization: Option<f64>,
    weburl: Option<String>,
    #[serde(rename = "finnhubIndustry")]
    industry: Option<String>,
    #[serde(rename = "shareOutstanding")]
    shares_outstanding: Option<f64>,
}

#[derive(Deserialize)]
struct QuoteResponse {
    error: Option<String>,
    c: Option<f64>,
    d: Option<f64>,
    dp: Option<f64>,
    h: Option<f64>,
    l: Option<f64>,
    o: Option<f64>,
    pc: Option<f64>,
}

#[derive(Deserialize)]
struct SearchResponse {
    result: Option<Vec<SearchEntry>>,
}

#[derive(Deserialize)]
struct SearchEntry {
    symbol: Option<String>,
}

impl From<ProfileResponse> for CompanyProfile {
    fn from(raw: ProfileResponse) -> Self {
        CompanyProfile {
            name: raw.name,
            logo: raw.logo,
            country: raw.country,
            currency: raw.currency,
            exchange: raw.exchange,
            ipo_date: raw.ipo,
            market_capitalization: raw.market_capitalization,
            web_url: raw.weburl,
            industry: raw.industry,
            shares_outstanding: raw.shares_outstanding,
        }
    }
}

impl From<QuoteResponse> for Quote {
    fn from(raw: QuoteResponse) -> Self {
        Quote {
            current_price: raw.c.unwrap_or_default(),
            price_change: raw.d.unwrap_or_default(),
            percent_change: raw.dp.unwrap_or_default(),
            day_high: raw.h.unwrap_or_default(),
            day_low: raw.l.unwrap_or_default(),
            day_open: raw.o.unwrap_or_default(),
            previous_close: raw.pc.unwrap_or_default(),
        }
    }
}

impl FinnhubClient {
    /// GET an endpoint and decode the body. Denial bodies arrive with a
    /// non-success status code, so the body is decoded before the status
    /// is checked — an `error` field wins over the HTTP status.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
        what: &str,
        ticker: &str,
    ) -> Result<(reqwest::StatusCode, T), CoreError> {
        let url = format!("{BASE_URL}{path}");
        let resp = self.client.get(&url).query(params).send().await?;
        let status = resp.status();
        let body: T = resp.json().await.map_err(|e| CoreError::Api {
            provider: "Finnhub".into(),
            message: format!("Failed to parse {what} for {ticker}: {e}"),
        })?;
        Ok((status, body))
    }

    fn http_failure(status: reqwest::StatusCode, what: &str, ticker: &str) -> CoreError {
        CoreError::Api {
            provider: "Finnhub".into(),
            message: format!("HTTP {status} fetching {what} for {ticker}"),
        }
    }
}

#[async_trait]
impl MarketDataProvider for FinnhubClient {
    fn name(&self) -> &str {
        "Finnhub"
    }

    async fn company_profile(&self, ticker: &str) -> Result<Decoded<CompanyProfile>, CoreError> {
        let upper = ticker.to_uppercase();
        let (status, body): (_, ProfileResponse) = self
            .get_json(
                "/stock/profile2",
                &[("symbol", upper.as_str()), ("token", self.api_key.as_str())],
                "profile",
                &upper,
            )
            .await?;

        if let Some(message) = body.error {
            return Ok(Decoded::Denied(message));
        }
        if !status.is_success() {
            return Err(Self::http_failure(status, "profile", &upper));
        }
        Ok(Decoded::Data(body.into()))
    }

    async fn quote(&self, ticker: &str) -> Result<Decoded<Quote>, CoreError> {
        let upper = ticker.to_uppercase();
        let (status, body): (_, QuoteResponse) = self
            .get_json(
                "/quote",
                &[("symbol", upper.as_str()), ("token", self.api_key.as_str())],
                "quote",
                &upper,
            )
            .await?;

        if let Some(message) = body.error {
            return Ok(Decoded::Denied(message));
        }
        if !status.is_success() {
            return Err(Self::http_failure(status, "quote", &upper));
        }
        Ok(Decoded::Data(body.into()))
    }

    async fn search_symbols(&self, query: &str) -> Result<Vec<String>, CoreError> {
        let (status, body): (_, SearchResponse) = self
            .get_json(
                "/search",
                &[("q", query), ("token", self.api_key.as_str())],
                "symbol search",
                query,
            )
            .await?;

        if !status.is_success() {
            return Err(Self::http_failure(status, "symbol search", query));
        }

        // Keep the provider's relevance order; drop entries without a symbol.
        Ok(body
            .result
            .unwrap_or_default()
            .into_iter()
            .filter_map(|entry| entry.symbol.filter(|s| !s.is_empty()))
            .collect())
    }
}
