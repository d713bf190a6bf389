use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::series::{TimeRange, TimeSeriesPoint};

use super::traits::TimeSeriesProvider;

const BASE_URL: &str = "https://www.alphavantage.co/query";

/// Alpha Vantage API provider for historical price time series.
///
/// - **Free tier**: 25 requests/day (across ALL endpoints); on overrun the
///   API answers HTTP 200 with a `Note`/`Information` body instead of data.
/// - **Requires**: API key, sent as the `apikey` query parameter.
pub struct AlphaVantageClient {
    client: Client,
    api_key: String,
}

impl AlphaVantageClient {
    pub fn new(api_key: String) -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(30));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            api_key,
        }
    }

    /// Which series endpoint serves a display range: intraday for 1D,
    /// daily for the short ranges, weekly for everything from 6M up.
    pub fn series_function(range: TimeRange) -> (&'static str, Option<&'static str>) {
        match range {
            TimeRange::D1 => ("TIME_SERIES_INTRADAY", Some("60min")),
            TimeRange::M1 | TimeRange::M3 => ("TIME_SERIES_DAILY", None),
            TimeRange::M6 | TimeRange::Ytd | TimeRange::Y1 | TimeRange::Y2 | TimeRange::Y5 => {
                ("TIME_SERIES_WEEKLY", None)
            }
        }
    }
}

// ── Alpha Vantage API response types ────────────────────────────────

/// One raw OHLCV bar as the API ships it: every number is a string.
#[derive(Debug, Clone, Deserialize)]
pub struct RawBar {
    #[serde(rename = "1. open")]
    pub open: String,
    #[serde(rename = "2. high")]
    pub high: String,
    #[serde(rename = "3. low")]
    pub low: String,
    #[serde(rename = "4. close")]
    pub close: String,
    #[serde(rename = "5. volume")]
    pub volume: String,
}

impl RawBar {
    /// Parse this bar into a typed point. `timestamp` is the map key the
    /// bar was stored under: either a date ("2024-01-05") or a date-time
    /// ("2024-01-05 16:00:00"). Returns `None` when any field fails to
    /// parse — malformed entries are dropped, not fatal.
    pub fn parse(&self, timestamp: &str) -> Option<TimeSeriesPoint> {
        let timestamp = parse_timestamp(timestamp)?;
        Some(TimeSeriesPoint {
            timestamp,
            open: self.open.parse().ok()?,
            high: self.high.parse().ok()?,
            low: self.low.parse().ok()?,
            close: self.close.parse().ok()?,
            volume: self.volume.parse().ok()?,
        })
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

pub type SeriesMap = HashMap<String, RawBar>;

/// The raw multi-shape time-series payload. Which top-level key carries
/// the data depends on the requested granularity, and the API has used
/// two spellings for the weekly and monthly keys over time — both are
/// accepted here via aliases.
///
/// A `Note`/`Information`/`Error Message` field in lieu of data signals
/// rate limiting or an invalid request; callers treat that as "no data",
/// not as an error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimeSeriesResponse {
    #[serde(rename = "Time Series (Daily)")]
    pub daily: Option<SeriesMap>,
    #[serde(rename = "Weekly Time Series", alias = "Time Series (Weekly)")]
    pub weekly: Option<SeriesMap>,
    #[serde(rename = "Monthly Time Series", alias = "Time Series (Monthly)")]
    pub monthly: Option<SeriesMap>,
    #[serde(rename = "Time Series (1min)")]
    pub min1: Option<SeriesMap>,
    #[serde(rename = "Time Series (5min)")]
    pub min5: Option<SeriesMap>,
    #[serde(rename = "Time Series (15min)")]
    pub min15: Option<SeriesMap>,
    #[serde(rename = "Time Series (30min)")]
    pub min30: Option<SeriesMap>,
    #[serde(rename = "Time Series (60min)")]
    pub min60: Option<SeriesMap>,
    #[serde(rename = "Note")]
    pub note: Option<String>,
    #[serde(rename = "Information")]
    pub information: Option<String>,
    #[serde(rename = "Error Message", alias = "ErrorMessage")]
    pub error_message: Option<String>,
}

impl TimeSeriesResponse {
    /// True when the payload carries a rate-limit or error marker
    /// instead of data.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        self.note.is_some() || self.information.is_some() || self.error_message.is_some()
    }

    /// Locate the series under the fixed precedence order: daily, weekly,
    /// monthly, then intraday from 1-minute to 60-minute. The precedence
    /// never depends on which range was requested — if the payload lacks
    /// the expected key, whatever series is present is used instead.
    #[must_use]
    pub fn located_series(&self) -> Option<&SeriesMap> {
        self.daily
            .as_ref()
            .or(self.weekly.as_ref())
            .or(self.monthly.as_ref())
            .or(self.min1.as_ref())
            .or(self.min5.as_ref())
            .or(self.min15.as_ref())
            .or(self.min30.as_ref())
            .or(self.min60.as_ref())
    }
}

#[async_trait]
impl TimeSeriesProvider for AlphaVantageClient {
    fn name(&self) -> &str {
        "Alpha Vantage"
    }

    async fn time_series(
        &self,
        ticker: &str,
        range: TimeRange,
    ) -> Result<TimeSeriesResponse, CoreError> {
        let upper = ticker.to_uppercase();
        let (function, interval) = Self::series_function(range);

        let mut params = vec![
            ("function", function),
            ("symbol", upper.as_str()),
            ("apikey", self.api_key.as_str()),
        ];
        if let Some(interval) = interval {
            params.push(("interval", interval));
        }

        let resp = self.client.get(BASE_URL).query(&params).send().await?;
        if !resp.status().is_success() {
            return Err(CoreError::Api {
                provider: "Alpha Vantage".into(),
                message: format!("HTTP {} fetching time series for {upper}", resp.status()),
            });
        }

        resp.json().await.map_err(|e| CoreError::Api {
            provider: "Alpha Vantage".into(),
            message: format!("Failed to parse time series for {upper}: {e}"),
        })
    }
}
