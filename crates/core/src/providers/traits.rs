use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::series::TimeRange;

use super::alphavantage::TimeSeriesResponse;

/// Classification of a successfully-transported provider response.
///
/// Some providers signal "you lack entitlement for this symbol" inside an
/// HTTP body that is otherwise shaped like a success. That is not a
/// transport failure, so it is classified here instead of being surfaced
/// as an error — callers decide whether denial is fatal (strict fetch)
/// or downgraded to a stub record (tolerant lookup).
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
    Data(T),
    /// Provider-signaled access denial, with the provider's message.
    Denied(String),
}

/// Static company metadata as decoded from the profile endpoint.
/// All fields optional: the provider omits what it does not know.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyProfile {
    pub name: Option<String>,
    pub logo: Option<String>,
    pub country: Option<String>,
    pub currency: Option<String>,
    pub exchange: Option<String>,
    pub ipo_date: Option<String>,
    /// In millions.
    pub market_capitalization: Option<f64>,
    pub web_url: Option<String>,
    pub industry: Option<String>,
    /// In millions of shares.
    pub shares_outstanding: Option<f64>,
}

/// Real-time price snapshot with the provider's short field codes already
/// renamed to domain names (c → current_price, d → price_change, …).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Quote {
    pub current_price: f64,
    pub price_change: f64,
    pub percent_change: f64,
    pub day_high: f64,
    pub day_low: f64,
    pub day_open: f64,
    pub previous_close: f64,
}

/// Profile/quote/symbol-search capability of the market-data API.
///
/// One implementation per real provider; tests plug in mocks. If the API
/// changes, only the implementation is touched — services stay as they are.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Company profile for one ticker, classified at the decode boundary.
    async fn company_profile(&self, ticker: &str) -> Result<Decoded<CompanyProfile>, CoreError>;

    /// Real-time quote for one ticker, classified at the decode boundary.
    async fn quote(&self, ticker: &str) -> Result<Decoded<Quote>, CoreError>;

    /// Resolve a free-text query into candidate ticker symbols,
    /// in the provider's relevance order.
    async fn search_symbols(&self, query: &str) -> Result<Vec<String>, CoreError>;
}

/// Historical price-history capability of the time-series API.
#[async_trait]
pub trait TimeSeriesProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch the raw time-series payload for a ticker at the granularity
    /// implied by `range`. The payload is decoded but NOT normalized —
    /// windowing and label formatting happen in the chart service.
    async fn time_series(
        &self,
        ticker: &str,
        range: TimeRange,
    ) -> Result<TimeSeriesResponse, CoreError>;
}
