use async_trait::async_trait;
use futures::future::try_join_all;
use std::sync::Arc;

use crate::errors::{CoreError, FetchStage};
use crate::models::stock::StockRecord;
use crate::providers::traits::{CompanyProfile, Decoded, MarketDataProvider, Quote};
use crate::services::search_service::SymbolLookup;

/// Tickers shown when there is no query and no signed-in watchlist.
pub const DEFAULT_WATCHLIST: [&str; 12] = [
    "AAPL", "MSFT", "GOOGL", "AMZN", "TSLA", "NVDA", "META", "BA", "JPM", "V", "CRM", "AVGO",
];

/// Upper bound on symbols resolved from one search query. Tie-break is
/// provider order: the first 25 results are kept as returned.
const MAX_LOOKUP_SYMBOLS: usize = 25;

/// Fetches and merges profile + quote data into flat stock records.
///
/// Two fetch disciplines, per caller contract:
/// - **strict** (`fetch_stock`, `fetch_batch`): any sub-call failure,
///   including provider-signaled denial, fails the whole fetch with an
///   error naming the ticker and the sub-call. No partial records.
/// - **tolerant** (`lookup`): provider-signaled denial is downgraded to a
///   `no_access` stub so one restricted symbol never sinks the batch;
///   transport failures still propagate.
///
/// No caching — every call re-fetches.
pub struct StockService {
    provider: Arc<dyn MarketDataProvider>,
}

impl StockService {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { provider }
    }

    /// Strict profile + quote fetch for one ticker.
    pub async fn fetch_stock(&self, ticker: &str) -> Result<StockRecord, CoreError> {
        let upper = ticker.to_uppercase();

        let profile = match self.provider.company_profile(&upper).await {
            Ok(Decoded::Data(profile)) => profile,
            Ok(Decoded::Denied(_)) => {
                return Err(CoreError::Fetch {
                    ticker: upper,
                    stage: FetchStage::Profile,
                });
            }
            Err(e) => {
                log::debug!("profile fetch for {upper} failed: {e}");
                return Err(CoreError::Fetch {
                    ticker: upper,
                    stage: FetchStage::Profile,
                });
            }
        };

        let quote = match self.provider.quote(&upper).await {
            Ok(Decoded::Data(quote)) => quote,
            Ok(Decoded::Denied(_)) => {
                return Err(CoreError::Fetch {
                    ticker: upper,
                    stage: FetchStage::Quote,
                });
            }
            Err(e) => {
                log::debug!("quote fetch for {upper} failed: {e}");
                return Err(CoreError::Fetch {
                    ticker: upper,
                    stage: FetchStage::Quote,
                });
            }
        };

        Ok(merge(&upper, profile, quote))
    }

    /// Strict concurrent fetch for a batch of tickers (the watchlist
    /// screen). One failed ticker fails the whole batch.
    pub async fn fetch_batch(&self, tickers: &[String]) -> Result<Vec<StockRecord>, CoreError> {
        if tickers.is_empty() {
            return Ok(Vec::new());
        }
        try_join_all(tickers.iter().map(|t| self.fetch_stock(t))).await
    }

    /// Tolerant search-driven lookup. An empty (or whitespace) query falls
    /// back to the default watchlist symbols; otherwise the query is
    /// resolved through symbol search, capped at 25 candidates in provider
    /// order. Per-symbol fetches run concurrently; output order matches
    /// the resolved-symbol order.
    pub async fn lookup(&self, query: &str) -> Result<Vec<StockRecord>, CoreError> {
        let symbols: Vec<String> = if query.trim().is_empty() {
            DEFAULT_WATCHLIST.iter().map(|s| s.to_string()).collect()
        } else {
            self.provider
                .search_symbols(query.trim())
                .await?
                .into_iter()
                .take(MAX_LOOKUP_SYMBOLS)
                .collect()
        };

        try_join_all(symbols.iter().map(|s| self.fetch_tolerant(s))).await
    }

    /// Tolerant per-symbol fetch: denial becomes a stub record, transport
    /// failure propagates.
    async fn fetch_tolerant(&self, ticker: &str) -> Result<StockRecord, CoreError> {
        let upper = ticker.to_uppercase();

        let profile = match self.provider.company_profile(&upper).await? {
            Decoded::Data(profile) => profile,
            // No access to the profile: only the ticker is trustworthy.
            Decoded::Denied(_) => return Ok(StockRecord::denied(&upper)),
        };

        match self.provider.quote(&upper).await? {
            Decoded::Data(quote) => Ok(merge(&upper, profile, quote)),
            // Profile came through but the quote is restricted: keep the
            // profile fields, leave every price field absent.
            Decoded::Denied(_) => Ok(merge_profile_only(&upper, profile)),
        }
    }
}

#[async_trait]
impl SymbolLookup for StockService {
    async fn lookup(&self, query: &str) -> Result<Vec<StockRecord>, CoreError> {
        StockService::lookup(self, query).await
    }
}

fn merge(ticker: &str, profile: CompanyProfile, quote: Quote) -> StockRecord {
    StockRecord {
        ticker: ticker.to_string(),
        name: profile.name.unwrap_or_else(|| ticker.to_string()),
        logo: profile.logo,
        country: profile.country,
        currency: profile.currency,
        exchange: profile.exchange,
        ipo_date: profile.ipo_date,
        market_capitalization: profile.market_capitalization,
        web_url: profile.web_url,
        industry: profile.industry,
        shares_outstanding: profile.shares_outstanding,
        current_price: Some(quote.current_price),
        price_change: Some(quote.price_change),
        percent_change: Some(quote.percent_change),
        day_high: Some(quote.day_high),
        day_low: Some(quote.day_low),
        day_open: Some(quote.day_open),
        previous_close: Some(quote.previous_close),
        no_access: false,
    }
}

fn merge_profile_only(ticker: &str, profile: CompanyProfile) -> StockRecord {
    StockRecord {
        ticker: ticker.to_string(),
        name: profile.name.unwrap_or_else(|| ticker.to_string()),
        logo: profile.logo,
        country: profile.country,
        currency: profile.currency,
        exchange: profile.exchange,
        ipo_date: profile.ipo_date,
        market_capitalization: profile.market_capitalization,
        web_url: profile.web_url,
        industry: profile.industry,
        shares_outstanding: profile.shares_outstanding,
        current_price: None,
        price_change: None,
        percent_change: None,
        day_high: None,
        day_low: None,
        day_open: None,
        previous_close: None,
        no_access: true,
    }
}
