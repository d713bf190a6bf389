pub mod backend;
pub mod errors;
pub mod models;
pub mod providers;
pub mod services;

use std::sync::Arc;

use backend::auth::{AuthProvider, AuthUser};
use backend::documents::DocumentStore;
use errors::CoreError;
use models::series::{ChartSeries, TimeRange};
use models::stock::StockRecord;
use models::trending::TrendingStockEntry;
use providers::alphavantage::AlphaVantageClient;
use providers::finnhub::FinnhubClient;
use providers::traits::{MarketDataProvider, TimeSeriesProvider};
use services::chart_service::ChartService;
use services::search_service::SearchOrchestrator;
use services::stock_service::{StockService, DEFAULT_WATCHLIST};
use services::trending_service::{TrendingService, TRENDING_LIMIT};
use services::watchlist_service::{SessionState, WatchlistService};

/// Main entry point for the Stock Tracker core library.
///
/// Every external collaborator — market-data API, time-series API, auth
/// provider, document store — is passed in at construction. The core
/// never reaches for ambient global state; the application entry point
/// owns the handles' process-wide lifetime.
#[must_use]
pub struct StockTracker {
    stock_service: Arc<StockService>,
    chart_service: ChartService,
    watchlist: WatchlistService,
    trending: Arc<TrendingService>,
    auth: Arc<dyn AuthProvider>,
    search: SearchOrchestrator,
}

impl std::fmt::Debug for StockTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StockTracker")
            .field("session", &self.watchlist.state())
            .field("watchlist", &self.watchlist.tickers().len())
            .finish()
    }
}

impl StockTracker {
    /// Build from explicit provider/backend handles (dependency injection;
    /// tests plug in mocks here).
    pub fn new(
        market: Arc<dyn MarketDataProvider>,
        series: Arc<dyn TimeSeriesProvider>,
        auth: Arc<dyn AuthProvider>,
        watchlist_store: Arc<dyn DocumentStore>,
        trending_store: Arc<dyn DocumentStore>,
    ) -> Self {
        let stock_service = Arc::new(StockService::new(market));
        let trending = Arc::new(TrendingService::new(trending_store));
        let lookup: Arc<dyn services::search_service::SymbolLookup> = stock_service.clone();
        let sink: Arc<dyn services::search_service::TrendingSink> = trending.clone();
        let search = SearchOrchestrator::new(lookup, Some(sink));

        Self {
            chart_service: ChartService::new(series),
            watchlist: WatchlistService::new(watchlist_store),
            stock_service,
            trending,
            auth,
            search,
        }
    }

    /// Build with the real market-data and time-series clients from their
    /// API keys.
    pub fn with_api_keys(
        finnhub_key: String,
        alphavantage_key: String,
        auth: Arc<dyn AuthProvider>,
        watchlist_store: Arc<dyn DocumentStore>,
        trending_store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self::new(
            Arc::new(FinnhubClient::new(finnhub_key)),
            Arc::new(AlphaVantageClient::new(alphavantage_key)),
            auth,
            watchlist_store,
            trending_store,
        )
    }

    // ── Session ─────────────────────────────────────────────────────

    /// Register a new account, then enter a session (loads or creates the
    /// user's remote watchlist document).
    pub async fn sign_up(&mut self, email: &str, password: &str) -> Result<AuthUser, CoreError> {
        let user = self.auth.sign_up(email, password).await?;
        self.watchlist.on_sign_in(&user.id).await?;
        Ok(user)
    }

    /// Authenticate and enter a session.
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<AuthUser, CoreError> {
        let user = self.auth.sign_in(email, password).await?;
        self.watchlist.on_sign_in(&user.id).await?;
        Ok(user)
    }

    /// End the session. Local watchlist state resets to empty; the remote
    /// copy persists for the next sign-in.
    pub async fn sign_out(&mut self) -> Result<(), CoreError> {
        self.auth.sign_out().await?;
        self.watchlist.on_sign_out();
        Ok(())
    }

    pub async fn current_user(&self) -> Option<AuthUser> {
        self.auth.current_user().await
    }

    #[must_use]
    pub fn session_state(&self) -> SessionState {
        self.watchlist.state()
    }

    // ── Stocks ──────────────────────────────────────────────────────

    /// Strict profile + quote fetch for one ticker (the detail screen).
    pub async fn fetch_stock(&self, ticker: &str) -> Result<StockRecord, CoreError> {
        self.stock_service.fetch_stock(ticker).await
    }

    /// Fetch full records for the watchlist screen: the signed-in user's
    /// tickers when present, the default set otherwise.
    pub async fn fetch_watchlist_stocks(&self) -> Result<Vec<StockRecord>, CoreError> {
        let tickers: Vec<String> = if self.watchlist.tickers().is_empty() {
            DEFAULT_WATCHLIST.iter().map(|s| s.to_string()).collect()
        } else {
            self.watchlist.tickers().to_vec()
        };
        self.stock_service.fetch_batch(&tickers).await
    }

    /// Tolerant search-driven lookup (direct, non-debounced).
    pub async fn lookup(&self, query: &str) -> Result<Vec<StockRecord>, CoreError> {
        self.stock_service.lookup(query).await
    }

    // ── Charts ──────────────────────────────────────────────────────

    /// Price-history chart for a ticker over a display range. Empty
    /// series means "no data", never an error.
    pub async fn fetch_chart(
        &self,
        ticker: &str,
        range: TimeRange,
    ) -> Result<ChartSeries, CoreError> {
        self.chart_service.fetch_chart(ticker, range).await
    }

    // ── Watchlist ───────────────────────────────────────────────────

    #[must_use]
    pub fn watchlist(&self) -> &[String] {
        self.watchlist.tickers()
    }

    #[must_use]
    pub fn is_watched(&self, ticker: &str) -> bool {
        self.watchlist.contains(ticker)
    }

    /// Add a ticker to the watchlist. Silent no-op while signed out.
    pub async fn watch(&mut self, ticker: &str) -> Result<(), CoreError> {
        self.watchlist.add(ticker).await
    }

    /// Remove a ticker from the watchlist. Silent no-op while signed out.
    pub async fn unwatch(&mut self, ticker: &str) -> Result<(), CoreError> {
        self.watchlist.remove(ticker).await
    }

    /// Re-fetch the remote watchlist document — the reconciliation path
    /// after a reported sync divergence.
    pub async fn reload_watchlist(&mut self) -> Result<(), CoreError> {
        self.watchlist.reload().await
    }

    // ── Trending & Search ───────────────────────────────────────────

    /// Top tickers by search popularity.
    pub async fn trending(&self) -> Result<Vec<TrendingStockEntry>, CoreError> {
        self.trending.trending(TRENDING_LIMIT).await
    }

    /// The debounced search orchestrator; the search screen feeds its
    /// keystrokes here and polls `results()`.
    #[must_use]
    pub fn search(&self) -> &SearchOrchestrator {
        &self.search
    }
}
