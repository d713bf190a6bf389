// ═══════════════════════════════════════════════════════════════════
// Integration Tests — StockTracker facade wired to mock providers,
// auth, and document stores (no network)
// ═══════════════════════════════════════════════════════════════════

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDate};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use stock_tracker_core::backend::auth::{AuthProvider, AuthUser};
use stock_tracker_core::backend::documents::{Document, DocumentQuery, DocumentStore, FieldMap};
use stock_tracker_core::errors::CoreError;
use stock_tracker_core::models::series::TimeRange;
use stock_tracker_core::providers::alphavantage::{RawBar, TimeSeriesResponse};
use stock_tracker_core::providers::traits::{
    CompanyProfile, Decoded, MarketDataProvider, Quote, TimeSeriesProvider,
};
use stock_tracker_core::services::watchlist_service::SessionState;
use stock_tracker_core::StockTracker;

// ═══════════════════════════════════════════════════════════════════
// Mocks
// ═══════════════════════════════════════════════════════════════════

#[derive(Default)]
struct MockMarket {
    stocks: HashMap<String, (CompanyProfile, Quote)>,
    denied: HashSet<String>,
    search_results: Vec<String>,
}

impl MockMarket {
    fn with_stock(mut self, ticker: &str, name: &str, price: f64) -> Self {
        let profile = CompanyProfile {
            name: Some(name.into()),
            logo: Some(format!("https://logo.example/{ticker}.png")),
            country: Some("US".into()),
            currency: Some("USD".into()),
            exchange: Some("NASDAQ".into()),
            industry: Some("Technology".into()),
            ..Default::default()
        };
        let quote = Quote {
            current_price: price,
            price_change: 2.0,
            percent_change: 1.0,
            day_high: price + 3.0,
            day_low: price - 3.0,
            day_open: price - 1.0,
            previous_close: price - 2.0,
        };
        self.stocks.insert(ticker.into(), (profile, quote));
        self
    }

    fn denying(mut self, ticker: &str) -> Self {
        self.denied.insert(ticker.into());
        self
    }

    fn searching(mut self, symbols: &[&str]) -> Self {
        self.search_results = symbols.iter().map(|s| s.to_string()).collect();
        self
    }
}

#[async_trait]
impl MarketDataProvider for MockMarket {
    fn name(&self) -> &str {
        "MockMarket"
    }

    async fn company_profile(&self, ticker: &str) -> Result<Decoded<CompanyProfile>, CoreError> {
        if self.denied.contains(ticker) {
            return Ok(Decoded::Denied("no access".into()));
        }
        Ok(Decoded::Data(
            self.stocks
                .get(ticker)
                .map(|(p, _)| p.clone())
                .unwrap_or_default(),
        ))
    }

    async fn quote(&self, ticker: &str) -> Result<Decoded<Quote>, CoreError> {
        if self.denied.contains(ticker) {
            return Ok(Decoded::Denied("no access".into()));
        }
        Ok(Decoded::Data(
            self.stocks
                .get(ticker)
                .map(|(_, q)| q.clone())
                .unwrap_or_default(),
        ))
    }

    async fn search_symbols(&self, _query: &str) -> Result<Vec<String>, CoreError> {
        Ok(self.search_results.clone())
    }
}

struct MockSeries {
    payload: TimeSeriesResponse,
}

#[async_trait]
impl TimeSeriesProvider for MockSeries {
    fn name(&self) -> &str {
        "MockSeries"
    }

    async fn time_series(
        &self,
        _ticker: &str,
        _range: TimeRange,
    ) -> Result<TimeSeriesResponse, CoreError> {
        Ok(self.payload.clone())
    }
}

#[derive(Default)]
struct MockAuth {
    current: Mutex<Option<AuthUser>>,
}

#[async_trait]
impl AuthProvider for MockAuth {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, CoreError> {
        if password.len() < 8 {
            return Err(CoreError::Auth("password must be at least 8 characters".into()));
        }
        self.sign_in(email, password).await
    }

    async fn sign_in(&self, email: &str, _password: &str) -> Result<AuthUser, CoreError> {
        let user = AuthUser {
            id: format!("user-{email}"),
            email: email.into(),
        };
        *self.current.lock().unwrap() = Some(user.clone());
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), CoreError> {
        *self.current.lock().unwrap() = None;
        Ok(())
    }

    async fn current_user(&self) -> Option<AuthUser> {
        self.current.lock().unwrap().clone()
    }
}

#[derive(Default)]
struct MockStore {
    docs: Mutex<Vec<Document>>,
    fail_updates: AtomicBool,
}

#[async_trait]
impl DocumentStore for MockStore {
    async fn list_documents(&self, queries: &[DocumentQuery]) -> Result<Vec<Document>, CoreError> {
        let mut out: Vec<Document> = self.docs.lock().unwrap().clone();
        for q in queries {
            if let DocumentQuery::Equal(field, value) = q {
                out.retain(|d| d.fields.get(field) == Some(value));
            }
        }
        for q in queries {
            if let DocumentQuery::OrderDesc(field) = q {
                out.sort_by(|a, b| b.u64_field(field).cmp(&a.u64_field(field)));
            }
        }
        for q in queries {
            if let DocumentQuery::Limit(n) = q {
                out.truncate(*n);
            }
        }
        Ok(out)
    }

    async fn create_document(&self, fields: FieldMap) -> Result<Document, CoreError> {
        let mut docs = self.docs.lock().unwrap();
        let doc = Document {
            id: format!("doc-{}", docs.len() + 1),
            fields,
        };
        docs.push(doc.clone());
        Ok(doc)
    }

    async fn update_document(&self, id: &str, fields: FieldMap) -> Result<(), CoreError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(CoreError::Store("store offline".into()));
        }
        let mut docs = self.docs.lock().unwrap();
        let doc = docs
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| CoreError::Store(format!("no document {id}")))?;
        for (k, v) in fields {
            doc.fields.insert(k, v);
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════
// Tracker builders
// ═══════════════════════════════════════════════════════════════════

fn daily_payload(first: NaiveDate, count: usize) -> TimeSeriesResponse {
    let daily = (0..count)
        .map(|i| {
            let date = first + ChronoDuration::days(i as i64);
            let close = (i + 1) as f64;
            (
                date.format("%Y-%m-%d").to_string(),
                RawBar {
                    open: format!("{:.2}", close - 0.5),
                    high: format!("{:.2}", close + 0.5),
                    low: format!("{:.2}", close - 1.0),
                    close: format!("{close:.2}"),
                    volume: "1000".into(),
                },
            )
        })
        .collect();
    TimeSeriesResponse {
        daily: Some(daily),
        ..Default::default()
    }
}

struct Fixture {
    tracker: StockTracker,
    watchlist_store: Arc<MockStore>,
    trending_store: Arc<MockStore>,
}

fn fixture(market: MockMarket, payload: TimeSeriesResponse) -> Fixture {
    let watchlist_store = Arc::new(MockStore::default());
    let trending_store = Arc::new(MockStore::default());
    let tracker = StockTracker::new(
        Arc::new(market),
        Arc::new(MockSeries { payload }),
        Arc::new(MockAuth::default()),
        Arc::clone(&watchlist_store) as Arc<dyn DocumentStore>,
        Arc::clone(&trending_store) as Arc<dyn DocumentStore>,
    );
    Fixture {
        tracker,
        watchlist_store,
        trending_store,
    }
}

fn default_fixture() -> Fixture {
    fixture(
        MockMarket::default()
            .with_stock("AAPL", "Apple Inc.", 198.0)
            .with_stock("TSLA", "Tesla, Inc.", 250.0)
            .searching(&["AAPL", "TSLA"]),
        daily_payload(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), 400),
    )
}

// ═══════════════════════════════════════════════════════════════════
// Session lifecycle
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn sign_in_enters_a_ready_session() {
    let mut fx = default_fixture();
    assert_eq!(fx.tracker.session_state(), SessionState::SignedOut);

    let user = fx.tracker.sign_in("ada@example.com", "hunter22").await.unwrap();
    assert_eq!(user.email, "ada@example.com");
    assert_eq!(fx.tracker.session_state(), SessionState::Ready);
    assert_eq!(
        fx.tracker.current_user().await.unwrap().id,
        "user-ada@example.com"
    );
    // An empty per-user watchlist document was created on first sign-in.
    assert_eq!(fx.watchlist_store.docs.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn sign_up_enters_a_session_too() {
    let mut fx = default_fixture();
    fx.tracker.sign_up("ada@example.com", "longenough").await.unwrap();
    assert_eq!(fx.tracker.session_state(), SessionState::Ready);
}

#[tokio::test]
async fn rejected_sign_up_leaves_no_session() {
    let mut fx = default_fixture();
    assert!(fx.tracker.sign_up("ada@example.com", "short").await.is_err());
    assert_eq!(fx.tracker.session_state(), SessionState::SignedOut);
    assert!(fx.tracker.current_user().await.is_none());
}

#[tokio::test]
async fn sign_out_clears_local_watchlist_and_keeps_remote() {
    let mut fx = default_fixture();
    fx.tracker.sign_in("ada@example.com", "hunter22").await.unwrap();
    fx.tracker.watch("AAPL").await.unwrap();

    fx.tracker.sign_out().await.unwrap();
    assert_eq!(fx.tracker.session_state(), SessionState::SignedOut);
    assert!(fx.tracker.watchlist().is_empty());
    assert!(fx.tracker.current_user().await.is_none());

    fx.tracker.sign_in("ada@example.com", "hunter22").await.unwrap();
    assert_eq!(fx.tracker.watchlist(), ["AAPL"]);
}

// ═══════════════════════════════════════════════════════════════════
// Watchlist through the facade
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn watch_and_unwatch_round_trip() {
    let mut fx = default_fixture();
    fx.tracker.sign_in("ada@example.com", "hunter22").await.unwrap();

    fx.tracker.watch("tsla").await.unwrap();
    assert!(fx.tracker.is_watched("TSLA"));
    fx.tracker.watch("TSLA").await.unwrap(); // idempotent
    assert_eq!(fx.tracker.watchlist(), ["TSLA"]);

    fx.tracker.unwatch("TSLA").await.unwrap();
    assert!(fx.tracker.watchlist().is_empty());
}

#[tokio::test]
async fn watch_while_signed_out_is_a_silent_no_op() {
    let mut fx = default_fixture();
    fx.tracker.watch("AAPL").await.unwrap();
    assert!(fx.tracker.watchlist().is_empty());
    assert!(fx.watchlist_store.docs.lock().unwrap().is_empty());
}

#[tokio::test]
async fn watchlist_screen_uses_user_tickers_when_present() {
    let mut fx = default_fixture();
    fx.tracker.sign_in("ada@example.com", "hunter22").await.unwrap();
    fx.tracker.watch("AAPL").await.unwrap();

    let records = fx.tracker.fetch_watchlist_stocks().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].ticker, "AAPL");
    assert_eq!(records[0].name, "Apple Inc.");
}

#[tokio::test]
async fn watchlist_screen_falls_back_to_defaults_when_empty() {
    let fx = default_fixture();
    let records = fx.tracker.fetch_watchlist_stocks().await.unwrap();
    assert_eq!(records.len(), 12);
    assert_eq!(records[0].ticker, "AAPL");
}

#[tokio::test]
async fn remote_failure_surfaces_divergence_and_reload_reconciles() {
    let mut fx = default_fixture();
    fx.tracker.sign_in("ada@example.com", "hunter22").await.unwrap();
    fx.watchlist_store.fail_updates.store(true, Ordering::SeqCst);

    let err = fx.tracker.watch("AAPL").await.unwrap_err();
    assert!(matches!(err, CoreError::SyncDivergence { .. }));
    // Local list is ahead of the remote document until reconciled.
    assert_eq!(fx.tracker.watchlist(), ["AAPL"]);

    fx.tracker.reload_watchlist().await.unwrap();
    assert!(fx.tracker.watchlist().is_empty());
}

// ═══════════════════════════════════════════════════════════════════
// Stocks & lookup (spec end-to-end scenarios)
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn full_profile_and_quote_for_one_ticker() {
    let fx = default_fixture();
    let record = fx.tracker.fetch_stock("AAPL").await.unwrap();
    assert_eq!(record.ticker, "AAPL");
    assert!(!record.no_access);
    assert_eq!(record.current_price, Some(198.0));
    assert_eq!(record.day_high, Some(201.0));
    assert_eq!(record.previous_close, Some(196.0));
}

#[tokio::test]
async fn lookup_mixes_full_records_and_denial_stubs() {
    let fx = fixture(
        MockMarket::default()
            .with_stock("AAPL", "Apple Inc.", 198.0)
            .denying("LOCKED")
            .searching(&["AAPL", "LOCKED"]),
        TimeSeriesResponse::default(),
    );

    let records = fx.tracker.lookup("a").await.unwrap();
    assert_eq!(records.len(), 2);
    assert!(!records[0].no_access);
    assert!(records[1].no_access);
    assert!(records[1].current_price.is_none());
}

// ═══════════════════════════════════════════════════════════════════
// Charts
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn one_month_chart_has_thirty_ascending_points() {
    let fx = default_fixture();
    let series = fx.tracker.fetch_chart("AAPL", TimeRange::M1).await.unwrap();
    assert_eq!(series.len(), 30);
    assert_eq!(series.labels.len(), series.values.len());
    assert!(series.values.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(series.values[29], 400.0);
}

#[tokio::test]
async fn rate_limited_chart_is_empty_not_an_error() {
    let fx = fixture(
        MockMarket::default(),
        TimeSeriesResponse {
            note: Some("rate limit reached".into()),
            ..Default::default()
        },
    );
    let series = fx.tracker.fetch_chart("AAPL", TimeRange::Y1).await.unwrap();
    assert!(series.is_empty());
}

// ═══════════════════════════════════════════════════════════════════
// Search → trending
// ═══════════════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn debounced_search_feeds_the_trending_aggregate() {
    let fx = default_fixture();

    fx.tracker.search().on_input("app");
    tokio::time::sleep(Duration::from_millis(100)).await;
    fx.tracker.search().on_input("apple");
    tokio::time::sleep(Duration::from_millis(600)).await;

    let results = fx.tracker.search().results();
    assert_eq!(results.query, "apple");
    assert_eq!(results.records.len(), 2);

    // The fire-and-forget trending report lands shortly after.
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(fx.trending_store.docs.lock().unwrap().len(), 1);

    let top = fx.tracker.trending().await.unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].ticker, "AAPL");
    assert_eq!(top[0].count, 1);
    assert_eq!(top[0].search_terms, vec!["apple"]);
}
