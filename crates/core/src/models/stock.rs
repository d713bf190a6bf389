use serde::{Deserialize, Serialize};

/// A merged company-profile + real-time-quote record for one ticker.
///
/// Constructed fresh on every fetch and never mutated in place; a new fetch
/// supersedes the previous record entirely.
///
/// Price fields are `Option` because the tolerant lookup path can return a
/// record whose quote (or whole profile) was denied by the provider's free
/// tier. Such records carry `no_access: true` and only `ticker`/`name` are
/// trustworthy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    /// Exchange-listed symbol, uppercased (e.g., "AAPL"). Primary key.
    pub ticker: String,

    /// Company display name. Falls back to the ticker for denied profiles.
    pub name: String,

    // ── Profile (static company metadata) ───────────────────────────
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipo_date: Option<String>,
    /// Reported by the provider in millions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_capitalization: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    /// Reported by the provider in millions of shares.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shares_outstanding: Option<f64>,

    // ── Quote (price snapshot) ──────────────────────────────────────
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_change: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent_change: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_high: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_low: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_open: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_close: Option<f64>,

    /// Set when the provider denied the profile or quote call for this
    /// symbol. Only `ticker` and `name` (and any profile fields that did
    /// come through) are meaningful; all price fields are `None`.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub no_access: bool,
}

impl StockRecord {
    /// Stub for a symbol whose profile call was denied: only the ticker is
    /// known, the name falls back to the ticker itself.
    pub fn denied(ticker: impl Into<String>) -> Self {
        let ticker = ticker.into().to_uppercase();
        Self {
            name: ticker.clone(),
            ticker,
            logo: None,
            country: None,
            currency: None,
            exchange: None,
            ipo_date: None,
            market_capitalization: None,
            web_url: None,
            industry: None,
            shares_outstanding: None,
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

    /// Stub for a symbol whose profile succeeded but whose quote call was
    /// denied: profile fields are kept, price fields stay absent.
    pub fn without_quote(mut self) -> Self {
        self.current_price = None;
        self.price_change = None;
        self.percent_change = None;
        self.day_high = None;
        self.day_low = None;
        self.day_open = None;
        self.previous_close = None;
        self.no_access = true;
        self
    }

    /// True when the record carries a full price snapshot.
    #[must_use]
    pub fn has_quote(&self) -> bool {
        self.current_price.is_some() && !self.no_access
    }
}
