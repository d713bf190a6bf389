use thiserror::Error;

/// Which sub-call of a stock fetch failed. A full stock record is assembled
/// from two provider calls (profile + quote); the search and time-series
/// endpoints get their own stages so errors name the exact sub-call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    Profile,
    Quote,
    Search,
    TimeSeries,
}

impl std::fmt::Display for FetchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchStage::Profile => write!(f, "profile"),
            FetchStage::Quote => write!(f, "quote"),
            FetchStage::Search => write!(f, "symbol search"),
            FetchStage::TimeSeries => write!(f, "time series"),
        }
    }
}

/// Which watchlist mutation was in flight when local and remote state diverged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchlistAction {
    Add,
    Remove,
}

impl std::fmt::Display for WatchlistAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WatchlistAction::Add => write!(f, "add"),
            WatchlistAction::Remove => write!(f, "remove"),
        }
    }
}

/// Unified error type for the entire stock-tracker-core library.
/// Every fallible public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── API / Network ───────────────────────────────────────────────
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error ({provider}): {message}")]
    Api { provider: String, message: String },

    #[error("Failed to fetch {stage} for {ticker}")]
    Fetch { ticker: String, stage: FetchStage },

    // ── Backend (auth / document store) ─────────────────────────────
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Document store error: {0}")]
    Store(String),

    /// The local watchlist mutation applied but the remote one failed.
    /// Local state is ahead of the remote document until the next reload.
    #[error("Watchlist {action} for {ticker} applied locally but failed remotely: {message}")]
    SyncDivergence {
        ticker: String,
        action: WatchlistAction,
        message: String,
    },

    // ── Serialization ───────────────────────────────────────────────
    #[error("Serialization error: {0}")]
    Serialization(String),
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // Sanitize error message: strip query parameters from URLs to prevent
        // API key leakage. reqwest errors often contain full URLs with secrets.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}
