use serde_json::{json, Value};
use std::sync::Arc;

use crate::backend::documents::{DocumentQuery, DocumentStore, FieldMap};
use crate::errors::{CoreError, WatchlistAction};

const USER_ID_FIELD: &str = "user_id";
const TICKERS_FIELD: &str = "tickers";

/// Watchlist session lifecycle: `SignedOut → Loading → Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    SignedOut,
    Loading,
    Ready,
}

/// Keeps the authenticated user's ticker set in sync with its remote
/// per-user document.
///
/// Mutations are optimistic: the local list is updated first, then the
/// remote document. A failed remote mutation is surfaced as
/// `CoreError::SyncDivergence` while the local change stays applied —
/// the caller can show the divergence and call `reload()` to reconcile.
///
/// While signed out, `add`/`remove` are silent no-ops.
pub struct WatchlistService {
    store: Arc<dyn DocumentStore>,
    state: SessionState,
    user_id: Option<String>,
    document_id: Option<String>,
    tickers: Vec<String>,
}

impl WatchlistService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            state: SessionState::SignedOut,
            user_id: None,
            document_id: None,
            tickers: Vec::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Local mirror of the watchlist, newest first.
    #[must_use]
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    #[must_use]
    pub fn contains(&self, ticker: &str) -> bool {
        let upper = ticker.to_uppercase();
        self.tickers.iter().any(|t| *t == upper)
    }

    /// Enter a session: load the user's remote watchlist document,
    /// creating an empty one on first sign-in.
    pub async fn on_sign_in(&mut self, user_id: &str) -> Result<(), CoreError> {
        self.state = SessionState::Loading;
        self.user_id = Some(user_id.to_string());

        match self.load_remote(user_id).await {
            Ok(()) => {
                self.state = SessionState::Ready;
                Ok(())
            }
            Err(e) => {
                self.on_sign_out();
                Err(e)
            }
        }
    }

    /// Leave the session: local state resets to empty. The remote copy
    /// persists for the next sign-in.
    pub fn on_sign_out(&mut self) {
        self.state = SessionState::SignedOut;
        self.user_id = None;
        self.document_id = None;
        self.tickers.clear();
    }

    /// Re-fetch the remote document and replace the local mirror —
    /// the reconciliation path after a `SyncDivergence`.
    pub async fn reload(&mut self) -> Result<(), CoreError> {
        let Some(user_id) = self.user_id.clone() else {
            return Ok(());
        };
        self.load_remote(&user_id).await
    }

    /// Add a ticker: duplicate-safe local prepend, then idempotent remote
    /// union. Adding an already-present ticker is a complete no-op.
    pub async fn add(&mut self, ticker: &str) -> Result<(), CoreError> {
        if self.state != SessionState::Ready {
            return Ok(());
        }
        let upper = ticker.to_uppercase();
        if self.contains(&upper) {
            return Ok(());
        }

        // Local first (optimistic), remote second.
        self.tickers.insert(0, upper.clone());
        self.push_remote(&upper, WatchlistAction::Add).await
    }

    /// Remove a ticker from local state and the remote document.
    /// No-op if absent.
    pub async fn remove(&mut self, ticker: &str) -> Result<(), CoreError> {
        if self.state != SessionState::Ready {
            return Ok(());
        }
        let upper = ticker.to_uppercase();
        if !self.contains(&upper) {
            return Ok(());
        }

        self.tickers.retain(|t| *t != upper);
        self.push_remote(&upper, WatchlistAction::Remove).await
    }

    async fn load_remote(&mut self, user_id: &str) -> Result<(), CoreError> {
        let docs = self
            .store
            .list_documents(&[
                DocumentQuery::equal(USER_ID_FIELD, user_id),
                DocumentQuery::Limit(1),
            ])
            .await?;

        match docs.into_iter().next() {
            Some(doc) => {
                self.tickers = doc.str_array_field(TICKERS_FIELD);
                self.document_id = Some(doc.id);
            }
            None => {
                let mut fields = FieldMap::new();
                fields.insert(USER_ID_FIELD.to_string(), Value::from(user_id));
                fields.insert(TICKERS_FIELD.to_string(), json!([]));
                let doc = self.store.create_document(fields).await?;
                self.tickers = Vec::new();
                self.document_id = Some(doc.id);
            }
        }
        Ok(())
    }

    /// Write the whole local ticker array to the remote document. A remote
    /// failure leaves the local mutation applied and reports divergence.
    async fn push_remote(&self, ticker: &str, action: WatchlistAction) -> Result<(), CoreError> {
        let document_id = self.document_id.as_deref().ok_or_else(|| {
            CoreError::Store("watchlist session has no backing document".into())
        })?;

        let mut fields = FieldMap::new();
        fields.insert(TICKERS_FIELD.to_string(), json!(self.tickers));

        self.store
            .update_document(document_id, fields)
            .await
            .map_err(|e| {
                log::warn!("watchlist {action} for {ticker} failed remotely: {e}");
                CoreError::SyncDivergence {
                    ticker: ticker.to_string(),
                    action,
                    message: e.to_string(),
                }
            })
    }
}
