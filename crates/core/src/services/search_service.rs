use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::stock::StockRecord;

/// How long the input must stay unchanged before a lookup fires.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

/// Seam between the orchestrator and the symbol-lookup client, so tests
/// can substitute a scripted lookup.
#[async_trait]
pub trait SymbolLookup: Send + Sync {
    async fn lookup(&self, query: &str) -> Result<Vec<StockRecord>, CoreError>;
}

/// Seam for the fire-and-forget trending report.
#[async_trait]
pub trait TrendingSink: Send + Sync {
    async fn record_search(&self, query: &str, stock: &StockRecord) -> Result<(), CoreError>;
}

/// Snapshot of the current search state, as the UI reads it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResults {
    pub query: String,
    pub records: Vec<StockRecord>,
    /// Message of the most recent failed lookup, cleared on the next
    /// successful one and on reset.
    pub error: Option<String>,
}

struct SearchState {
    results: Mutex<SearchResults>,
    /// Stamp handed to each fired lookup. A response is applied only if
    /// its stamp is still the latest issued — later-arriving stale
    /// responses are dropped instead of overwriting newer results.
    issued: AtomicU64,
}

impl SearchState {
    fn reset(&self) {
        // Invalidate any in-flight lookup so it cannot resurrect results.
        self.issued.fetch_add(1, Ordering::SeqCst);
        let mut results = self.results.lock().unwrap_or_else(|e| e.into_inner());
        *results = SearchResults::default();
    }

    fn apply(&self, generation: u64, update: impl FnOnce(&mut SearchResults)) -> bool {
        let mut results = self.results.lock().unwrap_or_else(|e| e.into_inner());
        // Checked under the results lock so a newer generation can't
        // interleave between the check and the write.
        if generation != self.issued.load(Ordering::SeqCst) {
            return false;
        }
        update(&mut results);
        true
    }
}

/// Debounced search orchestration: a stream of keystroke events becomes a
/// rate-limited sequence of lookup calls.
///
/// Each input event restarts the debounce timer; only the last keystroke
/// of a burst survives. A settled non-empty (trimmed) text triggers one
/// lookup; settled empty text resets the results without touching the
/// network. Cancellation stops a *scheduled* call, never an in-flight
/// one — an in-flight request runs to completion and its response is
/// dropped if a newer lookup was issued meanwhile.
pub struct SearchOrchestrator {
    lookup: Arc<dyn SymbolLookup>,
    trending: Option<Arc<dyn TrendingSink>>,
    delay: Duration,
    state: Arc<SearchState>,
    /// Cancellation flag of the currently scheduled (sleeping) timer.
    scheduled: Mutex<Option<Arc<AtomicBool>>>,
}

impl SearchOrchestrator {
    pub fn new(lookup: Arc<dyn SymbolLookup>, trending: Option<Arc<dyn TrendingSink>>) -> Self {
        Self::with_delay(lookup, trending, DEBOUNCE_WINDOW)
    }

    pub fn with_delay(
        lookup: Arc<dyn SymbolLookup>,
        trending: Option<Arc<dyn TrendingSink>>,
        delay: Duration,
    ) -> Self {
        Self {
            lookup,
            trending,
            delay,
            state: Arc::new(SearchState {
                results: Mutex::new(SearchResults::default()),
                issued: AtomicU64::new(0),
            }),
            scheduled: Mutex::new(None),
        }
    }

    /// Feed one raw text-input change event. Must run inside a tokio
    /// runtime: the debounce timer is a spawned task.
    pub fn on_input(&self, text: &str) {
        let cancelled = Arc::new(AtomicBool::new(false));
        self.replace_scheduled(Some(Arc::clone(&cancelled)));

        let text = text.to_string();
        let lookup = Arc::clone(&self.lookup);
        let trending = self.trending.clone();
        let state = Arc::clone(&self.state);
        let delay = self.delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Classic debounce: a newer keystroke (or view teardown)
            // cancelled this timer while it slept.
            if cancelled.load(Ordering::SeqCst) {
                return;
            }

            let trimmed = text.trim();
            if trimmed.is_empty() {
                state.reset();
                return;
            }

            let generation = state.issued.fetch_add(1, Ordering::SeqCst) + 1;
            match lookup.lookup(trimmed).await {
                Ok(records) => {
                    let applied = state.apply(generation, |results| {
                        results.query = trimmed.to_string();
                        results.records = records.clone();
                        results.error = None;
                    });
                    if !applied {
                        log::warn!("dropping stale search response for '{trimmed}'");
                        return;
                    }
                    // Fire-and-forget: report the first result to the
                    // trending aggregate; failures never touch search state.
                    if let (Some(sink), Some(first)) = (trending, records.into_iter().next()) {
                        let query = trimmed.to_string();
                        tokio::spawn(async move {
                            if let Err(e) = sink.record_search(&query, &first).await {
                                log::warn!("trending report for '{query}' failed: {e}");
                            }
                        });
                    }
                }
                Err(e) => {
                    state.apply(generation, |results| {
                        results.query = trimmed.to_string();
                        results.error = Some(e.to_string());
                    });
                }
            }
        });
    }

    /// Current results snapshot.
    #[must_use]
    pub fn results(&self) -> SearchResults {
        self.state
            .results
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Cancel any scheduled (not yet fired) lookup. Called when the
    /// consuming view is torn down.
    pub fn shutdown(&self) {
        self.replace_scheduled(None);
    }

    fn replace_scheduled(&self, next: Option<Arc<AtomicBool>>) {
        let mut scheduled = self.scheduled.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = scheduled.take() {
            previous.store(true, Ordering::SeqCst);
        }
        *scheduled = next;
    }
}

impl Drop for SearchOrchestrator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
