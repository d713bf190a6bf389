use serde::{Deserialize, Serialize};

/// Aggregated search-popularity record for one ticker.
///
/// Created the first time a search resolves to the ticker; every later
/// search increments `count` and unions the query into `search_terms`.
/// The "trending" display is a top-N projection ordered by descending count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingStockEntry {
    pub ticker: String,
    pub name: String,
    #[serde(default)]
    pub logo: Option<String>,
    pub count: u64,
    /// Distinct search terms that resolved to this ticker, in first-seen order.
    #[serde(default)]
    pub search_terms: Vec<String>,
}
