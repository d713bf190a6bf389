use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::backend::documents::{Document, DocumentQuery, DocumentStore, FieldMap};
use crate::errors::CoreError;
use crate::models::stock::StockRecord;
use crate::models::trending::TrendingStockEntry;
use crate::services::search_service::TrendingSink;

const STOCK_ID_FIELD: &str = "stock_id";
const SEARCH_TERM_FIELD: &str = "search_term";
const SEARCH_TERMS_FIELD: &str = "search_terms";
const COUNT_FIELD: &str = "count";
const NAME_FIELD: &str = "name";
const LOGO_FIELD: &str = "logo";

/// Default size of the trending projection.
pub const TRENDING_LIMIT: usize = 10;

/// Per-ticker search-popularity aggregate over a remote document table.
///
/// Every search that resolves to a ticker increments that ticker's count
/// and unions the query into its distinct-term set; the trending display
/// is a top-N projection by descending count.
pub struct TrendingService {
    store: Arc<dyn DocumentStore>,
}

impl TrendingService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Record one resolved search. Lookup order:
    /// 1. a document keyed by the normalized ticker — increment and union;
    /// 2. a document holding this exact search term — adopt the ticker;
    /// 3. neither — create a fresh document with count 1.
    pub async fn record_search(&self, query: &str, stock: &StockRecord) -> Result<(), CoreError> {
        // Normalize to avoid duplicate aggregates ('AAPL' vs 'aapl').
        let ticker = stock.ticker.to_uppercase();

        let by_ticker = self
            .store
            .list_documents(&[
                DocumentQuery::equal(STOCK_ID_FIELD, ticker.as_str()),
                DocumentQuery::Limit(1),
            ])
            .await?;
        if let Some(doc) = by_ticker.into_iter().next() {
            let fields = increment_fields(&doc, query, stock, None);
            return self.store.update_document(&doc.id, fields).await;
        }

        let by_term = self
            .store
            .list_documents(&[
                DocumentQuery::equal(SEARCH_TERM_FIELD, query),
                DocumentQuery::Limit(1),
            ])
            .await?;
        if let Some(doc) = by_term.into_iter().next() {
            let fields = increment_fields(&doc, query, stock, Some(&ticker));
            return self.store.update_document(&doc.id, fields).await;
        }

        let mut fields = FieldMap::new();
        fields.insert(SEARCH_TERM_FIELD.to_string(), Value::from(query));
        fields.insert(SEARCH_TERMS_FIELD.to_string(), json!([query]));
        fields.insert(STOCK_ID_FIELD.to_string(), Value::from(ticker));
        fields.insert(COUNT_FIELD.to_string(), json!(1));
        fields.insert(NAME_FIELD.to_string(), Value::from(stock.name.as_str()));
        if let Some(logo) = &stock.logo {
            fields.insert(LOGO_FIELD.to_string(), Value::from(logo.as_str()));
        }
        self.store.create_document(fields).await.map(|_| ())
    }

    /// Top-N tickers by descending search count.
    pub async fn trending(&self, limit: usize) -> Result<Vec<TrendingStockEntry>, CoreError> {
        let docs = self
            .store
            .list_documents(&[
                DocumentQuery::OrderDesc(COUNT_FIELD.to_string()),
                DocumentQuery::Limit(limit),
            ])
            .await?;

        Ok(docs.iter().filter_map(entry_from_document).collect())
    }
}

#[async_trait]
impl TrendingSink for TrendingService {
    async fn record_search(&self, query: &str, stock: &StockRecord) -> Result<(), CoreError> {
        TrendingService::record_search(self, query, stock).await
    }
}

/// Fields for an increment update: count + 1, the query unioned into the
/// distinct-term set, name/logo refreshed from the fresher record, and
/// optionally the normalized ticker adopted onto a term-matched document.
fn increment_fields(
    doc: &Document,
    query: &str,
    stock: &StockRecord,
    adopt_ticker: Option<&str>,
) -> FieldMap {
    let mut terms = doc.str_array_field(SEARCH_TERMS_FIELD);
    if !terms.iter().any(|t| t == query) {
        terms.push(query.to_string());
    }

    let mut fields = FieldMap::new();
    fields.insert(
        COUNT_FIELD.to_string(),
        json!(doc.u64_field(COUNT_FIELD).unwrap_or(0) + 1),
    );
    fields.insert(SEARCH_TERM_FIELD.to_string(), Value::from(query));
    fields.insert(SEARCH_TERMS_FIELD.to_string(), json!(terms));
    if let Some(ticker) = adopt_ticker {
        fields.insert(STOCK_ID_FIELD.to_string(), Value::from(ticker));
    }
    if !stock.name.is_empty() {
        fields.insert(NAME_FIELD.to_string(), Value::from(stock.name.as_str()));
    }
    if let Some(logo) = &stock.logo {
        fields.insert(LOGO_FIELD.to_string(), Value::from(logo.as_str()));
    }
    fields
}

fn entry_from_document(doc: &Document) -> Option<TrendingStockEntry> {
    Some(TrendingStockEntry {
        ticker: doc.str_field(STOCK_ID_FIELD)?.to_string(),
        name: doc
            .str_field(NAME_FIELD)
            .unwrap_or(doc.str_field(STOCK_ID_FIELD)?)
            .to_string(),
        logo: doc.str_field(LOGO_FIELD).map(str::to_string),
        count: doc.u64_field(COUNT_FIELD).unwrap_or(0),
        search_terms: doc.str_array_field(SEARCH_TERMS_FIELD),
    })
}
