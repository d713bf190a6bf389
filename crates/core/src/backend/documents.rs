use async_trait::async_trait;
use serde_json::Value;

use crate::errors::CoreError;

pub type FieldMap = serde_json::Map<String, Value>;

/// One stored document: an opaque id plus a flat field map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: FieldMap,
}

impl Document {
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    pub fn u64_field(&self, name: &str) -> Option<u64> {
        self.fields.get(name).and_then(Value::as_u64)
    }

    /// A string-array field, with non-string elements dropped.
    pub fn str_array_field(&self, name: &str) -> Vec<String> {
        self.fields
            .get(name)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Query primitives of the remote store, mirroring the surface the app
/// consumes: equality filter, descending order, result limit.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentQuery {
    Equal(String, Value),
    OrderDesc(String),
    Limit(usize),
}

impl DocumentQuery {
    pub fn equal(field: impl Into<String>, value: impl Into<Value>) -> Self {
        DocumentQuery::Equal(field.into(), value.into())
    }
}

/// One logical table/collection of the remote document store. The
/// application hands the core one handle per collection; no optimistic
/// concurrency check is performed on update — concurrent writers to the
/// same document follow last-write-wins.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list_documents(&self, queries: &[DocumentQuery]) -> Result<Vec<Document>, CoreError>;

    async fn create_document(&self, fields: FieldMap) -> Result<Document, CoreError>;

    async fn update_document(&self, id: &str, fields: FieldMap) -> Result<(), CoreError>;
}
