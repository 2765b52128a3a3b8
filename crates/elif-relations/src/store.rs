//! Document store contract consumed by the relation layer
//!
//! The relation layer never talks to a storage engine directly. Everything it
//! needs (point lookups, counting and scanning by field, single document
//! writes and index lifecycle) goes through [`DocumentStore`].

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::document::{DocumentId, StoredDocument, ID_FIELD};
use crate::mapping::Mappings;

/// Storage failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Document '{id}' not found in index '{index}'")]
    NotFound { index: String, id: DocumentId },

    #[error("Index not found: {0}")]
    IndexNotFound(String),

    #[error("Mapping conflict in index '{index}': field '{field}' is mapped as {existing}, got {requested}")]
    MappingConflict {
        index: String,
        field: String,
        existing: String,
        requested: String,
    },

    #[error("Backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Returns true for a failed document lookup
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::NotFound { .. } => "not_found",
            StoreError::IndexNotFound(_) => "index_not_found",
            StoreError::MappingConflict { .. } => "mapping_conflict",
            StoreError::Backend(_) => "backend",
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Field filter understood by every store
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Field equals value; array fields match on any element
    Term { field: String, value: Value },
    /// Field equals any of the values
    Terms { field: String, values: Vec<Value> },
    /// Document id is one of the ids
    Ids(Vec<DocumentId>),
}

impl Query {
    /// Term query; `_id` becomes an id lookup
    pub fn term(field: impl Into<String>, value: impl Into<Value>) -> Self {
        let field = field.into();
        let value = value.into();
        if field == ID_FIELD {
            if let Value::String(id) = &value {
                return Query::Ids(vec![DocumentId::new(id.clone())]);
            }
        }
        Query::Term { field, value }
    }

    pub fn terms(field: impl Into<String>, values: Vec<Value>) -> Self {
        Query::Terms {
            field: field.into(),
            values,
        }
    }

    pub fn ids(ids: impl IntoIterator<Item = DocumentId>) -> Self {
        Query::Ids(ids.into_iter().collect())
    }

    /// Check a stored document against this query
    pub fn matches(&self, document: &StoredDocument) -> bool {
        match self {
            Query::Ids(ids) => ids.contains(&document.id),
            Query::Term { field, value } => document
                .field(field)
                .is_some_and(|stored| value_matches(&stored, value)),
            Query::Terms { field, values } => document
                .field(field)
                .is_some_and(|stored| values.iter().any(|value| value_matches(&stored, value))),
        }
    }
}

fn value_matches(stored: &Value, expected: &Value) -> bool {
    match stored {
        Value::Array(items) => items.iter().any(|item| scalar_matches(item, expected)),
        other => scalar_matches(other, expected),
    }
}

/// Strings match numbers and booleans with the same text, like keyword terms
fn scalar_matches(stored: &Value, expected: &Value) -> bool {
    match (stored, expected) {
        (Value::String(text), other @ (Value::Number(_) | Value::Bool(_)))
        | (other @ (Value::Number(_) | Value::Bool(_)), Value::String(text)) => {
            *text == other.to_string()
        }
        _ => stored == expected,
    }
}

/// A scan result
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub id: DocumentId,
    pub source: Map<String, Value>,
}

impl From<StoredDocument> for Hit {
    fn from(document: StoredDocument) -> Self {
        Self {
            id: document.id,
            source: document.source,
        }
    }
}

/// Lazily produced scan results
pub type HitStream<'a> = BoxStream<'a, StoreResult<Hit>>;

/// Store-specific options passed through unchanged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreOptions(Map<String, Value>);

impl StoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Storage engine operations required per document type
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document, failing with [`StoreError::NotFound`] if absent
    async fn get(&self, index: &str, id: &DocumentId) -> StoreResult<StoredDocument>;

    /// Count documents matching a query
    async fn count(&self, index: &str, query: &Query) -> StoreResult<u64>;

    /// Iterate over documents matching a query
    fn scan<'a>(&'a self, index: &'a str, query: &'a Query) -> HitStream<'a>;

    /// Insert or replace a document
    async fn save(
        &self,
        index: &str,
        document: StoredDocument,
        options: &StoreOptions,
    ) -> StoreResult<()>;

    /// Merge fields into an existing document
    async fn update(
        &self,
        index: &str,
        id: &DocumentId,
        changes: Map<String, Value>,
        options: &StoreOptions,
    ) -> StoreResult<()>;

    /// Remove a single document
    async fn delete(&self, index: &str, id: &DocumentId, options: &StoreOptions)
        -> StoreResult<()>;

    /// Create the physical index or extend its mappings
    async fn init_index(
        &self,
        index: &str,
        mappings: &Mappings,
        options: &StoreOptions,
    ) -> StoreResult<()>;

    /// Drop the physical index
    async fn delete_index(&self, index: &str, options: &StoreOptions) -> StoreResult<()>;

    /// Check whether a document exists
    async fn exists(&self, index: &str, id: &DocumentId) -> StoreResult<bool> {
        match self.get(index, id).await {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }
}
