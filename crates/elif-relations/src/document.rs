//! Document identity and the relation-aware document contract

use std::fmt;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{RelationError, RelationResult};
use crate::relations::DocumentDefinition;

/// Name of the primary identifier field
pub const ID_FIELD: &str = "_id";

/// Document identifier as stored in the document store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&DocumentId> for Value {
    fn from(id: &DocumentId) -> Self {
        Value::String(id.0.clone())
    }
}

impl From<DocumentId> for Value {
    fn from(id: DocumentId) -> Self {
        Value::String(id.0)
    }
}

/// Current value of a relation field on a document instance
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RelationValue {
    #[default]
    Missing,
    One(DocumentId),
    Many(Vec<DocumentId>),
}

impl RelationValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, RelationValue::Missing)
    }
}

impl From<DocumentId> for RelationValue {
    fn from(id: DocumentId) -> Self {
        RelationValue::One(id)
    }
}

impl From<Option<DocumentId>> for RelationValue {
    fn from(id: Option<DocumentId>) -> Self {
        id.map_or(RelationValue::Missing, RelationValue::One)
    }
}

impl From<Vec<DocumentId>> for RelationValue {
    fn from(ids: Vec<DocumentId>) -> Self {
        RelationValue::Many(ids)
    }
}

impl From<Option<Vec<DocumentId>>> for RelationValue {
    fn from(ids: Option<Vec<DocumentId>>) -> Self {
        ids.map_or(RelationValue::Missing, RelationValue::Many)
    }
}

/// Raw document as kept by a [`DocumentStore`](crate::DocumentStore)
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: DocumentId,
    pub source: Map<String, Value>,
}

impl StoredDocument {
    pub fn new(id: DocumentId, source: Map<String, Value>) -> Self {
        Self { id, source }
    }

    /// Serialize a typed document into its stored form
    pub fn from_document<D: Document>(id: DocumentId, document: &D) -> RelationResult<Self> {
        match serde_json::to_value(document)? {
            Value::Object(source) => Ok(Self { id, source }),
            other => Err(RelationError::Definition(format!(
                "document '{}' must serialize to an object, got {}",
                D::document_name(),
                other
            ))),
        }
    }

    /// Look up a field; `_id` resolves to the document id
    pub fn field(&self, name: &str) -> Option<Value> {
        if name == ID_FIELD {
            return Some(Value::from(&self.id));
        }
        self.source.get(name).cloned()
    }

    /// Deserialize into a typed document, restoring its id
    pub fn into_document<D: Document>(self) -> RelationResult<D> {
        let mut document: D = serde_json::from_value(Value::Object(self.source))?;
        document.set_id(self.id);
        Ok(document)
    }
}

/// A document type that takes part in relation management
///
/// Implementors declare their fields and relations in [`Document::define`];
/// the declarations are materialized once by
/// [`RelationGraphBuilder::bind`](crate::RelationGraphBuilder::bind).
pub trait Document: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Unique name of the document type, used for forward references
    fn document_name() -> &'static str;

    /// Name of the index holding documents of this type
    fn index_name() -> &'static str;

    fn id(&self) -> Option<&DocumentId>;

    fn set_id(&mut self, id: DocumentId);

    /// Declare field mappings and relations
    fn define(_definition: &mut DocumentDefinition<Self>)
    where
        Self: Sized,
    {
    }
}
