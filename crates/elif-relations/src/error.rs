//! Error types for relation management
//!
//! Integrity violations, registry failures and binding errors all surface as
//! [`RelationError`]. Storage failures keep their own type ([`StoreError`])
//! and pass through unchanged.

use thiserror::Error;

use crate::document::DocumentId;
use crate::store::StoreError;

/// Result type for relation operations
pub type RelationResult<T> = Result<T, RelationError>;

/// Errors raised by the relation layer
#[derive(Error, Debug)]
pub enum RelationError {
    #[error("Integrity error: {0}")]
    Integrity(#[from] IntegrityViolation),

    #[error("Index '{0}' already registered")]
    ConflictIndexDefinition(String),

    #[error("Index '{0}' not registered")]
    IndexNotRegistered(String),

    #[error("{0}")]
    IndexInit(#[from] IndexInitError),

    #[error("Invalid document type: {0}")]
    InvalidDocumentType(String),

    #[error("Unresolved relation target '{target}' for field '{field}' of document '{document}'")]
    UnresolvedRelationTarget {
        document: String,
        field: String,
        target: String,
    },

    #[error("Document type '{0}' defined more than once")]
    DuplicateDocumentType(String),

    #[error("Invalid document definition: {0}")]
    Definition(String),

    #[error("Document '{0}' has no id")]
    MissingDocumentId(String),

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Relation configuration error: {0}")]
    Configuration(String),
}

impl RelationError {
    /// Short, stable name of the error variant
    pub fn kind(&self) -> &'static str {
        match self {
            RelationError::Integrity(_) => "integrity",
            RelationError::ConflictIndexDefinition(_) => "conflict_index_definition",
            RelationError::IndexNotRegistered(_) => "index_not_registered",
            RelationError::IndexInit(_) => "index_init",
            RelationError::InvalidDocumentType(_) => "invalid_document_type",
            RelationError::UnresolvedRelationTarget { .. } => "unresolved_relation_target",
            RelationError::DuplicateDocumentType(_) => "duplicate_document_type",
            RelationError::Definition(_) => "definition",
            RelationError::MissingDocumentId(_) => "missing_document_id",
            RelationError::Storage(err) => err.kind(),
            RelationError::Serialization(_) => "serialization",
            RelationError::Configuration(_) => "configuration",
        }
    }

    /// Returns true if this error is a relation constraint violation
    pub fn is_integrity(&self) -> bool {
        matches!(self, RelationError::Integrity(_))
    }
}

/// A violated relation constraint
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntegrityViolation {
    /// A required relation field holds no value
    #[error("related document id not provided for field '{field}' of '{document}'")]
    MissingValue { document: String, field: String },

    /// Referenced documents do not exist in the target index
    #[error("related index '{index}' has no documents with ids {ids:?}")]
    MissingTargets { index: String, ids: Vec<DocumentId> },

    /// Child documents block the delete
    #[error("cannot delete {document} with id {id}: found {count} related {child} documents")]
    Referenced {
        document: String,
        id: DocumentId,
        child: String,
        count: u64,
    },
}

/// One index that failed during bulk initialization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexInitFailure {
    pub index: String,
    pub kind: String,
    pub message: String,
}

/// Aggregate failure of a non fail-fast bulk initialization
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to initialize {} index(es): {}", .failures.len(), summarize(.failures))]
pub struct IndexInitError {
    pub failures: Vec<IndexInitFailure>,
}

impl IndexInitError {
    pub fn new(failures: Vec<IndexInitFailure>) -> Self {
        Self { failures }
    }

    /// Names of the indices that failed
    pub fn indices(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.index.as_str()).collect()
    }
}

fn summarize(failures: &[IndexInitFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({}: {})", f.index, f.kind, f.message))
        .collect::<Vec<_>>()
        .join(", ")
}
