//! Document Registry - index name to document type bookkeeping
//!
//! Tracks which document types own which index and drives index
//! initialization and removal for them.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::document::Document;
use crate::error::{IndexInitError, IndexInitFailure, RelationError, RelationResult};
use crate::mapping::Mappings;
use crate::relations::RelationGraph;
use crate::store::{DocumentStore, StoreOptions};

/// Index name matching every index
pub const WILDCARD_INDEX: &str = "*";

/// A registered document type
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredIndex {
    pub index_name: String,
    pub document_name: String,
    pub mappings: Mappings,
}

/// Registry of document types by index name
///
/// Entries are only ever added; each index name may be registered once.
#[derive(Debug)]
pub struct DocumentRegistry {
    graph: Arc<RelationGraph>,
    indices: RwLock<Vec<RegisteredIndex>>,
}

impl DocumentRegistry {
    pub fn new(graph: Arc<RelationGraph>) -> Self {
        Self {
            graph,
            indices: RwLock::new(Vec::new()),
        }
    }

    /// Register a document type under its index name
    pub fn register<D: Document>(&self) -> RelationResult<&Self> {
        let bound = self.graph.bound::<D>().map_err(|_| {
            RelationError::InvalidDocumentType(format!(
                "expected a document type bound in the relation graph, got '{}'",
                D::document_name()
            ))
        })?;

        let index_name = bound.index_name();
        if index_name.is_empty() {
            warn!(document = bound.name(), "Index name not indicated for document type");
        } else if index_name == WILDCARD_INDEX {
            warn!(
                document = bound.name(),
                index = index_name,
                "Wildcard index name provided for document type"
            );
        }

        let mut indices = self.indices.write();
        if indices.iter().any(|entry| entry.index_name == index_name) {
            return Err(RelationError::ConflictIndexDefinition(index_name.to_string()));
        }

        indices.push(RegisteredIndex {
            index_name: index_name.to_string(),
            document_name: bound.name().to_string(),
            mappings: bound.mappings().clone(),
        });
        info!(document = bound.name(), index = index_name, "Registered document index");
        Ok(self)
    }

    /// Look up a registered index
    pub fn get(&self, index_name: &str) -> Option<RegisteredIndex> {
        self.indices
            .read()
            .iter()
            .find(|entry| entry.index_name == index_name)
            .cloned()
    }

    pub fn contains(&self, index_name: &str) -> bool {
        self.get(index_name).is_some()
    }

    /// Registered index names in registration order
    pub fn index_names(&self) -> Vec<String> {
        self.indices
            .read()
            .iter()
            .map(|entry| entry.index_name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.indices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.read().is_empty()
    }

    fn require(&self, index_name: &str) -> RelationResult<RegisteredIndex> {
        self.get(index_name)
            .ok_or_else(|| RelationError::IndexNotRegistered(index_name.to_string()))
    }

    /// Create the physical index of a registered document type
    pub async fn init<S: DocumentStore + ?Sized>(
        &self,
        store: &S,
        index_name: &str,
        options: &StoreOptions,
    ) -> RelationResult<()> {
        let entry = self.require(index_name)?;
        store
            .init_index(&entry.index_name, &entry.mappings, options)
            .await?;
        info!(index = index_name, document = %entry.document_name, "Initialized index");
        Ok(())
    }

    /// Initialize every registered index
    ///
    /// With `fail_fast` the first failure is returned as is. Otherwise every
    /// index is attempted and failures are reported together as
    /// [`RelationError::IndexInit`].
    pub async fn init_all<S: DocumentStore + ?Sized>(
        &self,
        store: &S,
        fail_fast: bool,
        options: &StoreOptions,
    ) -> RelationResult<()> {
        let mut failures = Vec::new();

        for index_name in self.index_names() {
            match self.init(store, &index_name, options).await {
                Ok(()) => {}
                Err(err) if fail_fast => return Err(err),
                Err(err) => {
                    warn!(index = %index_name, error = %err, "Index initialization failed");
                    failures.push(IndexInitFailure {
                        index: index_name,
                        kind: err.kind().to_string(),
                        message: err.to_string(),
                    });
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(IndexInitError::new(failures).into())
        }
    }

    /// Drop the physical index of a registered document type
    pub async fn delete<S: DocumentStore + ?Sized>(
        &self,
        store: &S,
        index_name: &str,
        options: &StoreOptions,
    ) -> RelationResult<()> {
        let entry = self.require(index_name)?;
        store.delete_index(&entry.index_name, options).await?;
        info!(index = index_name, document = %entry.document_name, "Deleted index");
        Ok(())
    }
}
