//! Relation-aware document operations
//!
//! [`RelationManager`] is the entry point for application code: it saves
//! documents after validating their relations and deletes them after
//! applying the delete policies of every relation pointing at them.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::config::RelationConfig;
use crate::document::{Document, DocumentId, StoredDocument};
use crate::error::RelationResult;
use crate::relations::{
    ChildRelation, DeletePropagator, DeleteReport, IntegrityValidator, ParentRelation,
    RelationGraph,
};
use crate::store::{DocumentStore, StoreOptions};

/// Per-call save options
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    /// Overrides `RelationConfig::validate_on_save` when set
    pub validate_relations: Option<bool>,
    /// Options passed to the store
    pub store: StoreOptions,
}

impl SaveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Save without checking relation targets
    pub fn skip_validation(mut self) -> Self {
        self.validate_relations = Some(false);
        self
    }

    pub fn store_options(mut self, options: StoreOptions) -> Self {
        self.store = options;
        self
    }
}

/// Saves and deletes documents while enforcing their relations
pub struct RelationManager<S: DocumentStore> {
    store: Arc<S>,
    graph: Arc<RelationGraph>,
    config: RelationConfig,
}

impl<S: DocumentStore> RelationManager<S> {
    pub fn new(store: Arc<S>, graph: Arc<RelationGraph>, config: RelationConfig) -> Self {
        Self {
            store,
            graph,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn graph(&self) -> &RelationGraph {
        &self.graph
    }

    pub fn config(&self) -> &RelationConfig {
        &self.config
    }

    /// Relations declared by `D`
    pub fn parent_relations<D: Document>(&self) -> RelationResult<&[ParentRelation]> {
        Ok(self.graph.bound::<D>()?.parent_relations())
    }

    /// Relations pointing at `D`, keyed by the referencing document type
    pub fn child_relations<D: Document>(
        &self,
    ) -> RelationResult<&BTreeMap<String, Vec<ChildRelation>>> {
        Ok(self.graph.bound::<D>()?.child_relations())
    }

    /// Check that every document referenced by `document` exists
    pub async fn validate<D: Document>(&self, document: &D) -> RelationResult<()> {
        IntegrityValidator::new(self.store.as_ref(), &self.graph)
            .validate(document)
            .await
    }

    /// Validate relations, then write the document
    ///
    /// Documents without an id get a generated one, which is written back to
    /// the instance.
    pub async fn save<D: Document>(
        &self,
        document: &mut D,
        options: SaveOptions,
    ) -> RelationResult<DocumentId> {
        let bound = self.graph.bound::<D>()?;

        if options
            .validate_relations
            .unwrap_or(*self.config.get_validate_on_save())
        {
            self.validate(document).await?;
        } else {
            debug!(document = bound.name(), "Saving without relation validation");
        }

        let id = match document.id() {
            Some(id) => id.clone(),
            None => {
                let id = DocumentId::generate();
                document.set_id(id.clone());
                id
            }
        };

        let stored = StoredDocument::from_document(id.clone(), document)?;
        self.store
            .save(bound.index_name(), stored, &options.store)
            .await?;
        debug!(document = bound.name(), id = %id, "Saved document");
        Ok(id)
    }

    /// Load a document, returning `None` if it does not exist
    pub async fn get<D: Document>(&self, id: &DocumentId) -> RelationResult<Option<D>> {
        let bound = self.graph.bound::<D>()?;
        match self.store.get(bound.index_name(), id).await {
            Ok(stored) => Ok(Some(stored.into_document()?)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Apply delete policies, then delete the document
    pub async fn delete<D: Document>(
        &self,
        document: &D,
        options: &StoreOptions,
    ) -> RelationResult<DeleteReport> {
        self.propagator().delete(document, options).await
    }

    /// Same as [`RelationManager::delete`] for a document known by type name and id
    pub async fn delete_by_id(
        &self,
        document: &str,
        id: &DocumentId,
        options: &StoreOptions,
    ) -> RelationResult<DeleteReport> {
        self.propagator().delete_by_id(document, id, options).await
    }

    fn propagator(&self) -> DeletePropagator<'_, S> {
        DeletePropagator::new(
            self.store.as_ref(),
            &self.graph,
            *self.config.get_propagation(),
        )
    }
}

impl<S: DocumentStore> Clone for RelationManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            graph: Arc::clone(&self.graph),
            config: self.config.clone(),
        }
    }
}
