//! Integrity validation - checks that referenced documents exist before a save

use std::collections::BTreeSet;

use futures::TryStreamExt;
use serde_json::Value;
use tracing::debug;

use crate::document::{Document, DocumentId, RelationValue, ID_FIELD};
use crate::error::{IntegrityViolation, RelationResult};
use crate::store::{DocumentStore, Hit, Query};
use super::graph::{ParentRelation, RelationGraph};

/// Read-only checks of a document's outgoing relations
pub struct IntegrityValidator<'a, S: ?Sized> {
    store: &'a S,
    graph: &'a RelationGraph,
}

impl<'a, S: DocumentStore + ?Sized> IntegrityValidator<'a, S> {
    pub fn new(store: &'a S, graph: &'a RelationGraph) -> Self {
        Self { store, graph }
    }

    /// Validate every parent relation of a document
    ///
    /// Stops at the first violation. Storage failures other than a missing
    /// document are returned unchanged.
    pub async fn validate<D: Document>(&self, document: &D) -> RelationResult<()> {
        let (bound, accessors) = self.graph.relations_of::<D>()?;

        for (relation, accessor) in bound.parent_relations().iter().zip(accessors) {
            match accessor(document) {
                RelationValue::Missing if relation.required => {
                    return Err(IntegrityViolation::MissingValue {
                        document: bound.name().to_string(),
                        field: relation.field.clone(),
                    }
                    .into());
                }
                RelationValue::Missing => {
                    debug!(
                        document = bound.name(),
                        field = %relation.field,
                        "Skipping empty optional relation"
                    );
                }
                RelationValue::One(id) => self.check_one(relation, id).await?,
                RelationValue::Many(ids) => self.check_many(relation, ids).await?,
            }
        }

        Ok(())
    }

    async fn check_one(&self, relation: &ParentRelation, id: DocumentId) -> RelationResult<()> {
        let exists = if relation.referenced_field == ID_FIELD {
            self.store.exists(&relation.target_index, &id).await?
        } else {
            let query = Query::term(relation.referenced_field.clone(), Value::from(&id));
            self.store.count(&relation.target_index, &query).await? > 0
        };

        if exists {
            debug!(field = %relation.field, target = %relation.target, id = %id, "Relation target found");
            Ok(())
        } else {
            Err(IntegrityViolation::MissingTargets {
                index: relation.target_index.clone(),
                ids: vec![id],
            }
            .into())
        }
    }

    async fn check_many(&self, relation: &ParentRelation, ids: Vec<DocumentId>) -> RelationResult<()> {
        let requested: BTreeSet<DocumentId> = ids.into_iter().collect();
        if requested.is_empty() {
            return Ok(());
        }

        let query = if relation.referenced_field == ID_FIELD {
            Query::ids(requested.iter().cloned())
        } else {
            Query::terms(
                relation.referenced_field.clone(),
                requested.iter().map(Value::from).collect(),
            )
        };

        let hits: Vec<Hit> = self
            .store
            .scan(&relation.target_index, &query)
            .try_collect()
            .await?;

        let found: BTreeSet<DocumentId> = hits
            .into_iter()
            .flat_map(|hit| referenced_values(relation, hit))
            .collect();

        let missing: Vec<DocumentId> = requested.difference(&found).cloned().collect();
        if missing.is_empty() {
            debug!(
                field = %relation.field,
                target = %relation.target,
                count = requested.len(),
                "Relation targets found"
            );
            Ok(())
        } else {
            Err(IntegrityViolation::MissingTargets {
                index: relation.target_index.clone(),
                ids: missing,
            }
            .into())
        }
    }
}

fn referenced_values(relation: &ParentRelation, hit: Hit) -> Vec<DocumentId> {
    if relation.referenced_field == ID_FIELD {
        return vec![hit.id];
    }
    match hit.source.get(&relation.referenced_field) {
        Some(Value::Array(items)) => items.iter().filter_map(as_document_id).collect(),
        Some(value) => as_document_id(value).into_iter().collect(),
        None => Vec::new(),
    }
}

/// Scalar field value in the string form relation fields store
fn as_document_id(value: &Value) -> Option<DocumentId> {
    match value {
        Value::String(text) => Some(DocumentId::new(text.clone())),
        Value::Number(_) | Value::Bool(_) => Some(DocumentId::new(value.to_string())),
        _ => None,
    }
}
