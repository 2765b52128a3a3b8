//! Delete propagation - applies `check`, `cascade` and `set_null` policies
//!
//! Child documents are located with one count per incoming relation and then
//! handled one at a time: cascaded children go through the same propagation
//! recursively, nullified children get a partial update clearing the field.
//! Nothing here is transactional; see [`PropagationMode`] for how blocking
//! references are detected.

use std::collections::HashSet;

use futures::future::BoxFuture;
use futures::TryStreamExt;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::config::PropagationMode;
use crate::document::{Document, DocumentId, ID_FIELD};
use crate::error::{IntegrityViolation, RelationError, RelationResult};
use crate::store::{DocumentStore, Hit, Query, StoreOptions};
use super::descriptor::OnDelete;
use super::graph::{BoundDocument, ChildRelation, RelationGraph};

/// A document touched by a delete
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentRef {
    pub document: String,
    pub id: DocumentId,
}

impl DocumentRef {
    fn new(document: &str, id: &DocumentId) -> Self {
        Self {
            document: document.to_string(),
            id: id.clone(),
        }
    }
}

/// A relation field cleared by `set_null`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NullifiedField {
    pub target: DocumentRef,
    pub field: String,
}

/// Everything a delete changed, in the order it happened
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteReport {
    pub deleted: Vec<DocumentRef>,
    pub nullified: Vec<NullifiedField>,
}

impl DeleteReport {
    /// Whether a document was deleted as part of this operation
    pub fn was_deleted(&self, document: &str, id: &DocumentId) -> bool {
        self.deleted
            .iter()
            .any(|deleted| deleted.document == document && &deleted.id == id)
    }
}

type Visited = HashSet<(&'static str, DocumentId)>;

/// Simulated effects of a delete, built by the preflight pass
#[derive(Default)]
struct Plan {
    visited: Visited,
    deleted: Visited,
    nullified: HashSet<(&'static str, DocumentId, String)>,
}

impl Plan {
    fn is_nullified(&self, document: &'static str, id: &DocumentId, field: &str) -> bool {
        self.nullified
            .contains(&(document, id.clone(), field.to_string()))
    }

    /// Whether a matching child would no longer match at this point of the delete
    fn is_gone(&self, document: &'static str, id: &DocumentId, field: &str) -> bool {
        self.deleted.contains(&(document, id.clone())) || self.is_nullified(document, id, field)
    }
}

/// Enforces delete policies of incoming relations
pub struct DeletePropagator<'a, S: ?Sized> {
    store: &'a S,
    graph: &'a RelationGraph,
    mode: PropagationMode,
}

impl<'a, S: DocumentStore + ?Sized> DeletePropagator<'a, S> {
    pub fn new(store: &'a S, graph: &'a RelationGraph, mode: PropagationMode) -> Self {
        Self { store, graph, mode }
    }

    /// Delete a document after applying the policies of every relation
    /// pointing at it
    pub async fn delete<D: Document>(
        &self,
        document: &D,
        options: &StoreOptions,
    ) -> RelationResult<DeleteReport> {
        let bound = self.graph.bound::<D>()?;
        let id = document
            .id()
            .ok_or_else(|| RelationError::MissingDocumentId(D::document_name().to_string()))?;
        self.delete_bound(bound, id, options).await
    }

    /// Delete a document identified by type name and id
    pub async fn delete_by_id(
        &self,
        document: &str,
        id: &DocumentId,
        options: &StoreOptions,
    ) -> RelationResult<DeleteReport> {
        let bound = self.graph.document(document)?;
        self.delete_bound(bound, id, options).await
    }

    async fn delete_bound(
        &self,
        bound: &'a BoundDocument,
        id: &DocumentId,
        options: &StoreOptions,
    ) -> RelationResult<DeleteReport> {
        if self.mode == PropagationMode::Preflight {
            let mut plan = Plan::default();
            self.preflight(bound, id.clone(), &mut plan).await?;
        }

        let mut visited = Visited::new();
        let mut report = DeleteReport::default();
        self.propagate(bound, id.clone(), options, &mut visited, &mut report)
            .await?;

        info!(
            document = bound.name(),
            id = %id,
            deleted = report.deleted.len(),
            nullified = report.nullified.len(),
            "Deleted document with relations"
        );
        Ok(report)
    }

    /// Read-only dry run of [`Self::propagate`]
    ///
    /// Relations are visited in the same order as the real delete, with
    /// documents planned for deletion or nullification treated as already
    /// gone, so a blocker removed by an earlier cascade does not count.
    fn preflight<'b>(
        &'b self,
        bound: &'b BoundDocument,
        id: DocumentId,
        plan: &'b mut Plan,
    ) -> BoxFuture<'b, RelationResult<()>> {
        Box::pin(async move {
            if !plan.visited.insert((bound.name(), id.clone())) {
                return Ok(());
            }

            for (source, relations) in bound.child_relations() {
                let child = self.graph.document(source)?;
                for relation in relations {
                    if plan.is_nullified(bound.name(), &id, &relation.referenced_field) {
                        continue;
                    }
                    let Some(value) = self.referenced_value(bound, &id, relation).await? else {
                        continue;
                    };

                    let query = Query::term(relation.field.clone(), value);
                    let remaining: Vec<Hit> = self
                        .matching(child, &query)
                        .await?
                        .into_iter()
                        .filter(|hit| !plan.is_gone(child.name(), &hit.id, &relation.field))
                        .collect();
                    if remaining.is_empty() {
                        continue;
                    }

                    match relation.on_delete {
                        OnDelete::Check => {
                            return Err(blocked(bound, &id, relation, remaining.len() as u64));
                        }
                        OnDelete::Cascade => {
                            for hit in remaining {
                                self.preflight(child, hit.id, plan).await?;
                            }
                        }
                        OnDelete::SetNull => {
                            for hit in remaining {
                                plan.nullified
                                    .insert((child.name(), hit.id, relation.field.clone()));
                            }
                        }
                    }
                }
            }

            plan.deleted.insert((bound.name(), id));
            Ok(())
        })
    }

    fn propagate<'b>(
        &'b self,
        bound: &'b BoundDocument,
        id: DocumentId,
        options: &'b StoreOptions,
        visited: &'b mut Visited,
        report: &'b mut DeleteReport,
    ) -> BoxFuture<'b, RelationResult<()>> {
        Box::pin(async move {
            // Cascade cycles lead back to documents already being deleted
            if !visited.insert((bound.name(), id.clone())) {
                debug!(document = bound.name(), id = %id, "Document already being deleted");
                return Ok(());
            }

            for (source, relations) in bound.child_relations() {
                let child = self.graph.document(source)?;
                for relation in relations {
                    let Some((query, count)) = self.references(bound, &id, child, relation).await?
                    else {
                        continue;
                    };

                    match relation.on_delete {
                        OnDelete::Check => return Err(blocked(bound, &id, relation, count)),
                        OnDelete::Cascade => {
                            // TODO: switch to a delete-by-query primitive once DocumentStore offers one
                            for hit in self.matching(child, &query).await? {
                                self.propagate(child, hit.id, options, visited, report)
                                    .await?;
                            }
                        }
                        OnDelete::SetNull => {
                            for hit in self.matching(child, &query).await? {
                                let mut changes = Map::new();
                                changes.insert(relation.field.clone(), Value::Null);
                                self.store
                                    .update(child.index_name(), &hit.id, changes, options)
                                    .await?;
                                debug!(
                                    document = child.name(),
                                    id = %hit.id,
                                    field = %relation.field,
                                    "Cleared relation field"
                                );
                                report.nullified.push(NullifiedField {
                                    target: DocumentRef::new(child.name(), &hit.id),
                                    field: relation.field.clone(),
                                });
                            }
                        }
                    }
                }
            }

            self.store.delete(bound.index_name(), &id, options).await?;
            debug!(document = bound.name(), id = %id, "Deleted document");
            report.deleted.push(DocumentRef::new(bound.name(), &id));
            Ok(())
        })
    }

    /// Count children referencing a document through one relation
    async fn references(
        &self,
        bound: &BoundDocument,
        id: &DocumentId,
        child: &BoundDocument,
        relation: &ChildRelation,
    ) -> RelationResult<Option<(Query, u64)>> {
        let Some(value) = self.referenced_value(bound, id, relation).await? else {
            return Ok(None);
        };

        let query = Query::term(relation.field.clone(), value);
        let count = self.store.count(child.index_name(), &query).await?;
        debug!(
            document = bound.name(),
            id = %id,
            child = child.name(),
            field = %relation.field,
            count,
            "Counted referencing documents"
        );

        Ok((count > 0).then_some((query, count)))
    }

    /// Value children store to point at this document
    async fn referenced_value(
        &self,
        bound: &BoundDocument,
        id: &DocumentId,
        relation: &ChildRelation,
    ) -> RelationResult<Option<Value>> {
        if relation.referenced_field == ID_FIELD {
            return Ok(Some(Value::from(id)));
        }

        match self.store.get(bound.index_name(), id).await {
            Ok(document) => Ok(document
                .field(&relation.referenced_field)
                .filter(|value| !value.is_null())),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn matching(&self, child: &BoundDocument, query: &Query) -> RelationResult<Vec<Hit>> {
        Ok(self
            .store
            .scan(child.index_name(), query)
            .try_collect()
            .await?)
    }
}

fn blocked(
    bound: &BoundDocument,
    id: &DocumentId,
    relation: &ChildRelation,
    count: u64,
) -> RelationError {
    warn!(
        document = bound.name(),
        id = %id,
        child = %relation.source,
        count,
        "Delete blocked by referencing documents"
    );
    IntegrityViolation::Referenced {
        document: bound.name().to_string(),
        id: id.clone(),
        child: relation.source.clone(),
        count,
    }
    .into()
}
