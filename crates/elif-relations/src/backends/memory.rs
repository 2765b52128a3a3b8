//! In-memory document store for development and testing

use std::collections::BTreeMap;

use async_trait::async_trait;
use dashmap::DashMap;
use futures::stream;
use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::document::{DocumentId, StoredDocument};
use crate::mapping::Mappings;
use crate::store::{DocumentStore, Hit, HitStream, Query, StoreError, StoreOptions, StoreResult};

/// A single index held in memory
#[derive(Debug, Default)]
struct MemoryIndex {
    mappings: RwLock<Mappings>,
    documents: RwLock<BTreeMap<DocumentId, Map<String, Value>>>,
}

impl MemoryIndex {
    fn matching(&self, query: &Query) -> Vec<Hit> {
        self.documents
            .read()
            .iter()
            .map(|(id, source)| StoredDocument::new(id.clone(), source.clone()))
            .filter(|document| query.matches(document))
            .map(Hit::from)
            .collect()
    }
}

/// In-memory document store
///
/// Indices are created on first write. Counting or scanning an index that
/// does not exist yields no documents.
#[derive(Debug, Default)]
pub struct MemoryStore {
    indices: DashMap<String, MemoryIndex>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether an index exists
    pub fn has_index(&self, index: &str) -> bool {
        self.indices.contains_key(index)
    }

    /// Current mappings of an index
    pub fn mappings(&self, index: &str) -> Option<Mappings> {
        self.indices
            .get(index)
            .map(|entry| entry.value().mappings.read().clone())
    }

    /// Number of documents in an index
    pub fn len(&self, index: &str) -> usize {
        self.indices
            .get(index)
            .map_or(0, |entry| entry.value().documents.read().len())
    }

    pub fn is_empty(&self, index: &str) -> bool {
        self.len(index) == 0
    }

    fn not_found(index: &str, id: &DocumentId) -> StoreError {
        StoreError::NotFound {
            index: index.to_string(),
            id: id.clone(),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, index: &str, id: &DocumentId) -> StoreResult<StoredDocument> {
        let entry = self
            .indices
            .get(index)
            .ok_or_else(|| Self::not_found(index, id))?;
        let source = entry
            .value()
            .documents
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| Self::not_found(index, id))?;
        Ok(StoredDocument::new(id.clone(), source))
    }

    async fn count(&self, index: &str, query: &Query) -> StoreResult<u64> {
        Ok(self
            .indices
            .get(index)
            .map_or(0, |entry| entry.value().matching(query).len() as u64))
    }

    fn scan<'a>(&'a self, index: &'a str, query: &'a Query) -> HitStream<'a> {
        let hits = self
            .indices
            .get(index)
            .map(|entry| entry.value().matching(query))
            .unwrap_or_default();
        Box::pin(stream::iter(hits.into_iter().map(Ok)))
    }

    async fn save(
        &self,
        index: &str,
        document: StoredDocument,
        _options: &StoreOptions,
    ) -> StoreResult<()> {
        let entry = self.indices.entry(index.to_string()).or_default();
        entry
            .value()
            .documents
            .write()
            .insert(document.id, document.source);
        Ok(())
    }

    async fn update(
        &self,
        index: &str,
        id: &DocumentId,
        changes: Map<String, Value>,
        _options: &StoreOptions,
    ) -> StoreResult<()> {
        let entry = self
            .indices
            .get(index)
            .ok_or_else(|| Self::not_found(index, id))?;
        let mut documents = entry.value().documents.write();
        let source = documents
            .get_mut(id)
            .ok_or_else(|| Self::not_found(index, id))?;
        source.extend(changes);
        Ok(())
    }

    async fn delete(
        &self,
        index: &str,
        id: &DocumentId,
        _options: &StoreOptions,
    ) -> StoreResult<()> {
        let entry = self
            .indices
            .get(index)
            .ok_or_else(|| Self::not_found(index, id))?;
        let removed = entry.value().documents.write().remove(id);
        removed.map(|_| ()).ok_or_else(|| Self::not_found(index, id))
    }

    async fn init_index(
        &self,
        index: &str,
        mappings: &Mappings,
        _options: &StoreOptions,
    ) -> StoreResult<()> {
        let entry = self.indices.entry(index.to_string()).or_default();
        let mut current = entry.value().mappings.write();

        for (field, mapping) in mappings {
            if let Some(existing) = current.get(field) {
                if existing != mapping {
                    return Err(StoreError::MappingConflict {
                        index: index.to_string(),
                        field: field.clone(),
                        existing: existing.type_name().to_string(),
                        requested: mapping.type_name().to_string(),
                    });
                }
            }
        }

        current.extend(mappings.iter().map(|(field, mapping)| (field.clone(), mapping.clone())));
        Ok(())
    }

    async fn delete_index(&self, index: &str, _options: &StoreOptions) -> StoreResult<()> {
        self.indices
            .remove(index)
            .map(|_| ())
            .ok_or_else(|| StoreError::IndexNotFound(index.to_string()))
    }
}
