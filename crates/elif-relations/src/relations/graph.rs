//! Relation graph - bidirectional relation metadata for bound document types
//!
//! Binding is explicit and happens once at startup:
//!
//! 1. every document type is added to a [`RelationGraphBuilder`], which runs
//!    [`Document::define`] and collects its field and relation declarations;
//! 2. [`RelationGraphBuilder::bind`] resolves relation targets by name, swaps
//!    each relation field for its storage mapping and records a child entry on
//!    every referenced type.
//!
//! The resulting [`RelationGraph`] is immutable and meant to be shared behind
//! an `Arc`.

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use tracing::{debug, info};

use crate::document::Document;
use crate::error::{RelationError, RelationResult};
use crate::mapping::{FieldMapping, Mappings};
use super::definition::{DocumentDefinition, RelationAccessor};
use super::descriptor::{OnDelete, RelatedDocument};

/// Outgoing relation declared by a document type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRelation {
    pub field: String,
    pub target: String,
    pub target_index: String,
    pub referenced_field: String,
    pub on_delete: OnDelete,
    pub required: bool,
}

/// Incoming relation recorded on the referenced document type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildRelation {
    pub source: String,
    pub source_index: String,
    pub field: String,
    pub referenced_field: String,
    pub on_delete: OnDelete,
}

/// A document type after binding
pub struct BoundDocument {
    name: &'static str,
    index_name: &'static str,
    type_id: TypeId,
    mappings: Mappings,
    parents: Vec<ParentRelation>,
    children: BTreeMap<String, Vec<ChildRelation>>,
    accessors: Box<dyn Any + Send + Sync>,
}

impl BoundDocument {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn index_name(&self) -> &'static str {
        self.index_name
    }

    /// Field mappings with relation fields replaced by their storage type
    pub fn mappings(&self) -> &Mappings {
        &self.mappings
    }

    /// Relations declared by this type, in declaration order
    pub fn parent_relations(&self) -> &[ParentRelation] {
        &self.parents
    }

    /// Relations pointing at this type, keyed by the referencing type
    pub fn child_relations(&self) -> &BTreeMap<String, Vec<ChildRelation>> {
        &self.children
    }

    /// Relations from one referencing type
    pub fn child_relations_from(&self, source: &str) -> &[ChildRelation] {
        self.children.get(source).map(Vec::as_slice).unwrap_or(&[])
    }

    fn accessors<D: Document>(&self) -> Option<&[RelationAccessor<D>]> {
        self.accessors
            .downcast_ref::<Vec<RelationAccessor<D>>>()
            .map(Vec::as_slice)
    }
}

impl fmt::Debug for BoundDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundDocument")
            .field("name", &self.name)
            .field("index_name", &self.index_name)
            .field("mappings", &self.mappings)
            .field("parents", &self.parents)
            .field("children", &self.children)
            .finish()
    }
}

struct PendingDocument {
    name: &'static str,
    index_name: &'static str,
    type_id: TypeId,
    fields: Vec<(String, FieldMapping)>,
    relations: Vec<(String, RelatedDocument)>,
    accessors: Box<dyn Any + Send + Sync>,
}

/// Collects document types for binding
#[derive(Default)]
pub struct RelationGraphBuilder {
    pending: Vec<PendingDocument>,
}

impl RelationGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document type, collecting its declarations
    pub fn document<D: Document>(mut self) -> Self {
        let DocumentDefinition { fields, relations } = DocumentDefinition::<D>::collect();
        let (relations, accessors): (Vec<_>, Vec<RelationAccessor<D>>) = relations
            .into_iter()
            .map(|relation| ((relation.name, relation.descriptor), relation.accessor))
            .unzip();

        self.pending.push(PendingDocument {
            name: D::document_name(),
            index_name: D::index_name(),
            type_id: TypeId::of::<D>(),
            fields,
            relations,
            accessors: Box::new(accessors),
        });
        self
    }

    /// Resolve all relations and build the graph
    pub fn bind(self) -> RelationResult<RelationGraph> {
        let mut index_names: HashMap<&'static str, &'static str> = HashMap::new();
        for pending in &self.pending {
            if index_names.insert(pending.name, pending.index_name).is_some() {
                return Err(RelationError::DuplicateDocumentType(pending.name.to_string()));
            }
        }

        let mut order = Vec::with_capacity(self.pending.len());
        let mut documents = HashMap::with_capacity(self.pending.len());

        for pending in self.pending {
            let document = bind_document(pending, &index_names)?;
            order.push(document.name);
            documents.insert(document.name, document);
        }

        let incoming: Vec<(String, ChildRelation)> = order
            .iter()
            .flat_map(|name| {
                let document = &documents[name];
                document.parents.iter().map(move |parent| {
                    let child = ChildRelation {
                        source: document.name.to_string(),
                        source_index: document.index_name.to_string(),
                        field: parent.field.clone(),
                        referenced_field: parent.referenced_field.clone(),
                        on_delete: parent.on_delete,
                    };
                    (parent.target.clone(), child)
                })
            })
            .collect();

        let relation_count = incoming.len();
        for (target, child) in incoming {
            // Every target was resolved against the same name set by bind_document
            if let Some(document) = documents.get_mut(target.as_str()) {
                debug!(
                    target = %target,
                    source = %child.source,
                    field = %child.field,
                    on_delete = %child.on_delete,
                    "Recorded child relation"
                );
                document
                    .children
                    .entry(child.source.clone())
                    .or_default()
                    .push(child);
            }
        }

        info!(
            documents = order.len(),
            relations = relation_count,
            "Relation graph bound"
        );

        Ok(RelationGraph { order, documents })
    }
}

fn bind_document(
    pending: PendingDocument,
    index_names: &HashMap<&'static str, &'static str>,
) -> RelationResult<BoundDocument> {
    let mut mappings = Mappings::new();
    let mut seen = HashSet::new();

    for (field, mapping) in pending.fields {
        if !seen.insert(field.clone()) {
            return Err(duplicate_field(pending.name, &field));
        }
        mappings.insert(field, mapping);
    }

    let mut parents = Vec::with_capacity(pending.relations.len());
    for (field, descriptor) in pending.relations {
        if !seen.insert(field.clone()) {
            return Err(duplicate_field(pending.name, &field));
        }

        let target = descriptor.target().name();
        let target_index = index_names.get(target).ok_or_else(|| {
            RelationError::UnresolvedRelationTarget {
                document: pending.name.to_string(),
                field: field.clone(),
                target: target.to_string(),
            }
        })?;

        if descriptor.delete_strategy() == OnDelete::SetNull && descriptor.is_required() {
            return Err(RelationError::Definition(format!(
                "relation '{}' on '{}' is cleared on delete and must be optional",
                field, pending.name
            )));
        }

        mappings.insert(field.clone(), descriptor.mapping().clone());
        parents.push(ParentRelation {
            field,
            target: target.to_string(),
            target_index: target_index.to_string(),
            referenced_field: descriptor.referenced_field().to_string(),
            on_delete: descriptor.delete_strategy(),
            required: descriptor.is_required(),
        });
    }

    Ok(BoundDocument {
        name: pending.name,
        index_name: pending.index_name,
        type_id: pending.type_id,
        mappings,
        parents,
        children: BTreeMap::new(),
        accessors: pending.accessors,
    })
}

fn duplicate_field(document: &str, field: &str) -> RelationError {
    RelationError::Definition(format!(
        "field '{}' declared more than once on '{}'",
        field, document
    ))
}

/// Bound relation metadata for a set of document types
pub struct RelationGraph {
    order: Vec<&'static str>,
    documents: HashMap<&'static str, BoundDocument>,
}

impl RelationGraph {
    pub fn builder() -> RelationGraphBuilder {
        RelationGraphBuilder::new()
    }

    /// Look up a bound document type by name
    pub fn get(&self, name: &str) -> Option<&BoundDocument> {
        self.documents.get(name)
    }

    /// Look up a bound document type by name, failing if unknown
    pub fn document(&self, name: &str) -> RelationResult<&BoundDocument> {
        self.get(name).ok_or_else(|| {
            RelationError::InvalidDocumentType(format!(
                "document '{}' is not bound in the relation graph",
                name
            ))
        })
    }

    /// Look up the bound entry for a Rust document type
    pub fn bound<D: Document>(&self) -> RelationResult<&BoundDocument> {
        let document = self.document(D::document_name())?;
        if document.type_id != TypeId::of::<D>() {
            return Err(RelationError::InvalidDocumentType(format!(
                "document name '{}' is bound to a different type",
                D::document_name()
            )));
        }
        Ok(document)
    }

    pub fn contains<D: Document>(&self) -> bool {
        self.bound::<D>().is_ok()
    }

    /// Parent relations of a document type paired with their accessors
    pub(crate) fn relations_of<D: Document>(
        &self,
    ) -> RelationResult<(&BoundDocument, &[RelationAccessor<D>])> {
        let document = self.bound::<D>()?;
        let accessors = document.accessors::<D>().ok_or_else(|| {
            RelationError::InvalidDocumentType(format!(
                "accessors of '{}' do not match its type",
                D::document_name()
            ))
        })?;
        Ok((document, accessors))
    }

    /// Bound document types in definition order
    pub fn documents(&self) -> impl Iterator<Item = &BoundDocument> {
        self.order.iter().filter_map(|name| self.documents.get(name))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl fmt::Debug for RelationGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.documents()).finish()
    }
}
