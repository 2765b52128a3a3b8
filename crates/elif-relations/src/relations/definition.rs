//! Document definitions - the collection step of relation binding

use std::fmt;

use crate::document::{Document, RelationValue};
use crate::mapping::FieldMapping;
use super::descriptor::RelatedDocument;

/// Typed read access to a relation field
pub type RelationAccessor<D> = fn(&D) -> RelationValue;

/// A relation declared on a document type
pub struct RelationField<D> {
    pub(crate) name: String,
    pub(crate) descriptor: RelatedDocument,
    pub(crate) accessor: RelationAccessor<D>,
}

impl<D> RelationField<D> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &RelatedDocument {
        &self.descriptor
    }

    /// Read the relation value from a document
    pub fn read(&self, document: &D) -> RelationValue {
        (self.accessor)(document)
    }
}

impl<D> fmt::Debug for RelationField<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelationField")
            .field("name", &self.name)
            .field("descriptor", &self.descriptor)
            .finish()
    }
}

/// Fields and relations declared by a document type
///
/// Filled in by [`Document::define`] and consumed when the relation graph is
/// bound.
pub struct DocumentDefinition<D> {
    pub(crate) fields: Vec<(String, FieldMapping)>,
    pub(crate) relations: Vec<RelationField<D>>,
}

impl<D: Document> DocumentDefinition<D> {
    pub(crate) fn collect() -> Self {
        let mut definition = Self {
            fields: Vec::new(),
            relations: Vec::new(),
        };
        D::define(&mut definition);
        definition
    }

    /// Declare a plain field mapping
    pub fn field(&mut self, name: impl Into<String>, mapping: FieldMapping) -> &mut Self {
        self.fields.push((name.into(), mapping));
        self
    }

    /// Declare a relation field
    pub fn relation(
        &mut self,
        name: impl Into<String>,
        descriptor: RelatedDocument,
        accessor: RelationAccessor<D>,
    ) -> &mut Self {
        self.relations.push(RelationField {
            name: name.into(),
            descriptor,
            accessor,
        });
        self
    }

    pub fn fields(&self) -> &[(String, FieldMapping)] {
        &self.fields
    }

    pub fn relations(&self) -> &[RelationField<D>] {
        &self.relations
    }
}

impl<D> fmt::Debug for DocumentDefinition<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentDefinition")
            .field("fields", &self.fields)
            .field("relations", &self.relations)
            .finish()
    }
}
