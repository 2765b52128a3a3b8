//! Relation descriptors - declarative parent references on document fields

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::document::{Document, ID_FIELD};
use crate::error::RelationError;
use crate::mapping::FieldMapping;

/// What happens to referencing documents when their target is deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OnDelete {
    /// Refuse the delete while references exist
    #[default]
    Check,
    /// Delete referencing documents as well
    Cascade,
    /// Clear the reference on referencing documents
    SetNull,
}

impl OnDelete {
    pub fn as_str(self) -> &'static str {
        match self {
            OnDelete::Check => "check",
            OnDelete::Cascade => "cascade",
            OnDelete::SetNull => "set_null",
        }
    }
}

impl fmt::Display for OnDelete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OnDelete {
    type Err = RelationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "check" => Ok(OnDelete::Check),
            "cascade" => Ok(OnDelete::Cascade),
            "set_null" => Ok(OnDelete::SetNull),
            other => Err(RelationError::Definition(format!(
                "unknown delete strategy '{}', expected check, cascade or set_null",
                other
            ))),
        }
    }
}

/// Reference to a document type by name
///
/// Names are resolved when the relation graph is bound, so a type may refer
/// to one that is defined later.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef(String);

impl TypeRef {
    pub fn of<R: Document>() -> Self {
        Self(R::document_name().to_string())
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// Declaration of a relation field pointing at another document type
#[derive(Debug, Clone, PartialEq)]
pub struct RelatedDocument {
    target: TypeRef,
    on_delete: OnDelete,
    field_name: String,
    storage_type: FieldMapping,
    required: bool,
}

impl RelatedDocument {
    /// Relation to a known document type
    pub fn to<R: Document>() -> Self {
        Self::new(TypeRef::of::<R>())
    }

    /// Relation to a document type by name, resolved at bind time
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(TypeRef::named(name))
    }

    fn new(target: TypeRef) -> Self {
        Self {
            target,
            on_delete: OnDelete::default(),
            field_name: ID_FIELD.to_string(),
            storage_type: FieldMapping::Keyword,
            required: true,
        }
    }

    /// Set the delete strategy
    pub fn on_delete(mut self, on_delete: OnDelete) -> Self {
        self.on_delete = on_delete;
        self
    }

    /// Reference a field other than the target's id
    pub fn field_name(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = field_name.into();
        self
    }

    /// Mapping emitted for the relation field
    pub fn storage_type(mut self, storage_type: FieldMapping) -> Self {
        self.storage_type = storage_type;
        self
    }

    /// Allow the relation field to be empty
    ///
    /// Required for [`OnDelete::SetNull`] relations.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn target(&self) -> &TypeRef {
        &self.target
    }

    pub fn delete_strategy(&self) -> OnDelete {
        self.on_delete
    }

    pub fn referenced_field(&self) -> &str {
        &self.field_name
    }

    pub fn mapping(&self) -> &FieldMapping {
        &self.storage_type
    }

    pub fn is_required(&self) -> bool {
        self.required
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_defaults() {
        let relation = RelatedDocument::named("author");
        assert_eq!(relation.target().name(), "author");
        assert_eq!(relation.delete_strategy(), OnDelete::Check);
        assert_eq!(relation.referenced_field(), ID_FIELD);
        assert_eq!(relation.mapping(), &FieldMapping::Keyword);
        assert!(relation.is_required());
    }

    #[test]
    fn test_descriptor_builder() {
        let relation = RelatedDocument::named("author")
            .on_delete(OnDelete::SetNull)
            .field_name("slug")
            .storage_type(FieldMapping::Text)
            .optional();
        assert_eq!(relation.delete_strategy(), OnDelete::SetNull);
        assert_eq!(relation.referenced_field(), "slug");
        assert_eq!(relation.mapping(), &FieldMapping::Text);
        assert!(!relation.is_required());
    }

    #[test]
    fn test_on_delete_parsing() {
        assert_eq!("cascade".parse::<OnDelete>().unwrap(), OnDelete::Cascade);
        assert_eq!("set_null".parse::<OnDelete>().unwrap(), OnDelete::SetNull);
        assert!("restrict".parse::<OnDelete>().is_err());
        assert_eq!(OnDelete::Check.to_string(), "check");
    }
}
