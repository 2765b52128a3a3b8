//! Field mapping types passed through to the document store

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Index mappings, field name -> mapping
pub type Mappings = BTreeMap<String, FieldMapping>;

/// Storage mapping of a single field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldMapping {
    #[default]
    Keyword,
    Text,
    Integer,
    Long,
    Float,
    Double,
    Boolean,
    Date,
    Object,
    /// Store-specific mapping emitted verbatim
    Custom { definition: Value },
}

impl FieldMapping {
    /// Name of the mapping type
    pub fn type_name(&self) -> &str {
        match self {
            FieldMapping::Keyword => "keyword",
            FieldMapping::Text => "text",
            FieldMapping::Integer => "integer",
            FieldMapping::Long => "long",
            FieldMapping::Float => "float",
            FieldMapping::Double => "double",
            FieldMapping::Boolean => "boolean",
            FieldMapping::Date => "date",
            FieldMapping::Object => "object",
            FieldMapping::Custom { definition } => definition
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("custom"),
        }
    }
}
