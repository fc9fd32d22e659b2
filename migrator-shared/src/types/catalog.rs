use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ParseEnumError;

/// Technical type of a remote field, as reported by the store's field metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum FieldType {
    Char,
    Text,
    Html,
    Integer,
    Float,
    Monetary,
    Boolean,
    Date,
    Datetime,
    Selection,
    Binary,
    Many2one,
    Many2many,
    One2many,
    /// Anything the migrator has no special handling for.
    Other(String),
}

impl FieldType {
    pub fn is_relational(&self) -> bool {
        matches!(self, FieldType::Many2one | FieldType::Many2many | FieldType::One2many)
    }

    /// True for relation kinds whose values reference several records.
    pub fn is_multi_relation(&self) -> bool {
        matches!(self, FieldType::Many2many | FieldType::One2many)
    }

    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Char => "char",
            FieldType::Text => "text",
            FieldType::Html => "html",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Monetary => "monetary",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Datetime => "datetime",
            FieldType::Selection => "selection",
            FieldType::Binary => "binary",
            FieldType::Many2one => "many2one",
            FieldType::Many2many => "many2many",
            FieldType::One2many => "one2many",
            FieldType::Other(other) => other,
        }
    }
}

impl From<&str> for FieldType {
    fn from(value: &str) -> Self {
        match value {
            "char" => FieldType::Char,
            "text" => FieldType::Text,
            "html" => FieldType::Html,
            "integer" => FieldType::Integer,
            "float" => FieldType::Float,
            "monetary" => FieldType::Monetary,
            "boolean" => FieldType::Boolean,
            "date" => FieldType::Date,
            "datetime" => FieldType::Datetime,
            "selection" => FieldType::Selection,
            "binary" => FieldType::Binary,
            "many2one" => FieldType::Many2one,
            "many2many" => FieldType::Many2many,
            "one2many" => FieldType::One2many,
            other => FieldType::Other(other.to_string()),
        }
    }
}

impl From<String> for FieldType {
    fn from(value: String) -> Self {
        FieldType::from(value.as_str())
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        value.as_str().to_string()
    }
}

impl FromStr for FieldType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseEnumError::new("field type", s));
        }
        Ok(FieldType::from(s))
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata of one field of a remote model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMeta {
    pub name: String,
    pub field_type: FieldType,
    /// Target model for relational fields.
    pub relation: Option<String>,
}

impl FieldMeta {
    pub fn new(name: impl Into<String>, field_type: FieldType, relation: Option<&str>) -> Self {
        Self {
            name: name.into(),
            field_type,
            relation: relation.filter(|r| !r.is_empty()).map(str::to_string),
        }
    }
}

/// A model known to a remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Technical name, e.g. `res.partner`.
    pub model: String,
    /// Human readable name.
    pub name: String,
}
