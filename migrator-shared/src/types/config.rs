use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{ConfigId, FieldMeta, FieldType, ParseEnumError};

/// What to do when a relation cannot be matched in the destination store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotFoundPolicy {
    /// Leave the relation unresolved and drop the containing record.
    #[default]
    Skip,
    /// Create the related record in the destination from the search values.
    Create,
}

impl NotFoundPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotFoundPolicy::Skip => "skip",
            NotFoundPolicy::Create => "create",
        }
    }
}

impl FromStr for NotFoundPolicy {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skip" => Ok(NotFoundPolicy::Skip),
            "create" => Ok(NotFoundPolicy::Create),
            other => Err(ParseEnumError::new("not-found policy", other)),
        }
    }
}

impl fmt::Display for NotFoundPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do when a relation matches several destination records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Take the match with the lowest destination id.
    #[default]
    First,
    /// Leave the relation unresolved.
    Skip,
    /// Fail the containing record.
    Error,
}

impl DuplicatePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DuplicatePolicy::First => "first",
            DuplicatePolicy::Skip => "skip",
            DuplicatePolicy::Error => "error",
        }
    }
}

impl FromStr for DuplicatePolicy {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first" => Ok(DuplicatePolicy::First),
            "skip" => Ok(DuplicatePolicy::Skip),
            "error" => Ok(DuplicatePolicy::Error),
            other => Err(ParseEnumError::new("duplicate policy", other)),
        }
    }
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection parameters of a remote store.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParams {
    pub url: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("url", &self.url)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// One `(source field, destination field)` correspondence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub id: i64,
    pub source_field: Option<String>,
    pub destination_field: Option<String>,
    /// Derived from the source field metadata, see [`FieldMapping::refresh_metadata`].
    pub field_type: Option<FieldType>,
    /// Derived from the source field metadata.
    pub related_model: Option<String>,
    /// Destination fields of the related model used as a natural key.
    #[serde(default)]
    pub search_fields: Vec<String>,
    #[serde(default)]
    pub not_found: NotFoundPolicy,
    #[serde(default)]
    pub duplicate: DuplicatePolicy,
}

impl FieldMapping {
    /// A plain scalar mapping.
    pub fn scalar(id: i64, source_field: &str, destination_field: &str) -> Self {
        Self {
            id,
            source_field: Some(source_field.to_string()),
            destination_field: Some(destination_field.to_string()),
            field_type: None,
            related_model: None,
            search_fields: Vec::new(),
            not_found: NotFoundPolicy::default(),
            duplicate: DuplicatePolicy::default(),
        }
    }

    /// A relational mapping towards `related_model`.
    pub fn relation(
        id: i64,
        source_field: &str,
        destination_field: &str,
        field_type: FieldType,
        related_model: &str,
        search_fields: &[&str],
    ) -> Self {
        Self {
            field_type: Some(field_type),
            related_model: Some(related_model.to_string()),
            search_fields: search_fields.iter().map(|f| f.to_string()).collect(),
            ..Self::scalar(id, source_field, destination_field)
        }
    }

    pub fn with_policies(mut self, not_found: NotFoundPolicy, duplicate: DuplicatePolicy) -> Self {
        self.not_found = not_found;
        self.duplicate = duplicate;
        self
    }

    /// A mapping is relational when its source field points at another model.
    pub fn is_relational(&self) -> bool {
        self.related_model.as_deref().is_some_and(|m| !m.is_empty())
    }

    pub fn is_one2many(&self) -> bool {
        self.field_type == Some(FieldType::One2many)
    }

    /// Recomputes the derived attributes from the source field's metadata.
    ///
    /// Must be called whenever the source field selection changes. `None`
    /// clears the derived attributes.
    pub fn refresh_metadata(&mut self, meta: Option<&FieldMeta>) {
        match meta {
            Some(meta) => {
                self.field_type = Some(meta.field_type.clone());
                self.related_model = meta.relation.clone().filter(|r| !r.is_empty());
            }
            None => {
                self.field_type = None;
                self.related_model = None;
            }
        }
    }
}

/// One `(source model, destination model)` pair within a configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMapping {
    pub id: i64,
    pub source_model: String,
    pub destination_model: String,
    pub field_mappings: Vec<FieldMapping>,
}

impl ModelMapping {
    /// Source fields to project when fetching: every mapped field plus `id`,
    /// deduplicated, in configured order.
    pub fn source_projection(&self) -> Vec<String> {
        let mut fields = vec![super::ID_FIELD.to_string()];
        for name in self.field_mappings.iter().filter_map(|f| f.source_field.as_deref()) {
            if !fields.iter().any(|f| f == name) {
                fields.push(name.to_string());
            }
        }
        fields
    }
}

/// Static setup of one migration: source connection and ordered model pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationConfiguration {
    pub id: ConfigId,
    pub name: String,
    pub source: ConnectionParams,
    pub model_mappings: Vec<ModelMapping>,
}

/// Structural problems that make a configuration unusable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("model mapping {mapping_id} has an empty {side} model")]
    EmptyModel { mapping_id: i64, side: &'static str },
}

/// Problems that do not prevent a run but leave some fields unmigrated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// One2many fields are never migrated.
    One2manyUnsupported { model: String, field: String },
    /// The field is relational but no related model is known.
    MissingRelatedModel { model: String, field: String },
    /// No search fields: the relation can never be resolved.
    NoSearchFields { model: String, field: String },
    /// Source or destination field not chosen; the mapping is ignored.
    IncompleteMapping { model: String, mapping_id: i64 },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigWarning::One2manyUnsupported { model, field } => {
                write!(f, "{model}.{field}: one2many fields are not migrated")
            }
            ConfigWarning::MissingRelatedModel { model, field } => {
                write!(f, "{model}.{field}: relational field without related model")
            }
            ConfigWarning::NoSearchFields { model, field } => {
                write!(f, "{model}.{field}: no search fields, relation cannot be resolved")
            }
            ConfigWarning::IncompleteMapping { model, mapping_id } => {
                write!(f, "{model}: field mapping {mapping_id} lacks a source or destination field")
            }
        }
    }
}

impl MigrationConfiguration {
    /// Checks the configuration before a run.
    pub fn validate(&self) -> Result<Vec<ConfigWarning>, ConfigError> {
        let mut warnings = Vec::new();
        for mapping in &self.model_mappings {
            if mapping.source_model.trim().is_empty() {
                return Err(ConfigError::EmptyModel { mapping_id: mapping.id, side: "source" });
            }
            if mapping.destination_model.trim().is_empty() {
                return Err(ConfigError::EmptyModel { mapping_id: mapping.id, side: "destination" });
            }

            let model = &mapping.destination_model;
            for field in &mapping.field_mappings {
                let (Some(_), Some(dest)) = (&field.source_field, &field.destination_field) else {
                    warnings.push(ConfigWarning::IncompleteMapping {
                        model: model.clone(),
                        mapping_id: field.id,
                    });
                    continue;
                };
                let field_name = dest.clone();
                if field.is_one2many() {
                    warnings.push(ConfigWarning::One2manyUnsupported { model: model.clone(), field: field_name });
                } else if field.field_type.as_ref().is_some_and(FieldType::is_relational) && !field.is_relational() {
                    warnings.push(ConfigWarning::MissingRelatedModel { model: model.clone(), field: field_name });
                } else if field.is_relational() && field.search_fields.is_empty() {
                    warnings.push(ConfigWarning::NoSearchFields { model: model.clone(), field: field_name });
                }
            }
        }
        Ok(warnings)
    }
}
