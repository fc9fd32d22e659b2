mod catalog;
mod config;
mod domain;
mod id_mapping;
mod migration_log;
mod record;
mod report;
mod value;

pub use catalog::{FieldMeta, FieldType, ModelInfo};
pub use config::{
    ConfigError, ConfigWarning, ConnectionParams, DuplicatePolicy, FieldMapping, MigrationConfiguration,
    ModelMapping, NotFoundPolicy,
};
pub use domain::{Condition, Domain, Operator};
pub use id_mapping::{IdMapping, MappingKey};
pub use migration_log::{MigrationLogEntry, MigrationStatus};
pub use record::{ID_FIELD, Record};
pub use report::{ModelSummary, RunReport};
pub use value::FieldValue;

/// Identifier of a record inside one of the remote stores.
pub type RecordId = i64;

/// Identifier of a persisted migration configuration.
pub type ConfigId = i64;

/// Error returned when a textual enum representation cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
