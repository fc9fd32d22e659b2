use migrator_shared::types::{ConfigId, RecordId};
use thiserror::Error;

/// Errors raised by the repositories.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// An id mapping with the same `(config, model, source id)` already exists.
    #[error("Mapping already exists for {model_name} source id {source_id} in configuration {config_id}")]
    DuplicateKey {
        config_id: ConfigId,
        model_name: String,
        source_id: RecordId,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    /// A stored row could not be turned back into a domain value.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Another run holds the lock for this configuration.
    #[error("Configuration {0} is locked by another run")]
    Locked(ConfigId),
}

impl RepositoryError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }
}
