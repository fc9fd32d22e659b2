//! Errors isolated to a single source record.
use migrator_repository::RepositoryError;
use object_rpc::RpcError;
use thiserror::Error;

use super::ResolveError;

/// Failure of one record. Logged and counted; the run carries on unless
/// [`RecordError::is_connection`] holds.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Source record has no id")]
    MissingId,

    #[error("Field '{field}': {source}")]
    Resolve {
        field: String,
        #[source]
        source: ResolveError,
    },

    /// The destination rejected the new record.
    #[error("Commit to {model} failed: {source}")]
    Commit {
        model: String,
        #[source]
        source: RpcError,
    },

    #[error("Mapping store error: {0}")]
    MappingStore(#[from] RepositoryError),
}

impl RecordError {
    pub fn resolve(field: &str, source: ResolveError) -> Self {
        Self::Resolve {
            field: field.to_string(),
            source,
        }
    }

    pub fn commit(model: &str, source: RpcError) -> Self {
        Self::Commit {
            model: model.to_string(),
            source,
        }
    }

    /// True when a store became unreachable, as opposed to rejecting this
    /// one record.
    pub fn is_connection(&self) -> bool {
        match self {
            Self::Resolve { source, .. } => source.is_connection(),
            Self::Commit { source, .. } => source.is_connection(),
            Self::MissingId | Self::MappingStore(_) => false,
        }
    }
}
