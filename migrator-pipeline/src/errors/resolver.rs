//! Errors raised while resolving a relational field value.
use migrator_repository::RepositoryError;
use migrator_shared::types::RecordId;
use object_rpc::RpcError;
use thiserror::Error;

/// A relation could not be resolved and the containing record must fail.
///
/// Unresolved-but-acceptable outcomes (nothing found, duplicates skipped)
/// are not errors, see [`crate::Resolution`].
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("{matches} records of {model} match source id {source_id}")]
    DuplicateMatch {
        model: String,
        source_id: RecordId,
        matches: usize,
    },

    #[error("Mapping store error: {0}")]
    MappingStore(#[from] RepositoryError),

    /// A store became unreachable while resolving. Fatal for the run.
    #[error("Lost connection to {store} store on {model}: {source}")]
    Connection {
        store: &'static str,
        model: String,
        #[source]
        source: RpcError,
    },

    /// The destination store failed while searching or creating a related record.
    #[error("Destination error on {model}: {source}")]
    Destination {
        model: String,
        #[source]
        source: RpcError,
    },
}

impl ResolveError {
    /// Wraps a destination failure, keeping connection-class errors apart.
    pub fn destination(model: &str, source: RpcError) -> Self {
        if source.is_connection() {
            return Self::connection("destination", model, source);
        }
        Self::Destination {
            model: model.to_string(),
            source,
        }
    }

    pub fn connection(store: &'static str, model: &str, source: RpcError) -> Self {
        Self::Connection {
            store,
            model: model.to_string(),
            source,
        }
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}
