//! Errors that abort a whole migration run.
use migrator_repository::RepositoryError;
use migrator_shared::types::ConfigError;
use object_rpc::RpcError;
use thiserror::Error;

use super::RecordError;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    /// Authentication against the source or destination store failed.
    #[error("Cannot connect to {store} store: {source}")]
    Connection {
        store: &'static str,
        #[source]
        source: RpcError,
    },

    #[error("Failed to clear previous id mappings: {0}")]
    ClearMappings(#[source] RepositoryError),

    /// The source became unreachable while fetching a model.
    #[error("Failed to fetch {model}: {source}")]
    Fetch {
        model: String,
        #[source]
        source: RpcError,
    },

    /// A store became unreachable while migrating the records of a model.
    #[error("Connection lost while migrating {model}: {source}")]
    ConnectionLost {
        model: String,
        #[source]
        source: RecordError,
    },
}

impl OrchestratorError {
    pub fn connection(store: &'static str, source: RpcError) -> Self {
        Self::Connection { store, source }
    }
}
