//! Error types for the migrator application.
//! Consolidates the errors of the pipeline, the repositories and the
//! remote stores into one type returned by `main`.
use migrator_pipeline::{OrchestratorError, SyncError};
use migrator_repository::RepositoryError;
use object_rpc::RpcError;

#[derive(Debug, thiserror::Error)]
pub enum MigratorError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("Remote store error: {0}")]
    Rpc(#[from] RpcError),
    #[error("Orchestrator error: {0}")]
    Orchestrator(#[from] OrchestratorError),
    #[error("Catalog error: {0}")]
    Sync(#[from] SyncError),
    #[error("Tracing error: {0}")]
    Tracing(String),
}

impl MigratorError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
