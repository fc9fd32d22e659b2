use migrator_repository::RepositoryError;
use object_rpc::RpcError;
use thiserror::Error;

/// Errors raised while importing the source catalog.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Remote error: {0}")]
    Remote(#[from] RpcError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}
