use async_trait::async_trait;
use migrator_shared::types::MigrationLogEntry;

use crate::errors::RepositoryError;

/// Append-only log of per-record migration outcomes.
#[async_trait]
pub trait MigrationLogRepository: Send + Sync {
    async fn append(&self, entry: &MigrationLogEntry) -> Result<(), RepositoryError>;

    /// Entries of a migration, oldest first.
    async fn list(&self, migration_name: &str) -> Result<Vec<MigrationLogEntry>, RepositoryError>;
}
