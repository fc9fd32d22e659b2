//! This module defines the `RecordLoader` responsible for committing
//! transformed records to the destination store and recording the outcome.
use std::sync::Arc;

use migrator_repository::{IdMappingRepository, MigrationLogRepository, RepositoryError};
use migrator_shared::types::{ConfigId, IdMapping, MigrationLogEntry, Record, RecordId};
use object_rpc::ObjectStore;
use tracing::{debug, warn};

use crate::errors::RecordError;

/// `RecordLoader` creates destination records and keeps the id mapping and
/// the failure log in step with what was written.
pub struct RecordLoader {
    config_id: ConfigId,
    migration_name: String,
    destination: Arc<dyn ObjectStore>,
    mappings: Arc<dyn IdMappingRepository>,
    logs: Arc<dyn MigrationLogRepository>,
}

impl RecordLoader {
    /// Creates a new `RecordLoader`.
    ///
    /// # Arguments
    ///
    /// * `config_id` - Configuration whose id mapping receives the new rows
    /// * `migration_name` - Name written into failure log entries
    /// * `destination` - Store the records are created in
    /// * `mappings` - Id mapping repository
    /// * `logs` - Failure log repository
    pub fn new(
        config_id: ConfigId,
        migration_name: impl Into<String>,
        destination: Arc<dyn ObjectStore>,
        mappings: Arc<dyn IdMappingRepository>,
        logs: Arc<dyn MigrationLogRepository>,
    ) -> Self {
        Self {
            config_id,
            migration_name: migration_name.into(),
            destination,
            mappings,
            logs,
        }
    }

    /// Creates `values` in `model` and maps `source_id` to the new record.
    ///
    /// A mapping that already exists for the source record is logged and
    /// left alone; the record still counts as committed.
    ///
    /// # Returns
    ///
    /// * `Ok(dest_id)` - Id of the created destination record
    /// * `Err(RecordError::Commit)` - If the destination rejected the record
    /// * `Err(RecordError::MappingStore)` - If the mapping row could not be written
    pub async fn load(&self, model: &str, source_id: RecordId, values: &Record) -> Result<RecordId, RecordError> {
        let dest_id = self
            .destination
            .create(model, values)
            .await
            .map_err(|e| RecordError::commit(model, e))?;

        match self
            .mappings
            .insert(&IdMapping::new(self.config_id, model, source_id, dest_id))
            .await
        {
            Ok(()) => debug!(model, source_id, dest_id, "record committed"),
            Err(RepositoryError::DuplicateKey { .. }) => {
                warn!(model, source_id, dest_id, "id mapping already present, keeping the existing row");
            }
            Err(e) => return Err(e.into()),
        }
        Ok(dest_id)
    }

    /// Appends a `failed` entry to the failure log and returns it.
    ///
    /// A log that cannot be written is reported through tracing only, so the
    /// entry still reaches the run report.
    pub async fn log_failure(&self, model: &str, message: impl Into<String>) -> MigrationLogEntry {
        let entry = MigrationLogEntry::failed(&self.migration_name, model, message);
        if let Err(e) = self.logs.append(&entry).await {
            warn!(model, error = %e, "failed to append migration log entry");
        }
        entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migrator_repository::{InMemoryIdMappingRepository, InMemoryMigrationLogRepository};
    use migrator_shared::types::{Domain, MigrationStatus};
    use object_rpc::MockObjectStore;

    struct Fixture {
        destination: Arc<MockObjectStore>,
        mappings: Arc<InMemoryIdMappingRepository>,
        logs: Arc<InMemoryMigrationLogRepository>,
        loader: RecordLoader,
    }

    fn fixture() -> Fixture {
        let destination = Arc::new(MockObjectStore::new());
        let mappings = Arc::new(InMemoryIdMappingRepository::new());
        let logs = Arc::new(InMemoryMigrationLogRepository::new());
        let loader = RecordLoader::new(7, "partners", destination.clone(), mappings.clone(), logs.clone());
        Fixture {
            destination,
            mappings,
            logs,
            loader,
        }
    }

    #[tokio::test]
    async fn test_load_creates_record_and_mapping() {
        let f = fixture();

        let dest_id = f
            .loader
            .load("partner.core", 5, &Record::new().with("full_name", "Acme"))
            .await
            .unwrap();

        assert_eq!(f.destination.records("partner.core").len(), 1);
        assert_eq!(f.mappings.lookup(7, "partner.core", 5).await.unwrap(), Some(dest_id));
    }

    #[tokio::test]
    async fn test_existing_mapping_is_not_a_failure() {
        let f = fixture();
        f.mappings.insert(&IdMapping::new(7, "partner.core", 5, 100)).await.unwrap();

        let dest_id = f
            .loader
            .load("partner.core", 5, &Record::new().with("full_name", "Acme"))
            .await
            .unwrap();

        assert_ne!(dest_id, 100);
        assert_eq!(f.mappings.lookup(7, "partner.core", 5).await.unwrap(), Some(100));
    }

    #[tokio::test]
    async fn test_commit_failure() {
        let f = fixture();
        f.destination
            .fail_creates_matching("partner.core", Domain::eq("full_name", "Broken"), "missing required field");

        let err = f
            .loader
            .load("partner.core", 5, &Record::new().with("full_name", "Broken"))
            .await
            .unwrap_err();

        assert!(matches!(err, RecordError::Commit { .. }));
        assert_eq!(f.mappings.count(7).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_log_failure_survives_log_errors() {
        let f = fixture();

        let entry = f.loader.log_failure("partner.core", "first").await;
        assert_eq!(entry.status, MigrationStatus::Failed);
        assert_eq!(f.logs.list("partners").await.unwrap().len(), 1);

        f.logs.set_fail_appends(true);
        let entry = f.loader.log_failure("partner.core", "second").await;
        assert_eq!(entry.message, "second");
        assert_eq!(f.logs.len().await, 1);
    }
}
