use async_trait::async_trait;
use migrator_shared::types::{ConfigId, IdMapping, RecordId};

use crate::errors::RepositoryError;

/// Persistent source id to destination id mapping, scoped per configuration.
///
/// Holds at most one row per `(config_id, model_name, source_id)`. The model
/// name is the destination model the record was written to.
#[async_trait]
pub trait IdMappingRepository: Send + Sync {
    /// Looks up the destination id recorded for a source record.
    ///
    /// # Arguments
    ///
    /// * `config_id` - Configuration the mapping belongs to
    /// * `model_name` - Destination model name
    /// * `source_id` - Id of the record in the source store
    ///
    /// # Returns
    ///
    /// * `Ok(Some(dest_id))` - If a mapping exists
    /// * `Ok(None)` - If the source record has not been migrated
    /// * `Err(RepositoryError)` - If the store cannot be queried
    async fn lookup(
        &self,
        config_id: ConfigId,
        model_name: &str,
        source_id: RecordId,
    ) -> Result<Option<RecordId>, RepositoryError>;

    /// Records a new mapping.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the row was inserted
    /// * `Err(RepositoryError::DuplicateKey)` - If the key is already mapped
    /// * `Err(RepositoryError)` - On any other storage failure
    async fn insert(&self, mapping: &IdMapping) -> Result<(), RepositoryError>;

    /// Deletes every mapping of a configuration and returns how many rows went.
    async fn clear_all(&self, config_id: ConfigId) -> Result<u64, RepositoryError>;

    async fn count(&self, config_id: ConfigId) -> Result<u64, RepositoryError>;
}
