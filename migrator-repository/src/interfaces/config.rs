use async_trait::async_trait;
use migrator_shared::types::{ConfigId, FieldMapping, MigrationConfiguration};

use crate::errors::RepositoryError;

/// Read access to migration configurations.
#[async_trait]
pub trait ConfigRepository: Send + Sync {
    /// Loads a configuration with its model and field mappings.
    ///
    /// Model mappings and field mappings come back in configured order.
    ///
    /// # Returns
    ///
    /// * `Ok(MigrationConfiguration)` - The full configuration
    /// * `Err(RepositoryError::NotFound)` - If no configuration has this id
    async fn load(&self, config_id: ConfigId) -> Result<MigrationConfiguration, RepositoryError>;

    /// Persists the derived attributes of a field mapping (field type and
    /// related model) after they were recomputed from source metadata.
    async fn save_field_metadata(&self, field: &FieldMapping) -> Result<(), RepositoryError>;
}
