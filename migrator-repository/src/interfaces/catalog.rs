use async_trait::async_trait;
use migrator_shared::types::{FieldMeta, ModelInfo};

use crate::errors::RepositoryError;

/// Local copy of the source store's model and field catalog.
///
/// Entries are only ever added: saving a model or field that is already
/// known leaves the stored entry untouched.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Stores the models not yet known and returns how many were added.
    async fn save_models(&self, models: &[ModelInfo]) -> Result<usize, RepositoryError>;

    /// Stores the fields of `model` not yet known and returns how many were added.
    async fn save_fields(&self, model: &str, fields: &[FieldMeta]) -> Result<usize, RepositoryError>;

    /// Known fields of `model`, by name.
    async fn fields_for(&self, model: &str) -> Result<Vec<FieldMeta>, RepositoryError>;
}
