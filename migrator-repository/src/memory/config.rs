use std::collections::HashMap;

use async_trait::async_trait;
use migrator_shared::types::{ConfigId, FieldMapping, MigrationConfiguration};
use tokio::sync::RwLock;

use crate::{ConfigRepository, RepositoryError};

#[derive(Default)]
pub struct InMemoryConfigRepository {
    configs: RwLock<HashMap<ConfigId, MigrationConfiguration>>,
}

impl InMemoryConfigRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository holding a single configuration.
    pub fn with_config(config: MigrationConfiguration) -> Self {
        let mut configs = HashMap::new();
        configs.insert(config.id, config);
        Self {
            configs: RwLock::new(configs),
        }
    }

    pub async fn insert(&self, config: MigrationConfiguration) {
        self.configs.write().await.insert(config.id, config);
    }
}

#[async_trait]
impl ConfigRepository for InMemoryConfigRepository {
    async fn load(&self, config_id: ConfigId) -> Result<MigrationConfiguration, RepositoryError> {
        self.configs
            .read()
            .await
            .get(&config_id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found(format!("migration configuration {config_id}")))
    }

    async fn save_field_metadata(&self, field: &FieldMapping) -> Result<(), RepositoryError> {
        let mut configs = self.configs.write().await;
        let stored = configs
            .values_mut()
            .flat_map(|c| c.model_mappings.iter_mut())
            .flat_map(|m| m.field_mappings.iter_mut())
            .find(|f| f.id == field.id)
            .ok_or_else(|| RepositoryError::not_found(format!("field mapping {}", field.id)))?;

        stored.field_type = field.field_type.clone();
        stored.related_model = field.related_model.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migrator_shared::types::{ConnectionParams, FieldType, ModelMapping};

    fn config() -> MigrationConfiguration {
        MigrationConfiguration {
            id: 1,
            name: "partners".to_string(),
            source: ConnectionParams {
                url: "http://source".to_string(),
                database: "src".to_string(),
                username: "admin".to_string(),
                password: "admin".to_string(),
            },
            model_mappings: vec![ModelMapping {
                id: 1,
                source_model: "res.partner".to_string(),
                destination_model: "partner.core".to_string(),
                field_mappings: vec![FieldMapping::scalar(7, "country_id", "country_id")],
            }],
        }
    }

    #[tokio::test]
    async fn test_load_unknown_configuration() {
        let repo = InMemoryConfigRepository::new();
        assert!(matches!(repo.load(9).await.unwrap_err(), RepositoryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_save_field_metadata() {
        let repo = InMemoryConfigRepository::with_config(config());
        let mut field = FieldMapping::scalar(7, "country_id", "country_id");
        field.field_type = Some(FieldType::Many2one);
        field.related_model = Some("res.country".to_string());

        repo.save_field_metadata(&field).await.unwrap();

        let stored = &repo.load(1).await.unwrap().model_mappings[0].field_mappings[0];
        assert!(stored.is_relational());
        assert_eq!(stored.field_type, Some(FieldType::Many2one));
    }
}
