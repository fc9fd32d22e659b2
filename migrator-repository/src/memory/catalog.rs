use std::collections::BTreeMap;

use async_trait::async_trait;
use migrator_shared::types::{FieldMeta, ModelInfo};
use tokio::sync::RwLock;

use crate::{CatalogRepository, RepositoryError};

#[derive(Default)]
pub struct InMemoryCatalogRepository {
    models: RwLock<BTreeMap<String, ModelInfo>>,
    fields: RwLock<BTreeMap<(String, String), FieldMeta>>,
}

impl InMemoryCatalogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Known models ordered by technical name.
    pub async fn models(&self) -> Vec<ModelInfo> {
        self.models.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl CatalogRepository for InMemoryCatalogRepository {
    async fn save_models(&self, models: &[ModelInfo]) -> Result<usize, RepositoryError> {
        let mut stored = self.models.write().await;
        let mut created = 0;
        for model in models {
            if !stored.contains_key(&model.model) {
                stored.insert(model.model.clone(), model.clone());
                created += 1;
            }
        }
        Ok(created)
    }

    async fn save_fields(&self, model: &str, fields: &[FieldMeta]) -> Result<usize, RepositoryError> {
        let mut stored = self.fields.write().await;
        let mut created = 0;
        for field in fields {
            let key = (model.to_string(), field.name.clone());
            if !stored.contains_key(&key) {
                stored.insert(key, field.clone());
                created += 1;
            }
        }
        Ok(created)
    }

    async fn fields_for(&self, model: &str) -> Result<Vec<FieldMeta>, RepositoryError> {
        Ok(self
            .fields
            .read()
            .await
            .iter()
            .filter(|((m, _), _)| m == model)
            .map(|(_, field)| field.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migrator_shared::types::FieldType;

    #[tokio::test]
    async fn test_save_is_insert_if_absent() {
        let repo = InMemoryCatalogRepository::new();
        let partner = ModelInfo {
            model: "res.partner".to_string(),
            name: "Contact".to_string(),
        };

        assert_eq!(repo.save_models(&[partner.clone()]).await.unwrap(), 1);
        assert_eq!(repo.save_models(&[partner]).await.unwrap(), 0);

        let name = FieldMeta::new("name", FieldType::Char, None);
        let country = FieldMeta::new("country_id", FieldType::Many2one, Some("res.country"));
        assert_eq!(repo.save_fields("res.partner", &[name.clone(), country.clone()]).await.unwrap(), 2);
        assert_eq!(repo.save_fields("res.partner", &[name]).await.unwrap(), 0);

        let fields = repo.fields_for("res.partner").await.unwrap();
        assert_eq!(fields[0], country);
        assert!(repo.fields_for("res.users").await.unwrap().is_empty());
    }
}
