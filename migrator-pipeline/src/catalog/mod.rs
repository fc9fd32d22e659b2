//! Import of the source store's catalog.
//!
//! Copies the source model list and the field metadata of every mapped
//! source model into the catalog repository, then recomputes the derived
//! attributes of each field mapping from that metadata.
use std::collections::BTreeSet;
use std::sync::Arc;

use migrator_repository::{CatalogRepository, ConfigRepository};
use migrator_shared::types::ConfigId;
use object_rpc::ObjectStore;
use tracing::{info, instrument, warn};

use crate::errors::SyncError;

/// Counters of a catalog synchronisation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub models_created: usize,
    pub fields_created: usize,
    /// Field mappings whose derived attributes changed.
    pub mappings_updated: usize,
}

pub struct CatalogSynchronizer {
    source: Arc<dyn ObjectStore>,
    catalog: Arc<dyn CatalogRepository>,
    configs: Arc<dyn ConfigRepository>,
}

impl CatalogSynchronizer {
    pub fn new(
        source: Arc<dyn ObjectStore>,
        catalog: Arc<dyn CatalogRepository>,
        configs: Arc<dyn ConfigRepository>,
    ) -> Self {
        Self {
            source,
            catalog,
            configs,
        }
    }

    /// Synchronises the catalog for the source models used by `config_id`.
    ///
    /// The caller must have authenticated the source store.
    #[instrument(skip(self))]
    pub async fn sync(&self, config_id: ConfigId) -> Result<SyncReport, SyncError> {
        let config = self.configs.load(config_id).await?;
        let mut report = SyncReport::default();

        let models = self.source.list_models().await?;
        report.models_created = self.catalog.save_models(&models).await?;

        let source_models: BTreeSet<&str> = config
            .model_mappings
            .iter()
            .map(|m| m.source_model.as_str())
            .collect();
        for model in source_models {
            let fields = self.source.list_fields(model).await?;
            report.fields_created += self.catalog.save_fields(model, &fields).await?;
        }

        for mapping in &config.model_mappings {
            let fields = self.catalog.fields_for(&mapping.source_model).await?;
            for field in &mapping.field_mappings {
                let Some(source_field) = field.source_field.as_deref() else {
                    continue;
                };
                let meta = fields.iter().find(|f| f.name == source_field);
                if meta.is_none() {
                    warn!(model = %mapping.source_model, field = source_field, "source field not found in catalog");
                }

                let mut refreshed = field.clone();
                refreshed.refresh_metadata(meta);
                if refreshed != *field {
                    self.configs.save_field_metadata(&refreshed).await?;
                    report.mappings_updated += 1;
                }
            }
        }

        info!(
            models_created = report.models_created,
            fields_created = report.fields_created,
            mappings_updated = report.mappings_updated,
            "Catalog synchronised"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migrator_repository::{InMemoryCatalogRepository, InMemoryConfigRepository};
    use migrator_shared::types::{
        ConnectionParams, FieldMapping, FieldMeta, FieldType, MigrationConfiguration, ModelMapping,
    };
    use object_rpc::MockObjectStore;

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
                field_mappings: vec![
                    FieldMapping::scalar(1, "name", "full_name"),
                    FieldMapping::scalar(2, "country_id", "nation"),
                ],
            }],
        }
    }

    #[tokio::test]
    async fn test_sync_imports_catalog_and_refreshes_mappings() {
        let source = Arc::new(
            MockObjectStore::new()
                .with_fields(
                    "res.partner",
                    vec![
                        FieldMeta::new("name", FieldType::Char, None),
                        FieldMeta::new("country_id", FieldType::Many2one, Some("res.country")),
                    ],
                )
                .with_fields("res.country", vec![FieldMeta::new("code", FieldType::Char, None)]),
        );
        let catalog = Arc::new(InMemoryCatalogRepository::new());
        let configs = Arc::new(InMemoryConfigRepository::with_config(config()));
        let sync = CatalogSynchronizer::new(source.clone(), catalog.clone(), configs.clone());

        let report = sync.sync(1).await.unwrap();

        assert_eq!(report.models_created, 2);
        assert_eq!(report.fields_created, 2);
        assert_eq!(report.mappings_updated, 2);
        assert_eq!(source.calls().list_fields, 1);

        let fields = &configs.load(1).await.unwrap().model_mappings[0].field_mappings;
        assert_eq!(fields[0].field_type, Some(FieldType::Char));
        assert!(!fields[0].is_relational());
        assert!(fields[1].is_relational());
        assert_eq!(fields[1].related_model.as_deref(), Some("res.country"));

        let again = sync.sync(1).await.unwrap();
        assert_eq!(again, SyncReport::default());
    }
}
