use serde::{Deserialize, Serialize};

use super::{ConfigId, RecordId};

/// Key of the mapping table: one row per configuration, model and source record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MappingKey {
    pub config_id: ConfigId,
    pub model_name: String,
    pub source_id: RecordId,
}

impl MappingKey {
    pub fn new(config_id: ConfigId, model_name: impl Into<String>, source_id: RecordId) -> Self {
        Self {
            config_id,
            model_name: model_name.into(),
            source_id,
        }
    }
}

/// Records that a source record now lives in the destination under `dest_id`.
///
/// Written once per resolved or migrated entity and never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdMapping {
    pub config_id: ConfigId,
    pub model_name: String,
    pub source_id: RecordId,
    pub dest_id: RecordId,
    /// External identifier of the source record, when it has one.
    pub external_id: Option<String>,
    pub label: String,
}

impl IdMapping {
    pub fn new(config_id: ConfigId, model_name: impl Into<String>, source_id: RecordId, dest_id: RecordId) -> Self {
        let model_name = model_name.into();
        let label = format!("{model_name}: {source_id} → {dest_id}");
        Self {
            config_id,
            model_name,
            source_id,
            dest_id,
            external_id: None,
            label,
        }
    }

    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    pub fn key(&self) -> MappingKey {
        MappingKey::new(self.config_id, self.model_name.clone(), self.source_id)
    }
}
