use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use migrator_shared::types::{ConfigId, IdMapping, MappingKey, RecordId};
use tokio::sync::RwLock;

use crate::{IdMappingRepository, RepositoryError};

/// Id mappings kept in a map keyed like the Postgres unique constraint.
#[derive(Default)]
pub struct InMemoryIdMappingRepository {
    rows: RwLock<BTreeMap<MappingKey, IdMapping>>,
    fail_lookups: AtomicBool,
    fail_clear: AtomicBool,
}

impl InMemoryIdMappingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every `lookup` fail until switched off again.
    pub fn set_fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    /// Makes every `clear_all` fail until switched off again.
    pub fn set_fail_clear(&self, fail: bool) {
        self.fail_clear.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of all rows in key order.
    pub async fn all(&self) -> Vec<IdMapping> {
        self.rows.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl IdMappingRepository for InMemoryIdMappingRepository {
    async fn lookup(
        &self,
        config_id: ConfigId,
        model_name: &str,
        source_id: RecordId,
    ) -> Result<Option<RecordId>, RepositoryError> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        let key = MappingKey::new(config_id, model_name, source_id);
        Ok(self.rows.read().await.get(&key).map(|m| m.dest_id))
    }

    async fn insert(&self, mapping: &IdMapping) -> Result<(), RepositoryError> {
        let mut rows = self.rows.write().await;
        let key = mapping.key();
        if rows.contains_key(&key) {
            return Err(RepositoryError::DuplicateKey {
                config_id: key.config_id,
                model_name: key.model_name,
                source_id: key.source_id,
            });
        }
        rows.insert(key, mapping.clone());
        Ok(())
    }

    async fn clear_all(&self, config_id: ConfigId) -> Result<u64, RepositoryError> {
        if self.fail_clear.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|key, _| key.config_id != config_id);
        Ok((before - rows.len()) as u64)
    }

    async fn count(&self, config_id: ConfigId) -> Result<u64, RepositoryError> {
        let rows = self.rows.read().await;
        Ok(rows.keys().filter(|k| k.config_id == config_id).count() as u64)
    }
}
