use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use migrator_shared::types::MigrationLogEntry;
use tokio::sync::RwLock;

use crate::{MigrationLogRepository, RepositoryError};

#[derive(Default)]
pub struct InMemoryMigrationLogRepository {
    entries: RwLock<Vec<MigrationLogEntry>>,
    fail_appends: AtomicBool,
}

impl InMemoryMigrationLogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl MigrationLogRepository for InMemoryMigrationLogRepository {
    async fn append(&self, entry: &MigrationLogEntry) -> Result<(), RepositoryError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        self.entries.write().await.push(entry.clone());
        Ok(())
    }

    async fn list(&self, migration_name: &str) -> Result<Vec<MigrationLogEntry>, RepositoryError> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .filter(|e| e.migration_name == migration_name)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_filters_by_migration_in_append_order() {
        let repo = InMemoryMigrationLogRepository::new();
        repo.append(&MigrationLogEntry::failed("m1", "res.partner", "first")).await.unwrap();
        repo.append(&MigrationLogEntry::failed("m2", "res.partner", "other")).await.unwrap();
        repo.append(&MigrationLogEntry::failed("m1", "res.partner", "second")).await.unwrap();

        let entries = repo.list("m1").await.unwrap();
        let messages: Vec<&str> = entries.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second"]);
        assert_eq!(repo.len().await, 3);
    }
}
