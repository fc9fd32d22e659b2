use async_trait::async_trait;
use chrono::{DateTime, Utc};
use migrator_shared::types::{MigrationLogEntry, MigrationStatus};
use sqlx::Row;

use crate::{MigrationLogRepository, RepositoryError};

pub struct PostgresMigrationLogRepository {
    pool: sqlx::PgPool,
}

impl PostgresMigrationLogRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MigrationLogRepository for PostgresMigrationLogRepository {
    async fn append(&self, entry: &MigrationLogEntry) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO migration_log (migration_name, model_name, status, message, logged_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&entry.migration_name)
        .bind(&entry.model_name)
        .bind(entry.status.as_str())
        .bind(&entry.message)
        .bind(entry.logged_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list(&self, migration_name: &str) -> Result<Vec<MigrationLogEntry>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT migration_name, model_name, status, message, logged_at FROM migration_log WHERE migration_name = $1 ORDER BY id",
        )
        .bind(migration_name)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<MigrationLogEntry, RepositoryError> {
                let status: String = row.try_get("status")?;
                let status = status
                    .parse::<MigrationStatus>()
                    .map_err(|e| RepositoryError::invalid_data(e.to_string()))?;
                Ok(MigrationLogEntry {
                    migration_name: row.try_get("migration_name")?,
                    model_name: row.try_get("model_name")?,
                    status,
                    message: row.try_get("message")?,
                    logged_at: row.try_get::<DateTime<Utc>, _>("logged_at")?,
                })
            })
            .collect()
    }
}
