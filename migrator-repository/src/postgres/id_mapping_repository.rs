//! PostgreSQL implementation of the id mapping repository.
use async_trait::async_trait;
use migrator_shared::types::{ConfigId, IdMapping, RecordId};
use sqlx::Row;

use super::is_unique_violation;
use crate::{IdMappingRepository, RepositoryError};

/// Id mappings stored in `migration_id_mapping`.
///
/// The table's unique constraint on `(config_id, model_name, source_id)`
/// enforces one destination per source record.
pub struct PostgresIdMappingRepository {
    pool: sqlx::PgPool,
}

impl PostgresIdMappingRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdMappingRepository for PostgresIdMappingRepository {
    async fn lookup(
        &self,
        config_id: ConfigId,
        model_name: &str,
        source_id: RecordId,
    ) -> Result<Option<RecordId>, RepositoryError> {
        let row = sqlx::query(
            "SELECT dest_id FROM migration_id_mapping WHERE config_id = $1 AND model_name = $2 AND source_id = $3",
        )
        .bind(config_id)
        .bind(model_name)
        .bind(source_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.try_get::<i64, _>("dest_id"))
            .transpose()
            .map_err(RepositoryError::from)
    }

    async fn insert(&self, mapping: &IdMapping) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            INSERT INTO migration_id_mapping (config_id, model_name, source_id, dest_id, external_id, label)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(mapping.config_id)
        .bind(&mapping.model_name)
        .bind(mapping.source_id)
        .bind(mapping.dest_id)
        .bind(&mapping.external_id)
        .bind(&mapping.label)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(RepositoryError::DuplicateKey {
                config_id: mapping.config_id,
                model_name: mapping.model_name.clone(),
                source_id: mapping.source_id,
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn clear_all(&self, config_id: ConfigId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM migration_id_mapping WHERE config_id = $1")
            .bind(config_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn count(&self, config_id: ConfigId) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM migration_id_mapping WHERE config_id = $1")
            .bind(config_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}
