//! PostgreSQL implementation of the configuration repository.
use std::str::FromStr;

use async_trait::async_trait;
use migrator_shared::types::{
    ConfigId, ConnectionParams, DuplicatePolicy, FieldMapping, FieldType, MigrationConfiguration, ModelMapping,
    NotFoundPolicy,
};
use sqlx::Row;
use sqlx::postgres::PgRow;

use crate::{ConfigRepository, RepositoryError};

/// Configurations stored across `migration_config`, `migration_model` and
/// `migration_field`. Configured order is ascending row id.
pub struct PostgresConfigRepository {
    pool: sqlx::PgPool,
}

impl PostgresConfigRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    async fn load_fields(&self, model_mapping_id: i64) -> Result<Vec<FieldMapping>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, source_field, destination_field, field_type, related_model,
                   search_fields, not_found_policy, duplicate_policy
            FROM migration_field
            WHERE model_mapping_id = $1
            ORDER BY id
            "#,
        )
        .bind(model_mapping_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(field_from_row).collect()
    }
}

fn parse<T>(value: &str) -> Result<T, RepositoryError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| RepositoryError::invalid_data(e.to_string()))
}

fn field_from_row(row: &PgRow) -> Result<FieldMapping, RepositoryError> {
    let field_type: Option<String> = row.try_get("field_type")?;
    let not_found: String = row.try_get("not_found_policy")?;
    let duplicate: String = row.try_get("duplicate_policy")?;

    Ok(FieldMapping {
        id: row.try_get("id")?,
        source_field: row.try_get("source_field")?,
        destination_field: row.try_get("destination_field")?,
        field_type: field_type.filter(|t| !t.is_empty()).map(FieldType::from),
        related_model: row.try_get("related_model")?,
        search_fields: row.try_get("search_fields")?,
        not_found: parse::<NotFoundPolicy>(&not_found)?,
        duplicate: parse::<DuplicatePolicy>(&duplicate)?,
    })
}

#[async_trait]
impl ConfigRepository for PostgresConfigRepository {
    async fn load(&self, config_id: ConfigId) -> Result<MigrationConfiguration, RepositoryError> {
        let config = sqlx::query(
            "SELECT id, name, source_url, source_db, source_username, source_password FROM migration_config WHERE id = $1",
        )
        .bind(config_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::not_found(format!("migration configuration {config_id}")))?;

        let models = sqlx::query(
            "SELECT id, source_model, destination_model FROM migration_model WHERE config_id = $1 ORDER BY id",
        )
        .bind(config_id)
        .fetch_all(&self.pool)
        .await?;

        let mut model_mappings = Vec::with_capacity(models.len());
        for row in &models {
            let id: i64 = row.try_get("id")?;
            model_mappings.push(ModelMapping {
                id,
                source_model: row.try_get("source_model")?,
                destination_model: row.try_get("destination_model")?,
                field_mappings: self.load_fields(id).await?,
            });
        }

        Ok(MigrationConfiguration {
            id: config.try_get("id")?,
            name: config.try_get("name")?,
            source: ConnectionParams {
                url: config.try_get("source_url")?,
                database: config.try_get("source_db")?,
                username: config.try_get("source_username")?,
                password: config.try_get("source_password")?,
            },
            model_mappings,
        })
    }

    async fn save_field_metadata(&self, field: &FieldMapping) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE migration_field SET field_type = $2, related_model = $3 WHERE id = $1")
            .bind(field.id)
            .bind(field.field_type.as_ref().map(|t| t.as_str().to_string()))
            .bind(&field.related_model)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found(format!("field mapping {}", field.id)));
        }
        Ok(())
    }
}
