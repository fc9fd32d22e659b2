use async_trait::async_trait;
use migrator_shared::types::{FieldMeta, FieldType, ModelInfo};
use sqlx::Row;

use crate::{CatalogRepository, RepositoryError};

/// Source catalog stored in `origin_model` and `origin_field`.
pub struct PostgresCatalogRepository {
    pool: sqlx::PgPool,
}

impl PostgresCatalogRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogRepository for PostgresCatalogRepository {
    async fn save_models(&self, models: &[ModelInfo]) -> Result<usize, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut created = 0;
        for model in models {
            let result = sqlx::query("INSERT INTO origin_model (model, name) VALUES ($1, $2) ON CONFLICT (model) DO NOTHING")
                .bind(&model.model)
                .bind(&model.name)
                .execute(&mut *tx)
                .await?;
            created += result.rows_affected() as usize;
        }
        tx.commit().await?;
        Ok(created)
    }

    async fn save_fields(&self, model: &str, fields: &[FieldMeta]) -> Result<usize, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut created = 0;
        for field in fields {
            let result = sqlx::query(
                r#"
                INSERT INTO origin_field (model, name, field_type, relation)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (model, name) DO NOTHING
                "#,
            )
            .bind(model)
            .bind(&field.name)
            .bind(field.field_type.as_str())
            .bind(&field.relation)
            .execute(&mut *tx)
            .await?;
            created += result.rows_affected() as usize;
        }
        tx.commit().await?;
        Ok(created)
    }

    async fn fields_for(&self, model: &str) -> Result<Vec<FieldMeta>, RepositoryError> {
        let rows = sqlx::query("SELECT name, field_type, relation FROM origin_field WHERE model = $1 ORDER BY name")
            .bind(model)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| -> Result<FieldMeta, RepositoryError> {
                let name: String = row.try_get("name")?;
                let field_type: String = row.try_get("field_type")?;
                let relation: Option<String> = row.try_get("relation")?;
                Ok(FieldMeta::new(name, FieldType::from(field_type), relation.as_deref()))
            })
            .collect()
    }
}
