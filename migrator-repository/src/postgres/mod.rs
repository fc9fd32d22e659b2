//! PostgreSQL implementations of the repository traits.
//!
//! Queries are built at runtime with `sqlx::query` so the crate compiles
//! without a database. The schema lives in `migrations/` and is embedded
//! into the binary.
mod catalog_repository;
mod config_repository;
mod id_mapping_repository;
mod lock;
mod migration_log_repository;

pub use catalog_repository::PostgresCatalogRepository;
pub use config_repository::PostgresConfigRepository;
pub use id_mapping_repository::PostgresIdMappingRepository;
pub use lock::ConfigurationLock;
pub use migration_log_repository::PostgresMigrationLogRepository;

use crate::errors::RepositoryError;

/// Applies the embedded schema migrations.
pub async fn run_migrations(pool: &sqlx::PgPool) -> Result<(), RepositoryError> {
    sqlx::migrate!("./src/postgres/migrations").run(pool).await?;
    Ok(())
}

/// SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == UNIQUE_VIOLATION)
}
