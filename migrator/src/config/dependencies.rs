use std::sync::Arc;

use migrator_repository::{
    CatalogRepository, ConfigRepository, IdMappingRepository, MigrationLogRepository,
    PostgresCatalogRepository, PostgresConfigRepository, PostgresIdMappingRepository,
    PostgresMigrationLogRepository, run_migrations,
};
use object_rpc::{ObjectStore, StoreSource};
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::config::Settings;
use crate::errors::MigratorError;

/// `Dependencies` holds the storage and remote components shared by the
/// migrator's commands.
///
/// The source store is not part of it: its connection parameters belong to
/// the migration configuration and are only known once it has been loaded.
pub struct Dependencies {
    pub pool: sqlx::PgPool,
    pub mappings: Arc<dyn IdMappingRepository>,
    pub logs: Arc<dyn MigrationLogRepository>,
    pub configs: Arc<dyn ConfigRepository>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub destination: Arc<dyn ObjectStore>,
}

impl Dependencies {
    /// Connects to PostgreSQL, applies the schema and wires the repositories
    /// and the destination store client.
    ///
    /// # Arguments
    ///
    /// * `settings` - Settings read from the environment
    ///
    /// # Returns
    ///
    /// A `Result` which is `Ok(Self)` on successful initialization or a
    /// `MigratorError` if any dependency fails to initialize.
    pub async fn new(settings: &Settings) -> Result<Self, MigratorError> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.pg_max_connections)
            .connect(&settings.database_url)
            .await?;
        run_migrations(&pool).await?;
        info!(max_connections = settings.pg_max_connections, "database ready");

        let destination: Arc<dyn ObjectStore> =
            StoreSource::live(settings.destination.clone(), settings.rpc_timeout)
                .into_store()?
                .into();

        Ok(Self {
            mappings: Arc::new(PostgresIdMappingRepository::new(pool.clone())),
            logs: Arc::new(PostgresMigrationLogRepository::new(pool.clone())),
            configs: Arc::new(PostgresConfigRepository::new(pool.clone())),
            catalog: Arc::new(PostgresCatalogRepository::new(pool.clone())),
            destination,
            pool,
        })
    }
}
