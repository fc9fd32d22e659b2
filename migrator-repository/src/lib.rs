//! # Migrator Repository
//! Persistence for the migrator: the source-to-destination id mapping table,
//! the failure log, migration configurations and the imported source catalog.
//! Each concern is a trait with a PostgreSQL implementation and an in-memory
//! one used by tests and embedders.
pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod postgres;

pub use errors::RepositoryError;
pub use interfaces::{CatalogRepository, ConfigRepository, IdMappingRepository, MigrationLogRepository};
pub use memory::{
    InMemoryCatalogRepository, InMemoryConfigRepository, InMemoryIdMappingRepository,
    InMemoryMigrationLogRepository,
};
pub use postgres::{
    ConfigurationLock, PostgresCatalogRepository, PostgresConfigRepository, PostgresIdMappingRepository,
    PostgresMigrationLogRepository, run_migrations,
};
