//! In-memory implementations of the repository traits.
//!
//! Used by the pipeline tests and by embedders that do not need the
//! mapping to outlive the process. The mapping and log repositories can be
//! told to fail, to exercise error paths.
mod catalog;
mod config;
mod id_mapping;
mod migration_log;

pub use catalog::InMemoryCatalogRepository;
pub use config::InMemoryConfigRepository;
pub use id_mapping::InMemoryIdMappingRepository;
pub use migration_log::InMemoryMigrationLogRepository;
