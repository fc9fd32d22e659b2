//! Repository traits.
mod catalog;
mod config;
mod id_mapping;
mod migration_log;

pub use catalog::CatalogRepository;
pub use config::ConfigRepository;
pub use id_mapping::IdMappingRepository;
pub use migration_log::MigrationLogRepository;
