//! Error types for the migrator repository.
mod repository;

pub use repository::RepositoryError;
