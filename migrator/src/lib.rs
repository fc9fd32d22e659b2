//! Migrator Library
//!
//! Configuration loading, dependency wiring and the two commands of the
//! migrator binary: running a migration and importing the source catalog.

pub mod commands;
pub mod config;
pub mod errors;

pub use commands::{migrate, sync_catalog};
pub use config::{Command, Dependencies, Settings};
pub use errors::MigratorError;
