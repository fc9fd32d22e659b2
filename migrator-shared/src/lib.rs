//! # Migrator Shared
//! This crate defines shared data structures and types used across the record
//! migrator ecosystem.
//! It includes the dynamic field value model, search domains, migration
//! configuration entities, id mappings, failure log entries and run reports.
pub mod types;
