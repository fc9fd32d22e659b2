//! # Migrator Pipeline
//! The migration engine: fetches records from a source object store,
//! resolves their relational fields against a destination store through a
//! persistent id mapping, and commits them one by one.
//!
//! The pipeline is split into a fetcher, a processor (which owns the
//! relation resolver), a loader and the orchestrator driving them. The
//! catalog synchroniser keeps the local copy of the source schema and the
//! derived field mapping attributes up to date.
pub mod catalog;
pub mod errors;
pub mod fetcher;
pub mod loader;
pub mod orchestrator;
pub mod processor;
pub mod resolver;

pub use catalog::{CatalogSynchronizer, SyncReport};
pub use errors::{OrchestratorError, RecordError, ResolveError, SyncError};
pub use fetcher::RecordFetcher;
pub use loader::RecordLoader;
pub use orchestrator::{CancellationFlag, Orchestrator, RunState};
pub use processor::{Processed, RecordProcessor};
pub use resolver::{RelationResolver, Resolution};
