//! Error types for the migration pipeline.
mod orchestrator;
mod record;
mod resolver;
mod sync;

pub use orchestrator::OrchestratorError;
pub use record::RecordError;
pub use resolver::ResolveError;
pub use sync::SyncError;
