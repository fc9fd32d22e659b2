use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ConfigId, MigrationLogEntry};

/// Per model pair counters of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub source_model: String,
    pub destination_model: String,
    pub fetched: usize,
    pub migrated: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ModelSummary {
    pub fn new(source_model: &str, destination_model: &str) -> Self {
        Self {
            source_model: source_model.to_string(),
            destination_model: destination_model.to_string(),
            ..Default::default()
        }
    }
}

/// Outcome of a migration run, suitable for a user notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub config_id: ConfigId,
    pub migration_name: String,
    /// Primary records committed, i.e. id mapping rows created for top-level records.
    pub migrated: usize,
    /// Related records created while resolving relations.
    pub related_created: usize,
    /// Records dropped because a relation could not be resolved.
    pub skipped: usize,
    pub failures: Vec<MigrationLogEntry>,
    pub models: Vec<ModelSummary>,
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunReport {
    pub fn new(config_id: ConfigId, migration_name: &str) -> Self {
        Self {
            config_id,
            migration_name: migration_name.to_string(),
            migrated: 0,
            related_created: 0,
            skipped: 0,
            failures: Vec::new(),
            models: Vec::new(),
            cancelled: false,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = if self.cancelled { "cancelled" } else { "completed" };
        writeln!(
            f,
            "Migration '{}' {}: {} records migrated, {} related records created, {} skipped, {} failed",
            self.migration_name,
            outcome,
            self.migrated,
            self.related_created,
            self.skipped,
            self.failed()
        )?;
        for model in &self.models {
            writeln!(
                f,
                "  {} -> {}: fetched {}, migrated {}, skipped {}, failed {}",
                model.source_model, model.destination_model, model.fetched, model.migrated, model.skipped, model.failed
            )?;
        }
        for failure in &self.failures {
            writeln!(f, "  [{}] {}: {}", failure.status, failure.model_name, failure.message)?;
        }
        Ok(())
    }
}
