//! Orchestrator module for the migration run.
//!
//! Drives the fetcher, processor and loader over every model mapping of a
//! configuration, strictly sequentially, and collects the run report.
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use migrator_repository::{IdMappingRepository, MigrationLogRepository};
use migrator_shared::types::{MigrationConfiguration, ModelMapping, ModelSummary, Record, RunReport};
use object_rpc::ObjectStore;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

use crate::errors::{OrchestratorError, RecordError};
use crate::fetcher::RecordFetcher;
use crate::loader::RecordLoader;
use crate::processor::{Processed, RecordProcessor};
use crate::resolver::RelationResolver;

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    /// Both stores accepted the credentials.
    Connected,
    Fetching,
    TransformingRecords,
    Committing,
    Completed,
    /// The run aborted on a fatal error.
    Failed,
    Cancelled,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::NotStarted => "not_started",
            RunState::Connected => "connected",
            RunState::Fetching => "fetching",
            RunState::TransformingRecords => "transforming_records",
            RunState::Committing => "committing",
            RunState::Completed => "completed",
            RunState::Failed => "failed",
            RunState::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Shared flag asking a run to stop between records.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Coordinates one migration run for a configuration.
///
/// Records are processed one at a time in fetch order and model mappings in
/// configured order, so every id mapping insert is visible to the lookups
/// that follow it. A failing record is logged and skipped; only connection
/// failures and a failure to reset the id mapping abort the run.
pub struct Orchestrator {
    config: MigrationConfiguration,
    source: Arc<dyn ObjectStore>,
    destination: Arc<dyn ObjectStore>,
    mappings: Arc<dyn IdMappingRepository>,
    fetcher: RecordFetcher,
    processor: RecordProcessor,
    loader: RecordLoader,
    cancel: CancellationFlag,
    state: watch::Sender<RunState>,
}

impl Orchestrator {
    /// Creates an orchestrator wired to the given stores and repositories.
    ///
    /// # Arguments
    ///
    /// * `config` - The configuration to migrate
    /// * `source` - Store the records are read from
    /// * `destination` - Store the records are created in
    /// * `mappings` - Id mapping repository, cleared at the start of the run
    /// * `logs` - Failure log repository
    pub fn new(
        config: MigrationConfiguration,
        source: Arc<dyn ObjectStore>,
        destination: Arc<dyn ObjectStore>,
        mappings: Arc<dyn IdMappingRepository>,
        logs: Arc<dyn MigrationLogRepository>,
    ) -> Self {
        let resolver = RelationResolver::new(config.id, source.clone(), destination.clone(), mappings.clone());
        let loader = RecordLoader::new(config.id, config.name.clone(), destination.clone(), mappings.clone(), logs);
        let (state, _) = watch::channel(RunState::NotStarted);

        Self {
            fetcher: RecordFetcher::new(source.clone()),
            processor: RecordProcessor::new(Arc::new(resolver)),
            loader,
            config,
            source,
            destination,
            mappings,
            cancel: CancellationFlag::new(),
            state,
        }
    }

    /// Uses `cancel` to interrupt the run.
    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    pub fn state(&self) -> RunState {
        *self.state.borrow()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.state.subscribe()
    }

    fn set_state(&self, state: RunState) {
        self.state.send_replace(state);
    }

    fn fail(&self, err: OrchestratorError) -> OrchestratorError {
        error!(error = %err, "migration aborted");
        self.set_state(RunState::Failed);
        err
    }

    /// Runs the migration.
    ///
    /// # Returns
    ///
    /// * `Ok(RunReport)` - Completed or cancelled run, with per-record failures
    /// * `Err(OrchestratorError)` - If the run hit a fatal error
    #[instrument(skip(self), fields(config_id = self.config.id, migration = %self.config.name))]
    pub async fn run(&self) -> Result<RunReport, OrchestratorError> {
        info!(models = self.config.model_mappings.len(), "Starting migration");
        let mut report = RunReport::new(self.config.id, &self.config.name);

        let warnings = self.config.validate().map_err(|e| self.fail(e.into()))?;
        for warning in &warnings {
            warn!(%warning, "configuration warning");
        }

        self.source
            .authenticate()
            .await
            .map_err(|e| self.fail(OrchestratorError::connection("source", e)))?;
        self.destination
            .authenticate()
            .await
            .map_err(|e| self.fail(OrchestratorError::connection("destination", e)))?;
        self.set_state(RunState::Connected);

        let cleared = self
            .mappings
            .clear_all(self.config.id)
            .await
            .map_err(|e| self.fail(OrchestratorError::ClearMappings(e)))?;
        debug!(cleared, "previous id mappings cleared");

        for mapping in &self.config.model_mappings {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            let summary = self.migrate_model(mapping, &mut report).await?;
            report.models.push(summary);
            if report.cancelled {
                break;
            }
        }

        report.related_created = self.processor.resolver().related_created();
        report.finished_at = Some(Utc::now());
        if report.cancelled {
            warn!(migrated = report.migrated, "Migration cancelled");
            self.set_state(RunState::Cancelled);
        } else {
            info!(
                migrated = report.migrated,
                related_created = report.related_created,
                skipped = report.skipped,
                failed = report.failed(),
                "Migration completed"
            );
            self.set_state(RunState::Completed);
        }
        Ok(report)
    }

    #[instrument(skip_all, fields(source = %mapping.source_model, destination = %mapping.destination_model))]
    async fn migrate_model(
        &self,
        mapping: &ModelMapping,
        report: &mut RunReport,
    ) -> Result<ModelSummary, OrchestratorError> {
        let mut summary = ModelSummary::new(&mapping.source_model, &mapping.destination_model);

        self.set_state(RunState::Fetching);
        let records = match self.fetcher.fetch(mapping).await {
            Ok(records) => records,
            Err(e) if e.is_connection() => {
                return Err(self.fail(OrchestratorError::Fetch {
                    model: mapping.source_model.clone(),
                    source: e,
                }));
            }
            Err(e) => {
                let entry = self
                    .loader
                    .log_failure(&mapping.destination_model, format!("Failed to fetch {}: {e}", mapping.source_model))
                    .await;
                report.failures.push(entry);
                summary.failed += 1;
                return Ok(summary);
            }
        };
        summary.fetched = records.len();
        info!(count = records.len(), "Migrating records");

        for record in &records {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            match self.migrate_record(mapping, record).await {
                Ok(true) => {
                    summary.migrated += 1;
                    report.migrated += 1;
                }
                Ok(false) => {
                    summary.skipped += 1;
                    report.skipped += 1;
                }
                Err(e) if e.is_connection() => {
                    return Err(self.fail(OrchestratorError::ConnectionLost {
                        model: mapping.source_model.clone(),
                        source: e,
                    }));
                }
                Err(e) => {
                    warn!(source_id = ?record.id(), error = %e, "record failed");
                    let message = match record.id() {
                        Some(id) => format!("{} {id}: {e}", mapping.source_model),
                        None => format!("{}: {e}", mapping.source_model),
                    };
                    let entry = self.loader.log_failure(&mapping.destination_model, message).await;
                    report.failures.push(entry);
                    summary.failed += 1;
                }
            }
        }

        info!(
            migrated = summary.migrated,
            skipped = summary.skipped,
            failed = summary.failed,
            "Model pair done"
        );
        Ok(summary)
    }

    /// Returns whether the record was committed.
    async fn migrate_record(
        &self,
        mapping: &ModelMapping,
        record: &Record,
    ) -> Result<bool, RecordError> {
        let source_id = record.id().ok_or(RecordError::MissingId)?;

        self.set_state(RunState::TransformingRecords);
        let values = match self.processor.process(mapping, record).await? {
            Processed::Ready(values) => values,
            Processed::Skipped { field } => {
                info!(source_id, field = %field, "record skipped, relation not resolved");
                return Ok(false);
            }
        };
        if values.is_empty() {
            debug!(source_id, "nothing to write");
            return Ok(false);
        }

        self.set_state(RunState::Committing);
        self.loader.load(&mapping.destination_model, source_id, &values).await?;
        Ok(true)
    }
}
