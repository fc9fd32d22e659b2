//! The migrator's commands.
use std::sync::Arc;

use migrator_pipeline::{CancellationFlag, CatalogSynchronizer, Orchestrator, SyncReport};
use migrator_repository::ConfigurationLock;
use migrator_shared::types::{ConnectionParams, RunReport};
use object_rpc::{ObjectStore, StoreSource};
use tracing::{info, instrument, warn};

use crate::config::{Dependencies, Settings};
use crate::errors::MigratorError;

/// Runs the configured migration.
///
/// Holds the configuration's run lock for the whole run so two migrators
/// never interleave writes into the same mapping table.
///
/// # Arguments
///
/// * `deps` - Wired repositories and destination store
/// * `settings` - Runtime settings, including the configuration id
/// * `cancel` - Flag checked between records
///
/// # Returns
///
/// The run report, or a `MigratorError` on a fatal failure.
#[instrument(skip_all, fields(config_id = settings.config_id))]
pub async fn migrate(
    deps: &Dependencies,
    settings: &Settings,
    cancel: CancellationFlag,
) -> Result<RunReport, MigratorError> {
    let lock = ConfigurationLock::try_acquire(&deps.pool, settings.config_id).await?;

    let outcome = run_locked(deps, settings, cancel).await;

    if let Err(e) = lock.release().await {
        warn!(error = %e, "failed to release configuration lock");
    }
    outcome
}

async fn run_locked(
    deps: &Dependencies,
    settings: &Settings,
    cancel: CancellationFlag,
) -> Result<RunReport, MigratorError> {
    let config = deps.configs.load(settings.config_id).await?;
    info!(migration = %config.name, source = %config.source.url, "configuration loaded");

    let source = source_store(&config.source, settings)?;
    let orchestrator = Orchestrator::new(
        config,
        source,
        deps.destination.clone(),
        deps.mappings.clone(),
        deps.logs.clone(),
    )
    .with_cancellation(cancel);

    Ok(orchestrator.run().await?)
}

/// Imports the source store's models and fields and refreshes the derived
/// attributes of the configuration's field mappings.
#[instrument(skip_all, fields(config_id = settings.config_id))]
pub async fn sync_catalog(deps: &Dependencies, settings: &Settings) -> Result<SyncReport, MigratorError> {
    let config = deps.configs.load(settings.config_id).await?;
    let source = source_store(&config.source, settings)?;
    source.authenticate().await?;

    let synchronizer = CatalogSynchronizer::new(source, deps.catalog.clone(), deps.configs.clone());
    let report = synchronizer.sync(settings.config_id).await?;
    info!(
        models_created = report.models_created,
        fields_created = report.fields_created,
        mappings_updated = report.mappings_updated,
        "catalog synchronised"
    );
    Ok(report)
}

fn source_store(
    params: &ConnectionParams,
    settings: &Settings,
) -> Result<Arc<dyn ObjectStore>, MigratorError> {
    let store = StoreSource::live(params.clone(), settings.rpc_timeout).into_store()?;
    Ok(store.into())
}
