use std::env;

use dotenv::dotenv;
use migrator::{Command, Dependencies, MigratorError, Settings, migrate, sync_catalog};
use migrator_pipeline::CancellationFlag;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Sets up tracing. `LOG_FORMAT=json` selects structured JSON output,
/// anything else the pretty console format.
fn init_tracing() -> Result<(), MigratorError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("migrator=info,migrator_pipeline=info"));

    let json = env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .try_init()
            .map_err(|e| MigratorError::Tracing(e.to_string()))?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .try_init()
            .map_err(|e| MigratorError::Tracing(e.to_string()))?;
    }

    info!(
        service_name = "migrator",
        service_version = env!("CARGO_PKG_VERSION"),
        json,
        "Tracing initialized"
    );
    Ok(())
}

/// Main entry point of the migrator.
///
/// Usage: `migrator [migrate|sync-catalog]`. Settings come from the
/// environment, optionally through a `.env` file.
#[tokio::main]
async fn main() -> Result<(), MigratorError> {
    dotenv().ok();
    init_tracing()?;

    let command = Command::from_args(env::args().skip(1))?;
    let settings = Settings::from_env()?;
    let dependencies = Dependencies::new(&settings).await?;

    match command {
        Command::Migrate => {
            let cancel = CancellationFlag::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("interrupt received, stopping after the current record");
                    on_signal.cancel();
                }
            });

            match migrate(&dependencies, &settings, cancel).await {
                Ok(report) => {
                    info!(
                        migrated = report.migrated,
                        related_created = report.related_created,
                        skipped = report.skipped,
                        failures = report.failures.len(),
                        cancelled = report.cancelled,
                        "migration finished"
                    );
                    println!("{report}");
                }
                Err(e) => {
                    error!(error = %e, "migration failed");
                    return Err(e);
                }
            }
        }
        Command::SyncCatalog => {
            let report = sync_catalog(&dependencies, &settings).await?;
            println!(
                "models created: {}, fields created: {}, mappings updated: {}",
                report.models_created, report.fields_created, report.mappings_updated
            );
        }
    }

    Ok(())
}
