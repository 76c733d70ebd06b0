use std::sync::Arc;

use rdbox_config::{RunSettings, validate_run_settings};
use rdbox_data::DropboxStore;
use rdbox_fsops::PathValidator;
use rdbox_procs::{PathLauncher, ProcfsInventory};
use tracing::{Instrument, info};

use crate::error::{AppError, AppResult};
use crate::orchestrator::{Reconciler, RunReport};

/// Run one reconciliation against the real database, filesystem, and
/// process table.
///
/// # Errors
///
/// Returns an error if the settings are invalid, the database cannot be
/// reached, the validator cannot be built, or the run is aborted.
pub async fn run_reconcile(settings: &RunSettings) -> AppResult<RunReport> {
    validate_run_settings(settings).map_err(|err| AppError::config("settings.validate", err))?;

    let span = rdbox_telemetry::run_span(&settings.station);
    async move {
        info!(
            database = %settings.database.name,
            host = %settings.database.host,
            verbosity = ?settings.verbosity,
            "dropbox reconciliation starting"
        );

        let validator = PathValidator::new(
            settings.reconcile.directory_mode,
            settings.reconcile.require_writable_dropbox,
        )
        .map_err(|err| AppError::fsops("path_validator.new", err))?;

        let store = DropboxStore::connect(&settings.database)
            .await
            .map_err(|err| AppError::data("dropbox_store.connect", err))?;

        let reconciler = Reconciler::new(
            Arc::new(store.clone()),
            Arc::new(ProcfsInventory),
            Arc::new(PathLauncher::new()),
            validator,
            settings.reconcile.clone(),
        );
        let result = reconciler.run(&settings.station).await;
        store.close().await;
        Ok(result?)
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdbox_config::{DatabaseSettings, ReconcileSettings, Verbosity};

    #[tokio::test]
    async fn invalid_settings_fail_before_connecting() {
        let settings = RunSettings {
            station: String::new(),
            verbosity: Verbosity::Quiet,
            database: DatabaseSettings::default(),
            reconcile: ReconcileSettings::default(),
        };
        let result = run_reconcile(&settings).await;
        assert!(matches!(
            result,
            Err(AppError::Config {
                operation: "settings.validate",
                ..
            })
        ));
    }
}
