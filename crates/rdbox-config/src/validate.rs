//! Pre-run validation of assembled settings.

use crate::error::{ConfigError, ConfigResult};
use crate::model::{ReconcileSettings, RunSettings};

/// Reject settings that would make a run meaningless.
///
/// # Errors
///
/// Returns the first offending field.
pub fn validate_run_settings(settings: &RunSettings) -> ConfigResult<()> {
    if settings.station.trim().is_empty() {
        return Err(ConfigError::invalid("station", "must not be empty", None));
    }
    if settings.database.host.trim().is_empty() {
        return Err(ConfigError::invalid("db_host", "must not be empty", None));
    }
    if settings.database.name.trim().is_empty() {
        return Err(ConfigError::invalid("db_name", "must not be empty", None));
    }
    validate_reconcile(&settings.reconcile)
}

fn validate_reconcile(settings: &ReconcileSettings) -> ConfigResult<()> {
    validate_process_name("worker_executable", &settings.worker_executable)?;
    validate_process_name("supervisor_executable", &settings.supervisor_executable)?;
    if settings.worker_executable == settings.supervisor_executable {
        return Err(ConfigError::invalid(
            "supervisor_executable",
            "must differ from the worker executable",
            Some(&settings.supervisor_executable),
        ));
    }
    if settings.directory_mode > 0o7777 {
        return Err(ConfigError::invalid(
            "directory_mode",
            "must be a permission mode",
            Some(&format!("{:o}", settings.directory_mode)),
        ));
    }
    Ok(())
}

fn validate_process_name(field: &'static str, name: &str) -> ConfigResult<()> {
    if name.is_empty() {
        return Err(ConfigError::invalid(field, "must not be empty", None));
    }
    // Process names are compared against the process table, never paths.
    if name.contains('/') || name.chars().any(char::is_whitespace) {
        return Err(ConfigError::invalid(
            field,
            "must be a bare executable name",
            Some(name),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DatabaseSettings, Verbosity};

    fn settings() -> RunSettings {
        RunSettings {
            station: "onair-1".to_string(),
            verbosity: Verbosity::Quiet,
            database: DatabaseSettings::default(),
            reconcile: ReconcileSettings::default(),
        }
    }

    #[test]
    fn default_settings_are_valid() -> ConfigResult<()> {
        validate_run_settings(&settings())
    }

    #[test]
    fn empty_station_is_rejected() {
        let mut run = settings();
        run.station = "  ".to_string();
        assert!(matches!(
            validate_run_settings(&run),
            Err(ConfigError::InvalidField { field: "station", .. })
        ));
    }

    #[test]
    fn executable_names_must_be_bare() {
        let mut run = settings();
        run.reconcile.worker_executable = "/usr/bin/rdimport".to_string();
        assert!(matches!(
            validate_run_settings(&run),
            Err(ConfigError::InvalidField { field: "worker_executable", .. })
        ));

        let mut run = settings();
        run.reconcile.supervisor_executable = run.reconcile.worker_executable.clone();
        assert!(matches!(
            validate_run_settings(&run),
            Err(ConfigError::InvalidField { field: "supervisor_executable", .. })
        ));
    }

    #[test]
    fn directory_mode_must_fit_permission_bits() {
        let mut run = settings();
        run.reconcile.directory_mode = 0o10_000;
        assert!(matches!(
            validate_run_settings(&run),
            Err(ConfigError::InvalidField { field: "directory_mode", .. })
        ));
    }
}
