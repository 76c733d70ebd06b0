//! # Design
//!
//! - `ReconcileError` is reserved for the conditions that end a run early;
//!   every other failure is counted in the run report.
//! - `AppError` wraps setup failures around a run with an operation label.

use std::error::Error as StdError;

use rdbox_procs::ProcessError;
use thiserror::Error;

use crate::orchestrator::Phase;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Conditions that abort a reconciliation run.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The dropbox definitions could not be fetched.
    #[error("dropbox definitions unavailable")]
    DropboxSource {
        /// Station whose dropboxes were requested.
        station: String,
        /// Underlying error.
        source: Box<dyn StdError + Send + Sync>,
    },
    /// The process table could not be read for correlation.
    #[error("process inventory unavailable")]
    Inventory {
        /// Phase that needed the snapshot.
        phase: Phase,
        /// Underlying error.
        source: ProcessError,
    },
    /// A supervisor relaunch was needed but its executable is not on the path.
    #[error("supervisor executable not found")]
    SupervisorNotFound {
        /// Executable name that was looked up.
        name: String,
        /// Underlying error.
        source: ProcessError,
    },
}

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Settings were rejected.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: rdbox_config::ConfigError,
    },
    /// The dropbox database could not be used.
    #[error("dropbox database operation failed")]
    Data {
        /// Operation identifier.
        operation: &'static str,
        /// Source data error.
        source: rdbox_data::DataError,
    },
    /// The path validator could not be built.
    #[error("path validator setup failed")]
    FsOps {
        /// Operation identifier.
        operation: &'static str,
        /// Source fsops error.
        source: rdbox_fsops::FsOpsError,
    },
    /// The run was aborted.
    #[error("reconciliation aborted")]
    Reconcile {
        /// Source reconcile error.
        #[from]
        source: ReconcileError,
    },
}

impl AppError {
    pub(crate) const fn config(operation: &'static str, source: rdbox_config::ConfigError) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn data(operation: &'static str, source: rdbox_data::DataError) -> Self {
        Self::Data { operation, source }
    }

    pub(crate) const fn fsops(operation: &'static str, source: rdbox_fsops::FsOpsError) -> Self {
        Self::FsOps { operation, source }
    }

    /// Whether the run itself was aborted, as opposed to failing during setup.
    ///
    /// An unreachable dropbox database counts as an aborted run: the
    /// definitions could not be fetched.
    #[must_use]
    pub const fn is_run_abort(&self) -> bool {
        matches!(self, Self::Data { .. } | Self::Reconcile { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn reconcile_error_messages_and_sources() {
        let source = ReconcileError::DropboxSource {
            station: "onair-1".to_string(),
            source: Box::new(io::Error::other("offline")),
        };
        assert_eq!(source.to_string(), "dropbox definitions unavailable");
        assert!(source.source().is_some());

        let inventory = ReconcileError::Inventory {
            phase: Phase::RecheckSupervisor,
            source: ProcessError::Enumerate {
                source: io::Error::other("proc"),
            },
        };
        assert_eq!(inventory.to_string(), "process inventory unavailable");

        let missing = ReconcileError::SupervisorNotFound {
            name: "rdcatchd".to_string(),
            source: ProcessError::ExecutableNotFound {
                name: "rdcatchd".to_string(),
            },
        };
        assert_eq!(missing.to_string(), "supervisor executable not found");
    }

    #[test]
    fn app_error_helpers_classify_aborts() {
        let config = AppError::config(
            "validate",
            rdbox_config::ConfigError::InvalidField {
                field: "station",
                reason: "must not be empty",
                value: None,
            },
        );
        assert!(matches!(config, AppError::Config { .. }));
        assert!(!config.is_run_abort());

        let data = AppError::data(
            "connect",
            rdbox_data::DataError::ConnectFailed {
                host: "localhost".to_string(),
                port: 3306,
                source: sqlx::Error::PoolTimedOut,
            },
        );
        assert!(data.is_run_abort());

        let fsops = AppError::fsops(
            "validator.new",
            rdbox_fsops::FsOpsError::InvalidInput {
                field: "pattern",
                reason: "invalid",
                value: None,
            },
        );
        assert!(!fsops.is_run_abort());

        let reconcile = AppError::from(ReconcileError::SupervisorNotFound {
            name: "rdcatchd".to_string(),
            source: ProcessError::ExecutableNotFound {
                name: "rdcatchd".to_string(),
            },
        });
        assert!(reconcile.is_run_abort());
        assert_eq!(reconcile.to_string(), "reconciliation aborted");
    }
}
