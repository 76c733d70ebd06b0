//! Error types for process-table operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for process operations.
pub type ProcessResult<T> = Result<T, ProcessError>;

/// Errors raised while enumerating, terminating, or launching processes.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The process table could not be read.
    #[error("process table unreadable")]
    Enumerate {
        /// Underlying error.
        source: io::Error,
    },
    /// Sending the termination signal failed.
    #[error("failed to terminate process")]
    Terminate {
        /// Target process.
        pid: i32,
        /// Underlying error.
        source: io::Error,
    },
    /// The executable is not on the search path.
    #[error("executable not found on search path")]
    ExecutableNotFound {
        /// Executable name that was looked up.
        name: String,
    },
    /// Spawning the executable failed.
    #[error("failed to launch executable")]
    Launch {
        /// Executable path.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// The executable ran but exited unsuccessfully.
    #[error("launched executable exited unsuccessfully")]
    LaunchStatus {
        /// Executable path.
        path: PathBuf,
        /// Exit code, if the process was not killed by a signal.
        code: Option<i32>,
    },
}
