//! # Design
//!
//! - Provide structured, constant-message errors for the path checks.
//! - Capture operation context (paths, fields) so failures can be logged with fields.
//! - Preserve source errors without interpolating context into error messages.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for filesystem checks.
pub type FsOpsResult<T> = Result<T, FsOpsError>;

/// Errors produced while checking or healing a dropbox path.
#[derive(Debug, Error)]
pub enum FsOpsError {
    /// IO failures while interacting with the filesystem.
    #[error("fsops io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Input validation failures.
    #[error("fsops invalid input")]
    InvalidInput {
        /// Field that failed validation.
        field: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
    /// Built-in pattern failed to compile.
    #[error("fsops regex compile failure")]
    RegexCompile {
        /// Pattern that failed to compile.
        pattern: &'static str,
        /// Underlying regex error.
        source: regex::Error,
    },
}

impl FsOpsError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid(
        field: &'static str,
        reason: &'static str,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidInput {
            field,
            reason,
            value: Some(value.into()),
        }
    }

    /// Name of the operation that failed, for log fields.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Io { operation, .. } => *operation,
            Self::InvalidInput { field, .. } => *field,
            Self::RegexCompile { .. } => "regex_compile",
        }
    }
}
