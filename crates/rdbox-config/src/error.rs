//! Error types for settings assembly.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading the option file failed.
    #[error("option file io failure")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Source IO error.
        source: io::Error,
    },
    /// A line in the option file could not be parsed.
    #[error("malformed option file")]
    MalformedOptionFile {
        /// Option file path.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// Field contained an invalid value.
    #[error("invalid configuration field")]
    InvalidField {
        /// Field that failed validation.
        field: &'static str,
        /// Machine-readable reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: &'static str, value: Option<&str>) -> Self {
        Self::InvalidField {
            field,
            reason,
            value: value.map(str::to_string),
        }
    }
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn config_error_messages_are_constant() {
        let io_err = ConfigError::Io {
            operation: "read",
            path: PathBuf::from("/root/.my.cnf"),
            source: io::Error::other("io"),
        };
        assert_eq!(io_err.to_string(), "option file io failure");
        assert!(io_err.source().is_some());

        let malformed = ConfigError::MalformedOptionFile {
            path: PathBuf::from(".my.cnf"),
            line: 3,
            reason: "unterminated section header",
        };
        assert_eq!(malformed.to_string(), "malformed option file");

        let invalid = ConfigError::invalid("db_port", "must be a port number", Some("x"));
        assert!(matches!(
            invalid,
            ConfigError::InvalidField { field: "db_port", value: Some(ref v), .. } if v == "x"
        ));
    }
}
