//! Error types for the data access layer.

use std::error::Error;
use std::fmt::{self, Display, Formatter};

/// Result alias for data layer operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors raised by the data access layer.
#[derive(Debug)]
pub enum DataError {
    /// The database server could not be reached or refused the login.
    ConnectFailed {
        /// Host that was contacted.
        host: String,
        /// Port that was contacted.
        port: u16,
        /// Underlying SQL error.
        source: sqlx::Error,
    },
    /// A database operation failed.
    QueryFailed {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying SQL error.
        source: sqlx::Error,
    },
}

impl DataError {
    pub(crate) fn query(operation: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| Self::QueryFailed { operation, source }
    }
}

impl Display for DataError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectFailed { .. } => formatter.write_str("database connection failed"),
            Self::QueryFailed { .. } => formatter.write_str("database operation failed"),
        }
    }
}

impl Error for DataError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ConnectFailed { source, .. } | Self::QueryFailed { source, .. } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_error_display_and_source() {
        let connect = DataError::ConnectFailed {
            host: "localhost".to_string(),
            port: 3306,
            source: sqlx::Error::PoolTimedOut,
        };
        assert_eq!(connect.to_string(), "database connection failed");
        assert!(connect.source().is_some());

        let query = DataError::query("list_dropboxes")(sqlx::Error::RowNotFound);
        assert_eq!(query.to_string(), "database operation failed");
        assert!(matches!(
            query,
            DataError::QueryFailed {
                operation: "list_dropboxes",
                ..
            }
        ));
    }
}
