//! Dropbox definitions stored in the station database.

use rdbox_config::DatabaseSettings;
use serde::Serialize;
use sqlx::MySqlPool;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use tracing::{debug, info};

use crate::error::{DataError, Result};

const COUNT_DROPBOXES: &str = r"
    SELECT COUNT(*)
    FROM DROPBOXES
    WHERE STATION_NAME = ?
";

const LIST_DROPBOXES: &str = r"
    SELECT CAST(ID AS SIGNED), PATH, LOG_PATH
    FROM DROPBOXES
    WHERE STATION_NAME = ?
    ORDER BY ID
";

/// One dropbox row as configured for a station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DropboxDefinition {
    /// Row identifier.
    pub id: i64,
    /// Path spec: watched directory plus file pattern.
    pub path: String,
    /// Worker log file.
    pub log_path: String,
}

/// Read-only repository over the `DROPBOXES` table.
#[derive(Clone)]
pub struct DropboxStore {
    pool: MySqlPool,
}

impl DropboxStore {
    /// Connect to the database described by `settings`.
    ///
    /// The pool opens one connection eagerly, so an unreachable server or a
    /// rejected login surfaces here rather than on the first query.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::ConnectFailed`] when no connection can be made.
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self> {
        let mut options = MySqlConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.user)
            .database(&settings.name);
        if let Some(password) = &settings.password {
            options = options.password(password);
        }

        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|source| DataError::ConnectFailed {
                host: settings.host.clone(),
                port: settings.port,
                source,
            })?;
        info!(host = %settings.host, database = %settings.name, "connected to dropbox database");
        Ok(Self { pool })
    }

    /// Number of dropboxes configured for `station`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn count_dropboxes(&self, station: &str) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(COUNT_DROPBOXES)
            .bind(station)
            .fetch_one(&self.pool)
            .await
            .map_err(DataError::query("count_dropboxes"))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// All dropboxes configured for `station`, ordered by id.
    ///
    /// A NULL path or log path is returned as an empty string.
    ///
    /// # Errors
    ///
    /// Returns an error if the query or row decoding fails.
    pub async fn list_dropboxes(&self, station: &str) -> Result<Vec<DropboxDefinition>> {
        let rows: Vec<(i64, Option<String>, Option<String>)> = sqlx::query_as(LIST_DROPBOXES)
            .bind(station)
            .fetch_all(&self.pool)
            .await
            .map_err(DataError::query("list_dropboxes"))?;

        let definitions: Vec<DropboxDefinition> = rows
            .into_iter()
            .map(|(id, path, log_path)| DropboxDefinition {
                id,
                path: path.unwrap_or_default(),
                log_path: log_path.unwrap_or_default(),
            })
            .collect();
        debug!(station, dropboxes = ?definitions, "loaded dropbox definitions");
        Ok(definitions)
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
