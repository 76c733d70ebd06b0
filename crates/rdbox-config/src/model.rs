//! Typed settings for one reconciliation run.

use std::fmt;

use serde::Serialize;

use crate::defaults;
use crate::error::{ConfigError, ConfigResult};
use crate::mycnf::ClientOptions;

/// How chatty the run should be.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verbosity {
    /// Only failures and warnings.
    #[default]
    Quiet,
    /// Progress messages for every check.
    Verbose,
    /// Registry dumps and per-process scan details. Implies `Verbose`.
    Debug,
}

impl Verbosity {
    /// Derive the verbosity from the `--verbose`/`--debug` pair.
    #[must_use]
    pub const fn from_flags(verbose: bool, debug: bool) -> Self {
        if debug {
            Self::Debug
        } else if verbose {
            Self::Verbose
        } else {
            Self::Quiet
        }
    }

    /// Tracing filter level matching this verbosity.
    #[must_use]
    pub const fn log_level(self) -> &'static str {
        match self {
            Self::Quiet => "warn",
            Self::Verbose => "info",
            Self::Debug => "debug",
        }
    }
}

/// Connection parameters for the dropbox-definition database.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    /// Host name or address.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Database user.
    pub user: String,
    /// Password, when one is configured.
    pub password: Option<String>,
    /// Database (schema) name.
    pub name: String,
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("DatabaseSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("name", &self.name)
            .finish()
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            host: defaults::DB_HOST.to_string(),
            port: defaults::DB_PORT,
            user: defaults::DB_USER.to_string(),
            password: None,
            name: defaults::DB_NAME.to_string(),
        }
    }
}

/// Database values supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct DatabaseOverrides {
    /// `--dbhost`.
    pub host: Option<String>,
    /// `--dbport`.
    pub port: Option<u16>,
    /// `--dbuser`.
    pub user: Option<String>,
    /// `--dbpass`.
    pub password: Option<String>,
    /// `--dbname`.
    pub name: Option<String>,
}

impl DatabaseSettings {
    /// Merge command-line overrides over option-file values over defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the option file carries a port that is not a valid
    /// TCP port number.
    pub fn resolve(
        overrides: DatabaseOverrides,
        file: Option<ClientOptions>,
    ) -> ConfigResult<Self> {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        let file_port = file
            .port
            .as_deref()
            .map(|raw| {
                raw.parse::<u16>()
                    .ok()
                    .filter(|port| *port > 0)
                    .ok_or_else(|| ConfigError::invalid("port", "must be a TCP port", Some(raw)))
            })
            .transpose()?;

        Ok(Self {
            host: overrides.host.or(file.host).unwrap_or(defaults.host),
            port: overrides.port.or(file_port).unwrap_or(defaults.port),
            user: overrides.user.or(file.user).unwrap_or(defaults.user),
            password: overrides.password.or(file.password),
            name: overrides.name.or(file.database).unwrap_or(defaults.name),
        })
    }
}

/// Knobs for the reconciliation engine itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileSettings {
    /// Process name of the file-import worker.
    pub worker_executable: String,
    /// Process name of the supervisor daemon that spawns workers.
    pub supervisor_executable: String,
    /// Mode used when creating or repairing directories.
    pub directory_mode: u32,
    /// Drop dropboxes whose directory fails the sentinel write probe.
    pub require_writable_dropbox: bool,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            worker_executable: defaults::WORKER_EXECUTABLE.to_string(),
            supervisor_executable: defaults::SUPERVISOR_EXECUTABLE.to_string(),
            directory_mode: defaults::DIRECTORY_MODE,
            require_writable_dropbox: true,
        }
    }
}

/// Everything one run needs, assembled before any work starts.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Station whose dropboxes are reconciled.
    pub station: String,
    /// Requested verbosity.
    pub verbosity: Verbosity,
    /// Database connection parameters.
    pub database: DatabaseSettings,
    /// Engine knobs.
    pub reconcile: ReconcileSettings,
}

impl RunSettings {
    /// Resolve the local station name from the host name.
    ///
    /// # Errors
    ///
    /// Returns an error if the host name is empty or not valid UTF-8.
    pub fn local_station() -> ConfigResult<String> {
        let hostname = gethostname::gethostname();
        let station = hostname
            .into_string()
            .map_err(|raw| {
                ConfigError::invalid(
                    "station",
                    "host name is not valid utf-8",
                    Some(&raw.to_string_lossy()),
                )
            })?
            .trim()
            .to_string();
        if station.is_empty() {
            return Err(ConfigError::invalid("station", "host name is empty", None));
        }
        Ok(station)
    }
}
