//! Default identities and values for a Rivendell workstation.
//!
//! # Design
//! - Centralise executable names so correlation and remediation agree.
//! - Keep the settle delay a constant; it is not a setting.

use std::time::Duration;

/// Default database host when neither a flag nor the option file supplies one.
pub const DB_HOST: &str = "localhost";
/// Default MySQL port.
pub const DB_PORT: u16 = 3306;
/// Default database user.
pub const DB_USER: &str = "rduser";
/// Default database name.
pub const DB_NAME: &str = "Rivendell";
/// Option-file section that carries client credentials.
pub const OPTION_FILE_SECTION: &str = "client";
/// Option-file name looked up in the invoking user's home directory.
pub const OPTION_FILE_NAME: &str = ".my.cnf";
/// Process name of the file-import worker.
pub const WORKER_EXECUTABLE: &str = "rdimport";
/// Process name of the worker supervisor daemon.
pub const SUPERVISOR_EXECUTABLE: &str = "rdcatchd";
/// Mode applied when creating or repairing dropbox directories.
pub const DIRECTORY_MODE: u32 = 0o755;
/// Pause after stopping the supervisor, before checking whether it came back.
pub const SETTLE_DELAY: Duration = Duration::from_secs(4);
