//! Credential loading from MySQL option files (`~/.my.cnf`).
//!
//! Only the `[client]` section is consulted. Keys are matched the way the
//! MySQL client does: case-insensitively, with `-` and `_` interchangeable.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::defaults;
use crate::error::{ConfigError, ConfigResult};

/// Connection values found in the `[client]` section of an option file.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ClientOptions {
    /// `host`.
    pub host: Option<String>,
    /// `port`, kept raw until settings resolution.
    pub port: Option<String>,
    /// `user`.
    pub user: Option<String>,
    /// `password`.
    pub password: Option<String>,
    /// `database`.
    pub database: Option<String>,
}

impl std::fmt::Debug for ClientOptions {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ClientOptions")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("database", &self.database)
            .finish()
    }
}

/// Option file in the invoking user's home directory, if `HOME` is set.
#[must_use]
pub fn default_option_file() -> Option<PathBuf> {
    env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map(|home| PathBuf::from(home).join(defaults::OPTION_FILE_NAME))
}

/// Load the `[client]` credentials from `path`.
///
/// A missing file yields `Ok(None)` so the caller falls back to defaults.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read, or if it contains
/// a malformed section header.
pub fn load_client_options(path: &Path) -> ConfigResult<Option<ClientOptions>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "option file not present; using defaults");
            return Ok(None);
        }
        Err(source) => {
            return Err(ConfigError::Io {
                operation: "mycnf.read",
                path: path.to_path_buf(),
                source,
            });
        }
    };
    parse_client_options(path, &text).map(Some)
}

fn parse_client_options(path: &Path, text: &str) -> ConfigResult<ClientOptions> {
    let mut options = ClientOptions::default();
    let mut in_client = false;

    for (index, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if line.starts_with('!') {
            debug!(path = %path.display(), directive = line, "ignoring option file directive");
            continue;
        }
        if let Some(header) = line.strip_prefix('[') {
            let name = header
                .strip_suffix(']')
                .ok_or_else(|| ConfigError::MalformedOptionFile {
                    path: path.to_path_buf(),
                    line: index + 1,
                    reason: "unterminated section header",
                })?;
            in_client = name.trim().eq_ignore_ascii_case(defaults::OPTION_FILE_SECTION);
            continue;
        }
        if !in_client {
            continue;
        }

        // Bare switches such as `skip-ssl` carry no connection value.
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = unquote(value.trim()).to_string();
        match normalise_key(key).as_str() {
            "host" => options.host = Some(value),
            "port" => options.port = Some(value),
            "user" => options.user = Some(value),
            "password" => options.password = Some(value),
            "database" => options.database = Some(value),
            _ => {}
        }
    }

    Ok(options)
}

fn normalise_key(key: &str) -> String {
    key.trim().to_ascii_lowercase().replace('-', "_")
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::TempDir;

    #[test]
    fn parses_only_the_client_section() -> Result<()> {
        let text = "\
# local credentials
[mysqld]
user = mysql

[client]
host = db.studio.lan
user=rduser
password = \"s3cret pass\"
Database = Rivendell
skip-ssl
!includedir /etc/mysql/conf.d/

[mysqldump]
user = backup
";
        let options = parse_client_options(Path::new("test.cnf"), text)?;
        assert_eq!(options.host.as_deref(), Some("db.studio.lan"));
        assert_eq!(options.user.as_deref(), Some("rduser"));
        assert_eq!(options.password.as_deref(), Some("s3cret pass"));
        assert_eq!(options.database.as_deref(), Some("Rivendell"));
        assert!(options.port.is_none());
        Ok(())
    }

    #[test]
    fn rejects_unterminated_section_header() {
        let result = parse_client_options(Path::new("bad.cnf"), "[client\nuser = x\n");
        assert!(matches!(
            result,
            Err(ConfigError::MalformedOptionFile { line: 1, .. })
        ));
    }

    #[test]
    fn missing_file_is_not_an_error() -> Result<()> {
        let temp = TempDir::new()?;
        let options = load_client_options(&temp.path().join("absent.cnf"))?;
        assert!(options.is_none());
        Ok(())
    }

    #[test]
    fn loads_file_from_disk() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join(".my.cnf");
        fs::write(&path, "[client]\nport=3307\npassword='letmein'\n")?;
        let options = load_client_options(&path)?.unwrap_or_default();
        assert_eq!(options.port.as_deref(), Some("3307"));
        assert_eq!(options.password.as_deref(), Some("letmein"));
        assert!(!format!("{options:?}").contains("letmein"));
        Ok(())
    }

    #[test]
    fn directory_in_place_of_file_is_an_io_error() -> Result<()> {
        let temp = TempDir::new()?;
        let result = load_client_options(temp.path());
        assert!(matches!(result, Err(ConfigError::Io { .. })));
        Ok(())
    }
}
