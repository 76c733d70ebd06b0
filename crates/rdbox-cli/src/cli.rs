//! Argument parsing, settings assembly, and exit codes.

use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{Parser, ValueEnum};
use rdbox_app::{AppError, RunReport, run_reconcile};
use rdbox_config::{
    DatabaseOverrides, DatabaseSettings, ReconcileSettings, RunSettings, Verbosity,
    default_option_file, load_client_options,
};
use rdbox_telemetry::{LogFormat, LoggingConfig, init_logging};
use tracing::debug;

use crate::output::render_report;

#[derive(Parser, Debug)]
#[command(
    name = "rd-dropbox",
    version,
    about = "Check and, if necessary, restart Rivendell dropbox workers"
)]
pub(crate) struct Cli {
    /// MySQL option file holding `[client]` credentials (default: ~/.my.cnf).
    #[arg(short = 'm', long = "myconfig", env = "RDBOX_MYCNF", value_name = "PATH")]
    pub(crate) myconfig: Option<PathBuf>,
    /// Name or address of the database host.
    #[arg(short = 'd', long = "dbhost", env = "RDBOX_DBHOST")]
    pub(crate) dbhost: Option<String>,
    /// TCP port of the database server.
    #[arg(long = "dbport", env = "RDBOX_DBPORT")]
    pub(crate) dbport: Option<u16>,
    /// Database user.
    #[arg(short = 'u', long = "dbuser", env = "RDBOX_DBUSER")]
    pub(crate) dbuser: Option<String>,
    /// Password for the database user.
    #[arg(short = 'p', long = "dbpass", env = "RDBOX_DBPASS", hide_env_values = true)]
    pub(crate) dbpass: Option<String>,
    /// Name of the database.
    #[arg(short = 'n', long = "dbname", env = "RDBOX_DBNAME")]
    pub(crate) dbname: Option<String>,
    /// Be chatty when running.
    #[arg(short = 'v', long)]
    pub(crate) verbose: bool,
    /// Dump internal state while running (implies --verbose).
    #[arg(short = 'D', long)]
    pub(crate) debug: bool,
    /// Reconcile this station instead of the local host name.
    #[arg(long)]
    pub(crate) station: Option<String>,
    /// Keep dropboxes whose directory fails the write probe.
    #[arg(long)]
    pub(crate) no_write_probe: bool,
    /// Log line format.
    #[arg(long, value_parser = parse_log_format)]
    pub(crate) log_format: Option<LogFormat>,
    /// Report format written to stdout.
    #[arg(long = "output", value_enum, default_value_t = OutputFormat::Text)]
    pub(crate) output: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

fn parse_log_format(value: &str) -> Result<LogFormat, String> {
    value.parse::<LogFormat>().map_err(|err| err.to_string())
}

/// Parses CLI arguments, runs one reconciliation, and renders the report.
/// Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();

    let (exit_code, message) = match execute(cli).await {
        Ok(report) if report.succeeded() => (0, None),
        Ok(report) => {
            let err = CliError::Incomplete {
                errors: report.error_count,
            };
            (err.exit_code(), Some(err.display_message()))
        }
        Err(err) => (err.exit_code(), Some(err.display_message())),
    };

    if let Some(message) = message {
        eprintln!("error: {message}");
    }
    exit_code
}

async fn execute(cli: Cli) -> CliResult<RunReport> {
    let verbosity = Verbosity::from_flags(cli.verbose, cli.debug);
    let logging = LoggingConfig {
        level: verbosity.log_level(),
        format: cli.log_format.unwrap_or_else(LogFormat::infer),
        ..LoggingConfig::default()
    };
    init_logging(&logging).map_err(CliError::setup)?;

    let settings = settings_from_cli(&cli, verbosity)?;
    debug!(settings = ?settings, "assembled run settings");

    let report = run_reconcile(&settings).await.map_err(CliError::from)?;
    let rendered = render_report(&report, cli.output).map_err(CliError::setup)?;
    println!("{rendered}");
    Ok(report)
}

/// Assemble run settings: flags over option file over defaults.
pub(crate) fn settings_from_cli(cli: &Cli, verbosity: Verbosity) -> CliResult<RunSettings> {
    let option_file = cli.myconfig.clone().or_else(default_option_file);
    let client = match &option_file {
        Some(path) => {
            let loaded = load_client_options(path).map_err(CliError::setup)?;
            if loaded.is_none() && cli.myconfig.is_some() {
                return Err(CliError::setup(anyhow!(
                    "option file {} does not exist",
                    path.display()
                )));
            }
            loaded
        }
        None => None,
    };

    let overrides = DatabaseOverrides {
        host: cli.dbhost.clone(),
        port: cli.dbport,
        user: cli.dbuser.clone(),
        password: cli.dbpass.clone(),
        name: cli.dbname.clone(),
    };
    let database = DatabaseSettings::resolve(overrides, client).map_err(CliError::setup)?;

    let station = match &cli.station {
        Some(station) => station.clone(),
        None => RunSettings::local_station().map_err(CliError::setup)?,
    };

    Ok(RunSettings {
        station,
        verbosity,
        database,
        reconcile: ReconcileSettings {
            require_writable_dropbox: !cli.no_write_probe,
            ..ReconcileSettings::default()
        },
    })
}

pub(crate) type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub(crate) enum CliError {
    /// Settings, credentials, or logging could not be set up.
    Setup(anyhow::Error),
    /// The run was aborted before it could finish.
    Aborted(anyhow::Error),
    /// The run finished but counted failures.
    Incomplete { errors: usize },
}

impl CliError {
    pub(crate) fn setup(error: impl Into<anyhow::Error>) -> Self {
        Self::Setup(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Incomplete { .. } => 1,
            Self::Aborted(_) => 2,
            Self::Setup(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Setup(error) | Self::Aborted(error) => format!("{error:#}"),
            Self::Incomplete { errors } => {
                format!("run finished with {errors} error(s); see the log for details")
            }
        }
    }
}

impl From<AppError> for CliError {
    fn from(error: AppError) -> Self {
        if error.is_run_abort() {
            Self::Aborted(error.into())
        } else {
            Self::Setup(error.into())
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Result<Cli> {
        let mut argv = vec!["rd-dropbox"];
        argv.extend_from_slice(args);
        Ok(Cli::try_parse_from(argv)?)
    }

    #[test]
    fn short_flags_match_the_classic_interface() -> Result<()> {
        let cli = parse(&[
            "-d", "db.example", "-u", "rd", "-p", "secret", "-n", "Rivendell3", "-v", "-D",
        ])?;
        assert_eq!(cli.dbhost.as_deref(), Some("db.example"));
        assert_eq!(cli.dbuser.as_deref(), Some("rd"));
        assert_eq!(cli.dbpass.as_deref(), Some("secret"));
        assert_eq!(cli.dbname.as_deref(), Some("Rivendell3"));
        assert!(cli.verbose && cli.debug);
        assert_eq!(cli.output, OutputFormat::Text);
        Ok(())
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        assert!(parse(&["--log-format", "xml"]).is_err());
    }

    #[test]
    fn flags_override_option_file_values() -> Result<()> {
        let temp = TempDir::new()?;
        let file = temp.path().join("my.cnf");
        fs::write(
            &file,
            "[client]\nhost = filehost\nuser = fileuser\npassword = filepass\ndatabase = FileDb\nport = 3307\n",
        )?;
        let path = file.to_string_lossy().into_owned();
        let cli = parse(&["-m", &path, "-d", "flaghost", "--station", "onair-2", "--no-write-probe"])?;

        let settings = settings_from_cli(&cli, Verbosity::Verbose)?;
        assert_eq!(settings.station, "onair-2");
        assert_eq!(settings.database.host, "flaghost");
        assert_eq!(settings.database.user, "fileuser");
        assert_eq!(settings.database.password.as_deref(), Some("filepass"));
        assert_eq!(settings.database.name, "FileDb");
        assert_eq!(settings.database.port, 3307);
        assert!(!settings.reconcile.require_writable_dropbox);
        Ok(())
    }

    #[test]
    fn explicit_missing_option_file_is_a_setup_error() -> Result<()> {
        let temp = TempDir::new()?;
        let missing = temp.path().join("absent.cnf");
        let path = missing.to_string_lossy().into_owned();
        let cli = parse(&["-m", &path, "--station", "onair-1"])?;
        let result = settings_from_cli(&cli, Verbosity::Quiet);
        assert!(matches!(result, Err(ref err) if err.exit_code() == 3));
        Ok(())
    }

    #[test]
    fn exit_codes_distinguish_failure_classes() {
        assert_eq!(CliError::Incomplete { errors: 2 }.exit_code(), 1);
        assert_eq!(CliError::Aborted(anyhow!("db down")).exit_code(), 2);
        assert_eq!(CliError::setup(anyhow!("bad flag")).exit_code(), 3);
        assert!(
            CliError::Incomplete { errors: 2 }
                .display_message()
                .contains("2 error(s)")
        );
    }
}
