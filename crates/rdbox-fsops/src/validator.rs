//! Path validation with self-healing side effects.
//!
//! # Design
//! - A dropbox path spec is `<directory>/<pattern>`; the directory is healed,
//!   the pattern is only checked.
//! - Healing is limited to creating a missing directory and repairing its mode.
//!   Anything else is reported and left for an operator.
//! - Every check is idempotent: a healthy path is never mutated (the write
//!   probe removes its sentinel before returning).

use std::io;
use std::path::Path;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backend::{EntryKind, FsBackend, LocalFs};
use crate::error::{FsOpsError, FsOpsResult};

/// File created and removed again to prove a directory is writable.
pub const SENTINEL_NAME: &str = ".rd-dropbox-probe";

const PATH_SYNTAX: &str = r"^(/+\w+)+";
const DROPBOX_PATTERN: &str = r"^([\*\?]|\w+)\.(flac|mp[23]|ogg|wav)$";

/// Which half of a dropbox a directory belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectoryRole {
    /// Directory the worker watches for new media files.
    Dropbox,
    /// Directory holding the worker's log file.
    Log,
}

impl DirectoryRole {
    /// Stable label used in log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dropbox => "dropbox",
            Self::Log => "log",
        }
    }
}

/// Healing action the validator performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Repair {
    /// A missing directory was created.
    Created,
    /// A directory's mode was reset after a permission failure.
    PermissionsRepaired,
}

/// Why a dropbox was removed from the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// The dropbox directory is not a well-formed absolute path.
    PathSyntax,
    /// The dropbox directory could not be created or repaired.
    DirectoryUnavailable,
    /// The dropbox directory failed the write probe.
    DirectoryNotWritable,
    /// The log directory is not a well-formed absolute path.
    LogPathSyntax,
    /// The log directory could not be created or repaired.
    LogDirectoryUnavailable,
    /// The log directory failed the write probe.
    LogDirectoryNotWritable,
    /// The log file is missing, unreachable, or cannot be opened read-write.
    LogFileUnavailable,
}

impl DropReason {
    /// Stable label used in log fields and reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PathSyntax => "path_syntax",
            Self::DirectoryUnavailable => "directory_unavailable",
            Self::DirectoryNotWritable => "directory_not_writable",
            Self::LogPathSyntax => "log_path_syntax",
            Self::LogDirectoryUnavailable => "log_directory_unavailable",
            Self::LogDirectoryNotWritable => "log_directory_not_writable",
            Self::LogFileUnavailable => "log_file_unavailable",
        }
    }
}

/// Problem that is reported but does not remove the dropbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationWarning {
    /// The file pattern is not one of the accepted media globs.
    InvalidPattern,
    /// The dropbox directory failed the write probe while the probe is advisory.
    DirectoryNotWritable,
}

/// Result of validating one dropbox.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DropboxVerdict {
    /// Reason the dropbox was dropped, if it was.
    pub dropped: Option<DropReason>,
    /// Non-fatal problems found along the way.
    pub warnings: Vec<ValidationWarning>,
    /// Healing actions performed.
    pub repairs: Vec<Repair>,
}

impl DropboxVerdict {
    /// Whether the dropbox survives validation.
    #[must_use]
    pub const fn is_operable(&self) -> bool {
        self.dropped.is_none()
    }

    /// Contribution of this dropbox to the run's error counter.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.warnings.len() + usize::from(self.dropped.is_some())
    }
}

enum DirectoryOutcome {
    Ready(Vec<Repair>),
    BadSyntax,
    Unavailable,
    NotWritable(Vec<Repair>),
}

/// Split a path spec into its directory and its final component.
///
/// `"/mnt/drop1/*.wav"` yields `("/mnt/drop1", "*.wav")`; a spec with no `/`
/// yields two empty strings so that the syntax check rejects it.
#[must_use]
pub fn split_path_spec(spec: &str) -> (&str, &str) {
    spec.rsplit_once('/').unwrap_or(("", ""))
}

/// Checks and heals dropbox paths.
#[derive(Debug)]
pub struct PathValidator<B = LocalFs> {
    backend: B,
    path_syntax: Regex,
    pattern: Regex,
    directory_mode: u32,
    require_writable: bool,
}

impl PathValidator<LocalFs> {
    /// Validator over the real filesystem.
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in pattern fails to compile.
    pub fn new(directory_mode: u32, require_writable: bool) -> FsOpsResult<Self> {
        Self::with_backend(LocalFs, directory_mode, require_writable)
    }
}

impl<B: FsBackend> PathValidator<B> {
    /// Validator over an arbitrary backend.
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in pattern fails to compile.
    pub fn with_backend(
        backend: B,
        directory_mode: u32,
        require_writable: bool,
    ) -> FsOpsResult<Self> {
        let compile = |pattern: &'static str| {
            Regex::new(pattern).map_err(|source| FsOpsError::RegexCompile { pattern, source })
        };
        Ok(Self {
            backend,
            path_syntax: compile(PATH_SYNTAX)?,
            pattern: compile(DROPBOX_PATTERN)?,
            directory_mode,
            require_writable,
        })
    }

    /// Whether `dir` starts with one or more `/`-separated word segments.
    #[must_use]
    pub fn path_syntax_ok(&self, dir: &str) -> bool {
        self.path_syntax.is_match(dir)
    }

    /// Whether `base` is an accepted media glob (`*.ext`, `?.ext`, `name.ext`).
    #[must_use]
    pub fn pattern_ok(&self, base: &str) -> bool {
        self.pattern.is_match(base)
    }

    /// Validate one dropbox in order: directory, pattern, log directory, log file.
    ///
    /// Stops at the first condition that drops the dropbox.
    pub fn validate_dropbox(&self, id: i64, path: &str, log_path: &str) -> DropboxVerdict {
        let mut verdict = DropboxVerdict::default();
        let (dir, base) = split_path_spec(path);

        match self.directory_outcome(dir, id, DirectoryRole::Dropbox) {
            DirectoryOutcome::Ready(repairs) => verdict.repairs.extend(repairs),
            DirectoryOutcome::BadSyntax => {
                verdict.dropped = Some(DropReason::PathSyntax);
                return verdict;
            }
            DirectoryOutcome::Unavailable => {
                verdict.dropped = Some(DropReason::DirectoryUnavailable);
                return verdict;
            }
            DirectoryOutcome::NotWritable(repairs) => {
                verdict.repairs.extend(repairs);
                if self.require_writable {
                    verdict.dropped = Some(DropReason::DirectoryNotWritable);
                    return verdict;
                }
                verdict.warnings.push(ValidationWarning::DirectoryNotWritable);
            }
        }

        if !self.check_pattern(base, id) {
            verdict.warnings.push(ValidationWarning::InvalidPattern);
        }

        let (log_dir, _) = split_path_spec(log_path);
        match self.directory_outcome(log_dir, id, DirectoryRole::Log) {
            DirectoryOutcome::Ready(repairs) => verdict.repairs.extend(repairs),
            DirectoryOutcome::BadSyntax => {
                verdict.dropped = Some(DropReason::LogPathSyntax);
                return verdict;
            }
            DirectoryOutcome::Unavailable => {
                verdict.dropped = Some(DropReason::LogDirectoryUnavailable);
                return verdict;
            }
            DirectoryOutcome::NotWritable(repairs) => {
                verdict.repairs.extend(repairs);
                verdict.dropped = Some(DropReason::LogDirectoryNotWritable);
                return verdict;
            }
        }

        match self.inspect_log_file(Path::new(log_path)) {
            Ok(repairs) => {
                info!(dropbox_id = id, log_path, "log file is writable");
                verdict.repairs.extend(repairs);
            }
            Err(err) => {
                warn!(
                    dropbox_id = id,
                    log_path,
                    operation = err.operation(),
                    error = %error_detail(&err),
                    "log file unavailable; correct its ownership and/or permissions"
                );
                verdict.dropped = Some(DropReason::LogFileUnavailable);
            }
        }
        verdict
    }

    /// Check (and heal) a directory, returning whether it is usable.
    ///
    /// A failed write probe only fails a dropbox directory when the probe is
    /// required; it always fails a log directory.
    pub fn check_directory(&self, dir: &str, id: i64, role: DirectoryRole) -> bool {
        match self.directory_outcome(dir, id, role) {
            DirectoryOutcome::Ready(_) => true,
            DirectoryOutcome::BadSyntax | DirectoryOutcome::Unavailable => false,
            DirectoryOutcome::NotWritable(_) => {
                role == DirectoryRole::Dropbox && !self.require_writable
            }
        }
    }

    /// Check the file pattern of a dropbox, logging when it is not accepted.
    pub fn check_pattern(&self, base: &str, id: i64) -> bool {
        let ok = self.pattern_ok(base);
        if !ok {
            warn!(
                dropbox_id = id,
                pattern = base,
                "invalid dropbox file pattern; the worker still runs but may import nothing"
            );
        }
        ok
    }

    /// Check the log file itself, repairing its directory's mode if needed.
    pub fn check_log_file(&self, log_path: &str, id: i64) -> bool {
        match self.inspect_log_file(Path::new(log_path)) {
            Ok(_) => true,
            Err(err) => {
                warn!(
                    dropbox_id = id,
                    log_path,
                    operation = err.operation(),
                    error = %error_detail(&err),
                    "log file unavailable"
                );
                false
            }
        }
    }

    fn directory_outcome(&self, dir: &str, id: i64, role: DirectoryRole) -> DirectoryOutcome {
        if !self.path_syntax_ok(dir) {
            warn!(
                dropbox_id = id,
                role = role.as_str(),
                path = dir,
                "invalid filesystem path"
            );
            return DirectoryOutcome::BadSyntax;
        }

        let path = Path::new(dir);
        let repairs = match self.heal_directory(path) {
            Ok(repairs) => repairs,
            Err(err) => {
                warn!(
                    dropbox_id = id,
                    role = role.as_str(),
                    path = dir,
                    operation = err.operation(),
                    error = %error_detail(&err),
                    "directory unavailable and could not be healed"
                );
                return DirectoryOutcome::Unavailable;
            }
        };
        for repair in &repairs {
            info!(dropbox_id = id, role = role.as_str(), path = dir, ?repair, "healed directory");
        }

        match self.probe_writable(path) {
            Ok(()) => {
                debug!(dropbox_id = id, role = role.as_str(), path = dir, "directory is writable");
                DirectoryOutcome::Ready(repairs)
            }
            Err(err) => {
                warn!(
                    dropbox_id = id,
                    role = role.as_str(),
                    path = dir,
                    operation = err.operation(),
                    error = %error_detail(&err),
                    "unable to create a file in directory; correct its ownership and/or permissions"
                );
                DirectoryOutcome::NotWritable(repairs)
            }
        }
    }

    fn heal_directory(&self, dir: &Path) -> FsOpsResult<Vec<Repair>> {
        match self.backend.stat(dir) {
            Ok(EntryKind::Directory) => Ok(Vec::new()),
            Ok(_) => Err(FsOpsError::invalid(
                "directory",
                "path exists but is not a directory",
                dir.display().to_string(),
            )),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                self.backend
                    .create_dir_all(dir, self.directory_mode)
                    .map_err(|source| FsOpsError::io("create_dir", dir, source))?;
                Ok(vec![Repair::Created])
            }
            Err(err) if err.kind() == io::ErrorKind::PermissionDenied => {
                self.backend
                    .set_mode(dir, self.directory_mode)
                    .map_err(|source| FsOpsError::io("chmod_dir", dir, source))?;
                match self.backend.stat(dir) {
                    Ok(EntryKind::Directory) => Ok(vec![Repair::PermissionsRepaired]),
                    Ok(_) => Err(FsOpsError::invalid(
                        "directory",
                        "path exists but is not a directory",
                        dir.display().to_string(),
                    )),
                    Err(source) => Err(FsOpsError::io("restat_dir", dir, source)),
                }
            }
            Err(source) => Err(FsOpsError::io("stat_dir", dir, source)),
        }
    }

    fn probe_writable(&self, dir: &Path) -> FsOpsResult<()> {
        let sentinel = dir.join(SENTINEL_NAME);
        self.backend
            .create_file(&sentinel)
            .map_err(|source| FsOpsError::io("probe_create", &sentinel, source))?;
        if let Err(err) = self.backend.remove_file(&sentinel) {
            // Creation already proved writability.
            warn!(path = %sentinel.display(), error = %err, "failed to remove write probe");
        }
        Ok(())
    }

    fn inspect_log_file(&self, file: &Path) -> FsOpsResult<Vec<Repair>> {
        let mut repairs = Vec::new();
        match self.backend.stat(file) {
            Ok(EntryKind::File) => {}
            Ok(_) => {
                return Err(FsOpsError::invalid(
                    "log_path",
                    "path exists but is not a regular file",
                    file.display().to_string(),
                ));
            }
            Err(err) if err.kind() == io::ErrorKind::PermissionDenied => {
                // The file cannot be reached; repair the directory, not the file.
                let dir = file.parent().unwrap_or(file);
                self.backend
                    .set_mode(dir, self.directory_mode)
                    .map_err(|source| FsOpsError::io("chmod_log_dir", dir, source))?;
                repairs.push(Repair::PermissionsRepaired);
                match self.backend.stat(file) {
                    Ok(EntryKind::File) => {}
                    Ok(_) => {
                        return Err(FsOpsError::invalid(
                            "log_path",
                            "path exists but is not a regular file",
                            file.display().to_string(),
                        ));
                    }
                    Err(source) => return Err(FsOpsError::io("restat_log", file, source)),
                }
            }
            Err(source) => return Err(FsOpsError::io("stat_log", file, source)),
        }

        self.backend
            .open_read_write(file)
            .map_err(|source| FsOpsError::io("open_log", file, source))?;
        Ok(repairs)
    }
}

fn error_detail(err: &FsOpsError) -> String {
    match err {
        FsOpsError::Io { source, .. } => source.to_string(),
        FsOpsError::InvalidInput { reason, .. } => (*reason).to_string(),
        FsOpsError::RegexCompile { source, .. } => source.to_string(),
    }
}
