//! Locating and starting the supervisor daemon.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{ProcessError, ProcessResult};

/// Starts the supervisor once the reconciler decides it must be relaunched.
#[async_trait]
pub trait SupervisorLauncher: Send + Sync {
    /// Resolve `name` against the executable search path.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::ExecutableNotFound`] when no candidate exists.
    fn locate(&self, name: &str) -> ProcessResult<PathBuf>;

    /// Run the executable at `path` and wait for it to exit.
    ///
    /// The supervisor daemonizes itself, so a clean exit means the launch
    /// succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Launch`] when spawning fails and
    /// [`ProcessError::LaunchStatus`] on an unsuccessful exit.
    async fn launch(&self, path: &Path) -> ProcessResult<()>;
}

/// Launcher that searches `PATH` and spawns the executable directly.
#[derive(Debug, Clone, Default)]
pub struct PathLauncher {
    search_path: Option<String>,
}

impl PathLauncher {
    /// Launcher that searches the process `PATH`.
    #[must_use]
    pub const fn new() -> Self {
        Self { search_path: None }
    }

    /// Launcher that searches the given colon-separated path list instead.
    #[must_use]
    pub fn with_search_path(search_path: impl Into<String>) -> Self {
        Self {
            search_path: Some(search_path.into()),
        }
    }
}

#[async_trait]
impl SupervisorLauncher for PathLauncher {
    fn locate(&self, name: &str) -> ProcessResult<PathBuf> {
        let found = match &self.search_path {
            Some(paths) => {
                let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
                which::which_in(name, Some(paths), cwd)
            }
            None => which::which(name),
        };
        found.map_err(|err| {
            debug!(executable = name, error = %err, "executable lookup failed");
            ProcessError::ExecutableNotFound {
                name: name.to_string(),
            }
        })
    }

    async fn launch(&self, path: &Path) -> ProcessResult<()> {
        info!(executable = %path.display(), "launching supervisor");
        let status = Command::new(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|source| ProcessError::Launch {
                path: path.to_path_buf(),
                source,
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(ProcessError::LaunchStatus {
                path: path.to_path_buf(),
                code: status.code(),
            })
        }
    }
}
