//! On-disk dropbox fixtures.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

/// Paths of one dropbox laid out under a [`DropboxTree`].
#[derive(Debug, Clone)]
pub struct DropboxPaths {
    /// Configured path spec (`<dir>/<pattern>`), as stored in the database.
    pub path: String,
    /// Configured log path.
    pub log_path: String,
    /// Watched directory.
    pub directory: PathBuf,
    /// Log file.
    pub log_file: PathBuf,
}

/// Temporary root under which dropbox directories and logs are created.
pub struct DropboxTree {
    temp: TempDir,
}

impl DropboxTree {
    /// Create an empty tree.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created.
    pub fn new() -> Result<Self> {
        let temp = tempfile::Builder::new()
            .prefix("rdbox-")
            .tempdir()
            .context("failed to create dropbox fixture root")?;
        Ok(Self { temp })
    }

    /// Root directory of the tree.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    /// Lay out paths for a dropbox named `name` without touching the disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the fixture root is not valid UTF-8.
    pub fn planned(&self, name: &str, pattern: &str) -> Result<DropboxPaths> {
        let directory = self.root().join("drop").join(name);
        let log_file = self.root().join("log").join(format!("{name}.log"));
        let path = directory
            .join(pattern)
            .to_str()
            .context("fixture path is not utf-8")?
            .to_string();
        let log_path = log_file
            .to_str()
            .context("fixture log path is not utf-8")?
            .to_string();
        Ok(DropboxPaths {
            path,
            log_path,
            directory,
            log_file,
        })
    }

    /// Create a dropbox whose directory, log directory, and log file all exist.
    ///
    /// # Errors
    ///
    /// Returns an error if any part of the layout cannot be created.
    pub fn healthy(&self, name: &str, pattern: &str) -> Result<DropboxPaths> {
        let paths = self.planned(name, pattern)?;
        fs::create_dir_all(&paths.directory)
            .with_context(|| format!("failed to create {}", paths.directory.display()))?;
        if let Some(parent) = paths.log_file.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&paths.log_file, b"")
            .with_context(|| format!("failed to create {}", paths.log_file.display()))?;
        Ok(paths)
    }
}

/// Sorted names of the entries in `dir`.
///
/// # Errors
///
/// Returns an error if the directory cannot be listed.
pub fn entry_names(dir: &Path) -> Result<Vec<String>> {
    let mut names = fs::read_dir(dir)
        .with_context(|| format!("failed to list {}", dir.display()))?
        .map(|entry| entry.map(|entry| entry.file_name().to_string_lossy().into_owned()))
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("failed to read entry in {}", dir.display()))?;
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_dropbox_creates_directory_and_log() -> Result<()> {
        let tree = DropboxTree::new()?;
        let paths = tree.healthy("drop1", "*.wav")?;
        assert!(paths.directory.is_dir());
        assert!(paths.log_file.is_file());
        assert!(paths.path.ends_with("/drop/drop1/*.wav"));
        assert!(entry_names(&paths.directory)?.is_empty());
        Ok(())
    }

    #[test]
    fn planned_dropbox_touches_nothing() -> Result<()> {
        let tree = DropboxTree::new()?;
        let paths = tree.planned("drop2", "*.mp3")?;
        assert!(!paths.directory.exists());
        assert!(!paths.log_file.exists());
        Ok(())
    }
}
