//! Filesystem seam used by the path validator.
//!
//! Every mutation the validator may perform goes through [`FsBackend`], so a
//! test can count healing attempts or make a single syscall fail.

use std::fs::{self, DirBuilder, OpenOptions};
use std::io;
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt, PermissionsExt};
use std::path::Path;

/// Mode used for the writability sentinel file.
const SENTINEL_MODE: u32 = 0o644;

/// Kind of filesystem entry found by [`FsBackend::stat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A directory.
    Directory,
    /// A regular file.
    File,
    /// Anything else (socket, fifo, device).
    Other,
}

/// Primitive filesystem operations required by the validator.
pub trait FsBackend {
    /// Inspect `path`, following symlinks.
    ///
    /// # Errors
    ///
    /// Propagates the underlying `stat(2)` failure.
    fn stat(&self, path: &Path) -> io::Result<EntryKind>;

    /// Create `path` and any missing parents with `mode`.
    ///
    /// # Errors
    ///
    /// Propagates the underlying `mkdir(2)` failure.
    fn create_dir_all(&self, path: &Path, mode: u32) -> io::Result<()>;

    /// Replace the permission bits of `path` with `mode`.
    ///
    /// # Errors
    ///
    /// Propagates the underlying `chmod(2)` failure.
    fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()>;

    /// Create (or truncate) a file at `path` opened read-write.
    ///
    /// # Errors
    ///
    /// Propagates the underlying `open(2)` failure.
    fn create_file(&self, path: &Path) -> io::Result<()>;

    /// Remove the file at `path`.
    ///
    /// # Errors
    ///
    /// Propagates the underlying `unlink(2)` failure.
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Open an existing file read-write and close it again.
    ///
    /// # Errors
    ///
    /// Propagates the underlying `open(2)` failure.
    fn open_read_write(&self, path: &Path) -> io::Result<()>;
}

impl<T: FsBackend + ?Sized> FsBackend for &T {
    fn stat(&self, path: &Path) -> io::Result<EntryKind> {
        (**self).stat(path)
    }

    fn create_dir_all(&self, path: &Path, mode: u32) -> io::Result<()> {
        (**self).create_dir_all(path, mode)
    }

    fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()> {
        (**self).set_mode(path, mode)
    }

    fn create_file(&self, path: &Path) -> io::Result<()> {
        (**self).create_file(path)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        (**self).remove_file(path)
    }

    fn open_read_write(&self, path: &Path) -> io::Result<()> {
        (**self).open_read_write(path)
    }
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl FsBackend for LocalFs {
    fn stat(&self, path: &Path) -> io::Result<EntryKind> {
        let metadata = fs::metadata(path)?;
        let kind = if metadata.is_dir() {
            EntryKind::Directory
        } else if metadata.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        };
        Ok(kind)
    }

    fn create_dir_all(&self, path: &Path, mode: u32) -> io::Result<()> {
        DirBuilder::new().recursive(true).mode(mode).create(path)
    }

    fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()> {
        fs::set_permissions(path, fs::Permissions::from_mode(mode))
    }

    fn create_file(&self, path: &Path) -> io::Result<()> {
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .mode(SENTINEL_MODE)
            .open(path)
            .map(drop)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn open_read_write(&self, path: &Path) -> io::Result<()> {
        OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::TempDir;

    #[test]
    fn local_fs_reports_entry_kinds() -> Result<()> {
        let temp = TempDir::new()?;
        let file = temp.path().join("file.log");
        fs::write(&file, b"")?;

        assert_eq!(LocalFs.stat(temp.path())?, EntryKind::Directory);
        assert_eq!(LocalFs.stat(&file)?, EntryKind::File);
        let missing = LocalFs.stat(&temp.path().join("missing"));
        assert!(matches!(missing, Err(err) if err.kind() == io::ErrorKind::NotFound));
        Ok(())
    }

    #[test]
    fn local_fs_creates_nested_directories_with_mode() -> Result<()> {
        let temp = TempDir::new()?;
        let nested = temp.path().join("a").join("b");
        LocalFs.create_dir_all(&nested, 0o755)?;
        assert!(nested.is_dir());

        LocalFs.set_mode(&nested, 0o700)?;
        let mode = fs::metadata(&nested)?.permissions().mode() & 0o7777;
        assert_eq!(mode, 0o700);
        Ok(())
    }

    #[test]
    fn local_fs_sentinel_round_trip_leaves_nothing_behind() -> Result<()> {
        let temp = TempDir::new()?;
        let sentinel = temp.path().join(".probe");
        LocalFs.create_file(&sentinel)?;
        LocalFs.open_read_write(&sentinel)?;
        LocalFs.remove_file(&sentinel)?;
        assert!(!sentinel.exists());
        Ok(())
    }
}
