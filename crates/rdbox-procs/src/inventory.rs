//! Enumerating and terminating processes.

use std::io;

use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use procfs::ProcError;
use procfs::process::{Process, all_processes};
use tracing::{debug, warn};

use crate::error::{ProcessError, ProcessResult};
use crate::model::{ProcessEntry, ProcessSnapshot};

/// Source of process snapshots and the means to stop a process.
pub trait ProcessInventory: Send + Sync {
    /// Capture the current process table.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Enumerate`] when the table cannot be read at all.
    fn snapshot(&self) -> ProcessResult<ProcessSnapshot>;

    /// Forcibly terminate `pid`.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Terminate`] when the signal cannot be delivered.
    fn terminate(&self, pid: i32) -> ProcessResult<()>;
}

/// Process inventory backed by `/proc`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcfsInventory;

impl ProcfsInventory {
    fn entry(process: &Process) -> Result<ProcessEntry, ProcError> {
        let name = process.stat()?.comm;
        match process.cmdline() {
            Ok(args) => Ok(ProcessEntry::new(process.pid, name, args)),
            Err(err @ ProcError::NotFound(_)) => Err(err),
            Err(err) => {
                debug!(pid = process.pid, error = %err, "process arguments unreadable");
                Ok(ProcessEntry::unreadable(process.pid, name))
            }
        }
    }
}

impl ProcessInventory for ProcfsInventory {
    fn snapshot(&self) -> ProcessResult<ProcessSnapshot> {
        let processes = all_processes().map_err(|err| ProcessError::Enumerate {
            source: io::Error::other(err),
        })?;

        let mut entries = Vec::new();
        for process in processes {
            let process = match process {
                Ok(process) => process,
                Err(ProcError::NotFound(_)) => continue,
                Err(err) => {
                    warn!(error = %err, "skipping unreadable process entry");
                    continue;
                }
            };
            match Self::entry(&process) {
                Ok(entry) => entries.push(entry),
                // Exited between listing and inspection.
                Err(ProcError::NotFound(_)) => {}
                Err(err) => {
                    warn!(pid = process.pid, error = %err, "skipping unreadable process entry");
                }
            }
        }
        entries.sort_by_key(|entry| entry.pid);
        debug!(processes = entries.len(), "captured process table");
        Ok(ProcessSnapshot::new(entries))
    }

    fn terminate(&self, pid: i32) -> ProcessResult<()> {
        kill(Pid::from_raw(pid), Signal::SIGKILL).map_err(|errno| ProcessError::Terminate {
            pid,
            source: io::Error::from(errno),
        })
    }
}
