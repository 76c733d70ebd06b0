//! Matching surviving dropboxes to running workers.

use std::collections::BTreeSet;

use rdbox_procs::ProcessSnapshot;
use tracing::{debug, info, warn};

use crate::registry::{DropboxRegistry, WorkerHandle};

/// Outcome of matching the registry against one process snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Correlation {
    /// Pids of workers tied to a dropbox.
    pub matched: BTreeSet<i32>,
    /// Ids of dropboxes with no running worker.
    pub unmatched: Vec<i64>,
    /// Worker pids whose argument vector could not be read.
    pub unreadable: BTreeSet<i32>,
}

impl Correlation {
    /// Whether every surviving dropbox has its own worker.
    ///
    /// This is a count comparison: the number of distinct matched pids
    /// against the number of records.
    #[must_use]
    pub fn fully_matched(&self, registry: &DropboxRegistry) -> bool {
        self.matched.len() == registry.len()
    }

    /// Contribution of this pass to the run's error counter.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.unreadable.len()
    }
}

/// Tie each record to the first worker whose arguments contain its path.
///
/// Only processes named `worker_name` are considered, in snapshot order. An
/// argument must equal the record's path exactly. Records with no match stay
/// in the registry.
pub fn correlate(
    registry: &mut DropboxRegistry,
    snapshot: &ProcessSnapshot,
    worker_name: &str,
) -> Correlation {
    let mut correlation = Correlation::default();

    for record in registry.records_mut() {
        let mut found = None;
        for process in snapshot.named(worker_name) {
            let Some(args) = process.args.as_deref() else {
                if correlation.unreadable.insert(process.pid) {
                    warn!(
                        pid = process.pid,
                        process = %process.name,
                        "unable to read process command line"
                    );
                }
                continue;
            };
            debug!(pid = process.pid, dropbox_id = record.id, ?args, "inspecting worker");
            if process.has_arg(&record.path) {
                found = Some(WorkerHandle {
                    pid: process.pid,
                    name: process.name.clone(),
                });
                break;
            }
        }

        match found {
            Some(worker) => {
                let pid = worker.pid;
                if record.attach_worker(worker) {
                    info!(pid, dropbox_id = record.id, path = %record.path, "found worker for dropbox");
                }
                // A worker attached by an earlier pass keeps its pid.
                if let Some(attached) = record.worker_pid() {
                    correlation.matched.insert(attached);
                }
            }
            None => {
                warn!(
                    dropbox_id = record.id,
                    path = %record.path,
                    "unable to find a running worker for dropbox"
                );
                correlation.unmatched.push(record.id);
            }
        }
    }

    correlation
}
