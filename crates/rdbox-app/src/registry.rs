//! Working set of dropboxes for one run.

use rdbox_data::DropboxDefinition;
use serde::Serialize;
use tracing::{debug, info};

/// Worker process tied to a dropbox for the duration of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerHandle {
    /// Worker process id.
    pub pid: i32,
    /// Process name as reported by the process table.
    pub name: String,
}

/// One configured dropbox being reconciled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DropboxRecord {
    /// Row identifier from the definition store.
    pub id: i64,
    /// Path spec: watched directory plus file pattern.
    pub path: String,
    /// Worker log file.
    pub log_path: String,
    worker: Option<WorkerHandle>,
}

impl DropboxRecord {
    /// Record with no worker attached yet.
    #[must_use]
    pub fn new(id: i64, path: impl Into<String>, log_path: impl Into<String>) -> Self {
        Self {
            id,
            path: path.into(),
            log_path: log_path.into(),
            worker: None,
        }
    }

    /// Attach the matched worker. Only the first attachment sticks.
    ///
    /// Returns `false` when a worker was already attached.
    pub fn attach_worker(&mut self, worker: WorkerHandle) -> bool {
        if self.worker.is_some() {
            return false;
        }
        self.worker = Some(worker);
        true
    }

    /// Matched worker, if any.
    #[must_use]
    pub const fn worker(&self) -> Option<&WorkerHandle> {
        self.worker.as_ref()
    }

    /// Pid of the matched worker, if any.
    #[must_use]
    pub fn worker_pid(&self) -> Option<i32> {
        self.worker.as_ref().map(|worker| worker.pid)
    }
}

impl From<DropboxDefinition> for DropboxRecord {
    fn from(definition: DropboxDefinition) -> Self {
        Self::new(definition.id, definition.path, definition.log_path)
    }
}

/// Ordered working set of dropboxes for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DropboxRegistry {
    records: Vec<DropboxRecord>,
}

impl DropboxRegistry {
    /// Registry holding `records` in the given order.
    #[must_use]
    pub const fn new(records: Vec<DropboxRecord>) -> Self {
        Self { records }
    }

    /// Registry built from store rows, preserving their order.
    #[must_use]
    pub fn from_definitions(definitions: Vec<DropboxDefinition>) -> Self {
        Self::new(definitions.into_iter().map(DropboxRecord::from).collect())
    }

    /// Number of records still under consideration.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether every record has been removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in order.
    #[must_use]
    pub fn records(&self) -> &[DropboxRecord] {
        &self.records
    }

    /// Mutable access for in-place correlation updates.
    pub fn records_mut(&mut self) -> &mut [DropboxRecord] {
        &mut self.records
    }

    /// Visit every record exactly once, keeping those for which `keep`
    /// returns `true`.
    ///
    /// Survivors keep their relative order. Removed records are returned in
    /// their original order.
    pub fn retain_with<F>(&mut self, mut keep: F) -> Vec<DropboxRecord>
    where
        F: FnMut(&DropboxRecord) -> bool,
    {
        let (survivors, removed): (Vec<_>, Vec<_>) = std::mem::take(&mut self.records)
            .into_iter()
            .partition(|record| keep(record));
        self.records = survivors;
        for record in &removed {
            info!(
                dropbox_id = record.id,
                path = %record.path,
                "removing dropbox from consideration"
            );
        }
        removed
    }

    /// Remove the record at `index`, shifting later records down.
    pub fn remove_at(&mut self, index: usize) -> Option<DropboxRecord> {
        if index >= self.records.len() {
            return None;
        }
        let record = self.records.remove(index);
        info!(
            dropbox_id = record.id,
            path = %record.path,
            "removing dropbox from consideration"
        );
        Some(record)
    }

    /// Log the whole working set at debug level.
    pub fn dump(&self, stage: &'static str) {
        debug!(stage, records = ?self.records, "dropbox registry");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(count: i64) -> DropboxRegistry {
        DropboxRegistry::new(
            (1..=count)
                .map(|id| {
                    DropboxRecord::new(
                        id,
                        format!("/mnt/drop{id}/*.wav"),
                        format!("/var/log/drop{id}.log"),
                    )
                })
                .collect(),
        )
    }

    #[test]
    fn retain_visits_each_record_once_when_all_are_removed() {
        for size in 0..=7 {
            let mut registry = registry(size);
            let mut visited = Vec::new();
            let removed = registry.retain_with(|record| {
                visited.push(record.id);
                false
            });
            assert_eq!(visited, (1..=size).collect::<Vec<_>>());
            assert_eq!(removed.len(), usize::try_from(size).unwrap_or_default());
            assert!(registry.is_empty());
        }
    }

    #[test]
    fn retain_keeps_survivors_in_order() {
        let mut registry = registry(6);
        let removed = registry.retain_with(|record| record.id % 2 == 0);
        let kept: Vec<i64> = registry.records().iter().map(|record| record.id).collect();
        let gone: Vec<i64> = removed.iter().map(|record| record.id).collect();
        assert_eq!(kept, vec![2, 4, 6]);
        assert_eq!(gone, vec![1, 3, 5]);
    }

    #[test]
    fn descending_remove_at_never_skips_records() {
        let mut registry = registry(5);
        let mut removed = Vec::new();
        for index in (0..registry.len()).rev() {
            if let Some(record) = registry.remove_at(index) {
                removed.push(record.id);
            }
        }
        assert_eq!(removed, vec![5, 4, 3, 2, 1]);
        assert!(registry.is_empty());
        assert!(registry.remove_at(0).is_none());
    }

    #[test]
    fn worker_attaches_at_most_once() {
        let mut record = DropboxRecord::new(1, "/mnt/drop1/*.wav", "/var/log/drop1.log");
        assert!(record.worker_pid().is_none());
        assert!(record.attach_worker(WorkerHandle {
            pid: 40,
            name: "rdimport".to_string(),
        }));
        assert!(!record.attach_worker(WorkerHandle {
            pid: 41,
            name: "rdimport".to_string(),
        }));
        assert_eq!(record.worker_pid(), Some(40));
    }

    #[test]
    fn definitions_become_unmatched_records() {
        let registry = DropboxRegistry::from_definitions(vec![DropboxDefinition {
            id: 9,
            path: "/mnt/drop9/*.ogg".to_string(),
            log_path: "/var/log/drop9.log".to_string(),
        }]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.records()[0].id, 9);
        assert!(registry.records()[0].worker().is_none());
    }
}
