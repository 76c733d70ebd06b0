use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use rdbox_app::{DropboxSource, Outcome, Reconciler};
use rdbox_config::ReconcileSettings;
use rdbox_data::DropboxDefinition;
use rdbox_fsops::{DropReason, PathValidator, Repair, SENTINEL_NAME};
use rdbox_procs::{
    ProcessEntry, ProcessError, ProcessInventory, ProcessResult, ProcessSnapshot,
    SupervisorLauncher,
};
use rdbox_test_support::fixtures::{DropboxPaths, DropboxTree, entry_names};

struct StaticSource(Vec<DropboxDefinition>);

#[async_trait]
impl DropboxSource for StaticSource {
    async fn list_dropboxes(&self, _station: &str) -> anyhow::Result<Vec<DropboxDefinition>> {
        Ok(self.0.clone())
    }
}

struct StaticInventory {
    processes: Vec<ProcessEntry>,
    terminated: Mutex<Vec<i32>>,
}

impl StaticInventory {
    fn new(processes: Vec<ProcessEntry>) -> Self {
        Self {
            processes,
            terminated: Mutex::new(Vec::new()),
        }
    }
}

impl ProcessInventory for StaticInventory {
    fn snapshot(&self) -> ProcessResult<ProcessSnapshot> {
        Ok(ProcessSnapshot::new(self.processes.clone()))
    }

    fn terminate(&self, pid: i32) -> ProcessResult<()> {
        if let Ok(mut terminated) = self.terminated.lock() {
            terminated.push(pid);
        }
        Ok(())
    }
}

struct NoLauncher;

#[async_trait]
impl SupervisorLauncher for NoLauncher {
    fn locate(&self, name: &str) -> ProcessResult<PathBuf> {
        Err(ProcessError::ExecutableNotFound {
            name: name.to_string(),
        })
    }

    async fn launch(&self, _path: &Path) -> ProcessResult<()> {
        Ok(())
    }
}

fn definition(id: i64, paths: &DropboxPaths) -> DropboxDefinition {
    DropboxDefinition {
        id,
        path: paths.path.clone(),
        log_path: paths.log_path.clone(),
    }
}

fn worker_for(pid: i32, paths: &DropboxPaths) -> ProcessEntry {
    ProcessEntry::new(
        pid,
        "rdimport",
        vec![
            "rdimport".to_string(),
            "--drop-box".to_string(),
            format!("--log-filename={}", paths.log_path),
            "MUSIC".to_string(),
            paths.path.clone(),
        ],
    )
}

fn reconciler(
    definitions: Vec<DropboxDefinition>,
    inventory: Arc<StaticInventory>,
) -> Result<Reconciler> {
    let settings = ReconcileSettings::default();
    let validator = PathValidator::new(
        settings.directory_mode,
        settings.require_writable_dropbox,
    )?;
    Ok(Reconciler::new(
        Arc::new(StaticSource(definitions)),
        inventory,
        Arc::new(NoLauncher),
        validator,
        settings,
    ))
}

#[tokio::test]
async fn healthy_dropbox_with_worker_is_left_untouched() -> Result<()> {
    let tree = DropboxTree::new()?;
    let drop1 = tree.healthy("drop1", "*.wav")?;
    let inventory = Arc::new(StaticInventory::new(vec![worker_for(100, &drop1)]));

    let report = reconciler(vec![definition(1, &drop1)], Arc::clone(&inventory))?
        .run("onair-1")
        .await?;

    assert_eq!(report.outcome, Outcome::FullyMatched);
    assert_eq!(report.error_count, 0);
    assert!(report.repairs.is_empty());
    assert!(entry_names(&drop1.directory)?.is_empty());
    assert!(
        !drop1.directory.join(SENTINEL_NAME).exists(),
        "write probe must clean up after itself"
    );
    assert!(inventory.terminated.lock().map(|t| t.is_empty()).unwrap_or(false));
    Ok(())
}

#[tokio::test]
async fn missing_directories_are_created_and_missing_log_file_drops_the_dropbox() -> Result<()> {
    let tree = DropboxTree::new()?;
    let drop2 = tree.planned("drop2", "*.mp3")?;
    let inventory = Arc::new(StaticInventory::new(Vec::new()));

    let report = reconciler(vec![definition(2, &drop2)], inventory)?
        .run("onair-1")
        .await?;

    assert!(drop2.directory.is_dir());
    assert!(drop2.log_file.parent().is_some_and(Path::is_dir));
    assert_eq!(report.repairs.len(), 2);
    assert!(report.repairs.iter().all(|repair| repair.repair == Repair::Created));
    assert_eq!(report.dropped.len(), 1);
    assert_eq!(report.dropped[0].reason, DropReason::LogFileUnavailable);
    assert_eq!(report.error_count, 1);
    // Nothing survived, so nothing needed a worker.
    assert_eq!(report.outcome, Outcome::FullyMatched);
    Ok(())
}
