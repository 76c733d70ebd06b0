//! One reconciliation pass over a station's dropboxes.
//!
//! # Design
//! - The run is a fixed sequence of phases; every phase entered is recorded
//!   in the report so callers can see how far the run went.
//! - Healing and remediation are best effort and feed the error count; only
//!   the conditions in [`ReconcileError`] stop a run.
//! - Collaborators are injected as trait objects so tests can script the
//!   database, the process table, and the supervisor launcher.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rdbox_config::ReconcileSettings;
use rdbox_config::defaults::SETTLE_DELAY;
use rdbox_data::{DropboxDefinition, DropboxStore};
use rdbox_fsops::{DropReason, FsBackend, LocalFs, PathValidator, Repair, ValidationWarning};
use rdbox_procs::{ProcessInventory, ProcessSnapshot, SupervisorLauncher};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::correlator::correlate;
use crate::error::ReconcileError;
use crate::registry::DropboxRegistry;

/// Where dropbox definitions come from.
#[async_trait]
pub trait DropboxSource: Send + Sync {
    /// All dropboxes configured for `station`.
    async fn list_dropboxes(&self, station: &str) -> anyhow::Result<Vec<DropboxDefinition>>;
}

#[async_trait]
impl DropboxSource for DropboxStore {
    async fn list_dropboxes(&self, station: &str) -> anyhow::Result<Vec<DropboxDefinition>> {
        let count = self.count_dropboxes(station).await?;
        info!(station, count, "found dropboxes");
        Ok(Self::list_dropboxes(self, station).await?)
    }
}

/// Step of the reconciliation state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Fetch the station's dropbox definitions.
    Load,
    /// Check and heal every dropbox, dropping the inoperable ones.
    Validate,
    /// Match surviving dropboxes to running workers.
    Correlate,
    /// Every surviving dropbox has a worker.
    FullyMatched,
    /// At least one dropbox lacks a worker.
    NeedsRemediation,
    /// Kill the matched workers.
    StopWorkers,
    /// Kill every supervisor process.
    StopSupervisor,
    /// Give a service manager the chance to restart the supervisor.
    Wait,
    /// Look for a supervisor again.
    RecheckSupervisor,
    /// A supervisor came back without our help.
    Confirmed,
    /// Start the supervisor ourselves.
    RelaunchSupervisor,
    /// The run finished.
    Done,
}

impl Phase {
    /// Stable label used in log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Validate => "validate",
            Self::Correlate => "correlate",
            Self::FullyMatched => "fully_matched",
            Self::NeedsRemediation => "needs_remediation",
            Self::StopWorkers => "stop_workers",
            Self::StopSupervisor => "stop_supervisor",
            Self::Wait => "wait",
            Self::RecheckSupervisor => "recheck_supervisor",
            Self::Confirmed => "confirmed",
            Self::RelaunchSupervisor => "relaunch_supervisor",
            Self::Done => "done",
        }
    }
}

/// How a completed run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// No remediation was needed.
    FullyMatched,
    /// The supervisor was restarted by something else during the wait.
    Confirmed,
    /// The supervisor was launched by this run.
    Relaunched,
    /// Launching the supervisor failed.
    RelaunchFailed,
}

impl Outcome {
    /// Stable label used in log fields and summaries.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FullyMatched => "fully_matched",
            Self::Confirmed => "confirmed",
            Self::Relaunched => "relaunched",
            Self::RelaunchFailed => "relaunch_failed",
        }
    }
}

/// A dropbox removed during validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedDropbox {
    /// Dropbox id.
    pub id: i64,
    /// Configured path spec.
    pub path: String,
    /// Why it was removed.
    pub reason: DropReason,
}

/// A non-fatal validation problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DropboxWarning {
    /// Dropbox id.
    pub id: i64,
    /// What was wrong.
    pub warning: ValidationWarning,
}

/// A healing action taken during validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DropboxRepair {
    /// Dropbox id.
    pub id: i64,
    /// What was repaired.
    pub repair: Repair,
}

/// Everything a completed run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Station that was reconciled.
    pub station: String,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: DateTime<Utc>,
    /// Phases entered, in order.
    pub phases: Vec<Phase>,
    /// Dropboxes removed during validation.
    pub dropped: Vec<DroppedDropbox>,
    /// Non-fatal validation problems.
    pub warnings: Vec<DropboxWarning>,
    /// Healing actions taken.
    pub repairs: Vec<DropboxRepair>,
    /// Worker pids tied to a dropbox.
    pub matched_pids: BTreeSet<i32>,
    /// Ids of surviving dropboxes with no worker.
    pub unmatched: Vec<i64>,
    /// Pids successfully terminated during remediation.
    pub terminated: Vec<i32>,
    /// Failures counted along the way.
    pub error_count: usize,
    /// How the run ended.
    pub outcome: Outcome,
}

impl RunReport {
    fn started(station: &str) -> Self {
        Self {
            station: station.to_string(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            phases: Vec::new(),
            dropped: Vec::new(),
            warnings: Vec::new(),
            repairs: Vec::new(),
            matched_pids: BTreeSet::new(),
            unmatched: Vec::new(),
            terminated: Vec::new(),
            error_count: 0,
            outcome: Outcome::FullyMatched,
        }
    }

    fn enter(&mut self, phase: Phase) {
        debug!(phase = phase.as_str(), "entering phase");
        self.phases.push(phase);
    }

    /// Whether the run finished with nothing to report.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.error_count == 0
    }

    /// Whether any remediation was attempted.
    #[must_use]
    pub fn remediated(&self) -> bool {
        self.phases.contains(&Phase::NeedsRemediation)
    }
}

/// Runs the reconciliation state machine against injected collaborators.
pub struct Reconciler<B = LocalFs> {
    source: Arc<dyn DropboxSource>,
    inventory: Arc<dyn ProcessInventory>,
    launcher: Arc<dyn SupervisorLauncher>,
    validator: PathValidator<B>,
    settings: ReconcileSettings,
}

impl<B: FsBackend> Reconciler<B> {
    /// Assemble a reconciler.
    #[must_use]
    pub fn new(
        source: Arc<dyn DropboxSource>,
        inventory: Arc<dyn ProcessInventory>,
        launcher: Arc<dyn SupervisorLauncher>,
        validator: PathValidator<B>,
        settings: ReconcileSettings,
    ) -> Self {
        Self {
            source,
            inventory,
            launcher,
            validator,
            settings,
        }
    }

    /// Reconcile every dropbox configured for `station`.
    ///
    /// # Errors
    ///
    /// Returns an error when the definitions cannot be fetched, when the
    /// process table cannot be read for correlation, or when a needed
    /// supervisor relaunch finds no executable. Everything else, including a
    /// process-table read failing once remediation has begun, is counted in
    /// the report.
    pub async fn run(&self, station: &str) -> Result<RunReport, ReconcileError> {
        let mut report = RunReport::started(station);

        report.enter(Phase::Load);
        let definitions = self.source.list_dropboxes(station).await.map_err(|err| {
            ReconcileError::DropboxSource {
                station: station.to_string(),
                source: err.into(),
            }
        })?;
        let mut registry = DropboxRegistry::from_definitions(definitions);
        info!(station, dropboxes = registry.len(), "loaded dropboxes");
        registry.dump("loaded");

        report.enter(Phase::Validate);
        self.validate(&mut registry, &mut report);
        registry.dump("validated");

        report.enter(Phase::Correlate);
        let snapshot = self.correlation_snapshot()?;
        let correlation = correlate(&mut registry, &snapshot, &self.settings.worker_executable);
        report.error_count += correlation.error_count();
        let fully_matched = correlation.fully_matched(&registry);
        report.matched_pids = correlation.matched;
        report.unmatched = correlation.unmatched;
        registry.dump("correlated");

        if fully_matched {
            report.enter(Phase::FullyMatched);
            info!(
                station,
                dropboxes = registry.len(),
                "all available dropboxes are running"
            );
            report.outcome = Outcome::FullyMatched;
        } else {
            report.enter(Phase::NeedsRemediation);
            warn!(
                station,
                dropboxes = registry.len(),
                workers = report.matched_pids.len(),
                "missing one or more workers; restarting the supervisor"
            );
            let outcome = self.remediate(&mut report).await?;
            report.outcome = outcome;
        }

        report.enter(Phase::Done);
        report.finished_at = Utc::now();
        info!(
            station,
            outcome = report.outcome.as_str(),
            errors = report.error_count,
            "reconciliation finished"
        );
        Ok(report)
    }

    fn validate(&self, registry: &mut DropboxRegistry, report: &mut RunReport) {
        let removed = registry.retain_with(|record| {
            let verdict = self
                .validator
                .validate_dropbox(record.id, &record.path, &record.log_path);
            report.error_count += verdict.error_count();
            report.warnings.extend(verdict.warnings.iter().map(|warning| DropboxWarning {
                id: record.id,
                warning: *warning,
            }));
            report.repairs.extend(verdict.repairs.iter().map(|repair| DropboxRepair {
                id: record.id,
                repair: *repair,
            }));
            if let Some(reason) = verdict.dropped {
                report.dropped.push(DroppedDropbox {
                    id: record.id,
                    path: record.path.clone(),
                    reason,
                });
            }
            verdict.is_operable()
        });
        if !removed.is_empty() {
            warn!(
                dropped = removed.len(),
                remaining = registry.len(),
                "dropboxes removed during validation; correct them to have working dropboxes"
            );
        }
    }

    async fn remediate(&self, report: &mut RunReport) -> Result<Outcome, ReconcileError> {
        report.enter(Phase::StopWorkers);
        let workers: Vec<i32> = report.matched_pids.iter().copied().collect();
        for pid in workers {
            self.terminate(pid, "worker", report);
        }

        report.enter(Phase::StopSupervisor);
        let supervisor = self.settings.supervisor_executable.as_str();
        match self.inventory.snapshot() {
            Ok(snapshot) => {
                for process in snapshot.named(supervisor) {
                    self.terminate(process.pid, "supervisor", report);
                }
            }
            Err(err) => {
                warn!(
                    phase = Phase::StopSupervisor.as_str(),
                    error = %err,
                    "cannot read the process table; supervisor left running"
                );
                report.error_count += 1;
            }
        }

        report.enter(Phase::Wait);
        debug!(delay_secs = SETTLE_DELAY.as_secs(), "waiting for the supervisor to settle");
        tokio::time::sleep(SETTLE_DELAY).await;

        report.enter(Phase::RecheckSupervisor);
        match self.inventory.snapshot() {
            Ok(snapshot) if snapshot.contains_name(supervisor) => {
                report.enter(Phase::Confirmed);
                info!(supervisor, "supervisor was restarted for us");
                return Ok(Outcome::Confirmed);
            }
            Ok(_) => {}
            Err(err) => {
                warn!(
                    phase = Phase::RecheckSupervisor.as_str(),
                    error = %err,
                    "cannot read the process table; relaunching the supervisor"
                );
                report.error_count += 1;
            }
        }

        report.enter(Phase::RelaunchSupervisor);
        let path = self.launcher.locate(supervisor).map_err(|source| {
            error!(supervisor, "cannot find the supervisor executable on the search path");
            ReconcileError::SupervisorNotFound {
                name: supervisor.to_string(),
                source,
            }
        })?;
        match self.launcher.launch(&path).await {
            Ok(()) => {
                info!(executable = %path.display(), "started the supervisor");
                Ok(Outcome::Relaunched)
            }
            Err(err) => {
                error!(executable = %path.display(), error = %err, "could not launch the supervisor");
                report.error_count += 1;
                Ok(Outcome::RelaunchFailed)
            }
        }
    }

    fn terminate(&self, pid: i32, role: &'static str, report: &mut RunReport) {
        info!(pid, role, "terminating process");
        match self.inventory.terminate(pid) {
            Ok(()) => report.terminated.push(pid),
            Err(err) => {
                warn!(pid, role, error = %err, "failed to terminate process");
                report.error_count += 1;
            }
        }
    }

    fn correlation_snapshot(&self) -> Result<ProcessSnapshot, ReconcileError> {
        self.inventory.snapshot().map_err(|source| {
            error!(error = %source, "cannot read the process table");
            ReconcileError::Inventory {
                phase: Phase::Correlate,
                source,
            }
        })
    }
}
