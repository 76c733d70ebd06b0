#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

//! Dropbox reconciliation engine.
//!
//! Layout: `registry.rs` (per-run working set), `correlator.rs` (dropbox to
//! worker matching), `orchestrator.rs` (the run state machine),
//! `bootstrap.rs` (production wiring).

/// Production wiring for one run.
pub mod bootstrap;
/// Dropbox to worker-process matching.
pub mod correlator;
/// Application-level errors.
pub mod error;
/// Run state machine and report.
pub mod orchestrator;
/// Per-run dropbox working set.
pub mod registry;

pub use bootstrap::run_reconcile;
pub use correlator::{Correlation, correlate};
pub use error::{AppError, AppResult, ReconcileError};
pub use orchestrator::{
    DropboxSource, DroppedDropbox, DropboxRepair, DropboxWarning, Outcome, Phase, Reconciler,
    RunReport,
};
pub use registry::{DropboxRecord, DropboxRegistry, WorkerHandle};

pub use rdbox_fsops::{DropReason, Repair, ValidationWarning};
