#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

//! Process-table access for the dropbox reconciler.
//!
//! Layout: `model.rs` (immutable snapshots), `inventory.rs` (enumeration and
//! termination), `launcher.rs` (locating and starting the supervisor).

pub mod error;
pub mod inventory;
pub mod launcher;
pub mod model;

pub use error::{ProcessError, ProcessResult};
pub use inventory::{ProcessInventory, ProcfsInventory};
pub use launcher::{PathLauncher, SupervisorLauncher};
pub use model::{ProcessEntry, ProcessSnapshot};
