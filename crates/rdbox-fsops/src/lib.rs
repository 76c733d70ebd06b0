#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

//! Filesystem preconditions for dropboxes: path syntax, directory healing,
//! writability probing, and log-file checks.
//!
//! Layout: `backend.rs` (filesystem seam), `validator.rs` (`PathValidator`),
//! `error.rs` (structured errors).

pub mod backend;
pub mod error;
pub mod validator;

pub use backend::{EntryKind, FsBackend, LocalFs};
pub use error::{FsOpsError, FsOpsResult};
pub use validator::{
    DirectoryRole, DropReason, DropboxVerdict, PathValidator, Repair, SENTINEL_NAME,
    ValidationWarning, split_path_spec,
};
