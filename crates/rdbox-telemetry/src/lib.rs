#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

//! Logging primitives shared across the rd-dropbox workspace.
//!
//! Layout: `init.rs` (subscriber installation and build identifier),
//! `context.rs` (run-scoped span), `error.rs` (telemetry errors).

pub mod context;
pub mod error;
pub mod init;

pub use context::run_span;
pub use error::{TelemetryError, TelemetryResult};
pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_sha, init_logging};
