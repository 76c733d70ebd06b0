#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::redundant_pub_crate)]

//! Command-line entry point for the dropbox reconciler.
//!
//! Layout:
//! - `cli.rs`: argument parsing, settings assembly, and exit codes
//! - `output.rs`: report renderers
//! - `main.rs`: thin entrypoint delegating to `run()`

pub(crate) mod cli;
pub(crate) mod output;

pub use cli::run;
