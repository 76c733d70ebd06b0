#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

//! Run settings for the dropbox reconciler.
//!
//! Layout: `model.rs` (typed settings), `mycnf.rs` (MySQL option-file
//! credentials), `validate.rs` (pre-run validation), `defaults.rs` (constants).

pub mod defaults;
pub mod error;
pub mod model;
pub mod mycnf;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use model::{DatabaseOverrides, DatabaseSettings, ReconcileSettings, RunSettings, Verbosity};
pub use mycnf::{ClientOptions, default_option_file, load_client_options};
pub use validate::validate_run_settings;
