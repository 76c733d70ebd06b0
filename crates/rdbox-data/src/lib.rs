#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

//! Read access to the dropbox definitions configured for a station.

pub mod error;
pub mod store;

pub use error::{DataError, Result as DataResult};
pub use store::{DropboxDefinition, DropboxStore};
