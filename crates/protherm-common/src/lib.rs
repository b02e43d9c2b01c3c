//! Shared pieces of the ProTherm enrichment workspace
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! - [`error`]: [`ProthermError`] and the [`Result`] alias used by every
//!   library crate
//! - [`logging`]: tracing subscriber configuration for the binaries

pub mod error;
pub mod logging;

pub use error::{ProthermError, Result};
