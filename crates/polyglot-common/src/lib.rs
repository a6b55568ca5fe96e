//! # Polyglot Common
//!
//! Shared error type, logging bootstrap and test helpers for the Polyglot
//! workspace.
//!
//! This crate provides the foundational pieces used across the catalog,
//! compiler and runtime crates.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod logging;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;

pub use error::*;
pub use logging::{init_logging, LogFormat, LoggingConfig, LoggingGuard};
