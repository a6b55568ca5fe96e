//! # Polyglot
//!
//! Command line driver for the Polyglot message pipeline.
//!
//! Loads configuration, opens the translation catalogs and runs one build
//! pass: seeding keys, rewriting message calls, building the per-locale
//! message table or rendering a single message.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod commands;
pub mod error;

pub use cli::*;
pub use commands::*;
pub use error::*;
