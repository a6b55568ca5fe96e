//! # Polyglot Config
//!
//! Type-safe configuration for the Polyglot catalog, compiler and runtime.
//!
//! This crate provides configuration loading from TOML, YAML or JSON files,
//! environment overrides, validation and a lock-free configuration cache.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod defaults;
pub mod loader;
pub mod schema;
pub mod validator;

pub use cache::*;
pub use defaults::*;
pub use loader::*;
pub use schema::*;
pub use validator::*;
