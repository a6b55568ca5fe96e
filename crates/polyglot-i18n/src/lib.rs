//! # Polyglot I18n
//!
//! ICU message compilation, self-healing translation catalogs and the runtime
//! formatting library for Polyglot.
//!
//! Translations live in one JSON catalog per locale. At build time each
//! message is looked up through [`CatalogManager`], parsed by an external
//! [`MessageParser`] and compiled into a [`CompiledMessage`]: either a
//! constant string or a closure over the message's argument names that calls
//! the runtime helpers. At run time compiled messages render through a
//! [`FormatContext`] backed by a memoizing [`FormatterCache`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod compiler;
pub mod error;
pub mod locale;
pub mod pipeline;
pub mod pluralization;
pub mod runtime;
pub mod value;

pub use catalog::*;
pub use compiler::*;
pub use error::*;
pub use locale::Locale;
pub use pipeline::*;
pub use pluralization::{category_for, PluralCategory};
pub use runtime::*;
pub use value::{plain_number, MessageValues, Value};
