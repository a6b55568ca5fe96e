//! Translation catalog manager
//!
//! Catalogs map message keys to ICU message text, one JSON document per
//! locale. Lookups of missing keys seed the key as its own translation and
//! schedule a debounced whole-document write; external edits to the
//! documents are picked up by a directory watcher.

pub mod debounce;
pub mod locale_catalog;
pub mod manager;
pub mod store;
pub mod watch;

pub use debounce::Debouncer;
pub use locale_catalog::{CatalogSettings, LocaleCatalog, ReloadOutcome};
pub use manager::CatalogManager;
pub use store::{CatalogStore, JsonFileStore};
pub use watch::{locale_for_path, CatalogWatcher};
