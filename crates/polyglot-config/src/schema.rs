//! Configuration schema definitions using serde.

use polyglot_common::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Polyglot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Translation catalog configuration.
    pub catalog: CatalogConfig,
    /// Formatting runtime configuration.
    pub runtime: RuntimeConfig,
    /// Build pass configuration.
    pub build: BuildConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Translation catalog configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Directory holding one `<locale>.json` file per locale.
    pub directory: PathBuf,
    /// Quiet window before pending catalog changes are written, in milliseconds.
    pub debounce_ms: u64,
    /// Reload catalogs when their files change on disk.
    pub watch: bool,
    /// Indentation width of the written JSON.
    pub indent: usize,
}

impl CatalogConfig {
    /// Debounce window as a [`Duration`].
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Formatting runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Upper bound on memoized formatter instances.
    pub formatter_cache_capacity: u64,
    /// Date style used when a message does not name one.
    pub default_date_style: String,
    /// Time style used when a message does not name one.
    pub default_time_style: String,
}

/// Build pass configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Locales compiled by a build pass.
    pub locales: Vec<String>,
    /// Module specifier generated code imports the helpers from.
    pub helpers_module: String,
    /// What to do with a translation that fails to parse.
    pub on_parse_error: ParseErrorPolicy,
}

/// Handling of translations the external parser rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseErrorPolicy {
    /// Fail the build for the locale.
    #[default]
    Abort,
    /// Report the message and leave it out of the build.
    Skip,
}
