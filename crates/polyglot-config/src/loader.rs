//! Configuration loading from files and the environment.

use crate::schema::{Config, ParseErrorPolicy};
use polyglot_common::{PolyglotError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Prefix of the environment variables that override file values.
pub const ENV_PREFIX: &str = "POLYGLOT_";

/// Configuration loader.
///
/// Values come from the file (if present), then `POLYGLOT_*` environment
/// variables, and the result is validated before it is returned.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    path: PathBuf,
}

impl ConfigLoader {
    /// Creates a new configuration loader.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path the loader reads from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads configuration from the file and the process environment.
    ///
    /// A missing file yields the defaults; an unreadable or malformed one is an error.
    pub fn load(&self) -> Result<Config> {
        let mut config = if self.path.exists() {
            Self::load_from_file(&self.path)?
        } else {
            warn!(path = %self.path.display(), "configuration file not found, using defaults");
            Config::default()
        };

        apply_env_overrides(&mut config, std::env::vars())?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a configuration file, choosing the format from its extension.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            PolyglotError::config_with_source(format!("failed to read {}", path.display()), e)
        })?;

        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => serde_yaml::from_str(&content)?,
            Some("json") => serde_json::from_str(&content)?,
            Some("toml") | None => toml::from_str(&content)?,
            Some(other) => {
                return Err(PolyglotError::config(format!(
                    "unsupported configuration format .{other} for {}",
                    path.display()
                )))
            }
        };

        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }
}

/// Applies `POLYGLOT_*` overrides from `vars` onto `config`.
///
/// Unknown variables are ignored; malformed values are errors.
pub fn apply_env_overrides<I>(config: &mut Config, vars: I) -> Result<()>
where
    I: IntoIterator<Item = (String, String)>,
{
    for (name, value) in vars {
        let Some(key) = name.strip_prefix(ENV_PREFIX) else {
            continue;
        };

        match key {
            "CATALOG_DIR" => config.catalog.directory = PathBuf::from(&value),
            "DEBOUNCE_MS" => config.catalog.debounce_ms = parse_number(&name, &value)?,
            "WATCH" => config.catalog.watch = parse_bool(&name, &value)?,
            "FORMATTER_CACHE_CAPACITY" => {
                config.runtime.formatter_cache_capacity = parse_number(&name, &value)?;
            }
            "LOCALES" => {
                config.build.locales = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            "HELPERS_MODULE" => config.build.helpers_module = value.clone(),
            "ON_PARSE_ERROR" => {
                config.build.on_parse_error = match value.to_ascii_lowercase().as_str() {
                    "abort" => ParseErrorPolicy::Abort,
                    "skip" => ParseErrorPolicy::Skip,
                    _ => return Err(invalid_value(&name, &value)),
                };
            }
            "LOG_LEVEL" => config.logging.level = value.clone(),
            _ => continue,
        }
        debug!(variable = %name, "applied environment override");
    }
    Ok(())
}

fn parse_number(name: &str, value: &str) -> Result<u64> {
    value.trim().parse().map_err(|_| invalid_value(name, value))
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid_value(name, value)),
    }
}

fn invalid_value(name: &str, value: &str) -> PolyglotError {
    PolyglotError::validation_field(format!("invalid value {value:?}"), name)
}
