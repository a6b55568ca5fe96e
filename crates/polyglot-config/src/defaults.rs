//! Default values for every configuration section.

use crate::schema::*;
use std::path::PathBuf;

/// Default debounce window for catalog writes, in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 200;

/// Default upper bound on memoized formatters.
pub const DEFAULT_FORMATTER_CACHE_CAPACITY: u64 = 1024;

/// Default helper module specifier.
pub const DEFAULT_HELPERS_MODULE: &str = "polyglot/runtime";

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig::default(),
            runtime: RuntimeConfig::default(),
            build: BuildConfig::default(),
            logging: polyglot_common::LoggingConfig::default(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("translations"),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            watch: true,
            indent: 2,
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            formatter_cache_capacity: DEFAULT_FORMATTER_CACHE_CAPACITY,
            default_date_style: "short".to_string(),
            default_time_style: "short".to_string(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            locales: vec!["en".to_string()],
            helpers_module: DEFAULT_HELPERS_MODULE.to_string(),
            on_parse_error: ParseErrorPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.catalog.debounce_ms, 200);
        assert_eq!(config.catalog.indent, 2);
        assert!(config.catalog.watch);
        assert_eq!(config.build.locales, vec!["en".to_string()]);
        assert_eq!(config.build.on_parse_error, ParseErrorPolicy::Abort);
        assert_eq!(config.runtime.default_date_style, "short");
    }
}
