//! Runtime validation of loaded configuration.

use crate::schema::{BuildConfig, CatalogConfig, Config, RuntimeConfig};
use polyglot_common::{PolyglotError, Result};
use unic_langid::LanguageIdentifier;

/// Date and time styles understood by the runtime formatters.
pub const KNOWN_STYLES: &[&str] = &["short", "medium", "long", "full"];

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates a configuration.
    pub fn validate(config: &Config) -> Result<()> {
        config.validate()
    }
}

impl Config {
    /// Checks every section, returning the first problem found.
    pub fn validate(&self) -> Result<()> {
        self.catalog.validate()?;
        self.runtime.validate()?;
        self.build.validate()
    }
}

impl CatalogConfig {
    fn validate(&self) -> Result<()> {
        if self.directory.as_os_str().is_empty() {
            return Err(PolyglotError::validation_field(
                "catalog directory must not be empty",
                "catalog.directory",
            ));
        }
        if self.debounce_ms == 0 {
            return Err(PolyglotError::validation_field(
                "debounce window must be at least 1ms",
                "catalog.debounce_ms",
            ));
        }
        if self.indent > 8 {
            return Err(PolyglotError::validation_field(
                format!("indent of {} exceeds the maximum of 8", self.indent),
                "catalog.indent",
            ));
        }
        Ok(())
    }
}

impl RuntimeConfig {
    fn validate(&self) -> Result<()> {
        if self.formatter_cache_capacity == 0 {
            return Err(PolyglotError::validation_field(
                "formatter cache capacity must be positive",
                "runtime.formatter_cache_capacity",
            ));
        }
        for (field, style) in [
            ("runtime.default_date_style", &self.default_date_style),
            ("runtime.default_time_style", &self.default_time_style),
        ] {
            if !KNOWN_STYLES.contains(&style.as_str()) {
                return Err(PolyglotError::validation_field(
                    format!("unknown style {style:?}, expected one of {KNOWN_STYLES:?}"),
                    field,
                ));
            }
        }
        Ok(())
    }
}

impl BuildConfig {
    fn validate(&self) -> Result<()> {
        if self.locales.is_empty() {
            return Err(PolyglotError::validation_field(
                "at least one locale must be configured",
                "build.locales",
            ));
        }
        for locale in &self.locales {
            locale.parse::<LanguageIdentifier>().map_err(|_| {
                PolyglotError::validation_field(
                    format!("{locale:?} is not a valid locale identifier"),
                    "build.locales",
                )
            })?;
        }
        if self.helpers_module.trim().is_empty() {
            return Err(PolyglotError::validation_field(
                "helpers module must not be empty",
                "build.helpers_module",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_zero_debounce_rejected() {
        let mut config = Config::default();
        config.catalog.debounce_ms = 0;
        let err = config.validate().unwrap_err();
        assert_eq!(err.field(), Some("catalog.debounce_ms"));
    }

    #[test]
    fn test_invalid_locale_rejected() {
        let mut config = Config::default();
        config.build.locales = vec!["en".to_string(), "not a locale!".to_string()];
        let err = ConfigValidator::validate(&config).unwrap_err();
        assert_eq!(err.field(), Some("build.locales"));
    }

    #[test]
    fn test_unknown_default_style_rejected() {
        let mut config = Config::default();
        config.runtime.default_time_style = "tiny".to_string();
        let err = config.validate().unwrap_err();
        assert_eq!(err.field(), Some("runtime.default_time_style"));
    }

    #[test]
    fn test_zero_cache_capacity_rejected() {
        let mut config = Config::default();
        config.runtime.formatter_cache_capacity = 0;
        assert!(config.validate().is_err());
    }
}
