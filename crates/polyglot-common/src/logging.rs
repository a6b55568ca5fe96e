//! Structured logging infrastructure for Polyglot

use crate::error::{PolyglotError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Output format of the log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, human oriented output
    #[default]
    Pretty,
    /// Single-line output
    Compact,
    /// Newline delimited JSON
    Json,
}

/// Configuration for the logging system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "polyglot_i18n=debug")
    pub level: String,
    /// Output format
    pub format: LogFormat,
    /// Optional file path for log output; stderr when unset
    pub file: Option<PathBuf>,
    /// Whether to include target module information
    pub include_targets: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            file: None,
            include_targets: true,
        }
    }
}

/// Keeps the non-blocking file writer alive; drop it last.
#[derive(Debug)]
#[must_use = "dropping the guard stops the background log writer"]
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize the tracing subscriber with the given configuration.
///
/// `RUST_LOG` takes precedence over `config.level` when it is set.
pub fn init_logging(config: &LoggingConfig) -> Result<LoggingGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let (writer, file_guard) = match &config.file {
        Some(path) => {
            let (writer, guard) = file_writer(path)?;
            (writer, Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };
    let ansi = file_guard.is_none();

    let registry = tracing_subscriber::registry().with(env_filter);
    let installed = match config.format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_ansi(ansi)
                    .with_target(config.include_targets)
                    .with_writer(writer),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_ansi(ansi)
                    .with_target(config.include_targets)
                    .with_thread_names(true)
                    .with_writer(writer),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(config.include_targets)
                    .with_thread_names(true)
                    .with_writer(writer),
            )
            .try_init(),
    };

    installed.map_err(|e| PolyglotError::logging_with_source("failed to install subscriber", e))?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// Initialize logging for development (pretty, debug level)
pub fn init_dev_logging() -> Result<LoggingGuard> {
    init_logging(&LoggingConfig {
        level: "debug".to_string(),
        ..LoggingConfig::default()
    })
}

fn file_writer(path: &Path) -> Result<(BoxMakeWriter, WorkerGuard)> {
    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path.file_name().ok_or_else(|| {
        PolyglotError::validation_field(
            format!("log file path {} has no file name", path.display()),
            "logging.file",
        )
    })?;

    std::fs::create_dir_all(directory)?;
    let appender = tracing_appender::rolling::never(directory, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    Ok((BoxMakeWriter::new(non_blocking), guard))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.file.is_none());
        assert!(config.include_targets);
    }

    #[test]
    fn test_format_deserializes_lowercase() {
        let config: LoggingConfig =
            serde_json::from_str(r#"{"level": "debug", "format": "json"}"#).unwrap();
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, "debug");
        assert!(config.include_targets);
    }

    #[test]
    fn test_file_writer_rejects_directory_only_path() {
        assert!(file_writer(Path::new("/")).is_err());
    }
}
