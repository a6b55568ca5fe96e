//! Error types and utilities shared across Polyglot crates

use thiserror::Error;

/// Result type alias for Polyglot operations
pub type Result<T> = std::result::Result<T, PolyglotError>;

/// Boxed error source carried by the structured variants
pub type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for workspace-level operations
#[derive(Error, Debug)]
pub enum PolyglotError {
    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        /// Human readable description
        message: String,
        /// Underlying cause
        #[source]
        source: Option<BoxedSource>,
    },

    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Validation errors for configuration values or user input
    #[error("Validation error: {message}")]
    Validation {
        /// Human readable description
        message: String,
        /// Offending field, dotted path
        field: Option<String>,
    },

    /// Logging could not be initialised
    #[error("Logging error: {message}")]
    Logging {
        /// Human readable description
        message: String,
        /// Underlying cause
        #[source]
        source: Option<BoxedSource>,
    },

    /// Generic error with custom message
    #[error("{message}")]
    Generic {
        /// Human readable description
        message: String,
        /// Underlying cause
        #[source]
        source: Option<BoxedSource>,
    },
}

impl PolyglotError {
    /// Create a new generic error with a custom message
    pub fn new(msg: impl Into<String>) -> Self {
        Self::Generic {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new generic error with a custom message and source
    pub fn with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Generic {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new configuration error with source
    pub fn config_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: None,
        }
    }

    /// Create a new validation error with field name
    pub fn validation_field(msg: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new logging error with source
    pub fn logging_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Logging {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Name of the offending field for validation errors
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => field.as_deref(),
            _ => None,
        }
    }
}

/// Convert from toml::de::Error to PolyglotError
impl From<toml::de::Error> for PolyglotError {
    fn from(err: toml::de::Error) -> Self {
        Self::config_with_source("TOML parsing error", err)
    }
}

/// Convert from serde_yaml::Error to PolyglotError
impl From<serde_yaml::Error> for PolyglotError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::config_with_source("YAML parsing error", err)
    }
}
