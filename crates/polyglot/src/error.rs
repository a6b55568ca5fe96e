//! Application-wide error types using thiserror.

use polyglot_common::PolyglotError;
use polyglot_i18n::{CompileError, FormatError, I18nError};

/// Main application error type.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] PolyglotError),

    /// Catalog error.
    #[error(transparent)]
    Catalog(#[from] I18nError),

    /// Compilation error.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// Formatting error.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Malformed `--values` argument.
    #[error("Invalid message values: {0}")]
    Values(#[from] serde_json::Error),

    /// Writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the command line application.
pub type AppResult<T> = Result<T, AppError>;
