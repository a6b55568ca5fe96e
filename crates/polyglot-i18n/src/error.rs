//! Error types for catalog, compiler and runtime operations

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, persisting or watching translation catalogs
#[derive(Error, Debug)]
pub enum I18nError {
    /// Failed to parse a language identifier
    #[error("Invalid language identifier: {0}")]
    InvalidLanguageId(String),

    /// A catalog file exists but could not be read
    #[error("Failed to read catalog for locale {locale} from {}", path.display())]
    CatalogRead {
        /// Locale the catalog belongs to
        locale: String,
        /// File that failed to read
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// A catalog file is not a JSON object of strings
    #[error("Malformed catalog for locale {locale}: {source}")]
    CatalogDecode {
        /// Locale the catalog belongs to
        locale: String,
        /// Underlying JSON failure
        #[source]
        source: serde_json::Error,
    },

    /// The in-memory catalog could not be serialized
    #[error("Failed to encode catalog for locale {locale}: {source}")]
    CatalogEncode {
        /// Locale the catalog belongs to
        locale: String,
        /// Underlying JSON failure
        #[source]
        source: serde_json::Error,
    },

    /// Writing the catalog file failed
    #[error("Failed to write catalog for locale {locale} to {}", path.display())]
    CatalogWrite {
        /// Locale the catalog belongs to
        locale: String,
        /// Destination file
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The file watcher could not be started
    #[error("Failed to watch catalog directory: {0}")]
    Watch(#[from] notify::Error),

    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for catalog operations
pub type I18nResult<T> = Result<T, I18nError>;

/// Error reported by the external ICU message parser
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ParseError {
    /// Parser diagnostic
    pub message: String,
}

impl ParseError {
    /// Create a parse error from a diagnostic message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors raised while turning catalog text into compiled messages
#[derive(Error, Debug)]
pub enum CompileError {
    /// A `#` token appeared outside of any plural branch
    #[error("internal compiler defect: '#' token outside of a plural context")]
    PoundOutsidePlural,

    /// The AST handed over by the parser does not follow the node contract
    #[error("internal compiler defect: invalid message AST: {0}")]
    InvalidAst(#[from] serde_json::Error),

    /// A translation failed to parse
    #[error("Malformed translation for key {key:?} in locale {locale}: {source}")]
    MalformedTranslation {
        /// Locale of the offending catalog
        locale: String,
        /// Message key
        key: String,
        /// Parser diagnostic
        #[source]
        source: ParseError,
    },

    /// The catalog for the locale could not be loaded
    #[error(transparent)]
    Catalog(#[from] I18nError),
}

impl CompileError {
    /// Whether the error points at a bug in the compiler or its input contract
    /// rather than at translation content.
    pub const fn is_defect(&self) -> bool {
        matches!(self, Self::PoundOutsidePlural | Self::InvalidAst(_))
    }
}

/// Result type for compiler operations
pub type CompileResult<T> = Result<T, CompileError>;

/// Errors raised by the formatting runtime
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// `format` was called before a current locale was set
    #[error("no current locale set")]
    LocaleNotSet,

    /// A locale tag handed to the runtime could not be parsed
    #[error("Invalid locale tag: {0}")]
    InvalidLocale(String),

    /// A formatter could not be built for the locale
    #[error("Failed to create {kind} formatter for locale {locale}: {reason}")]
    FormatterConstruction {
        /// Formatter kind (number, plural, date, time)
        kind: &'static str,
        /// Locale tag
        locale: String,
        /// Diagnostic from the underlying library
        reason: String,
    },
}

macro_rules! into_polyglot_error {
    ($($ty:ty => $msg:literal),+ $(,)?) => {
        $(
            impl From<$ty> for polyglot_common::PolyglotError {
                fn from(err: $ty) -> Self {
                    Self::with_source($msg, err)
                }
            }
        )+
    };
}

into_polyglot_error! {
    I18nError => "catalog operation failed",
    CompileError => "message compilation failed",
    FormatError => "message formatting failed",
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyglot_common::PolyglotError;
    use std::error::Error as _;

    #[test]
    fn test_defects_are_told_apart_from_content_errors() {
        assert!(CompileError::PoundOutsidePlural.is_defect());
        let content = CompileError::MalformedTranslation {
            locale: "en".into(),
            key: "greeting".into(),
            source: ParseError::new("unclosed brace"),
        };
        assert!(!content.is_defect());
        assert_eq!(
            content.to_string(),
            "Malformed translation for key \"greeting\" in locale en: unclosed brace"
        );
    }

    #[test]
    fn test_conversion_keeps_source() {
        let err: PolyglotError = FormatError::LocaleNotSet.into();
        assert_eq!(err.to_string(), "message formatting failed");
        assert_eq!(err.source().map(ToString::to_string).as_deref(), Some("no current locale set"));
    }
}
