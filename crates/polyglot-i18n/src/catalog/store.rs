//! Persistence backends for translation catalogs

use crate::error::{I18nError, I18nResult};
use crate::locale::Locale;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Where catalogs are read from and written to
pub trait CatalogStore: Send + Sync + 'static {
    /// Raw catalog text for a locale, or `None` when nothing is persisted yet
    fn read(&self, locale: &Locale) -> I18nResult<Option<String>>;

    /// Replace the persisted catalog for a locale
    fn write(&self, locale: &Locale, contents: &str) -> I18nResult<()>;

    /// File backing the locale's catalog, for stores that have one
    fn location(&self, locale: &Locale) -> Option<PathBuf> {
        let _ = locale;
        None
    }
}

/// One `<locale>.json` file per locale inside a directory
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    base_dir: PathBuf,
}

impl JsonFileStore {
    /// Create a store rooted at `base_dir`
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    /// Directory holding the catalogs
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Path of a locale's catalog file
    pub fn path_for(&self, locale: &Locale) -> PathBuf {
        self.base_dir.join(locale.catalog_file_name())
    }
}

impl CatalogStore for JsonFileStore {
    fn read(&self, locale: &Locale) -> I18nResult<Option<String>> {
        let path = self.path_for(locale);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "catalog file does not exist yet");
                Ok(None)
            }
            Err(source) => Err(I18nError::CatalogRead {
                locale: locale.to_string(),
                path,
                source,
            }),
        }
    }

    /// Writes to a temporary file in the same directory and renames it over
    /// the catalog, so readers never see a partial document.
    fn write(&self, locale: &Locale, contents: &str) -> I18nResult<()> {
        let path = self.path_for(locale);
        let write_error = |source| I18nError::CatalogWrite {
            locale: locale.to_string(),
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.base_dir).map_err(write_error)?;
        let mut tmp = NamedTempFile::new_in(&self.base_dir).map_err(write_error)?;
        tmp.write_all(contents.as_bytes()).map_err(write_error)?;
        tmp.as_file().sync_all().map_err(write_error)?;
        tmp.persist(&path).map_err(|e| write_error(e.error))?;

        debug!(path = %path.display(), bytes = contents.len(), "catalog written");
        Ok(())
    }

    fn location(&self, locale: &Locale) -> Option<PathBuf> {
        Some(self.path_for(locale))
    }
}
