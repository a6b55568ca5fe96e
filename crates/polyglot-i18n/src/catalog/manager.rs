//! Catalog manager

use super::locale_catalog::{CatalogSettings, LocaleCatalog, ReloadOutcome};
use super::store::{CatalogStore, JsonFileStore};
use super::watch::CatalogWatcher;
use crate::error::I18nResult;
use crate::locale::Locale;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use polyglot_config::CatalogConfig;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

type ReloadListener = Arc<dyn Fn(&Locale) + Send + Sync>;

struct ManagerShared {
    store: Arc<dyn CatalogStore>,
    settings: CatalogSettings,
    catalogs: DashMap<Locale, Arc<LocaleCatalog>>,
    listeners: RwLock<Vec<ReloadListener>>,
}

impl ManagerShared {
    fn reload(&self, locale: &Locale) -> I18nResult<ReloadOutcome> {
        let Some(catalog) = self.catalogs.get(locale).map(|c| Arc::clone(c.value())) else {
            debug!(locale = %locale, "change to a catalog that is not loaded");
            return Ok(ReloadOutcome::Unchanged);
        };

        let outcome = catalog.reload()?;
        if matches!(outcome, ReloadOutcome::Reloaded { .. }) {
            let listeners = self.listeners.read().clone();
            for listener in listeners {
                listener(locale);
            }
        }
        Ok(outcome)
    }
}

/// Lazily loaded, self-healing catalogs for every locale of a project.
///
/// Each locale owns an independent catalog with its own debounce worker, so
/// different locales can be read and written concurrently.
pub struct CatalogManager {
    shared: Arc<ManagerShared>,
    watcher: Mutex<Option<CatalogWatcher>>,
}

impl CatalogManager {
    /// Create a manager over an arbitrary store; no file watching
    pub fn new(store: Arc<dyn CatalogStore>, settings: CatalogSettings) -> Self {
        Self {
            shared: Arc::new(ManagerShared {
                store,
                settings,
                catalogs: DashMap::new(),
                listeners: RwLock::new(Vec::new()),
            }),
            watcher: Mutex::new(None),
        }
    }

    /// Create a manager over a directory of JSON catalogs, watching it when enabled
    pub fn open(config: &CatalogConfig) -> I18nResult<Self> {
        let settings = CatalogSettings::from(config);
        let manager = Self::new(Arc::new(JsonFileStore::new(&config.directory)), settings);
        if config.watch {
            manager.watch_directory(&config.directory)?;
        }
        info!(dir = %config.directory.display(), watch = config.watch, "catalog manager ready");
        Ok(manager)
    }

    /// Reload catalogs whenever their files in `dir` change
    pub fn watch_directory(&self, dir: &Path) -> I18nResult<()> {
        let shared: Weak<ManagerShared> = Arc::downgrade(&self.shared);
        let watcher = CatalogWatcher::start(dir, move |locale| {
            let Some(shared) = shared.upgrade() else {
                return;
            };
            if let Err(e) = shared.reload(&locale) {
                warn!(locale = %locale, error = %e, "ignoring unreadable catalog change");
            }
        })?;
        *self.watcher.lock() = Some(watcher);
        Ok(())
    }

    /// Settings every catalog is created with
    pub fn settings(&self) -> &CatalogSettings {
        &self.shared.settings
    }

    /// Catalog for `locale`, loading it on first use
    pub fn catalog(&self, locale: &Locale) -> I18nResult<Arc<LocaleCatalog>> {
        if let Some(catalog) = self.shared.catalogs.get(locale) {
            return Ok(Arc::clone(catalog.value()));
        }

        let loaded = LocaleCatalog::load(
            locale.clone(),
            Arc::clone(&self.shared.store),
            &self.shared.settings,
        )?;
        let entry = self
            .shared
            .catalogs
            .entry(locale.clone())
            .or_insert(loaded);
        Ok(Arc::clone(entry.value()))
    }

    /// Translation of `key` in `locale`; see [`LocaleCatalog::get`]
    pub fn get(&self, locale: &Locale, key: &str) -> I18nResult<String> {
        Ok(self.catalog(locale)?.get(key))
    }

    /// Reload epoch of a loaded catalog, `0` when not loaded
    pub fn epoch(&self, locale: &Locale) -> u64 {
        self.shared
            .catalogs
            .get(locale)
            .map_or(0, |catalog| catalog.epoch())
    }

    /// Re-read a loaded catalog from its store and notify listeners if it changed
    pub fn reload(&self, locale: &Locale) -> I18nResult<ReloadOutcome> {
        self.shared.reload(locale)
    }

    /// Register a callback run after any catalog is reloaded
    pub fn on_reload<F>(&self, listener: F)
    where
        F: Fn(&Locale) + Send + Sync + 'static,
    {
        self.shared.listeners.write().push(Arc::new(listener));
    }

    /// Write every catalog with unwritten changes, stopping at the first failure
    pub fn flush_all(&self) -> I18nResult<usize> {
        let catalogs: Vec<_> = self
            .shared
            .catalogs
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        let mut written = 0;
        for catalog in catalogs {
            if catalog.flush()? {
                written += 1;
            }
        }
        Ok(written)
    }

    /// Locales with a loaded catalog, sorted by tag
    pub fn loaded_locales(&self) -> Vec<Locale> {
        let mut locales: Vec<Locale> = self
            .shared
            .catalogs
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        locales.sort_by_cached_key(ToString::to_string);
        locales
    }

    /// File backing a locale's catalog, if the store has one
    pub fn path_for(&self, locale: &Locale) -> Option<PathBuf> {
        self.shared.store.location(locale)
    }
}

impl Drop for CatalogManager {
    fn drop(&mut self) {
        self.watcher.lock().take();
        if let Err(e) = self.flush_all() {
            warn!(error = %e, "failed to flush catalogs on shutdown");
        }
    }
}

impl std::fmt::Debug for CatalogManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogManager")
            .field("settings", &self.shared.settings)
            .field("loaded", &self.loaded_locales())
            .field("watching", &self.watcher.lock().as_ref().map(CatalogWatcher::dir))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    fn manager(dir: &Path) -> CatalogManager {
        CatalogManager::new(
            Arc::new(JsonFileStore::new(dir)),
            CatalogSettings {
                debounce: Duration::from_secs(60),
                watch: false,
                ..CatalogSettings::default()
            },
        )
    }

    #[test]
    fn test_catalogs_are_loaded_once_per_locale() {
        let dir = TempDir::new().unwrap();
        let manager = manager(dir.path());
        let en = Locale::parse("en").unwrap();

        let a = manager.catalog(&en).unwrap();
        let b = manager.catalog(&en).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(manager.loaded_locales(), vec![en]);
    }

    #[test]
    fn test_locales_are_independent() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("fr.json"), r#"{"hello": "bonjour"}"#).unwrap();
        let manager = manager(dir.path());
        let en = Locale::parse("en").unwrap();
        let fr = Locale::parse("fr").unwrap();

        assert_eq!(manager.get(&fr, "hello").unwrap(), "bonjour");
        assert_eq!(manager.get(&en, "hello").unwrap(), "hello");
        assert_eq!(manager.flush_all().unwrap(), 1);
        assert!(dir.path().join("en.json").exists());
        assert_eq!(manager.path_for(&fr), Some(dir.path().join("fr.json")));
    }

    #[test]
    fn test_corrupt_catalog_is_propagated() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("de.json"), "not json").unwrap();
        let manager = manager(dir.path());
        assert!(manager.get(&Locale::parse("de").unwrap(), "k").is_err());
        assert!(manager.loaded_locales().is_empty());
    }

    #[test]
    fn test_reload_notifies_listeners() {
        let dir = TempDir::new().unwrap();
        let manager = manager(dir.path());
        let en = Locale::parse("en").unwrap();
        manager.catalog(&en).unwrap();

        let notified = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&notified);
        manager.on_reload(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        std::fs::write(dir.path().join("en.json"), r#"{"k": "v"}"#).unwrap();
        assert!(matches!(manager.reload(&en).unwrap(), ReloadOutcome::Reloaded { .. }));
        assert_eq!(manager.epoch(&en), 1);
        assert_eq!(notified.load(Ordering::SeqCst), 1);

        assert_eq!(manager.reload(&en).unwrap(), ReloadOutcome::Unchanged);
        assert_eq!(notified.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_flushes_everything() {
        let dir = TempDir::new().unwrap();
        {
            let manager = manager(dir.path());
            manager.get(&Locale::parse("pl").unwrap(), "klucz").unwrap();
        }
        let written = std::fs::read_to_string(dir.path().join("pl.json")).unwrap();
        assert!(written.contains("\"klucz\": \"klucz\""));
    }
}
