//! A single locale's translation catalog

use super::debounce::Debouncer;
use super::store::CatalogStore;
use crate::error::{I18nError, I18nResult};
use crate::locale::Locale;
use parking_lot::Mutex;
use polyglot_config::{CatalogConfig, DEFAULT_DEBOUNCE_MS};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Behaviour shared by every catalog of a manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSettings {
    /// Quiet window before pending changes are written
    pub debounce: Duration,
    /// Indentation width of the written JSON
    pub indent: usize,
    /// Reload catalogs when their files change on disk
    pub watch: bool,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            indent: 2,
            watch: true,
        }
    }
}

impl From<&CatalogConfig> for CatalogSettings {
    fn from(config: &CatalogConfig) -> Self {
        Self {
            debounce: config.debounce(),
            indent: config.indent,
            watch: config.watch,
        }
    }
}

/// Result of re-reading a catalog from its store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// The stored document is the one this catalog last wrote
    Unchanged,
    /// Nothing is persisted for the locale; memory was kept
    Missing,
    /// The in-memory catalog was replaced by the stored one
    Reloaded {
        /// Entries after the reload
        entries: usize,
        /// Unflushed seeded keys carried over because the file lacked them
        restored: usize,
    },
}

#[derive(Debug, Default)]
struct CatalogState {
    entries: BTreeMap<String, String>,
    /// Bumped on every in-memory mutation
    generation: u64,
    /// Generation covered by the last successful write
    flushed_generation: u64,
    /// Seeded keys not yet written, with the generation that added them
    pending: HashMap<String, u64>,
    /// Document most recently handed to the store
    last_written: Option<String>,
}

impl CatalogState {
    const fn is_dirty(&self) -> bool {
        self.generation > self.flushed_generation
    }
}

/// In-memory catalog of one locale with debounced persistence.
///
/// A key that is looked up and missing (or empty) is seeded with itself and
/// stays present from then on, across flushes and external reloads.
pub struct LocaleCatalog {
    locale: Locale,
    store: Arc<dyn CatalogStore>,
    indent: usize,
    state: Mutex<CatalogState>,
    write_lock: Mutex<()>,
    epoch: AtomicU64,
    debouncer: Option<Debouncer>,
}

impl std::fmt::Debug for LocaleCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("LocaleCatalog")
            .field("locale", &self.locale)
            .field("entries", &state.entries.len())
            .field("generation", &state.generation)
            .field("pending", &state.pending.len())
            .field("epoch", &self.epoch())
            .finish_non_exhaustive()
    }
}

impl LocaleCatalog {
    /// Load a locale's catalog from the store.
    ///
    /// An absent document yields an empty catalog; an unreadable or malformed
    /// one is an error.
    pub fn load(
        locale: Locale,
        store: Arc<dyn CatalogStore>,
        settings: &CatalogSettings,
    ) -> I18nResult<Arc<Self>> {
        let (entries, last_written) = match store.read(&locale) {
            Ok(Some(contents)) => (decode(&locale, &contents)?, Some(contents)),
            Ok(None) => (BTreeMap::new(), None),
            Err(e) => {
                error!(locale = %locale, error = %e, "failed to load catalog");
                return Err(e);
            }
        };
        info!(locale = %locale, entries = entries.len(), "catalog loaded");

        let mut spawn_error = None;
        let catalog = Arc::new_cyclic(|weak: &Weak<Self>| {
            let weak = weak.clone();
            let debouncer = Debouncer::spawn(
                format!("catalog-flush-{locale}"),
                settings.debounce,
                move || {
                    if let Some(catalog) = weak.upgrade() {
                        catalog.flush_in_background();
                    }
                },
            )
            .map_err(|e| spawn_error = Some(e))
            .ok();

            Self {
                locale,
                store,
                indent: settings.indent,
                state: Mutex::new(CatalogState {
                    entries,
                    last_written,
                    ..CatalogState::default()
                }),
                write_lock: Mutex::new(()),
                epoch: AtomicU64::new(0),
                debouncer,
            }
        });

        match spawn_error {
            Some(e) => Err(I18nError::IoError(e)),
            None => Ok(catalog),
        }
    }

    /// Locale of the catalog
    pub const fn locale(&self) -> &Locale {
        &self.locale
    }

    /// File backing the catalog, if the store has one
    pub fn location(&self) -> Option<PathBuf> {
        self.store.location(&self.locale)
    }

    /// Translation for `key`, seeding the key as its own translation when
    /// absent or empty. Seeding schedules a debounced write.
    pub fn get(&self, key: &str) -> String {
        let mut state = self.state.lock();
        if let Some(text) = state.entries.get(key).filter(|text| !text.is_empty()) {
            return text.clone();
        }

        state.generation += 1;
        let generation = state.generation;
        state.entries.insert(key.to_string(), key.to_string());
        state.pending.insert(key.to_string(), generation);
        drop(state);

        debug!(locale = %self.locale, key, "seeded missing translation");
        self.schedule_flush();
        key.to_string()
    }

    /// Stored translation without seeding
    pub fn lookup(&self, key: &str) -> Option<String> {
        self.state.lock().entries.get(key).cloned()
    }

    /// Whether `key` is present
    pub fn contains(&self, key: &str) -> bool {
        self.state.lock().entries.contains_key(key)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Whether the catalog has no entries
    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    /// Copy of all entries
    pub fn entries(&self) -> BTreeMap<String, String> {
        self.state.lock().entries.clone()
    }

    /// Number of seeded keys not yet written
    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Counter bumped whenever the catalog is replaced from its store
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    fn schedule_flush(&self) {
        match &self.debouncer {
            Some(debouncer) => debouncer.poke(),
            None => self.flush_in_background(),
        }
    }

    fn flush_in_background(&self) {
        if let Err(e) = self.flush() {
            warn!(locale = %self.locale, error = %e, "catalog write failed, will retry on next change");
        }
    }

    /// Write the whole catalog now if it has unwritten changes.
    ///
    /// Returns whether a write happened. On failure memory stays
    /// authoritative and the next flush retries.
    pub fn flush(&self) -> I18nResult<bool> {
        let _writer = self.write_lock.lock();

        let (snapshot, contents) = {
            let mut state = self.state.lock();
            if !state.is_dirty() {
                return Ok(false);
            }
            let contents = encode(&self.locale, &state.entries, self.indent)?;
            state.last_written = Some(contents.clone());
            (state.generation, contents)
        };

        self.store.write(&self.locale, &contents)?;

        let mut state = self.state.lock();
        state.flushed_generation = state.flushed_generation.max(snapshot);
        state.pending.retain(|_, added| *added > snapshot);
        info!(locale = %self.locale, entries = state.entries.len(), "catalog flushed");
        Ok(true)
    }

    /// Re-read the catalog from its store after an external change.
    ///
    /// A document identical to the one this catalog last wrote is ignored.
    /// Seeded keys that were not yet written and that the new document lacks
    /// are carried over and scheduled for writing.
    pub fn reload(&self) -> I18nResult<ReloadOutcome> {
        let _writer = self.write_lock.lock();

        let Some(contents) = self.store.read(&self.locale)? else {
            return Ok(ReloadOutcome::Missing);
        };
        if self.state.lock().last_written.as_deref() == Some(contents.as_str()) {
            return Ok(ReloadOutcome::Unchanged);
        }
        let mut entries = decode(&self.locale, &contents)?;

        let mut state = self.state.lock();
        let pending = std::mem::take(&mut state.pending);
        let mut restored = 0;
        for (key, added) in pending {
            if entries.contains_key(&key) {
                continue;
            }
            entries.insert(key.clone(), key.clone());
            state.pending.insert(key, added);
            restored += 1;
        }
        state.entries = entries;
        state.last_written = Some(contents);
        if restored == 0 {
            state.flushed_generation = state.generation;
        }
        let count = state.entries.len();
        drop(state);

        self.epoch.fetch_add(1, Ordering::AcqRel);
        info!(locale = %self.locale, entries = count, restored, "catalog reloaded");
        if restored > 0 {
            self.schedule_flush();
        }
        Ok(ReloadOutcome::Reloaded {
            entries: count,
            restored,
        })
    }
}

impl Drop for LocaleCatalog {
    fn drop(&mut self) {
        if self.state.get_mut().is_dirty() {
            self.flush_in_background();
        }
    }
}

fn decode(locale: &Locale, contents: &str) -> I18nResult<BTreeMap<String, String>> {
    if contents.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(contents).map_err(|source| {
        error!(locale = %locale, error = %source, "malformed catalog");
        I18nError::CatalogDecode {
            locale: locale.to_string(),
            source,
        }
    })
}

fn encode(locale: &Locale, entries: &BTreeMap<String, String>, indent: usize) -> I18nResult<String> {
    let indent = " ".repeat(indent);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    entries
        .serialize(&mut serializer)
        .map_err(|source| I18nError::CatalogEncode {
            locale: locale.to_string(),
            source,
        })?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex as PlMutex;
    use polyglot_common::test_utils::{init_test_logging, wait_until};

    /// In-memory store that counts writes and can be told to fail.
    #[derive(Default)]
    struct MemoryStore {
        contents: PlMutex<Option<String>>,
        writes: AtomicU64,
        fail_writes: std::sync::atomic::AtomicBool,
    }

    impl MemoryStore {
        fn with(contents: &str) -> Arc<Self> {
            let store = Self::default();
            *store.contents.lock() = Some(contents.to_string());
            Arc::new(store)
        }

        fn writes(&self) -> u64 {
            self.writes.load(Ordering::SeqCst)
        }

        fn document(&self) -> BTreeMap<String, String> {
            serde_json::from_str(self.contents.lock().as_deref().unwrap_or("{}")).unwrap()
        }
    }

    impl CatalogStore for MemoryStore {
        fn read(&self, _locale: &Locale) -> I18nResult<Option<String>> {
            Ok(self.contents.lock().clone())
        }

        fn write(&self, _locale: &Locale, contents: &str) -> I18nResult<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(I18nError::IoError(std::io::Error::other("disk full")));
            }
            self.writes.fetch_add(1, Ordering::SeqCst);
            *self.contents.lock() = Some(contents.to_string());
            Ok(())
        }
    }

    fn settings(debounce_ms: u64) -> CatalogSettings {
        CatalogSettings {
            debounce: Duration::from_millis(debounce_ms),
            ..CatalogSettings::default()
        }
    }

    fn en() -> Locale {
        Locale::parse("en").unwrap()
    }

    #[test]
    fn test_existing_key_is_returned() {
        let store = MemoryStore::with(r#"{"greeting": "Hello"}"#);
        let catalog = LocaleCatalog::load(en(), store.clone(), &settings(20)).unwrap();
        assert_eq!(catalog.get("greeting"), "Hello");
        assert_eq!(catalog.pending_count(), 0);
        assert!(!catalog.flush().unwrap());
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn test_missing_and_empty_keys_are_seeded() {
        let store = MemoryStore::with(r#"{"blank": ""}"#);
        let catalog = LocaleCatalog::load(en(), store.clone(), &settings(5_000)).unwrap();

        assert_eq!(catalog.get("new.key"), "new.key");
        assert_eq!(catalog.get("blank"), "blank");
        assert!(catalog.contains("new.key"));
        assert_eq!(catalog.pending_count(), 2);

        assert!(catalog.flush().unwrap());
        assert_eq!(catalog.pending_count(), 0);
        let document = store.document();
        assert_eq!(document["new.key"], "new.key");
        assert_eq!(document["blank"], "blank");
    }

    #[test]
    fn test_burst_of_misses_writes_once() {
        init_test_logging();
        let store = Arc::new(MemoryStore::default());
        let catalog = LocaleCatalog::load(en(), store.clone(), &settings(40)).unwrap();

        for i in 0..25 {
            catalog.get(&format!("key.{i}"));
        }
        assert!(wait_until(Duration::from_secs(2), || store.writes() >= 1));
        std::thread::sleep(Duration::from_millis(200));
        assert_eq!(store.writes(), 1);
        assert_eq!(store.document().len(), 25);
    }

    #[test]
    fn test_failed_write_is_retried_by_next_flush() {
        let store = Arc::new(MemoryStore::default());
        let catalog = LocaleCatalog::load(en(), store.clone(), &settings(5_000)).unwrap();
        catalog.get("a");

        store.fail_writes.store(true, Ordering::SeqCst);
        assert!(catalog.flush().is_err());
        assert_eq!(catalog.get("a"), "a");
        assert_eq!(catalog.pending_count(), 1);

        store.fail_writes.store(false, Ordering::SeqCst);
        assert!(catalog.flush().unwrap());
        assert_eq!(store.document()["a"], "a");
    }

    #[test]
    fn test_own_write_is_not_reloaded() {
        let store = Arc::new(MemoryStore::default());
        let catalog = LocaleCatalog::load(en(), store.clone(), &settings(5_000)).unwrap();
        catalog.get("k");
        catalog.flush().unwrap();

        assert_eq!(catalog.reload().unwrap(), ReloadOutcome::Unchanged);
        assert_eq!(catalog.epoch(), 0);
    }

    #[test]
    fn test_reload_keeps_unflushed_seeded_keys() {
        let store = MemoryStore::with(r#"{"a": "A"}"#);
        let catalog = LocaleCatalog::load(en(), store.clone(), &settings(5_000)).unwrap();
        catalog.get("seeded");

        *store.contents.lock() = Some(r#"{"a": "Alpha", "b": "Beta"}"#.to_string());
        let outcome = catalog.reload().unwrap();

        assert_eq!(outcome, ReloadOutcome::Reloaded { entries: 3, restored: 1 });
        assert_eq!(catalog.get("a"), "Alpha");
        assert_eq!(catalog.get("seeded"), "seeded");
        assert_eq!(catalog.epoch(), 1);

        assert!(catalog.flush().unwrap());
        assert_eq!(store.document().len(), 3);
    }

    #[test]
    fn test_external_translation_wins_over_seed() {
        let store = Arc::new(MemoryStore::default());
        let catalog = LocaleCatalog::load(en(), store.clone(), &settings(5_000)).unwrap();
        catalog.get("title");

        *store.contents.lock() = Some(r#"{"title": "Titel"}"#.to_string());
        assert_eq!(
            catalog.reload().unwrap(),
            ReloadOutcome::Reloaded { entries: 1, restored: 0 }
        );
        assert_eq!(catalog.pending_count(), 0);
        assert_eq!(catalog.get("title"), "Titel");
        assert!(!catalog.flush().unwrap());
    }

    #[test]
    fn test_malformed_catalog_is_fatal_on_load_only() {
        let store = MemoryStore::with("{ not json");
        assert!(matches!(
            LocaleCatalog::load(en(), store.clone(), &settings(20)),
            Err(I18nError::CatalogDecode { .. })
        ));

        *store.contents.lock() = Some(r#"{"x": "y"}"#.to_string());
        let catalog = LocaleCatalog::load(en(), store.clone(), &settings(20)).unwrap();
        *store.contents.lock() = Some("[1, 2".to_string());
        assert!(catalog.reload().is_err());
        assert_eq!(catalog.get("x"), "y");
    }

    #[test]
    fn test_encode_uses_configured_indent() {
        let mut entries = BTreeMap::new();
        entries.insert("k".to_string(), "v".to_string());
        assert_eq!(encode(&en(), &entries, 2).unwrap(), "{\n  \"k\": \"v\"\n}");
        assert_eq!(encode(&en(), &entries, 4).unwrap(), "{\n    \"k\": \"v\"\n}");
    }

    #[test]
    fn test_drop_flushes_pending_changes() {
        let store = Arc::new(MemoryStore::default());
        let catalog = LocaleCatalog::load(en(), store.clone(), &settings(60_000)).unwrap();
        catalog.get("late");
        drop(catalog);
        assert_eq!(store.document()["late"], "late");
        assert_eq!(store.writes(), 1);
    }
}
