//! File system watching for catalog directories

use crate::error::I18nResult;
use crate::locale::Locale;
use notify::event::EventKind;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Watches a catalog directory and reports which locale's file changed
pub struct CatalogWatcher {
    _watcher: RecommendedWatcher,
    dir: PathBuf,
}

impl CatalogWatcher {
    /// Start watching `dir`, creating it if needed.
    ///
    /// `on_change` runs on the watcher's thread once per relevant event.
    pub fn start<F>(dir: &Path, on_change: F) -> I18nResult<Self>
    where
        F: Fn(Locale) + Send + 'static,
    {
        fs::create_dir_all(dir)?;
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    for locale in changed_locales(&event) {
                        debug!(locale = %locale, kind = ?event.kind, "catalog file changed");
                        on_change(locale);
                    }
                }
                Err(e) => warn!(error = %e, "catalog watcher error"),
            },
            Config::default(),
        )?;
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        info!(dir = %dir.display(), "watching catalog directory");

        Ok(Self {
            _watcher: watcher,
            dir: dir.to_path_buf(),
        })
    }

    /// Directory being watched
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl std::fmt::Debug for CatalogWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogWatcher")
            .field("dir", &self.dir)
            .finish_non_exhaustive()
    }
}

fn changed_locales(event: &Event) -> Vec<Locale> {
    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
        return Vec::new();
    }
    let mut locales: Vec<Locale> = event.paths.iter().filter_map(|p| locale_for_path(p)).collect();
    locales.dedup();
    locales
}

/// Locale named by a catalog file path such as `translations/fr-CA.json`
pub fn locale_for_path(path: &Path) -> Option<Locale> {
    if path.extension()? != "json" {
        return None;
    }
    Locale::parse(path.file_stem()?.to_str()?).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind, RemoveKind};

    #[test]
    fn test_locale_for_path() {
        assert_eq!(
            locale_for_path(Path::new("/tmp/i18n/fr-CA.json")).map(|l| l.to_string()),
            Some("fr-CA".to_string())
        );
        assert!(locale_for_path(Path::new("/tmp/i18n/.tmpA1b2C3")).is_none());
        assert!(locale_for_path(Path::new("/tmp/i18n/en.yaml")).is_none());
        assert!(locale_for_path(Path::new("/tmp/i18n/not a locale.json")).is_none());
    }

    #[test]
    fn test_only_creates_and_modifies_are_relevant() {
        let path = PathBuf::from("/tmp/i18n/en.json");
        let modify = Event::new(EventKind::Modify(ModifyKind::Any)).add_path(path.clone());
        let create = Event::new(EventKind::Create(CreateKind::File)).add_path(path.clone());
        let remove = Event::new(EventKind::Remove(RemoveKind::File)).add_path(path);

        assert_eq!(changed_locales(&modify).len(), 1);
        assert_eq!(changed_locales(&create).len(), 1);
        assert!(changed_locales(&remove).is_empty());
    }
}
