//! Render-time locale context and the process-wide current locale

use super::formatters::FormatterCache;
use crate::error::FormatError;
use crate::locale::Locale;
use arc_swap::ArcSwapOption;
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::debug;

/// Locale and formatter cache a compiled message renders with.
///
/// Every helper receives the context explicitly, so concurrent renders in
/// different locales never observe each other's locale.
#[derive(Debug, Clone)]
pub struct FormatContext {
    locale: Locale,
    formatters: Arc<FormatterCache>,
}

impl FormatContext {
    /// Create a context over an existing formatter cache
    pub const fn new(locale: Locale, formatters: Arc<FormatterCache>) -> Self {
        Self { locale, formatters }
    }

    /// Create a context that uses the process-wide formatter cache
    pub fn shared(locale: Locale) -> Self {
        Self::new(locale, shared_formatters())
    }

    /// Active locale
    pub const fn locale(&self) -> &Locale {
        &self.locale
    }

    /// Formatter cache
    pub fn formatters(&self) -> &FormatterCache {
        &self.formatters
    }

    /// Same cache, different locale
    #[must_use]
    pub fn with_locale(&self, locale: Locale) -> Self {
        Self::new(locale, Arc::clone(&self.formatters))
    }
}

static CURRENT_LOCALE: Lazy<ArcSwapOption<Locale>> = Lazy::new(ArcSwapOption::empty);

static SHARED_FORMATTERS: Lazy<Arc<FormatterCache>> =
    Lazy::new(|| Arc::new(FormatterCache::default()));

/// Set the locale used by [`format`](super::format)
pub fn set_current_locale(locale: Locale) {
    debug!(locale = %locale, "current locale changed");
    CURRENT_LOCALE.store(Some(Arc::new(locale)));
}

/// Parse and set the locale used by [`format`](super::format)
pub fn set_current_locale_tag(tag: &str) -> Result<(), FormatError> {
    let locale = Locale::parse(tag).map_err(|_| FormatError::InvalidLocale(tag.to_string()))?;
    set_current_locale(locale);
    Ok(())
}

/// Locale used by [`format`](super::format), if one was set
pub fn current_locale() -> Option<Locale> {
    CURRENT_LOCALE.load_full().map(|locale| (*locale).clone())
}

/// Return to the initial unset state
pub fn clear_current_locale() {
    CURRENT_LOCALE.store(None);
}

/// Formatter cache shared by contexts created through [`FormatContext::shared`]
pub fn shared_formatters() -> Arc<FormatterCache> {
    Arc::clone(&SHARED_FORMATTERS)
}

/// Context for the current locale over the shared formatter cache
pub fn current_context() -> Result<FormatContext, FormatError> {
    current_locale()
        .map(FormatContext::shared)
        .ok_or(FormatError::LocaleNotSet)
}
