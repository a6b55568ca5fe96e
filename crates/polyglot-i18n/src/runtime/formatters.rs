//! Locale-bound formatters and their memoization cache

use crate::error::FormatError;
use crate::locale::Locale;
use crate::value::plain_number;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use fixed_decimal::FixedDecimal;
use icu_decimal::FixedDecimalFormatter;
use icu_plurals::PluralRules;
use moka::sync::Cache;
use polyglot_config::{RuntimeConfig, DEFAULT_FORMATTER_CACHE_CAPACITY};
use serde::Serialize;
use std::fmt::Write;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Number presentation selected by a message's style argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberStyle {
    /// Up to three fraction digits
    Decimal,
    /// Rounded to a whole number
    Integer,
    /// Multiplied by 100 and suffixed with `%`
    Percent,
}

impl NumberStyle {
    /// Resolve a style argument; unknown styles format as decimals
    pub fn parse(style: Option<&str>) -> Self {
        match style.map(str::trim) {
            None | Some("" | "decimal" | "number") => Self::Decimal,
            Some("integer") => Self::Integer,
            Some("percent") => Self::Percent,
            Some(other) => {
                debug!(style = other, "unknown number style, formatting as decimal");
                Self::Decimal
            }
        }
    }

    const fn fraction_digits(self) -> usize {
        match self {
            Self::Decimal => 3,
            Self::Integer | Self::Percent => 0,
        }
    }
}

/// Locale-aware number formatter
#[derive(Debug)]
pub struct NumberFormatter {
    inner: FixedDecimalFormatter,
    style: NumberStyle,
}

impl NumberFormatter {
    fn try_new(locale: &Locale, style: NumberStyle) -> Result<Self, FormatError> {
        let icu = locale
            .to_icu()
            .map_err(|e| construction_error("number", locale, e))?;
        let inner = FixedDecimalFormatter::try_new(&(&icu).into(), Default::default())
            .map_err(|e| construction_error("number", locale, e))?;
        Ok(Self { inner, style })
    }

    /// Style the formatter applies
    pub const fn style(&self) -> NumberStyle {
        self.style
    }

    /// Format a number with locale digits and grouping
    pub fn format(&self, n: f64) -> String {
        if n.is_nan() {
            return "NaN".to_string();
        }
        if n.is_infinite() {
            return if n > 0.0 { "∞" } else { "-∞" }.to_string();
        }

        let scaled = match self.style {
            NumberStyle::Percent => n * 100.0,
            NumberStyle::Decimal | NumberStyle::Integer => n,
        };
        let digits = trim_fraction(format!("{scaled:.*}", self.style.fraction_digits()));
        let formatted = FixedDecimal::from_str(&digits)
            .map_or_else(|_| plain_number(scaled), |d| self.inner.format_to_string(&d));

        match self.style {
            NumberStyle::Percent => format!("{formatted}%"),
            NumberStyle::Decimal | NumberStyle::Integer => formatted,
        }
    }
}

fn trim_fraction(mut digits: String) -> String {
    if digits.contains('.') {
        let trimmed = digits.trim_end_matches('0').trim_end_matches('.').len();
        digits.truncate(trimmed);
    }
    if digits == "-0" {
        digits.remove(0);
    }
    digits
}

/// Date or time formatter bound to a strftime pattern and a chrono locale
#[derive(Debug, Clone)]
pub struct DateTimeFormatter {
    pattern: String,
    locale: chrono::Locale,
}

impl DateTimeFormatter {
    fn new(pattern: String, locale: &Locale) -> Self {
        Self {
            pattern,
            locale: locale.chrono_locale(),
        }
    }

    /// Pattern the formatter renders with
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Render a point in time
    pub fn format(&self, dt: &DateTime<Utc>) -> String {
        let mut out = String::new();
        if write!(out, "{}", dt.format_localized(&self.pattern, self.locale)).is_err() {
            warn!(pattern = %self.pattern, "date pattern failed to render");
            out.clear();
            out.push_str(&dt.to_rfc3339());
        }
        out
    }
}

/// Whether the helper formats a calendar date or a time of day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DateTimeKind {
    /// Calendar date
    Date,
    /// Time of day
    Time,
}

impl DateTimeKind {
    const fn name(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Time => "time",
        }
    }

    fn preset(self, style: &str) -> Option<&'static str> {
        Some(match (self, style) {
            (Self::Date, "short") => "%x",
            (Self::Date, "medium") => "%-d %b %Y",
            (Self::Date, "long") => "%-d %B %Y",
            (Self::Date, "full") => "%A, %-d %B %Y",
            (Self::Time, "short") => "%H:%M",
            (Self::Time, "medium") => "%X",
            (Self::Time, "long" | "full") => "%X %Z",
            _ => return None,
        })
    }
}

/// Strftime pattern for a style: a named preset, a valid custom pattern, or the fallback preset.
pub fn resolve_pattern(kind: DateTimeKind, style: &str, fallback: &str) -> String {
    let style = style.trim();
    if let Some(pattern) = kind.preset(style) {
        return pattern.to_string();
    }
    if !style.is_empty() && StrftimeItems::new(style).all(|item| !matches!(item, Item::Error)) {
        return style.to_string();
    }
    warn!(kind = kind.name(), style, "invalid date style, using default");
    kind.preset(fallback)
        .or_else(|| kind.preset("short"))
        .unwrap_or("%c")
        .to_string()
}

#[derive(Serialize)]
struct FormatterKey<'a> {
    locale: String,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    style: Option<&'a str>,
}

impl FormatterKey<'_> {
    fn canonical(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| format!("{}|{}|{:?}", self.locale, self.kind, self.style))
    }
}

/// Memoized formatter instances keyed by locale, kind and style.
///
/// Each kind is held in its own bounded cache so a flood of custom date
/// patterns cannot evict plural rules. Construction runs at most once per
/// key while the entry is resident.
pub struct FormatterCache {
    numbers: Cache<String, Arc<NumberFormatter>>,
    plurals: Cache<String, Arc<PluralRules>>,
    datetimes: Cache<String, Arc<DateTimeFormatter>>,
    constructions: AtomicU64,
    default_date_style: String,
    default_time_style: String,
}

impl FormatterCache {
    /// Create a cache holding at most `capacity` formatters of each kind
    pub fn new(capacity: u64) -> Self {
        Self {
            numbers: Cache::new(capacity),
            plurals: Cache::new(capacity),
            datetimes: Cache::new(capacity),
            constructions: AtomicU64::new(0),
            default_date_style: "short".to_string(),
            default_time_style: "short".to_string(),
        }
    }

    /// Create a cache from runtime configuration
    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self {
            default_date_style: config.default_date_style.clone(),
            default_time_style: config.default_time_style.clone(),
            ..Self::new(config.formatter_cache_capacity)
        }
    }

    /// Number of formatters built so far
    pub fn constructions(&self) -> u64 {
        self.constructions.load(Ordering::Relaxed)
    }

    /// Number of resident formatters across all kinds
    pub fn entry_count(&self) -> u64 {
        self.numbers.run_pending_tasks();
        self.plurals.run_pending_tasks();
        self.datetimes.run_pending_tasks();
        self.numbers.entry_count() + self.plurals.entry_count() + self.datetimes.entry_count()
    }

    /// Style used when a date helper is called without one
    pub fn default_date_style(&self) -> &str {
        &self.default_date_style
    }

    /// Style used when a time helper is called without one
    pub fn default_time_style(&self) -> &str {
        &self.default_time_style
    }

    /// Number formatter for a locale and style
    pub fn number(
        &self,
        locale: &Locale,
        style: Option<&str>,
    ) -> Result<Arc<NumberFormatter>, FormatError> {
        let style = NumberStyle::parse(style);
        let key = FormatterKey {
            locale: locale.to_string(),
            kind: "number",
            style: Some(match style {
                NumberStyle::Decimal => "decimal",
                NumberStyle::Integer => "integer",
                NumberStyle::Percent => "percent",
            }),
        };
        self.memoize(&self.numbers, &key, || NumberFormatter::try_new(locale, style))
    }

    /// Cardinal plural rules for a locale
    pub fn plural_rules(&self, locale: &Locale) -> Result<Arc<PluralRules>, FormatError> {
        let key = FormatterKey {
            locale: locale.to_string(),
            kind: "plural",
            style: None,
        };
        self.memoize(&self.plurals, &key, || {
            let icu = locale
                .to_icu()
                .map_err(|e| construction_error("plural", locale, e))?;
            PluralRules::try_new_cardinal(&(&icu).into())
                .map_err(|e| construction_error("plural", locale, e))
        })
    }

    /// Date or time formatter for a locale; `None` selects the configured default style
    pub fn datetime(
        &self,
        locale: &Locale,
        kind: DateTimeKind,
        style: Option<&str>,
    ) -> Result<Arc<DateTimeFormatter>, FormatError> {
        let fallback = match kind {
            DateTimeKind::Date => self.default_date_style.as_str(),
            DateTimeKind::Time => self.default_time_style.as_str(),
        };
        let style = style.unwrap_or(fallback);
        let key = FormatterKey {
            locale: locale.to_string(),
            kind: kind.name(),
            style: Some(style),
        };
        self.memoize(&self.datetimes, &key, || {
            Ok(DateTimeFormatter::new(
                resolve_pattern(kind, style, fallback),
                locale,
            ))
        })
    }

    fn memoize<T, F>(
        &self,
        cache: &Cache<String, Arc<T>>,
        key: &FormatterKey<'_>,
        build: F,
    ) -> Result<Arc<T>, FormatError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Result<T, FormatError>,
    {
        cache
            .try_get_with(key.canonical(), || {
                self.constructions.fetch_add(1, Ordering::Relaxed);
                debug!(locale = %key.locale, kind = key.kind, style = ?key.style, "building formatter");
                build().map(Arc::new)
            })
            .map_err(|e| (*e).clone())
    }
}

impl Default for FormatterCache {
    fn default() -> Self {
        Self::new(DEFAULT_FORMATTER_CACHE_CAPACITY)
    }
}

impl std::fmt::Debug for FormatterCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatterCache")
            .field("constructions", &self.constructions())
            .field("default_date_style", &self.default_date_style)
            .field("default_time_style", &self.default_time_style)
            .finish_non_exhaustive()
    }
}

fn construction_error(
    kind: &'static str,
    locale: &Locale,
    reason: impl std::fmt::Display,
) -> FormatError {
    FormatError::FormatterConstruction {
        kind,
        locale: locale.to_string(),
        reason: reason.to_string(),
    }
}
