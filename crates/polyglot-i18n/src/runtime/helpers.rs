//! Runtime helper vocabulary
//!
//! These are the functions compiled messages call into. None of them fail:
//! a formatter that cannot be built degrades to plain output and is logged.

use super::context::FormatContext;
use super::formatters::DateTimeKind;
use crate::compiler::OptionKey;
use crate::pluralization::{category_for, PluralCategory};
use crate::value::{plain_number, Value};
use std::collections::BTreeMap;
use tracing::warn;

/// Rendering of a value that failed to convert to a date
pub const INVALID_DATE: &str = "Invalid Date";

const OTHER: &str = "other";

/// Display form of a value; empty-like values render as nothing, zero renders as `0`
pub fn interpolate(value: &Value) -> String {
    if value.is_empty_like() {
        String::new()
    } else {
        value.to_string()
    }
}

/// Locale-aware number
pub fn number_format(ctx: &FormatContext, value: &Value, style: Option<&str>) -> String {
    let n = value.as_number().unwrap_or(f64::NAN);
    match ctx.formatters().number(ctx.locale(), style) {
        Ok(formatter) => formatter.format(n),
        Err(e) => {
            warn!(error = %e, "number formatter unavailable, using plain output");
            plain_number(n)
        }
    }
}

/// Locale-aware date; the configured default style applies when `style` is `None`
pub fn date_format(ctx: &FormatContext, value: &Value, style: Option<&str>) -> String {
    format_datetime(ctx, DateTimeKind::Date, value, style)
}

/// Locale-aware time of day; the configured default style applies when `style` is `None`
pub fn time_format(ctx: &FormatContext, value: &Value, style: Option<&str>) -> String {
    format_datetime(ctx, DateTimeKind::Time, value, style)
}

fn format_datetime(
    ctx: &FormatContext,
    kind: DateTimeKind,
    value: &Value,
    style: Option<&str>,
) -> String {
    let Some(dt) = value.as_datetime() else {
        return INVALID_DATE.to_string();
    };
    match ctx.formatters().datetime(ctx.locale(), kind, style) {
        Ok(formatter) => formatter.format(&dt),
        Err(e) => {
            warn!(error = %e, "date formatter unavailable, using RFC 3339");
            dt.to_rfc3339()
        }
    }
}

/// Pick a select branch: the value's own key, then `other`.
pub fn select_format<'a, T>(value: &Value, options: &'a BTreeMap<OptionKey, T>) -> Option<&'a T> {
    options
        .get(&OptionKey::Named(value.to_string()))
        .or_else(|| exact_key(value).and_then(|key| options.get(&key)))
        .or_else(|| options.get(&OptionKey::Named(OTHER.to_string())))
}

/// Pick a plural branch without offset
pub fn plural_format<'a, T>(
    ctx: &FormatContext,
    value: &Value,
    options: &'a BTreeMap<OptionKey, T>,
) -> Option<&'a T> {
    plural_select(ctx, value, 0, options)
}

/// Pick a plural branch with an offset
pub fn offset_plural_format<'a, T>(
    ctx: &FormatContext,
    value: &Value,
    offset: i64,
    options: &'a BTreeMap<OptionKey, T>,
) -> Option<&'a T> {
    plural_select(ctx, value, offset, options)
}

/// Plural branch resolution.
///
/// An exact `=N` key is matched against the raw value, never against
/// `value - offset`. Otherwise the category of `value - offset` under the
/// context locale's rules is tried, then `other`.
pub fn plural_select<'a, T>(
    ctx: &FormatContext,
    value: &Value,
    offset: i64,
    options: &'a BTreeMap<OptionKey, T>,
) -> Option<&'a T> {
    if let Some(branch) = exact_key(value).and_then(|key| options.get(&key)) {
        return Some(branch);
    }

    #[allow(clippy::cast_precision_loss)]
    let n = value.as_number().map_or(f64::NAN, |n| n - offset as f64);
    let category = match ctx.formatters().plural_rules(ctx.locale()) {
        Ok(rules) => category_for(&rules, n),
        Err(e) => {
            warn!(error = %e, "plural rules unavailable, using 'other'");
            PluralCategory::Other
        }
    };

    options
        .get(&OptionKey::Named(category.abbreviation().to_string()))
        .or_else(|| options.get(&OptionKey::Named(category.as_str().to_string())))
        .or_else(|| options.get(&OptionKey::Named(PluralCategory::Other.abbreviation().to_string())))
        .or_else(|| options.get(&OptionKey::Named(OTHER.to_string())))
}

/// Integral numeric values map to `=N` keys.
fn exact_key(value: &Value) -> Option<OptionKey> {
    const MAX_SAFE: f64 = 9_007_199_254_740_991.0;
    let n = match value {
        Value::Number(n) => *n,
        Value::Text(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    #[allow(clippy::cast_possible_truncation)]
    (n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_SAFE).then(|| OptionKey::Exact(n as i64))
}
