//! Runtime formatting library
//!
//! Compiled messages render through a [`FormatContext`] that carries the
//! locale and a bounded, memoizing [`FormatterCache`]. The process-wide
//! current locale only backs the [`format`] convenience entry point.

pub mod context;
pub mod formatters;
pub mod helpers;
pub mod render;

pub use context::{
    clear_current_locale, current_context, current_locale, set_current_locale,
    set_current_locale_tag, shared_formatters, FormatContext,
};
pub use formatters::{DateTimeFormatter, DateTimeKind, FormatterCache, NumberFormatter, NumberStyle};
pub use helpers::{
    date_format, interpolate, number_format, offset_plural_format, plural_format, plural_select,
    select_format, time_format,
};
pub use render::format;
