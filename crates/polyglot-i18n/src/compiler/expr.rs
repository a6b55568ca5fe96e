//! Compiled expression tree and the helper vocabulary it calls into

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Runtime helpers a compiled message may call.
///
/// Variants are declared in the order of their import names so that a
/// [`HelperSet`] iterates in sorted import order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Helper {
    /// `__date`
    Date,
    /// `__interpolate`
    Interpolate,
    /// `__number`
    Number,
    /// `__offsetPlural`
    OffsetPlural,
    /// `__plural`
    Plural,
    /// `__select`
    Select,
    /// `__time`
    Time,
}

impl Helper {
    /// Name generated code imports the helper under
    pub const fn import_name(self) -> &'static str {
        match self {
            Self::Date => "__date",
            Self::Interpolate => "__interpolate",
            Self::Number => "__number",
            Self::OffsetPlural => "__offsetPlural",
            Self::Plural => "__plural",
            Self::Select => "__select",
            Self::Time => "__time",
        }
    }
}

impl fmt::Display for Helper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.import_name())
    }
}

/// Helpers used by one or more compiled messages, in import order
pub type HelperSet = BTreeSet<Helper>;

/// Selector of a select or plural branch
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OptionKey {
    /// `=N`: matches the raw value exactly
    Exact(i64),
    /// Category abbreviation (plural) or string selector (select)
    Named(String),
}

impl OptionKey {
    /// Normalize a raw selector: trim it and turn `=N` into an exact key
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        trimmed
            .strip_prefix('=')
            .and_then(|digits| digits.trim().parse().ok())
            .map_or_else(|| Self::Named(trimmed.to_string()), Self::Exact)
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(n) => write!(f, "{n}"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// Branches of a compiled select or plural
pub type Options = BTreeMap<OptionKey, Expr>;

/// Body of a compiled message
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal fragment
    Text(String),
    /// Concatenation of fragments
    Template(Vec<Expr>),
    /// Raw argument, as produced by `#` in a plural without offset
    Param(String),
    /// Argument minus the enclosing plural's offset
    OffsetParam {
        /// Argument name
        param: String,
        /// Amount subtracted
        offset: i64,
    },
    /// Helper invocation
    Call(HelperCall),
}

/// Invocation of one runtime helper
#[derive(Debug, Clone, PartialEq)]
pub enum HelperCall {
    /// `__interpolate(param)`
    Interpolate {
        /// Argument name
        param: String,
    },
    /// `__number(param, style?)`
    Number {
        /// Argument name
        param: String,
        /// Optional style
        style: Option<String>,
    },
    /// `__date(param, style?)`
    Date {
        /// Argument name
        param: String,
        /// Optional style
        style: Option<String>,
    },
    /// `__time(param, style?)`
    Time {
        /// Argument name
        param: String,
        /// Optional style
        style: Option<String>,
    },
    /// `__select(param, options)`
    Select {
        /// Argument name
        param: String,
        /// Branches
        options: Options,
    },
    /// `__plural(param, options)`
    Plural {
        /// Argument name
        param: String,
        /// Branches
        options: Options,
    },
    /// `__offsetPlural(param, offset, options)`
    OffsetPlural {
        /// Argument name
        param: String,
        /// Non-zero offset
        offset: i64,
        /// Branches
        options: Options,
    },
}

impl HelperCall {
    /// Helper the call resolves to
    pub const fn helper(&self) -> Helper {
        match self {
            Self::Interpolate { .. } => Helper::Interpolate,
            Self::Number { .. } => Helper::Number,
            Self::Date { .. } => Helper::Date,
            Self::Time { .. } => Helper::Time,
            Self::Select { .. } => Helper::Select,
            Self::Plural { .. } => Helper::Plural,
            Self::OffsetPlural { .. } => Helper::OffsetPlural,
        }
    }
}
