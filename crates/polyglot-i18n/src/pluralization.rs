//! Plural categories and their option-key abbreviations
//!
//! Compiled messages key plural branches by single-letter abbreviations of the
//! CLDR categories so the generated option maps stay small. The runtime maps a
//! number to its category through ICU4X plural rules and then back to the same
//! abbreviation.

use icu_plurals::{PluralCategory as IcuCategory, PluralOperands, PluralRules};
use std::str::FromStr;

/// CLDR plural category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluralCategory {
    /// `zero`
    Zero,
    /// `one`
    One,
    /// `two`
    Two,
    /// `few`
    Few,
    /// `many`
    Many,
    /// `other`
    Other,
}

impl PluralCategory {
    /// All categories in CLDR order
    pub const ALL: [Self; 6] = [
        Self::Zero,
        Self::One,
        Self::Two,
        Self::Few,
        Self::Many,
        Self::Other,
    ];

    /// Full category name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Zero => "zero",
            Self::One => "one",
            Self::Two => "two",
            Self::Few => "few",
            Self::Many => "many",
            Self::Other => "other",
        }
    }

    /// Single-letter option key used by compiled plural maps
    pub const fn abbreviation(self) -> &'static str {
        match self {
            Self::Zero => "z",
            Self::One => "o",
            Self::Two => "t",
            Self::Few => "f",
            Self::Many => "m",
            Self::Other => "h",
        }
    }

    /// Look up a category by its full name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }

    /// Abbreviate a plural option key; names outside the category table pass through
    pub fn abbreviate(name: &str) -> &str {
        match Self::from_name(name) {
            Some(category) => category.abbreviation(),
            None => name,
        }
    }
}

impl From<IcuCategory> for PluralCategory {
    fn from(category: IcuCategory) -> Self {
        match category {
            IcuCategory::Zero => Self::Zero,
            IcuCategory::One => Self::One,
            IcuCategory::Two => Self::Two,
            IcuCategory::Few => Self::Few,
            IcuCategory::Many => Self::Many,
            IcuCategory::Other => Self::Other,
        }
    }
}

/// Category of `n` under `rules`.
///
/// Operands are derived from the decimal rendering of `|n|` so that visible
/// fraction digits take part in rule selection. Non-finite numbers are `other`.
pub fn category_for(rules: &PluralRules, n: f64) -> PluralCategory {
    if !n.is_finite() {
        return PluralCategory::Other;
    }
    let rendered = crate::value::plain_number(n.abs());
    PluralOperands::from_str(&rendered)
        .map_or(PluralCategory::Other, |operands| {
            rules.category_for(operands).into()
        })
}
