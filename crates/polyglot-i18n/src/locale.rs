//! Locale identifiers

use crate::error::{I18nError, I18nResult};
use std::fmt;
use std::str::FromStr;
use unic_langid::LanguageIdentifier;

/// A validated BCP 47 language identifier such as `en` or `pt-BR`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locale {
    langid: LanguageIdentifier,
}

impl Locale {
    /// Parse a locale from a language tag
    pub fn parse(tag: &str) -> I18nResult<Self> {
        tag.parse()
    }

    /// The underlying language identifier
    pub const fn language_identifier(&self) -> &LanguageIdentifier {
        &self.langid
    }

    /// Primary language subtag, e.g. `pt` for `pt-BR`
    pub fn language(&self) -> &str {
        self.langid.language.as_str()
    }

    /// Region subtag, if any
    pub fn region(&self) -> Option<&str> {
        self.langid.region.as_ref().map(|r| r.as_str())
    }

    /// File name of this locale's catalog
    pub fn catalog_file_name(&self) -> String {
        format!("{self}.json")
    }

    /// Convert to an ICU4X locale for plural rules and number formatting
    pub fn to_icu(&self) -> Result<icu_locid::Locale, icu_locid::ParserError> {
        icu_locid::Locale::from_str(&self.to_string())
    }

    /// Nearest chrono locale for localized month and day names
    pub fn chrono_locale(&self) -> chrono::Locale {
        let language = self.language();
        let mut candidates = Vec::with_capacity(2);
        if let Some(region) = self.region() {
            candidates.push(format!("{language}_{region}"));
        }
        candidates.push(default_posix_name(language));

        candidates
            .iter()
            .find_map(|name| chrono::Locale::try_from(name.as_str()).ok())
            .unwrap_or(chrono::Locale::POSIX)
    }
}

/// `ll_RR` name of the most common region for a bare language.
fn default_posix_name(language: &str) -> String {
    let region = match language {
        "en" => "US",
        "ja" => "JP",
        "zh" => "CN",
        "ko" => "KR",
        "sv" => "SE",
        "da" => "DK",
        "cs" => "CZ",
        "uk" => "UA",
        "el" => "GR",
        "he" => "IL",
        "hi" => "IN",
        "ar" => "SA",
        "nb" => "NO",
        "vi" => "VN",
        other => return format!("{other}_{}", other.to_ascii_uppercase()),
    };
    format!("{language}_{region}")
}

impl FromStr for Locale {
    type Err = I18nError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let langid = tag
            .trim()
            .parse::<LanguageIdentifier>()
            .map_err(|_| I18nError::InvalidLanguageId(tag.to_string()))?;
        Ok(Self { langid })
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.langid.fmt(f)
    }
}

impl From<LanguageIdentifier> for Locale {
    fn from(langid: LanguageIdentifier) -> Self {
        Self { langid }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonicalizes() {
        let locale = Locale::parse("pt_br").unwrap();
        assert_eq!(locale.to_string(), "pt-BR");
        assert_eq!(locale.language(), "pt");
        assert_eq!(locale.region(), Some("BR"));
        assert_eq!(locale.catalog_file_name(), "pt-BR.json");
    }

    #[test]
    fn test_invalid_tag() {
        assert!(matches!(
            Locale::parse("not a locale"),
            Err(I18nError::InvalidLanguageId(_))
        ));
    }

    #[test]
    fn test_icu_conversion() {
        let locale = Locale::parse("de-AT").unwrap();
        assert_eq!(locale.to_icu().unwrap().to_string(), "de-AT");
    }

    #[test]
    fn test_chrono_locale_fallbacks() {
        assert_eq!(Locale::parse("fr").unwrap().chrono_locale(), chrono::Locale::fr_FR);
        assert_eq!(Locale::parse("en").unwrap().chrono_locale(), chrono::Locale::en_US);
        assert_eq!(Locale::parse("de-CH").unwrap().chrono_locale(), chrono::Locale::de_CH);
    }
}
