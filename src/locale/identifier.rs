//! Localization identifier: a validated `(language, locale?)` pair.
//!
//! The language is always two lowercase letters (international language
//! code); the locale, when present, is two or three uppercase letters or
//! digits (international locale code). The string form joins the two with
//! [`LANG_AND_LOCALE_SEPARATOR`], e.g. `en` or `en-US`.

use crate::error::LocaleParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator between the language and locale parts of a localization string.
pub const LANG_AND_LOCALE_SEPARATOR: char = '-';

/// A validated localization value.
///
/// Immutable once constructed; resolution produces a fresh value per
/// request. Construction from configuration should use [`LocaleIdentifier::parse`]
/// and treat errors as fatal, while request-sourced tokens treat a parse
/// failure as "signal absent" and fall through to the next detection source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LocaleIdentifier {
    /// ISO 639-1 language code (e.g., "en", "de")
    language: String,

    /// International locale code (e.g., "US", "DE"), absent for
    /// language-only localizations
    locale: Option<String>,
}

impl LocaleIdentifier {
    /// Create an identifier from already-separated parts.
    ///
    /// Case is normalized before validation, so `("EN", Some("us"))` yields
    /// `en-US`.
    pub fn new(language: &str, locale: Option<&str>) -> Result<Self, LocaleParseError> {
        let language = language.trim().to_ascii_lowercase();
        if language.is_empty() {
            return Err(LocaleParseError::Empty);
        }
        if !is_valid_language(&language) {
            return Err(LocaleParseError::InvalidLanguage(language));
        }
        let locale = match locale {
            Some(l) if !l.trim().is_empty() => {
                let l = l.trim().to_ascii_uppercase();
                if !is_valid_locale(&l) {
                    return Err(LocaleParseError::InvalidLocale(l));
                }
                Some(l)
            }
            _ => None,
        };
        Ok(Self { language, locale })
    }

    /// Parse a joined localization string (`en` or `en-US`).
    pub fn parse(value: &str) -> Result<Self, LocaleParseError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(LocaleParseError::Empty);
        }
        match value.split_once(LANG_AND_LOCALE_SEPARATOR) {
            Some((language, locale)) => Self::new(language, Some(locale)),
            None => Self::new(value, None),
        }
    }

    /// The language part.
    pub fn language(&self) -> &str {
        &self.language
    }

    /// The locale part, if present.
    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    /// Whether a locale part is present.
    pub fn has_locale(&self) -> bool {
        self.locale.is_some()
    }

    /// A copy of this identifier with the locale part stripped.
    pub fn language_only(&self) -> Self {
        Self {
            language: self.language.clone(),
            locale: None,
        }
    }

    /// The key used to index per-locale route data: the full localization
    /// string when routes are distinguished by language and locale, the
    /// bare language otherwise.
    pub fn routing_key(&self, by_language_and_locale: bool) -> String {
        if by_language_and_locale {
            self.to_string()
        } else {
            self.language.clone()
        }
    }
}

impl fmt::Display for LocaleIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.locale {
            Some(locale) => write!(f, "{}{}{}", self.language, LANG_AND_LOCALE_SEPARATOR, locale),
            None => write!(f, "{}", self.language),
        }
    }
}

impl FromStr for LocaleIdentifier {
    type Err = LocaleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for LocaleIdentifier {
    type Error = LocaleParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<LocaleIdentifier> for String {
    fn from(value: LocaleIdentifier) -> Self {
        value.to_string()
    }
}

fn is_valid_language(language: &str) -> bool {
    language.len() == 2 && language.bytes().all(|b| b.is_ascii_lowercase())
}

fn is_valid_locale(locale: &str) -> bool {
    (2..=3).contains(&locale.len())
        && locale
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // ==================== Parsing Tests ====================

    #[test]
    fn test_parse_language_only() {
        let id = LocaleIdentifier::parse("en").unwrap();
        assert_eq!(id.language(), "en");
        assert_eq!(id.locale(), None);
        assert!(!id.has_locale());
    }

    #[test]
    fn test_parse_language_and_locale() {
        let id = LocaleIdentifier::parse("en-US").unwrap();
        assert_eq!(id.language(), "en");
        assert_eq!(id.locale(), Some("US"));
        assert!(id.has_locale());
    }

    #[test]
    fn test_parse_normalizes_case() {
        let id = LocaleIdentifier::parse("EN-us").unwrap();
        assert_eq!(id.to_string(), "en-US");
    }

    #[test]
    fn test_parse_numeric_locale() {
        let id = LocaleIdentifier::parse("es-419").unwrap();
        assert_eq!(id.locale(), Some("419"));
    }

    #[test]
    fn test_parse_empty_fails() {
        assert_eq!(LocaleIdentifier::parse(""), Err(LocaleParseError::Empty));
        assert_eq!(LocaleIdentifier::parse("  "), Err(LocaleParseError::Empty));
    }

    #[test]
    fn test_parse_three_letter_language_fails() {
        assert!(matches!(
            LocaleIdentifier::parse("eng"),
            Err(LocaleParseError::InvalidLanguage(_))
        ));
    }

    #[test]
    fn test_parse_long_locale_fails() {
        assert!(matches!(
            LocaleIdentifier::parse("en-LATN"),
            Err(LocaleParseError::InvalidLocale(_))
        ));
    }

    #[test]
    fn test_trailing_separator_without_locale() {
        // "en-" splits into ("en", "") and the empty locale is dropped
        let id = LocaleIdentifier::parse("en-").unwrap();
        assert_eq!(id.locale(), None);
    }

    // ==================== Accessor Tests ====================

    #[test]
    fn test_language_only_strips_locale() {
        let id = LocaleIdentifier::parse("de-DE").unwrap();
        let lang = id.language_only();
        assert_eq!(lang.to_string(), "de");
    }

    #[test]
    fn test_routing_key_by_language() {
        let id = LocaleIdentifier::parse("de-DE").unwrap();
        assert_eq!(id.routing_key(false), "de");
        assert_eq!(id.routing_key(true), "de-DE");
    }

    #[test]
    fn test_display_round_trip() {
        for s in ["en", "en-US", "cs-CZ", "es-419"] {
            let id = LocaleIdentifier::parse(s).unwrap();
            assert_eq!(id.to_string(), s);
        }
    }

    #[test]
    fn test_equality_and_hash() {
        let a = LocaleIdentifier::parse("en-US").unwrap();
        let b = LocaleIdentifier::new("en", Some("US")).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, a.language_only());
    }

    // ==================== Serde Tests ====================

    #[test]
    fn test_serde_string_form() {
        let id = LocaleIdentifier::parse("de-DE").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"de-DE\"");

        let restored: LocaleIdentifier = serde_json::from_str("\"de-DE\"").unwrap();
        assert_eq!(restored, id);
    }

    #[test]
    fn test_serde_rejects_invalid() {
        let result: Result<LocaleIdentifier, _> = serde_json::from_str("\"not a locale\"");
        assert!(result.is_err());
    }

    // ==================== Property Tests ====================

    proptest! {
        #[test]
        fn prop_display_parse_round_trip(
            lang in "[a-z]{2}",
            locale in proptest::option::of("[A-Z0-9]{2,3}"),
        ) {
            let id = LocaleIdentifier::new(&lang, locale.as_deref()).unwrap();
            let parsed = LocaleIdentifier::parse(&id.to_string()).unwrap();
            prop_assert_eq!(parsed, id);
        }

        #[test]
        fn prop_parse_never_panics(input in ".{0,16}") {
            let _ = LocaleIdentifier::parse(&input);
        }
    }
}
