//! Allowed localization set.
//!
//! Holds the localization strings the application accepts, in insertion
//! order. The configured default localization is always a member, even when
//! it was never explicitly added; it sorts first for language-prefix
//! lookups. Mutated only by explicit configuration calls, never during
//! request handling.

use crate::locale::identifier::{LocaleIdentifier, LANG_AND_LOCALE_SEPARATOR};

/// Insertion-ordered set of allowed localization strings.
#[derive(Debug, Clone)]
pub struct AllowedLocales {
    /// String form of the default localization, implicitly always allowed
    default_str: String,

    /// Explicitly configured localizations, insertion ordered, deduplicated
    items: Vec<String>,
}

impl AllowedLocales {
    /// Create a set containing only the implicit default.
    pub fn new(default: &LocaleIdentifier) -> Self {
        Self {
            default_str: default.to_string(),
            items: Vec::new(),
        }
    }

    /// Update the implicit default member.
    pub(crate) fn set_default(&mut self, default: &LocaleIdentifier) {
        self.default_str = default.to_string();
    }

    /// Replace all explicitly configured localizations.
    pub fn replace<I, S>(&mut self, localizations: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items.clear();
        self.add(localizations);
    }

    /// Add localizations, preserving the order of first insertion.
    pub fn add<I, S>(&mut self, localizations: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for localization in localizations {
            let localization = localization.into();
            if !self.items.contains(&localization) {
                self.items.push(localization);
            }
        }
    }

    /// Whether the given localization string is allowed.
    pub fn is_allowed(&self, localization: &str) -> bool {
        self.default_str == localization || self.items.iter().any(|i| i == localization)
    }

    /// The first allowed localization whose language part matches, the
    /// default first. Used when detection matches on language prefix only.
    pub fn first_for_language(&self, language: &str) -> Option<&str> {
        self.iter().find(|candidate| {
            let lang = candidate
                .split(LANG_AND_LOCALE_SEPARATOR)
                .next()
                .unwrap_or(candidate);
            lang == language
        })
    }

    /// All allowed localization strings, the implicit default first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.default_str.as_str()).chain(
            self.items
                .iter()
                .filter(move |i| **i != self.default_str)
                .map(String::as_str),
        )
    }

    /// Number of distinct allowed localizations, including the default.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Always false: the default is a member of every configuration.
    pub fn is_empty(&self) -> bool {
        false
    }
}
