//! `Accept-Language` header parsing.
//!
//! Produces an ordered candidate list: descending by quality weight, ties
//! broken by header order. Tags are normalized (language lowercased, locale
//! uppercased) but not validated here — membership tests against the
//! allowed set decide what counts.

use crate::locale::identifier::LANG_AND_LOCALE_SEPARATOR;

/// One language tag from an `Accept-Language` header, with its quality.
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageCandidate {
    /// Lowercased language subtag (e.g. "en")
    pub language: String,

    /// Uppercased locale subtag, if the tag carried one (e.g. "US")
    pub locale: Option<String>,

    /// Quality weight in `[0.0, 1.0]`, 1.0 when omitted
    pub quality: f32,
}

impl LanguageCandidate {
    /// The normalized tag string, `en` or `en-US`.
    pub fn tag(&self) -> String {
        match &self.locale {
            Some(locale) => format!("{}{}{}", self.language, LANG_AND_LOCALE_SEPARATOR, locale),
            None => self.language.clone(),
        }
    }
}

/// Parse an `Accept-Language` value into candidates ordered by descending
/// quality, preserving header order among equal weights. Wildcard entries
/// and empty tags are skipped; a malformed `q` parameter falls back to 1.0.
pub fn parse_accept_language(header: &str) -> Vec<LanguageCandidate> {
    let mut candidates: Vec<LanguageCandidate> = header
        .split(',')
        .filter_map(parse_entry)
        .collect();

    // Stable sort keeps header order for equal weights
    candidates.sort_by(|a, b| {
        b.quality
            .partial_cmp(&a.quality)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates
}

fn parse_entry(entry: &str) -> Option<LanguageCandidate> {
    let mut parts = entry.split(';');
    let tag = parts.next()?.trim();
    if tag.is_empty() || tag == "*" {
        return None;
    }

    let mut quality = 1.0_f32;
    for param in parts {
        if let Some((key, value)) = param.split_once('=') {
            if key.trim() == "q" {
                if let Ok(q) = value.trim().parse::<f32>() {
                    quality = q.clamp(0.0, 1.0);
                }
            }
        }
    }

    let (language, locale) = match tag.split_once(LANG_AND_LOCALE_SEPARATOR) {
        Some((lang, locale)) => (
            lang.to_ascii_lowercase(),
            Some(locale.to_ascii_uppercase()),
        ),
        None => (tag.to_ascii_lowercase(), None),
    };

    Some(LanguageCandidate {
        language,
        locale,
        quality,
    })
}
