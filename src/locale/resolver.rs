//! Localization resolution.
//!
//! Determines, per request, the effective localization from the available
//! signals, in strict precedence order: explicit switch parameter, stored
//! session value, URL-embedded value, `Accept-Language` negotiation (direct
//! membership first, then equivalence remapping), configured default.
//!
//! The resolver is a pure function of its inputs: writing the result to
//! session storage and issuing the HTTP redirect belong to the caller.

use crate::locale::allowed::AllowedLocales;
use crate::locale::header::{parse_accept_language, LanguageCandidate};
use crate::locale::identifier::LocaleIdentifier;
use crate::locale::options::LocalizationOptions;
use crate::metrics::RouterMetrics;
use tracing::debug;

/// How the active localization was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionKind {
    /// A previous request already stored a localization in the session
    NotFirst,

    /// First request carrying an explicit, allowed switch-parameter or
    /// URL value
    ExplicitRequest,

    /// First request, best match from the `Accept-Language` header
    HeaderBestMatch,

    /// First request, nothing matched; the configured default was used
    Fallback,
}

/// Per-request input signals, already materialized by the transport layer.
#[derive(Debug, Clone, Default)]
pub struct RequestSignals {
    /// Raw value of the dedicated switch query parameter, if present
    pub switch_param: Option<String>,

    /// Localization string recalled from the session, absent on the first
    /// request
    pub session: Option<String>,

    /// Localization embedded in the request path, as parsed by the external
    /// route-matching layer
    pub url_localization: Option<String>,

    /// Raw `Accept-Language` header value
    pub accept_language: Option<String>,
}

/// Instruction to redirect the request to another localization version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectDecision {
    pub target: LocaleIdentifier,
}

/// Result of resolving one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The localization governing routing and URL generation
    pub localization: LocaleIdentifier,

    /// Whether this is the first request (no session value existed)
    pub first_request: bool,

    pub detection: DetectionKind,

    /// Redirect the caller must perform, when signaled
    pub redirect: Option<RedirectDecision>,
}

/// Resolves the effective localization for a request.
pub struct LocalizationResolver<'a> {
    options: &'a LocalizationOptions,
}

impl<'a> LocalizationResolver<'a> {
    pub fn new(options: &'a LocalizationOptions) -> Self {
        Self { options }
    }

    /// Resolve the active localization from the request signals.
    ///
    /// Malformed or disallowed switch/URL values are rejected silently and
    /// resolution falls through to the next source. The returned
    /// localization is always a member of the allowed set.
    pub fn resolve(&self, signals: &RequestSignals) -> Resolution {
        RouterMetrics::global().record_resolution();
        let first_request = signals.session.is_none();

        // 1. Explicit switch parameter
        if let Some(raw) = signals.switch_param.as_deref() {
            if let Some(id) = self.accept_explicit(raw) {
                let detection = if first_request {
                    DetectionKind::ExplicitRequest
                } else {
                    DetectionKind::NotFirst
                };
                return self.finish(id, first_request, detection);
            }
            debug!(value = raw, "ignoring unsupported switch parameter localization");
        }

        // 2. Session value from a previous request
        if let Some(raw) = signals.session.as_deref() {
            if let Some(id) = self.accept_explicit(raw) {
                return self.finish(id, false, DetectionKind::NotFirst);
            }
            debug!(value = raw, "stored session localization no longer allowed");
        }

        // 3. Localization embedded in the request URL
        if let Some(raw) = signals.url_localization.as_deref() {
            if let Some(id) = self.accept_explicit(raw) {
                let detection = if first_request {
                    DetectionKind::ExplicitRequest
                } else {
                    DetectionKind::NotFirst
                };
                return self.finish(id, first_request, detection);
            }
            debug!(value = raw, "ignoring unsupported URL localization");
        }

        // 4. Accept-Language negotiation
        if let Some(header) = signals.accept_language.as_deref() {
            if let Some(id) = self.detect_from_header(header) {
                RouterMetrics::global().record_header_detection();
                return self.finish(id, first_request, DetectionKind::HeaderBestMatch);
            }
        }

        // 5. Configured default
        RouterMetrics::global().record_fallback();
        self.finish(
            self.options.default_localization().clone(),
            first_request,
            DetectionKind::Fallback,
        )
    }

    /// Validate an explicit localization value: parseable and allowed.
    fn accept_explicit(&self, raw: &str) -> Option<LocaleIdentifier> {
        let id = LocaleIdentifier::parse(raw).ok()?;
        if self.options.allowed().is_allowed(&id.to_string()) {
            Some(id)
        } else {
            None
        }
    }

    /// Negotiate against the header candidates: a direct membership pass
    /// over all candidates first, then an equivalence-remapped pass.
    fn detect_from_header(&self, header: &str) -> Option<LocaleIdentifier> {
        let candidates = parse_accept_language(header);
        if candidates.is_empty() {
            return None;
        }

        for candidate in &candidates {
            if let Some(id) = self.match_candidate(candidate) {
                return Some(id);
            }
        }

        for candidate in &candidates {
            if let Some(target) = self.equivalent_target(candidate) {
                if let Ok(mapped) = LocaleIdentifier::parse(&target) {
                    let synthetic = LanguageCandidate {
                        language: mapped.language().to_string(),
                        locale: mapped.locale().map(str::to_string),
                        quality: candidate.quality,
                    };
                    if let Some(id) = self.match_candidate(&synthetic) {
                        return Some(id);
                    }
                }
            }
        }

        None
    }

    /// Membership test for one candidate: language-prefix match selecting
    /// the first allowed localization with that language, or exact match,
    /// per configuration.
    fn match_candidate(&self, candidate: &LanguageCandidate) -> Option<LocaleIdentifier> {
        let allowed: &AllowedLocales = self.options.allowed();
        if self.options.detect_localization_only_by_lang() {
            let hit = allowed.first_for_language(&candidate.language)?;
            LocaleIdentifier::parse(hit).ok()
        } else {
            let tag = candidate.tag();
            if allowed.is_allowed(&tag) {
                LocaleIdentifier::parse(&tag).ok()
            } else {
                None
            }
        }
    }

    /// Equivalence lookup for a candidate: the full tag first, then the
    /// bare language.
    fn equivalent_target(&self, candidate: &LanguageCandidate) -> Option<String> {
        let equivalents = self.options.equivalents();
        equivalents
            .resolve(&candidate.tag())
            .or_else(|| equivalents.resolve(&candidate.language))
            .map(str::to_string)
    }

    fn finish(
        &self,
        localization: LocaleIdentifier,
        first_request: bool,
        detection: DetectionKind,
    ) -> Resolution {
        let redirect = if first_request
            && self.options.redirect_first_request_to_default()
            && detection == DetectionKind::HeaderBestMatch
            && localization != *self.options.default_localization()
        {
            Some(RedirectDecision {
                target: self.options.default_localization().clone(),
            })
        } else {
            None
        };

        Resolution {
            localization,
            first_request,
            detection,
            redirect,
        }
    }
}

/// Rewrite query parameters for a localization redirect.
///
/// If the query already carries the localization parameter, the target is
/// written into it (or the parameter is removed when the target equals the
/// default) and no URL path value is returned; otherwise the parameters are
/// untouched and the target string is returned for path substitution.
pub fn redirect_query_update(
    mut query: Vec<(String, String)>,
    target: &LocaleIdentifier,
    default_localization_str: &str,
    localization_param_name: &str,
) -> (Vec<(String, String)>, Option<String>) {
    let target_str = target.to_string();
    if query.iter().any(|(name, _)| name == localization_param_name) {
        if target_str == default_localization_str {
            query.retain(|(name, _)| name != localization_param_name);
        } else {
            for (name, value) in query.iter_mut() {
                if name == localization_param_name {
                    *value = target_str.clone();
                }
            }
        }
        (query, None)
    } else {
        (query, Some(target_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> LocalizationOptions {
        let mut options = LocalizationOptions::new("en").unwrap();
        options
            .set_allowed_localizations(["en", "en-US", "de-DE", "cs-CZ"])
            .unwrap();
        options
    }

    fn signals() -> RequestSignals {
        RequestSignals::default()
    }

    // ==================== Precedence Tests ====================

    #[test]
    fn test_switch_param_wins_over_everything() {
        let options = options();
        let resolver = LocalizationResolver::new(&options);
        let resolution = resolver.resolve(&RequestSignals {
            switch_param: Some("cs-CZ".to_string()),
            session: Some("de-DE".to_string()),
            url_localization: Some("en-US".to_string()),
            accept_language: Some("en".to_string()),
        });

        assert_eq!(resolution.localization.to_string(), "cs-CZ");
        assert!(!resolution.first_request);
        assert_eq!(resolution.detection, DetectionKind::NotFirst);
    }

    #[test]
    fn test_session_wins_over_url_and_header() {
        let options = options();
        let resolver = LocalizationResolver::new(&options);
        let resolution = resolver.resolve(&RequestSignals {
            session: Some("de-DE".to_string()),
            url_localization: Some("en-US".to_string()),
            accept_language: Some("cs-CZ;q=1.0".to_string()),
            ..signals()
        });

        assert_eq!(resolution.localization.to_string(), "de-DE");
        assert!(!resolution.first_request);
        assert_eq!(resolution.detection, DetectionKind::NotFirst);
        assert!(resolution.redirect.is_none());
    }

    #[test]
    fn test_url_wins_over_header() {
        let options = options();
        let resolver = LocalizationResolver::new(&options);
        let resolution = resolver.resolve(&RequestSignals {
            url_localization: Some("de-DE".to_string()),
            accept_language: Some("cs-CZ".to_string()),
            ..signals()
        });

        assert_eq!(resolution.localization.to_string(), "de-DE");
        assert!(resolution.first_request);
        assert_eq!(resolution.detection, DetectionKind::ExplicitRequest);
    }

    #[test]
    fn test_disallowed_switch_falls_through_to_session() {
        let options = options();
        let resolver = LocalizationResolver::new(&options);
        let resolution = resolver.resolve(&RequestSignals {
            switch_param: Some("fr".to_string()),
            session: Some("de-DE".to_string()),
            ..signals()
        });

        assert_eq!(resolution.localization.to_string(), "de-DE");
    }

    #[test]
    fn test_disallowed_session_falls_through_but_not_first() {
        let options = options();
        let resolver = LocalizationResolver::new(&options);
        let resolution = resolver.resolve(&RequestSignals {
            session: Some("fr".to_string()),
            accept_language: Some("de-DE".to_string()),
            ..signals()
        });

        assert_eq!(resolution.localization.to_string(), "de-DE");
        assert!(!resolution.first_request);
    }

    // ==================== Header Detection Tests ====================

    #[test]
    fn test_header_exact_match_by_weight() {
        let mut options = options();
        options.set_detect_localization_only_by_lang(false);
        let resolver = LocalizationResolver::new(&options);
        let resolution = resolver.resolve(&RequestSignals {
            accept_language: Some("de-DE;q=1.0, en;q=0.5".to_string()),
            ..signals()
        });

        assert_eq!(resolution.localization.to_string(), "de-DE");
        assert!(resolution.first_request);
        assert_eq!(resolution.detection, DetectionKind::HeaderBestMatch);
    }

    #[test]
    fn test_header_language_prefix_match() {
        let options = options();
        let resolver = LocalizationResolver::new(&options);
        let resolution = resolver.resolve(&RequestSignals {
            accept_language: Some("de".to_string()),
            ..signals()
        });

        // First allowed localization sharing the language
        assert_eq!(resolution.localization.to_string(), "de-DE");
    }

    #[test]
    fn test_header_exact_mode_requires_exact_combination() {
        let mut options = options();
        options.set_detect_localization_only_by_lang(false);
        let resolver = LocalizationResolver::new(&options);
        let resolution = resolver.resolve(&RequestSignals {
            accept_language: Some("de".to_string()),
            ..signals()
        });

        // "de" alone is not an allowed combination
        assert_eq!(resolution.localization.to_string(), "en");
        assert_eq!(resolution.detection, DetectionKind::Fallback);
    }

    #[test]
    fn test_header_no_match_falls_back_to_default() {
        let options = options();
        let resolver = LocalizationResolver::new(&options);
        let resolution = resolver.resolve(&RequestSignals {
            accept_language: Some("fr, it;q=0.5".to_string()),
            ..signals()
        });

        assert_eq!(resolution.localization.to_string(), "en");
        assert_eq!(resolution.detection, DetectionKind::Fallback);
    }

    #[test]
    fn test_no_signals_falls_back_to_default() {
        let options = options();
        let resolver = LocalizationResolver::new(&options);
        let resolution = resolver.resolve(&signals());

        assert_eq!(resolution.localization.to_string(), "en");
        assert!(resolution.first_request);
        assert_eq!(resolution.detection, DetectionKind::Fallback);
    }

    // ==================== Equivalence Tests ====================

    #[test]
    fn test_equivalent_header_token_detected() {
        let mut options = LocalizationOptions::new("uk").unwrap();
        options.set_allowed_localizations(["uk"]).unwrap();
        options.set_localization_equivalents([("uk", vec!["ru"])]);
        let resolver = LocalizationResolver::new(&options);

        let resolution = resolver.resolve(&RequestSignals {
            accept_language: Some("ru".to_string()),
            ..signals()
        });

        assert_eq!(resolution.localization.to_string(), "uk");
        assert_eq!(resolution.detection, DetectionKind::HeaderBestMatch);
    }

    #[test]
    fn test_equivalence_is_noop_for_canonical_token() {
        let mut options = LocalizationOptions::new("uk").unwrap();
        options.set_allowed_localizations(["uk"]).unwrap();
        options.set_localization_equivalents([("uk", vec!["ru"])]);
        let resolver = LocalizationResolver::new(&options);

        let direct = resolver.resolve(&RequestSignals {
            accept_language: Some("uk".to_string()),
            ..signals()
        });
        let remapped = resolver.resolve(&RequestSignals {
            accept_language: Some("ru".to_string()),
            ..signals()
        });

        assert_eq!(direct.localization, remapped.localization);
    }

    #[test]
    fn test_direct_match_wins_over_equivalent_of_heavier_candidate() {
        let mut options = LocalizationOptions::new("en").unwrap();
        options.set_allowed_localizations(["en", "uk"]).unwrap();
        options.set_localization_equivalents([("uk", vec!["ru"])]);
        let resolver = LocalizationResolver::new(&options);

        // ru has the higher weight but only matches via equivalence;
        // the direct pass runs over all candidates first
        let resolution = resolver.resolve(&RequestSignals {
            accept_language: Some("ru;q=1.0, en;q=0.4".to_string()),
            ..signals()
        });
        assert_eq!(resolution.localization.to_string(), "en");
    }

    // ==================== Redirect Tests ====================

    #[test]
    fn test_redirect_on_first_request_header_match() {
        let mut options = options();
        options.set_redirect_first_request_to_default(true);
        let resolver = LocalizationResolver::new(&options);
        let resolution = resolver.resolve(&RequestSignals {
            accept_language: Some("de-DE".to_string()),
            ..signals()
        });

        assert_eq!(resolution.localization.to_string(), "de-DE");
        let redirect = resolution.redirect.expect("redirect expected");
        assert_eq!(redirect.target.to_string(), "en");
    }

    #[test]
    fn test_no_redirect_when_flag_disabled() {
        let options = options();
        let resolver = LocalizationResolver::new(&options);
        let resolution = resolver.resolve(&RequestSignals {
            accept_language: Some("de-DE".to_string()),
            ..signals()
        });
        assert!(resolution.redirect.is_none());
    }

    #[test]
    fn test_no_redirect_for_explicit_url_value() {
        let mut options = options();
        options.set_redirect_first_request_to_default(true);
        let resolver = LocalizationResolver::new(&options);
        let resolution = resolver.resolve(&RequestSignals {
            url_localization: Some("de-DE".to_string()),
            ..signals()
        });

        assert_eq!(resolution.localization.to_string(), "de-DE");
        assert!(resolution.redirect.is_none());
    }

    #[test]
    fn test_no_redirect_when_header_matches_default() {
        let mut options = options();
        options.set_redirect_first_request_to_default(true);
        let resolver = LocalizationResolver::new(&options);
        let resolution = resolver.resolve(&RequestSignals {
            accept_language: Some("en".to_string()),
            ..signals()
        });
        assert!(resolution.redirect.is_none());
    }

    #[test]
    fn test_no_redirect_for_stored_session() {
        let mut options = options();
        options.set_redirect_first_request_to_default(true);
        let resolver = LocalizationResolver::new(&options);
        let resolution = resolver.resolve(&RequestSignals {
            session: Some("de-DE".to_string()),
            ..signals()
        });
        assert!(resolution.redirect.is_none());
    }

    // ==================== Redirect Query Update Tests ====================

    #[test]
    fn test_redirect_query_update_without_param() {
        let target = LocaleIdentifier::parse("de-DE").unwrap();
        let (query, url_value) = redirect_query_update(
            vec![("color".to_string(), "blue".to_string())],
            &target,
            "en",
            "localization",
        );
        assert_eq!(query.len(), 1);
        assert_eq!(url_value, Some("de-DE".to_string()));
    }

    #[test]
    fn test_redirect_query_update_overwrites_param() {
        let target = LocaleIdentifier::parse("de-DE").unwrap();
        let (query, url_value) = redirect_query_update(
            vec![("localization".to_string(), "cs-CZ".to_string())],
            &target,
            "en",
            "localization",
        );
        assert_eq!(query, vec![("localization".to_string(), "de-DE".to_string())]);
        assert_eq!(url_value, None);
    }

    #[test]
    fn test_redirect_query_update_removes_param_for_default() {
        let target = LocaleIdentifier::parse("en").unwrap();
        let (query, url_value) = redirect_query_update(
            vec![
                ("localization".to_string(), "cs-CZ".to_string()),
                ("color".to_string(), "blue".to_string()),
            ],
            &target,
            "en",
            "localization",
        );
        assert_eq!(query, vec![("color".to_string(), "blue".to_string())]);
        assert_eq!(url_value, None);
    }
}
