//! Router localization options.
//!
//! Read-only during request handling: populate during the configuration
//! phase, share behind an `Arc`, and never mutate once traffic begins.

use crate::error::ConfigError;
use crate::locale::allowed::AllowedLocales;
use crate::locale::equivalents::EquivalenceMap;
use crate::locale::identifier::LocaleIdentifier;

/// Name of the URL parameter carrying a localization value, both as the
/// path substitution target and in query strings.
pub const URL_PARAM_LOCALIZATION: &str = "localization";

/// Shared localization configuration for resolution and URL building.
#[derive(Debug, Clone)]
pub struct LocalizationOptions {
    default_localization: LocaleIdentifier,

    /// Cached string form of the default, compared against often
    default_localization_str: String,

    allowed: AllowedLocales,
    equivalents: EquivalenceMap,

    /// Match `Accept-Language` candidates on language prefix only,
    /// selecting the first allowed localization with that language
    detect_localization_only_by_lang: bool,

    /// Redirect the first request to the default localization version when
    /// detection did not come from an explicit URL/switch value
    redirect_first_request_to_default: bool,

    /// Key per-locale route records by full language+locale instead of
    /// bare language
    route_records_by_language_and_locale: bool,

    /// Permit registering routes with no per-locale records
    allow_non_localized_routes: bool,

    localization_param_name: String,
    query_separator: String,
}

impl LocalizationOptions {
    /// Create options around a default localization string (`en`, `en-US`).
    pub fn new(default_localization: &str) -> Result<Self, ConfigError> {
        let default = parse_config_localization(default_localization)?;
        let default_str = default.to_string();
        let allowed = AllowedLocales::new(&default);
        Ok(Self {
            default_localization: default,
            default_localization_str: default_str,
            allowed,
            equivalents: EquivalenceMap::new(),
            detect_localization_only_by_lang: true,
            redirect_first_request_to_default: false,
            route_records_by_language_and_locale: false,
            allow_non_localized_routes: true,
            localization_param_name: URL_PARAM_LOCALIZATION.to_string(),
            query_separator: "&".to_string(),
        })
    }

    // ==================== Default localization ====================

    pub fn default_localization(&self) -> &LocaleIdentifier {
        &self.default_localization
    }

    pub fn default_localization_str(&self) -> &str {
        &self.default_localization_str
    }

    pub fn set_default_localization(&mut self, value: &str) -> Result<&mut Self, ConfigError> {
        self.default_localization = parse_config_localization(value)?;
        self.default_localization_str = self.default_localization.to_string();
        self.allowed.set_default(&self.default_localization);
        Ok(self)
    }

    // ==================== Allowed localizations ====================

    pub fn allowed(&self) -> &AllowedLocales {
        &self.allowed
    }

    /// Replace the allowed list. Entries are validated; the default stays a
    /// member regardless.
    pub fn set_allowed_localizations<I, S>(&mut self, localizations: I) -> Result<&mut Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let validated = validate_localizations(localizations)?;
        self.allowed.replace(validated);
        Ok(self)
    }

    /// Merge entries into the allowed list.
    pub fn add_allowed_localizations<I, S>(&mut self, localizations: I) -> Result<&mut Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let validated = validate_localizations(localizations)?;
        self.allowed.add(validated);
        Ok(self)
    }

    // ==================== Equivalents ====================

    pub fn equivalents(&self) -> &EquivalenceMap {
        &self.equivalents
    }

    /// Replace the equivalence configuration (`target -> [equivalents...]`).
    pub fn set_localization_equivalents<I, S, E>(&mut self, equivalents: I) -> &mut Self
    where
        I: IntoIterator<Item = (S, Vec<E>)>,
        S: Into<String>,
        E: Into<String>,
    {
        self.equivalents.replace(equivalents);
        self
    }

    /// Merge additional equivalence entries.
    pub fn add_localization_equivalents<I, S, E>(&mut self, equivalents: I) -> &mut Self
    where
        I: IntoIterator<Item = (S, Vec<E>)>,
        S: Into<String>,
        E: Into<String>,
    {
        self.equivalents.add(equivalents);
        self
    }

    // ==================== Flags ====================

    pub fn detect_localization_only_by_lang(&self) -> bool {
        self.detect_localization_only_by_lang
    }

    pub fn set_detect_localization_only_by_lang(&mut self, value: bool) -> &mut Self {
        self.detect_localization_only_by_lang = value;
        self
    }

    pub fn redirect_first_request_to_default(&self) -> bool {
        self.redirect_first_request_to_default
    }

    pub fn set_redirect_first_request_to_default(&mut self, value: bool) -> &mut Self {
        self.redirect_first_request_to_default = value;
        self
    }

    pub fn route_records_by_language_and_locale(&self) -> bool {
        self.route_records_by_language_and_locale
    }

    pub fn set_route_records_by_language_and_locale(&mut self, value: bool) -> &mut Self {
        self.route_records_by_language_and_locale = value;
        self
    }

    pub fn allow_non_localized_routes(&self) -> bool {
        self.allow_non_localized_routes
    }

    pub fn set_allow_non_localized_routes(&mut self, value: bool) -> &mut Self {
        self.allow_non_localized_routes = value;
        self
    }

    // ==================== Naming ====================

    pub fn localization_param_name(&self) -> &str {
        &self.localization_param_name
    }

    pub fn set_localization_param_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.localization_param_name = name.into();
        self
    }

    /// Query parameter used for explicit session-switch requests, derived
    /// from the localization parameter name.
    pub fn switch_param_name(&self) -> String {
        format!("switch_{}", self.localization_param_name)
    }

    pub fn query_separator(&self) -> &str {
        &self.query_separator
    }

    pub fn set_query_separator(&mut self, separator: impl Into<String>) -> &mut Self {
        self.query_separator = separator.into();
        self
    }

    /// Routing locale key for a localization string: the full string when
    /// records are keyed by language and locale, the language part
    /// otherwise.
    pub fn routing_key_for(&self, localization: &str) -> String {
        if self.route_records_by_language_and_locale {
            localization.to_string()
        } else {
            localization
                .split(crate::locale::identifier::LANG_AND_LOCALE_SEPARATOR)
                .next()
                .unwrap_or(localization)
                .to_string()
        }
    }
}

fn parse_config_localization(value: &str) -> Result<LocaleIdentifier, ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::MissingLanguage);
    }
    LocaleIdentifier::parse(value).map_err(|source| ConfigError::InvalidLocalization {
        value: value.to_string(),
        source,
    })
}

fn validate_localizations<I, S>(localizations: I) -> Result<Vec<String>, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut validated = Vec::new();
    for localization in localizations {
        let id = parse_config_localization(localization.as_ref())?;
        validated.push(id.to_string());
    }
    Ok(validated)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Construction Tests ====================

    #[test]
    fn test_defaults() {
        let options = LocalizationOptions::new("en").unwrap();
        assert_eq!(options.default_localization_str(), "en");
        assert!(options.detect_localization_only_by_lang());
        assert!(!options.redirect_first_request_to_default());
        assert!(!options.route_records_by_language_and_locale());
        assert!(options.allow_non_localized_routes());
        assert_eq!(options.localization_param_name(), "localization");
        assert_eq!(options.switch_param_name(), "switch_localization");
        assert_eq!(options.query_separator(), "&");
    }

    #[test]
    fn test_empty_default_rejected() {
        assert!(matches!(
            LocalizationOptions::new(""),
            Err(ConfigError::MissingLanguage)
        ));
    }

    #[test]
    fn test_malformed_default_rejected() {
        assert!(matches!(
            LocalizationOptions::new("english"),
            Err(ConfigError::InvalidLocalization { .. })
        ));
    }

    // ==================== Allowed Set Tests ====================

    #[test]
    fn test_default_stays_allowed_through_configuration() {
        let mut options = LocalizationOptions::new("en").unwrap();
        options.set_allowed_localizations(["de-DE", "cs-CZ"]).unwrap();
        assert!(options.allowed().is_allowed("en"));

        options.set_default_localization("de-DE").unwrap();
        options.add_allowed_localizations(["fr"]).unwrap();
        assert!(options.allowed().is_allowed("de-DE"));
        assert!(options.allowed().is_allowed("fr"));
    }

    #[test]
    fn test_allowed_entries_normalized() {
        let mut options = LocalizationOptions::new("en").unwrap();
        options.set_allowed_localizations(["DE-de"]).unwrap();
        assert!(options.allowed().is_allowed("de-DE"));
    }

    #[test]
    fn test_malformed_allowed_entry_rejected() {
        let mut options = LocalizationOptions::new("en").unwrap();
        assert!(options.set_allowed_localizations(["german"]).is_err());
    }

    // ==================== Routing Key Tests ====================

    #[test]
    fn test_routing_key_by_language_only() {
        let options = LocalizationOptions::new("en").unwrap();
        assert_eq!(options.routing_key_for("de-DE"), "de");
        assert_eq!(options.routing_key_for("de"), "de");
    }

    #[test]
    fn test_routing_key_full() {
        let mut options = LocalizationOptions::new("en").unwrap();
        options.set_route_records_by_language_and_locale(true);
        assert_eq!(options.routing_key_for("de-DE"), "de-DE");
    }
}
