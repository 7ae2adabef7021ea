//! Error types for locale configuration, route registration, and URL building.
//!
//! Resolution-time anomalies (malformed header tokens, unsupported switch
//! parameters) are never errors — they silently fall through to the next
//! detection source. Configuration and URL-composition problems are fatal to
//! the call that caused them and carry enough context (route name, offending
//! locale key or parameter) for diagnosis.

use thiserror::Error;

/// Failure to parse a localization string into a `LocaleIdentifier`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocaleParseError {
    /// The input was empty or contained only a separator
    #[error("localization string is empty")]
    Empty,

    /// The language part is not two ASCII lowercase letters
    #[error("invalid language code `{0}` (expected two lowercase letters)")]
    InvalidLanguage(String),

    /// The locale part is not 2-3 ASCII uppercase letters or digits
    #[error("invalid locale code `{0}` (expected 2-3 uppercase letters or digits)")]
    InvalidLocale(String),
}

/// Configuration-time errors, surfaced synchronously to the caller and never
/// recovered automatically.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The default localization was not given a language component
    #[error("default localization must be defined at least by the language")]
    MissingLanguage,

    /// A configured localization string failed to parse
    #[error("invalid localization `{value}`: {source}")]
    InvalidLocalization {
        value: String,
        source: LocaleParseError,
    },

    /// A locale-keyed group assignment was given to a non-localized route
    #[error("route `{route}`: localized group names require a localized route")]
    LocalizedGroupOnPlainRoute { route: String },

    /// A scalar group name was given to a route whose registered group
    /// assignment is locale-keyed
    #[error("route `{route}`: scalar group name conflicts with localized group assignment")]
    ScalarGroupOnLocalizedRoute { route: String },

    /// A route's group assignment was changed after registration
    #[error("route `{route}`: group assignment cannot change after registration")]
    GroupReassigned { route: String },

    /// A route with the same name or controller:action identity exists
    #[error("route `{route}` is already registered")]
    DuplicateRoute { route: String },

    /// A non-localized route was registered while non-localized routes are
    /// disallowed
    #[error("route `{route}`: non-localized routes are not allowed")]
    NonLocalizedRoute { route: String },

    /// A parameter constraint is not a valid regular expression
    #[error("route `{route}`: invalid constraint for parameter `{param}`: {message}")]
    InvalidConstraint {
        route: String,
        param: String,
        message: String,
    },
}

/// URL-composition errors, fatal to the building call. No partial or
/// best-effort URL is ever returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositionError {
    /// The target localization resolves to no reverse data for this route
    /// and no fallback key is available
    #[error("route `{route}`: no reverse data for localization `{key}`")]
    UnknownLocalization { route: String, key: String },

    /// A parameter reserved for domain substitution holds a value its
    /// placeholder forbids
    #[error("route `{route}`: domain parameter `{name}` holds forbidden value `{value}`")]
    ForbiddenDomainValue {
        route: String,
        name: String,
        value: String,
    },

    /// A parameter value does not satisfy the route's constraint
    #[error("route `{route}`: parameter `{name}` value `{value}` does not match `{constraint}`")]
    ConstraintViolation {
        route: String,
        name: String,
        value: String,
        constraint: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_parse_error_messages() {
        let err = LocaleParseError::InvalidLanguage("eng".to_string());
        assert!(err.to_string().contains("eng"));

        let err = LocaleParseError::InvalidLocale("usa9".to_string());
        assert!(err.to_string().contains("usa9"));
    }

    #[test]
    fn test_config_error_carries_route_name() {
        let err = ConfigError::DuplicateRoute {
            route: "products_list".to_string(),
        };
        assert!(err.to_string().contains("products_list"));
    }

    #[test]
    fn test_composition_error_carries_locale_key() {
        let err = CompositionError::UnknownLocalization {
            route: "products_list".to_string(),
            key: "fr".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("products_list"));
        assert!(msg.contains("fr"));
    }
}
