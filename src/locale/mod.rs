//! Locale resolution subsystem.
//!
//! Everything needed to turn a request's signals into the effective
//! localization:
//!
//! - `identifier`: the validated `(language, locale?)` pair
//! - `allowed`: the configured set of permitted localizations
//! - `equivalents`: header-token equivalence remapping
//! - `header`: `Accept-Language` parsing
//! - `options`: shared, read-only router configuration
//! - `resolver`: the precedence algorithm and redirect decision

mod allowed;
mod equivalents;
mod header;
mod identifier;
mod options;
mod resolver;

pub use allowed::AllowedLocales;
pub use equivalents::EquivalenceMap;
pub use header::{parse_accept_language, LanguageCandidate};
pub use identifier::{LocaleIdentifier, LANG_AND_LOCALE_SEPARATOR};
pub use options::{LocalizationOptions, URL_PARAM_LOCALIZATION};
pub use resolver::{
    redirect_query_update, DetectionKind, LocalizationResolver, RedirectDecision, RequestSignals,
    Resolution,
};
