//! Locale resolution and localized reverse-URL building for multilingual
//! web applications.
//!
//! Multilingual applications expose the same logical routes under
//! language-specific path segments (`/products-list/...` vs
//! `/produkt-liste/...`). This crate covers the two subsystems that make
//! that work:
//!
//! - **Locale resolution** ([`locale`]): per request, pick the effective
//!   localization from an explicit switch parameter, the stored session
//!   value, the URL-embedded segment, `Accept-Language` negotiation with
//!   equivalence remapping, or the configured default — and decide whether
//!   the first request should redirect to the default version.
//! - **Localized URL building** ([`routing`]): per-locale route records
//!   grouped for selective matching, cached reverse-template compositions,
//!   and a URL builder that merges caller parameters against per-locale
//!   defaults and reassembles scheme/host/path/query.
//!
//! Route matching itself, session persistence, and HTTP transport are
//! external collaborators; the [`web`] module bridges the gap to axum with
//! a middleware, a session-store trait, and redirect issuance.
//!
//! # Example
//!
//! ```rust
//! use localized_router::locale::{LocalizationOptions, LocalizationResolver, RequestSignals};
//!
//! let mut options = LocalizationOptions::new("en").unwrap();
//! options.set_allowed_localizations(["en", "de-DE"]).unwrap();
//!
//! let resolver = LocalizationResolver::new(&options);
//! let resolution = resolver.resolve(&RequestSignals {
//!     accept_language: Some("de-DE;q=1.0, en;q=0.5".to_string()),
//!     ..RequestSignals::default()
//! });
//! assert_eq!(resolution.localization.to_string(), "de-DE");
//! ```

pub mod config;
pub mod error;
pub mod locale;
pub mod metrics;
pub mod routing;
pub mod web;

pub use error::{CompositionError, ConfigError, LocaleParseError};
pub use locale::{
    DetectionKind, LocaleIdentifier, LocalizationOptions, LocalizationResolver, RedirectDecision,
    RequestSignals, Resolution,
};
pub use routing::{
    DuplicateRoutes, LocalizedRoute, ParamMap, ParamValue, RequestContext, RouteConfig,
    RouteField, RouteGroupRegistry, UrlBuilder,
};
