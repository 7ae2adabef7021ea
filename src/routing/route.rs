//! Localized route entity.
//!
//! A route's `pattern`, `match`, `reverse`, and `defaults` records are each
//! either a single scalar value or a per-locale mapping ([`RouteField`]).
//! The route is "localized" iff any of pattern/match/reverse is per-locale;
//! the predicate is evaluated once at construction, never re-inspected per
//! request. Routes are immutable after registration; the per-key reverse
//! composition is computed lazily and cached for the lifetime of the route.

use crate::error::{CompositionError, ConfigError};
use crate::metrics::RouterMetrics;
use crate::routing::param::ParamValue;
use crate::routing::reverse::ReverseData;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, RwLock};

/// A route record that is either one scalar value or a per-locale mapping.
///
/// Per-locale maps are ordered (`BTreeMap`) so fallback to the first
/// registered key is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RouteField<T> {
    Scalar(T),
    PerLocale(BTreeMap<String, T>),
}

impl<T> RouteField<T> {
    pub fn is_per_locale(&self) -> bool {
        matches!(self, RouteField::PerLocale(_))
    }

    /// The value applying under the given locale key: the scalar always
    /// applies; a per-locale map must contain the key.
    pub fn for_key(&self, key: &str) -> Option<&T> {
        match self {
            RouteField::Scalar(value) => Some(value),
            RouteField::PerLocale(map) => map.get(key),
        }
    }

    /// Deterministic fallback value: the scalar, or the entry under the
    /// lexicographically-first locale key.
    pub fn fallback(&self) -> Option<&T> {
        match self {
            RouteField::Scalar(value) => Some(value),
            RouteField::PerLocale(map) => map.values().next(),
        }
    }

    /// Locale keys of a per-locale field; empty for scalars.
    pub fn locale_keys(&self) -> Vec<&str> {
        match self {
            RouteField::Scalar(_) => Vec::new(),
            RouteField::PerLocale(map) => map.keys().map(String::as_str).collect(),
        }
    }
}

/// Declarative route definition, the registration form accepted by the
/// registry (and the shape of entries in a routes file).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    pub name: String,

    /// Target identity, `"Controller:Action"`
    #[serde(default)]
    pub controller_action: Option<String>,

    /// Match+reverse pattern in one, when `match`/`reverse` are not given
    /// separately
    #[serde(default)]
    pub pattern: Option<RouteField<String>>,

    /// Match specification handed to the external matching engine
    #[serde(default, rename = "match")]
    pub match_pattern: Option<RouteField<String>>,

    /// Reverse template for URL building
    #[serde(default)]
    pub reverse: Option<RouteField<String>>,

    #[serde(default)]
    pub defaults: Option<RouteField<BTreeMap<String, ParamValue>>>,

    /// Full-match regular expressions per parameter name
    #[serde(default)]
    pub constraints: Option<BTreeMap<String, String>>,
}

impl RouteConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            controller_action: None,
            pattern: None,
            match_pattern: None,
            reverse: None,
            defaults: None,
            constraints: None,
        }
    }

    pub fn controller_action(mut self, target: impl Into<String>) -> Self {
        self.controller_action = Some(target.into());
        self
    }

    pub fn pattern(mut self, pattern: RouteField<String>) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn reverse(mut self, reverse: RouteField<String>) -> Self {
        self.reverse = Some(reverse);
        self
    }

    pub fn defaults(mut self, defaults: RouteField<BTreeMap<String, ParamValue>>) -> Self {
        self.defaults = Some(defaults);
        self
    }

    pub fn constraints(mut self, constraints: BTreeMap<String, String>) -> Self {
        self.constraints = Some(constraints);
        self
    }
}

/// A registered route with locale-aware records and a lazily-built reverse
/// composition cache.
#[derive(Debug)]
pub struct LocalizedRoute {
    name: String,
    controller_action: Option<String>,
    pattern: Option<RouteField<String>>,
    match_pattern: Option<RouteField<String>>,
    reverse: Option<RouteField<String>>,
    defaults: RouteField<BTreeMap<String, ParamValue>>,
    constraints: BTreeMap<String, Regex>,

    /// Evaluated once at construction
    localized: bool,

    /// Group assignment, set exactly once at registration
    group_name: OnceLock<RouteField<String>>,

    /// Reverse data per routing locale key; entries are never invalidated
    reverse_cache: RwLock<HashMap<String, Arc<ReverseData>>>,

    /// Reverse template parses performed for this route
    reverse_parses: AtomicUsize,
}

impl LocalizedRoute {
    /// Build a route from its definition, compiling constraints and
    /// evaluating the localized predicate once.
    pub fn from_config(config: RouteConfig) -> Result<Self, ConfigError> {
        let localized = config.pattern.as_ref().is_some_and(RouteField::is_per_locale)
            || config
                .match_pattern
                .as_ref()
                .is_some_and(RouteField::is_per_locale)
            || config.reverse.as_ref().is_some_and(RouteField::is_per_locale);

        let mut constraints = BTreeMap::new();
        if let Some(raw) = &config.constraints {
            for (param, pattern) in raw {
                let anchored = format!("^(?:{pattern})$");
                let regex = Regex::new(&anchored).map_err(|e| ConfigError::InvalidConstraint {
                    route: config.name.clone(),
                    param: param.clone(),
                    message: e.to_string(),
                })?;
                constraints.insert(param.clone(), regex);
            }
        }

        Ok(Self {
            name: config.name,
            controller_action: config.controller_action,
            pattern: config.pattern,
            match_pattern: config.match_pattern,
            reverse: config.reverse,
            defaults: config
                .defaults
                .unwrap_or(RouteField::Scalar(BTreeMap::new())),
            constraints,
            localized,
            group_name: OnceLock::new(),
            reverse_cache: RwLock::new(HashMap::new()),
            reverse_parses: AtomicUsize::new(0),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn controller_action(&self) -> Option<&str> {
        self.controller_action.as_deref()
    }

    /// Whether any of pattern/match/reverse is keyed by locale.
    pub fn is_localized(&self) -> bool {
        self.localized
    }

    /// Match specification for the external matching engine, falling back
    /// to the pattern record.
    pub fn match_for(&self, key: &str) -> Option<&str> {
        self.match_pattern
            .as_ref()
            .and_then(|f| f.for_key(key))
            .or_else(|| self.pattern.as_ref().and_then(|f| f.for_key(key)))
            .map(String::as_str)
    }

    pub fn pattern_for(&self, key: &str) -> Option<&str> {
        self.pattern
            .as_ref()
            .and_then(|f| f.for_key(key))
            .map(String::as_str)
    }

    /// Default parameter values under the given locale key (with the
    /// deterministic fallback).
    pub fn defaults_for(&self, key: &str) -> Option<&BTreeMap<String, ParamValue>> {
        self.defaults.for_key(key).or_else(|| self.defaults.fallback())
    }

    // ==================== Group assignment ====================

    /// Assign the group name(s) at registration time. A second, different
    /// assignment is a configuration error; re-registering the same
    /// assignment is a no-op.
    pub(crate) fn assign_group(&self, group: RouteField<String>) -> Result<(), ConfigError> {
        if let Err(rejected) = self.group_name.set(group) {
            let current = self
                .group_name
                .get()
                .expect("group assignment present after failed set");
            if *current != rejected {
                return Err(ConfigError::GroupReassigned {
                    route: self.name.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn group_assignment(&self) -> Option<&RouteField<String>> {
        self.group_name.get()
    }

    // ==================== Reverse composition cache ====================

    /// Reverse composition data for a routing locale key, parsed on first
    /// use and cached for the lifetime of the route.
    ///
    /// A key that was never registered falls back to the scalar record, or
    /// to the lexicographically-first registered locale key; `None` only
    /// when the route has no reverse or pattern record at all.
    ///
    /// Safe under concurrent first use: computation happens outside the
    /// lock and is idempotent, and the first published entry wins.
    pub fn reverse_data(&self, key: &str) -> Option<Arc<ReverseData>> {
        {
            let cache = self.reverse_cache.read().expect("reverse cache poisoned");
            if let Some(data) = cache.get(key) {
                RouterMetrics::global().record_reverse_cache_hit();
                return Some(data.clone());
            }
        }

        let built = Arc::new(self.build_reverse_data(key)?);
        let mut cache = self.reverse_cache.write().expect("reverse cache poisoned");
        let data = cache
            .entry(key.to_string())
            .or_insert_with(|| {
                self.reverse_parses.fetch_add(1, Ordering::Relaxed);
                RouterMetrics::global().record_reverse_parse();
                built
            })
            .clone();
        Some(data)
    }

    fn build_reverse_data(&self, key: &str) -> Option<ReverseData> {
        let template_field = self.reverse.as_ref().or(self.pattern.as_ref())?;
        let template = template_field
            .for_key(key)
            .or_else(|| template_field.fallback())?;
        let defaults = self.defaults_for(key).cloned().unwrap_or_default();
        Some(ReverseData::parse(template, defaults))
    }

    /// How many times a reverse template was parsed for this route.
    pub fn reverse_parse_count(&self) -> usize {
        self.reverse_parses.load(Ordering::Relaxed)
    }

    // ==================== Parameter validation ====================

    /// Validate parameter values against the route's constraints.
    pub fn check_constraints<'p, I>(&self, params: I) -> Result<(), CompositionError>
    where
        I: IntoIterator<Item = (&'p str, &'p ParamValue)>,
    {
        for (name, value) in params {
            if let Some(regex) = self.constraints.get(name) {
                let values: Vec<&str> = match value {
                    ParamValue::Single(s) => vec![s.as_str()],
                    ParamValue::List(items) => items.iter().map(String::as_str).collect(),
                };
                for v in values {
                    if !regex.is_match(v) {
                        return Err(CompositionError::ConstraintViolation {
                            route: self.name.clone(),
                            name: name.to_string(),
                            value: v.to_string(),
                            constraint: regex.as_str().to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    fn per_locale(entries: &[(&str, &str)]) -> RouteField<String> {
        RouteField::PerLocale(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn defaults_map(entries: &[(&str, &str)]) -> BTreeMap<String, ParamValue> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), ParamValue::from(*v)))
            .collect()
    }

    fn localized_products_route() -> LocalizedRoute {
        let config = RouteConfig::new("products_list")
            .controller_action("Products:List")
            .pattern(per_locale(&[
                ("en", "/products-list/<name>/<color>"),
                ("de", "/produkt-liste/<name>/<color>"),
            ]))
            .defaults(RouteField::PerLocale(
                [
                    ("en".to_string(), defaults_map(&[("name", "default-name"), ("color", "red")])),
                    ("de".to_string(), defaults_map(&[("name", "standard-name"), ("color", "rot")])),
                ]
                .into_iter()
                .collect(),
            ));
        LocalizedRoute::from_config(config).unwrap()
    }

    // ==================== RouteField Tests ====================

    #[test]
    fn test_field_scalar_applies_to_any_key() {
        let field = RouteField::Scalar("/about".to_string());
        assert_eq!(field.for_key("en"), Some(&"/about".to_string()));
        assert_eq!(field.for_key("de"), Some(&"/about".to_string()));
        assert!(!field.is_per_locale());
    }

    #[test]
    fn test_field_per_locale_lookup_and_fallback() {
        let field = per_locale(&[("en", "/a"), ("de", "/b")]);
        assert_eq!(field.for_key("en"), Some(&"/a".to_string()));
        assert_eq!(field.for_key("cs"), None);
        // BTreeMap ordering: "de" sorts first
        assert_eq!(field.fallback(), Some(&"/b".to_string()));
        assert_eq!(field.locale_keys(), vec!["de", "en"]);
    }

    #[test]
    fn test_field_serde_untagged() {
        let scalar: RouteField<String> = serde_json::from_str("\"/about\"").unwrap();
        assert!(!scalar.is_per_locale());

        let localized: RouteField<String> =
            serde_json::from_str(r#"{"en": "/about", "de": "/ueber"}"#).unwrap();
        assert!(localized.is_per_locale());
    }

    // ==================== Localized Predicate Tests ====================

    #[test]
    fn test_localized_predicate() {
        let route = localized_products_route();
        assert!(route.is_localized());

        let plain = LocalizedRoute::from_config(
            RouteConfig::new("about").pattern(RouteField::Scalar("/about".to_string())),
        )
        .unwrap();
        assert!(!plain.is_localized());
    }

    #[test]
    fn test_scalar_defaults_alone_do_not_localize() {
        let route = LocalizedRoute::from_config(
            RouteConfig::new("about")
                .pattern(RouteField::Scalar("/about/<section>".to_string()))
                .defaults(RouteField::Scalar(defaults_map(&[("section", "intro")]))),
        )
        .unwrap();
        assert!(!route.is_localized());
    }

    // ==================== Reverse Cache Tests ====================

    #[test]
    fn test_reverse_data_per_key() {
        let route = localized_products_route();
        let en = route.reverse_data("en").unwrap();
        let de = route.reverse_data("de").unwrap();

        assert_eq!(en.template, "/products-list/<name>/<color>");
        assert_eq!(de.template, "/produkt-liste/<name>/<color>");
        assert_eq!(en.param_names, vec!["name", "color"]);
        assert_eq!(
            de.defaults.get("color"),
            Some(&ParamValue::from("rot"))
        );
    }

    #[test]
    fn test_reverse_parse_happens_once_per_key() {
        let route = localized_products_route();
        assert_eq!(route.reverse_parse_count(), 0);

        let first = route.reverse_data("en").unwrap();
        let second = route.reverse_data("en").unwrap();
        assert_eq!(route.reverse_parse_count(), 1);
        assert!(Arc::ptr_eq(&first, &second));

        route.reverse_data("de").unwrap();
        assert_eq!(route.reverse_parse_count(), 2);
    }

    #[test]
    fn test_reverse_unknown_key_falls_back_deterministically() {
        let route = localized_products_route();
        let first = route.reverse_data("cs").unwrap();
        let second = route.reverse_data("cs").unwrap();

        // Lexicographically-first locale key is "de"
        assert_eq!(first.template, "/produkt-liste/<name>/<color>");
        assert_eq!(first, second);
    }

    #[test]
    fn test_reverse_data_none_without_templates() {
        let route =
            LocalizedRoute::from_config(RouteConfig::new("nameless")).unwrap();
        assert!(route.reverse_data("en").is_none());
    }

    #[test]
    fn test_reverse_prefers_reverse_over_pattern() {
        let route = LocalizedRoute::from_config(
            RouteConfig::new("products")
                .pattern(RouteField::Scalar("/products/<id>/#detail".to_string()))
                .reverse(RouteField::Scalar("/products/<id>".to_string())),
        )
        .unwrap();
        assert_eq!(route.reverse_data("en").unwrap().template, "/products/<id>");
    }

    // ==================== Group Assignment Tests ====================

    #[test]
    fn test_group_assignment_set_once() {
        let route = localized_products_route();
        route
            .assign_group(RouteField::Scalar("eshop".to_string()))
            .unwrap();
        // Same assignment again is fine
        route
            .assign_group(RouteField::Scalar("eshop".to_string()))
            .unwrap();
        // A different one is rejected
        assert!(matches!(
            route.assign_group(RouteField::Scalar("other".to_string())),
            Err(ConfigError::GroupReassigned { .. })
        ));
    }

    // ==================== Constraint Tests ====================

    #[test]
    fn test_constraints_validated_at_construction() {
        let result = LocalizedRoute::from_config(
            RouteConfig::new("broken")
                .constraints([("name".to_string(), "[".to_string())].into_iter().collect()),
        );
        assert!(matches!(result, Err(ConfigError::InvalidConstraint { .. })));
    }

    #[test]
    fn test_check_constraints_full_match() {
        let route = LocalizedRoute::from_config(
            RouteConfig::new("products")
                .pattern(RouteField::Scalar("/products/<color>".to_string()))
                .constraints(
                    [("color".to_string(), "[a-z]*".to_string())]
                        .into_iter()
                        .collect(),
                ),
        )
        .unwrap();

        let ok = ParamValue::from("blue");
        assert!(route.check_constraints([("color", &ok)]).is_ok());

        let bad = ParamValue::from("Blue7");
        let err = route.check_constraints([("color", &bad)]).unwrap_err();
        assert!(matches!(err, CompositionError::ConstraintViolation { .. }));
    }

    #[test]
    fn test_check_constraints_lists_checked_element_wise() {
        let route = LocalizedRoute::from_config(
            RouteConfig::new("products").constraints(
                [("variants".to_string(), "[A-Z]{1,2}".to_string())]
                    .into_iter()
                    .collect(),
            ),
        )
        .unwrap();

        let ok = ParamValue::from(vec!["L", "XL"]);
        assert!(route.check_constraints([("variants", &ok)]).is_ok());

        let bad = ParamValue::from(vec!["L", "extra-large"]);
        assert!(route.check_constraints([("variants", &bad)]).is_err());
    }
}
