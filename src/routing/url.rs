//! Reverse URL building.
//!
//! Composes a concrete URL from a route's locale-specific reverse data and
//! caller-supplied parameters: capture the target localization, seed the
//! template's placeholder names, overlay route defaults / external defaults
//! / caller params in increasing precedence, validate against the route's
//! constraints, substitute placeholders section by section, and append
//! whatever is left as a percent-encoded query string.
//!
//! Parameters named `host`, `domain`, `tld`, `sld`, or `basePath` are
//! reserved for domain substitution; supplying any of them makes the
//! non-split result absolute.

use crate::error::CompositionError;
use crate::locale::{LocaleIdentifier, LocalizationOptions};
use crate::metrics::RouterMetrics;
use crate::routing::param::{ParamMap, ParamValue};
use crate::routing::reverse::{ReverseData, ReverseToken};
use crate::routing::route::LocalizedRoute;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Reserved parameter name replacing the whole host.
pub const URL_PARAM_HOST: &str = "host";
/// Reserved parameter name replacing the registrable domain (last two labels).
pub const URL_PARAM_DOMAIN: &str = "domain";
/// Reserved parameter name replacing the top-level domain label.
pub const URL_PARAM_TLD: &str = "tld";
/// Reserved parameter name replacing the second-level domain label.
pub const URL_PARAM_SLD: &str = "sld";
/// Reserved parameter name replacing the application base path.
pub const URL_PARAM_BASEPATH: &str = "basePath";

const DOMAIN_PARAM_NAMES: [&str; 5] = [
    URL_PARAM_HOST,
    URL_PARAM_DOMAIN,
    URL_PARAM_TLD,
    URL_PARAM_SLD,
    URL_PARAM_BASEPATH,
];

/// Characters escaped inside path segment values. `/` is kept literal in
/// greedy placeholders only.
const PATH_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'\'')
    .add(b'<')
    .add(b'>')
    .add(b'&')
    .add(b'#')
    .add(b'?')
    .add(b'%')
    .add(b'/');

const GREEDY_PATH_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'\'')
    .add(b'<')
    .add(b'>')
    .add(b'&')
    .add(b'#')
    .add(b'?')
    .add(b'%');

/// Characters escaped in query names and values so `< > & " '` and
/// `/ = &` round-trip safely.
const QUERY_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'\'')
    .add(b'<')
    .add(b'>')
    .add(b'&')
    .add(b'#')
    .add(b'?')
    .add(b'%')
    .add(b'/')
    .add(b'=')
    .add(b'+');

/// Scheme/host/base-path of the surrounding request, used for the domain
/// part of built URLs.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub scheme: String,
    pub host: String,
    pub base_path: String,
}

impl RequestContext {
    pub fn new(
        scheme: impl Into<String>,
        host: impl Into<String>,
        base_path: impl Into<String>,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            base_path: base_path.into(),
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new("http", "localhost", "")
    }
}

/// Builds URLs from routes under a shared localization configuration.
pub struct UrlBuilder<'a> {
    options: &'a LocalizationOptions,
}

impl<'a> UrlBuilder<'a> {
    pub fn new(options: &'a LocalizationOptions) -> Self {
        Self { options }
    }

    /// Build a complete URL string.
    ///
    /// The result is relative (base path + path + query) unless a reserved
    /// domain parameter was supplied, which forces the absolute form.
    pub fn build_url(
        &self,
        route: &LocalizedRoute,
        active: &LocaleIdentifier,
        params: ParamMap,
        external_defaults: ParamMap,
        ctx: &RequestContext,
    ) -> Result<String, CompositionError> {
        let built = self.build_parts(route, active, params, external_defaults, ctx)?;
        if built.absolute {
            Ok(format!("{}{}", built.domain_with_base, built.path_and_query))
        } else {
            Ok(format!("{}{}", ctx.base_path, built.path_and_query))
        }
    }

    /// Build a URL split into its domain part (scheme + host + base path)
    /// and its path + query part.
    pub fn build_url_split(
        &self,
        route: &LocalizedRoute,
        active: &LocaleIdentifier,
        params: ParamMap,
        external_defaults: ParamMap,
        ctx: &RequestContext,
    ) -> Result<(String, String), CompositionError> {
        let built = self.build_parts(route, active, params, external_defaults, ctx)?;
        Ok((built.domain_with_base, built.path_and_query))
    }

    fn build_parts(
        &self,
        route: &LocalizedRoute,
        active: &LocaleIdentifier,
        mut params: ParamMap,
        mut external_defaults: ParamMap,
        ctx: &RequestContext,
    ) -> Result<BuiltParts, CompositionError> {
        let loc_param = self.options.localization_param_name();
        let localization_from_caller = params.contains(loc_param);

        // 1. Capture the target localization and strip it from both maps
        let from_params = params.remove(loc_param);
        let from_defaults = external_defaults.remove(loc_param);
        let localization_str = single_value(from_params)
            .or_else(|| single_value(from_defaults))
            .unwrap_or_else(|| active.to_string());

        // 2. Locale-specific reverse data
        let routing_key = self.options.routing_key_for(&localization_str);
        let data = route
            .reverse_data(&routing_key)
            .ok_or_else(|| CompositionError::UnknownLocalization {
                route: route.name().to_string(),
                key: routing_key.clone(),
            })?;

        // 3. Seed the template's placeholder names, overlay route defaults,
        //    external defaults, and caller params in increasing precedence,
        //    then merge caller extras back in
        let mut working = Working::default();
        if data.param_names.is_empty() {
            for (name, value) in params.iter() {
                working.upsert(name, Some(value.clone()));
            }
        } else {
            for name in &data.param_names {
                working.upsert(name, None);
            }
            for name in &data.param_names {
                let merged = params
                    .get(name)
                    .or_else(|| external_defaults.get(name))
                    .or_else(|| data.defaults.get(name));
                if let Some(value) = merged {
                    working.upsert(name, Some(value.clone()));
                }
            }
            for (name, value) in params.iter() {
                working.upsert(name, Some(value.clone()));
            }
        }

        // 4. Re-attach the localization, run the route's parameter
        //    validation, then drop it again unless the caller supplied it
        working.upsert(loc_param, Some(ParamValue::Single(localization_str.clone())));
        route.check_constraints(working.iter_set())?;
        if !localization_from_caller {
            working.remove(loc_param);
        }

        // 5. Separate reserved domain parameters
        let mut domain_params: Vec<(String, ParamValue)> = Vec::new();
        for name in DOMAIN_PARAM_NAMES {
            if let Some(Some(value)) = working.remove(name) {
                domain_params.push((name.to_string(), value));
            }
        }

        // 6. Compose the path and append leftovers as the query string
        let (path, remaining) = compose_path(&data, working);
        let query = build_query(&remaining, self.options.query_separator());
        let path_and_query = if query.is_empty() {
            path
        } else if path.contains('?') {
            format!("{path}{}{query}", self.options.query_separator())
        } else {
            format!("{path}?{query}")
        };

        // 7. Domain part with placeholder substitutions
        let absolute = !domain_params.is_empty();
        let domain_with_base = apply_domain_params(route.name(), ctx, &domain_params)?;

        RouterMetrics::global().record_url_built();
        Ok(BuiltParts {
            domain_with_base,
            path_and_query,
            absolute,
        })
    }
}

struct BuiltParts {
    domain_with_base: String,
    path_and_query: String,
    absolute: bool,
}

fn single_value(value: Option<ParamValue>) -> Option<String> {
    match value {
        Some(ParamValue::Single(s)) => Some(s),
        _ => None,
    }
}

/// Working parameter set: insertion ordered, with `None` marking a
/// placeholder that was seeded but never given a value.
#[derive(Debug, Default)]
struct Working {
    entries: Vec<(String, Option<ParamValue>)>,
}

impl Working {
    fn upsert(&mut self, name: &str, value: Option<ParamValue>) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    fn remove(&mut self, name: &str) -> Option<Option<ParamValue>> {
        let index = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(index).1)
    }

    /// Entries holding a value.
    fn iter_set(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries
            .iter()
            .filter_map(|(n, v)| v.as_ref().map(|v| (n.as_str(), v)))
    }

    fn into_set_entries(self) -> Vec<(String, ParamValue)> {
        self.entries
            .into_iter()
            .filter_map(|(n, v)| v.map(|v| (n, v)))
            .collect()
    }
}

/// Walk the reverse sections substituting placeholder values, dropping the
/// trailing run of optional sections whose placeholders all still equal
/// their defaults. Placeholder parameters are consumed; what is left feeds
/// the query string.
fn compose_path(data: &ReverseData, mut working: Working) -> (String, Vec<(String, ParamValue)>) {
    struct Rendered {
        text: String,
        droppable: bool,
    }

    let mut rendered: Vec<Rendered> = Vec::with_capacity(data.sections.len());
    for section in &data.sections {
        let mut text = String::new();
        let mut all_default = true;
        for token in &section.tokens {
            match token {
                ReverseToken::Literal(literal) => text.push_str(literal),
                ReverseToken::Param { name, greedy } => {
                    let supplied = working.remove(name).flatten();
                    let default = data.defaults.get(name);
                    let equals_default = match (&supplied, default) {
                        (None, _) => true,
                        (Some(value), Some(d)) => value == d,
                        (Some(_), None) => false,
                    };
                    if !equals_default {
                        all_default = false;
                    }
                    if let Some(value) = supplied.or_else(|| default.cloned()) {
                        text.push_str(&render_path_value(&value, *greedy));
                    }
                }
            }
        }
        rendered.push(Rendered {
            text,
            droppable: section.optional && section.has_params() && all_default,
        });
    }

    while matches!(rendered.last(), Some(section) if section.droppable) {
        rendered.pop();
    }

    let path: String = rendered.into_iter().map(|section| section.text).collect();
    (path, working.into_set_entries())
}

fn render_path_value(value: &ParamValue, greedy: bool) -> String {
    match value {
        ParamValue::Single(s) => encode_path_value(s, greedy),
        ParamValue::List(items) => items
            .iter()
            .map(|item| encode_path_value(item, false))
            .collect::<Vec<_>>()
            .join("/"),
    }
}

fn encode_path_value(value: &str, greedy: bool) -> String {
    let set = if greedy { GREEDY_PATH_VALUE } else { PATH_VALUE };
    utf8_percent_encode(value, set).to_string()
}

fn encode_query_component(value: &str) -> String {
    utf8_percent_encode(value, QUERY_VALUE).to_string()
}

fn build_query(params: &[(String, ParamValue)], separator: &str) -> String {
    let mut pairs: Vec<String> = Vec::new();
    for (name, value) in params {
        match value {
            ParamValue::Single(s) => pairs.push(format!(
                "{}={}",
                encode_query_component(name),
                encode_query_component(s)
            )),
            ParamValue::List(items) => {
                for item in items {
                    // Encoded slashes are restored in array-style values
                    let encoded = encode_query_component(item).replace("%2F", "/");
                    pairs.push(format!("{}[]={}", encode_query_component(name), encoded));
                }
            }
        }
    }
    pairs.join(separator)
}

fn apply_domain_params(
    route_name: &str,
    ctx: &RequestContext,
    domain_params: &[(String, ParamValue)],
) -> Result<String, CompositionError> {
    let forbidden = |name: &str, value: &str| CompositionError::ForbiddenDomainValue {
        route: route_name.to_string(),
        name: name.to_string(),
        value: value.to_string(),
    };

    let mut host = ctx.host.clone();
    let mut base_path = ctx.base_path.clone();
    for (name, value) in domain_params {
        let value = match value.as_single() {
            Some(v) => v,
            None => return Err(forbidden(name, "<list>")),
        };
        match name.as_str() {
            URL_PARAM_BASEPATH => {
                if !value.is_empty() && !value.starts_with('/') {
                    return Err(forbidden(name, value));
                }
                base_path = value.to_string();
            }
            _ => {
                if value.is_empty() || value.contains('/') {
                    return Err(forbidden(name, value));
                }
                match name.as_str() {
                    URL_PARAM_HOST => host = value.to_string(),
                    URL_PARAM_DOMAIN => host = replace_domain(&host, value),
                    URL_PARAM_TLD => host = replace_label(&host, value, 1),
                    URL_PARAM_SLD => host = replace_label(&host, value, 2),
                    _ => {}
                }
            }
        }
    }
    Ok(format!("{}://{}{}", ctx.scheme, host, base_path))
}

/// Replace the registrable part of the host (its last two labels).
fn replace_domain(host: &str, value: &str) -> String {
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() <= 2 {
        value.to_string()
    } else {
        format!("{}.{}", labels[..labels.len() - 2].join("."), value)
    }
}

/// Replace one host label counted from the end (1 = TLD, 2 = SLD).
fn replace_label(host: &str, value: &str, from_end: usize) -> String {
    let mut labels: Vec<String> = host.split('.').map(str::to_string).collect();
    let len = labels.len();
    if len >= from_end {
        labels[len - from_end] = value.to_string();
    }
    labels.join(".")
}
