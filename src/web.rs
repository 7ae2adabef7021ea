//! axum integration.
//!
//! Bridges the transport to the core: extracts the resolver's input signals
//! from the request (switch query parameter, session cookie, leading path
//! segment, `Accept-Language`), runs the resolver, stores the outcome in
//! request extensions for handlers, writes the resolved localization back
//! to the session store, and issues the redirect when the resolver signals
//! one. When a redirect fires, the redirect target (not the detected
//! localization) is written to the session so the follow-up request is
//! stable.
//!
//! URL shape convention: the default localization version carries no path
//! prefix; other localizations are prefixed with their localization string.

use crate::locale::{
    redirect_query_update, LocaleIdentifier, LocalizationOptions, LocalizationResolver,
    RequestSignals,
};
use axum::extract::{Request, State};
use axum::http::header::{ACCEPT_LANGUAGE, COOKIE};
use axum::http::{HeaderMap, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;
use url::form_urlencoded;

/// Cookie carrying the session identifier.
pub const SESSION_COOKIE: &str = "sid";

/// Session-backed localization storage, the external collaborator that
/// remembers the resolved localization between requests.
pub trait SessionStore: Send + Sync {
    fn stored_localization(&self, session_id: &str) -> Option<String>;
    fn store_localization(&self, session_id: &str, localization: &LocaleIdentifier);
}

/// In-process session store for tests and the demo server.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn stored_localization(&self, session_id: &str) -> Option<String> {
        self.entries
            .read()
            .expect("session store poisoned")
            .get(session_id)
            .cloned()
    }

    fn store_localization(&self, session_id: &str, localization: &LocaleIdentifier) {
        self.entries
            .write()
            .expect("session store poisoned")
            .insert(session_id.to_string(), localization.to_string());
    }
}

/// Shared state for [`localization_middleware`].
#[derive(Clone)]
pub struct LocaleState {
    pub options: Arc<LocalizationOptions>,
    pub sessions: Arc<dyn SessionStore>,
}

/// Resolve the request's localization and stash the [`crate::locale::Resolution`]
/// in request extensions, or issue the redirect the resolver signaled.
pub async fn localization_middleware(
    State(state): State<LocaleState>,
    mut request: Request,
    next: Next,
) -> Response {
    let session_id = session_id_from_headers(request.headers());
    let session = session_id
        .as_deref()
        .and_then(|sid| state.sessions.stored_localization(sid));

    let signals = signals_from_request(request.uri(), request.headers(), session, &state.options);
    let resolution = LocalizationResolver::new(&state.options).resolve(&signals);

    if let Some(sid) = &session_id {
        let stored = resolution
            .redirect
            .as_ref()
            .map(|r| &r.target)
            .unwrap_or(&resolution.localization);
        state.sessions.store_localization(sid, stored);
    }

    if let Some(redirect) = &resolution.redirect {
        let location = redirect_location(request.uri(), &redirect.target, &state.options);
        debug!(%location, "redirecting first request to default localization");
        return Redirect::temporary(&location).into_response();
    }

    request.extensions_mut().insert(resolution);
    next.run(request).await
}

/// Extract the resolver's input signals from request parts.
pub fn signals_from_request(
    uri: &Uri,
    headers: &HeaderMap,
    session: Option<String>,
    options: &LocalizationOptions,
) -> RequestSignals {
    let switch_name = options.switch_param_name();
    let switch_param = uri.query().and_then(|query| {
        form_urlencoded::parse(query.as_bytes())
            .find(|(name, _)| name.as_ref() == switch_name.as_str())
            .map(|(_, value)| value.into_owned())
    });

    RequestSignals {
        switch_param,
        session,
        url_localization: url_localization_from_path(uri.path(), options),
        accept_language: headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
    }
}

/// The session identifier from the request cookies, if any.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

/// The allowed localization embedded as the leading path segment, if any.
pub fn url_localization_from_path(path: &str, options: &LocalizationOptions) -> Option<String> {
    let first = path.trim_start_matches('/').split('/').next()?;
    let id = LocaleIdentifier::parse(first).ok()?;
    let canonical = id.to_string();
    options
        .allowed()
        .is_allowed(&canonical)
        .then_some(canonical)
}

/// Redirect target preserving path and query, substituting the
/// localization segment or query parameter.
pub fn redirect_location(
    uri: &Uri,
    target: &LocaleIdentifier,
    options: &LocalizationOptions,
) -> String {
    let query: Vec<(String, String)> = uri
        .query()
        .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default();

    let (query, url_value) = redirect_query_update(
        query,
        target,
        options.default_localization_str(),
        options.localization_param_name(),
    );
    let path = localized_path(uri.path(), url_value.as_deref(), options);

    if query.is_empty() {
        path
    } else {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(query)
            .finish();
        format!("{path}?{encoded}")
    }
}

/// Swap the leading localization segment of a path. `target` of `None` (the
/// localization travels in the query) or the default localization yields
/// the unprefixed version.
pub fn localized_path(path: &str, target: Option<&str>, options: &LocalizationOptions) -> String {
    let trimmed = path.trim_start_matches('/');
    let stripped = match trimmed.split_once('/') {
        Some((first, rest)) if is_allowed_segment(first, options) => format!("/{rest}"),
        Some(_) => path.to_string(),
        None if is_allowed_segment(trimmed, options) => "/".to_string(),
        None => path.to_string(),
    };

    match target {
        Some(t) if t != options.default_localization_str() => {
            if stripped == "/" {
                format!("/{t}")
            } else {
                format!("/{t}{stripped}")
            }
        }
        _ => stripped,
    }
}

fn is_allowed_segment(segment: &str, options: &LocalizationOptions) -> bool {
    LocaleIdentifier::parse(segment)
        .map(|id| options.allowed().is_allowed(&id.to_string()))
        .unwrap_or(false)
}
