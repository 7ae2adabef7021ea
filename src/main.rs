use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::{header::HOST, HeaderMap, StatusCode};
use axum::routing::get;
use axum::{middleware, Extension, Json, Router};
use localized_router::config::Config;
use localized_router::locale::{LocalizationOptions, Resolution};
use localized_router::metrics::RouterMetrics;
use localized_router::routing::{
    DuplicateRoutes, ParamMap, ParamValue, RequestContext, RouteConfig, RouteField,
    RouteGroupRegistry, UrlBuilder,
};
use localized_router::web::{localization_middleware, LocaleState, MemorySessionStore, SessionStore};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone)]
struct AppState {
    options: Arc<LocalizationOptions>,
    registry: Arc<RouteGroupRegistry>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("localized_router=info".parse()?),
        )
        .init();

    info!("Starting localized-router demo server");

    // Load configuration from environment
    let config = Config::from_env()?;
    let options = Arc::new(config.localization_options()?);

    // Route table: configured file, or the built-in sample routes
    let mut registry = RouteGroupRegistry::new();
    registry.set_allow_non_localized_routes(options.allow_non_localized_routes());
    let mut routes = config.load_routes()?;
    if routes.is_empty() {
        routes = sample_routes();
    }
    registry.add_routes(routes, None, false, DuplicateRoutes::Reject)?;
    info!("Registered {} routes", registry.iter_routes().count());

    let sessions: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
    let locale_state = LocaleState {
        options: options.clone(),
        sessions,
    };
    let state = AppState {
        options,
        registry: Arc::new(registry),
    };

    let app = Router::new()
        .route("/", get(index))
        .route("/url/:name", get(url_for))
        .route("/stats", get(stats))
        .layer(middleware::from_fn_with_state(
            locale_state,
            localization_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!("Listening on port {}", config.port);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Overview: the resolved localization and every route's URL under it.
async fn index(
    State(state): State<AppState>,
    Extension(resolution): Extension<Resolution>,
    headers: HeaderMap,
) -> Json<serde_json::Value> {
    let ctx = request_context(&headers);
    let builder = UrlBuilder::new(&state.options);

    let mut urls = serde_json::Map::new();
    for route in state.registry.iter_routes() {
        let url = builder.build_url(
            route,
            &resolution.localization,
            ParamMap::new(),
            ParamMap::new(),
            &ctx,
        );
        let rendered = match url {
            Ok(url) => url,
            Err(err) => format!("error: {err}"),
        };
        urls.insert(route.name().to_string(), serde_json::Value::String(rendered));
    }

    Json(serde_json::json!({
        "localization": resolution.localization.to_string(),
        "first_request": resolution.first_request,
        "urls": urls,
    }))
}

/// Build one route's URL from query parameters.
async fn url_for(
    State(state): State<AppState>,
    Extension(resolution): Extension<Resolution>,
    Path(name): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let route = state
        .registry
        .route_by_name_or_target(&name)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("unknown route `{name}`")))?;

    let params: ParamMap = query.into_iter().collect();
    let builder = UrlBuilder::new(&state.options);
    let (domain, path_and_query) = builder
        .build_url_split(
            &route,
            &resolution.localization,
            params,
            ParamMap::new(),
            &request_context(&headers),
        )
        .map_err(|err| (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()))?;

    Ok(Json(serde_json::json!({
        "domain": domain,
        "path_and_query": path_and_query,
    })))
}

/// Router counters snapshot.
async fn stats() -> Json<serde_json::Value> {
    Json(serde_json::json!(RouterMetrics::global().report()))
}

fn request_context(headers: &HeaderMap) -> RequestContext {
    let host = headers
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("localhost");
    RequestContext::new("http", host, "")
}

/// Demo route table: one localized route with per-locale records, one
/// plain route.
fn sample_routes() -> Vec<RouteConfig> {
    let pattern: BTreeMap<String, String> = [
        (
            "en".to_string(),
            "/products-list/<name>/<color>".to_string(),
        ),
        (
            "de".to_string(),
            "/produkt-liste/<name>/<color>".to_string(),
        ),
    ]
    .into_iter()
    .collect();

    let defaults_en: BTreeMap<String, ParamValue> = [
        ("name".to_string(), ParamValue::from("default-name")),
        ("color".to_string(), ParamValue::from("red")),
    ]
    .into_iter()
    .collect();
    let defaults_de: BTreeMap<String, ParamValue> = [
        ("name".to_string(), ParamValue::from("standard-name")),
        ("color".to_string(), ParamValue::from("rot")),
    ]
    .into_iter()
    .collect();
    let defaults: BTreeMap<String, BTreeMap<String, ParamValue>> = [
        ("en".to_string(), defaults_en),
        ("de".to_string(), defaults_de),
    ]
    .into_iter()
    .collect();

    vec![
        RouteConfig::new("products_list")
            .controller_action("Products:List")
            .pattern(RouteField::PerLocale(pattern))
            .defaults(RouteField::PerLocale(defaults)),
        RouteConfig::new("about").pattern(RouteField::Scalar("/about".to_string())),
    ]
}
