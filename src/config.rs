use crate::locale::LocalizationOptions;
use crate::routing::RouteConfig;
use anyhow::{Context, Result};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Config {
    // Localization
    pub default_localization: String,
    pub allowed_localizations: Vec<String>,
    pub localization_equivalents: HashMap<String, Vec<String>>,

    // Detection behavior
    pub detect_localization_only_by_lang: bool,
    pub redirect_first_request_to_default: bool,
    pub route_records_by_language_and_locale: bool,
    pub allow_non_localized_routes: bool,

    // Routes
    pub routes_file: Option<String>,

    // Server
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            // Localization
            default_localization: std::env::var("DEFAULT_LOCALIZATION")
                .context("DEFAULT_LOCALIZATION not set")?,
            allowed_localizations: std::env::var("ALLOWED_LOCALIZATIONS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            localization_equivalents: std::env::var("LOCALIZATION_EQUIVALENTS")
                .ok()
                .map(|v| serde_json::from_str(&v))
                .transpose()
                .context("LOCALIZATION_EQUIVALENTS is not valid JSON")?
                .unwrap_or_default(),

            // Detection behavior
            detect_localization_only_by_lang: std::env::var("DETECT_LOCALIZATION_ONLY_BY_LANG")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            redirect_first_request_to_default: std::env::var("REDIRECT_FIRST_REQUEST_TO_DEFAULT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            route_records_by_language_and_locale: std::env::var(
                "ROUTE_RECORDS_BY_LANGUAGE_AND_LOCALE",
            )
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(false),
            allow_non_localized_routes: std::env::var("ALLOW_NON_LOCALIZED_ROUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),

            // Routes
            routes_file: std::env::var("ROUTES_FILE").ok(),

            // Server
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
        })
    }

    /// Build the shared localization options from this configuration.
    pub fn localization_options(&self) -> Result<LocalizationOptions> {
        let mut options = LocalizationOptions::new(&self.default_localization)
            .context("invalid DEFAULT_LOCALIZATION")?;
        options
            .set_allowed_localizations(&self.allowed_localizations)
            .context("invalid ALLOWED_LOCALIZATIONS")?;
        options.set_localization_equivalents(
            self.localization_equivalents
                .iter()
                .map(|(target, tokens)| (target.clone(), tokens.clone())),
        );
        options.set_detect_localization_only_by_lang(self.detect_localization_only_by_lang);
        options.set_redirect_first_request_to_default(self.redirect_first_request_to_default);
        options.set_route_records_by_language_and_locale(self.route_records_by_language_and_locale);
        options.set_allow_non_localized_routes(self.allow_non_localized_routes);
        Ok(options)
    }

    /// Load route definitions from the configured routes file.
    pub fn load_routes(&self) -> Result<Vec<RouteConfig>> {
        let Some(path) = &self.routes_file else {
            return Ok(Vec::new());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read routes file {path}"))?;
        serde_json::from_str(&raw).with_context(|| format!("invalid routes file {path}"))
    }
}
