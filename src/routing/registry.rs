//! Route registry with locale-aware grouping.
//!
//! Routes are indexed twice: by group key for the external matching engine
//! (`""` for ungrouped routes, `groupName`, or `localeKey/groupName` for
//! localized groups) and by name / controller:action identity for reverse
//! URL generation. Removing a route detaches it from matching (all group
//! keys) but keeps the name index intact so URLs can still be generated for
//! it.

use crate::error::ConfigError;
use crate::routing::route::{LocalizedRoute, RouteConfig, RouteField};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// What to do when a route name or controller:action identity is already
/// registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateRoutes {
    /// Raise a configuration error (default)
    Reject,

    /// Silently overwrite the existing route
    Replace,
}

/// Hook consulted by the external matching layer before the route table;
/// when registered, matching is attempted even with an empty table.
pub type PreMatchingHandler = Arc<dyn Fn(&str) -> Vec<Arc<LocalizedRoute>> + Send + Sync>;

/// Registry of routes grouped by `(locale, groupName)`.
#[derive(Default)]
pub struct RouteGroupRegistry {
    /// Group key -> ordered routes
    groups: HashMap<String, Vec<Arc<LocalizedRoute>>>,

    /// Route name and controller:action identity -> route
    by_name: HashMap<String, Arc<LocalizedRoute>>,

    pre_matching_handler: Option<PreMatchingHandler>,

    /// Derived: routes exist or a pre-matching handler is registered
    any_routes_configured: bool,

    /// When false, registering a route without per-locale records fails
    allow_non_localized_routes: bool,
}

impl RouteGroupRegistry {
    pub fn new() -> Self {
        Self {
            groups: HashMap::new(),
            by_name: HashMap::new(),
            pre_matching_handler: None,
            any_routes_configured: false,
            allow_non_localized_routes: true,
        }
    }

    pub fn set_allow_non_localized_routes(&mut self, value: bool) {
        self.allow_non_localized_routes = value;
    }

    // ==================== Registration ====================

    /// Register one route under the given group assignment.
    ///
    /// `prepend` inserts the route ahead of existing group members. The
    /// returned handle stays valid for URL generation even after
    /// [`remove_route`](Self::remove_route).
    pub fn add_route(
        &mut self,
        route: LocalizedRoute,
        group_names: Option<RouteField<String>>,
        prepend: bool,
        duplicates: DuplicateRoutes,
    ) -> Result<Arc<LocalizedRoute>, ConfigError> {
        if !self.allow_non_localized_routes && !route.is_localized() {
            return Err(ConfigError::NonLocalizedRoute {
                route: route.name().to_string(),
            });
        }

        if let Some(RouteField::PerLocale(_)) = &group_names {
            if !route.is_localized() {
                return Err(ConfigError::LocalizedGroupOnPlainRoute {
                    route: route.name().to_string(),
                });
            }
        }
        if let (Some(RouteField::Scalar(_)), Some(RouteField::PerLocale(_))) =
            (&group_names, route.group_assignment())
        {
            return Err(ConfigError::ScalarGroupOnLocalizedRoute {
                route: route.name().to_string(),
            });
        }

        let mut identities = vec![route.name().to_string()];
        if let Some(target) = route.controller_action() {
            if target != ":" {
                identities.push(target.to_string());
            }
        }
        for identity in &identities {
            if self.by_name.contains_key(identity) {
                match duplicates {
                    DuplicateRoutes::Reject => {
                        return Err(ConfigError::DuplicateRoute {
                            route: identity.clone(),
                        });
                    }
                    DuplicateRoutes::Replace => self.purge(identity),
                }
            }
        }

        if let Some(group) = &group_names {
            route.assign_group(group.clone())?;
        }

        let route = Arc::new(route);
        for key in group_keys(group_names.as_ref()) {
            let members = self.groups.entry(key).or_default();
            if prepend {
                members.insert(0, route.clone());
            } else {
                members.push(route.clone());
            }
        }

        for identity in identities {
            self.by_name.insert(identity, route.clone());
        }
        self.any_routes_configured = true;
        Ok(route)
    }

    /// Register a batch of route definitions. With `prepend`, the batch
    /// lands ahead of existing group members while keeping its own relative
    /// order.
    pub fn add_routes(
        &mut self,
        configs: Vec<RouteConfig>,
        group_names: Option<RouteField<String>>,
        prepend: bool,
        duplicates: DuplicateRoutes,
    ) -> Result<(), ConfigError> {
        let mut routes = Vec::with_capacity(configs.len());
        for config in configs {
            routes.push(LocalizedRoute::from_config(config)?);
        }
        if prepend {
            // Prepending one by one from the last entry keeps the batch order
            for route in routes.into_iter().rev() {
                self.add_route(route, group_names.clone(), true, duplicates)?;
            }
        } else {
            for route in routes {
                self.add_route(route, group_names.clone(), false, duplicates)?;
            }
        }
        Ok(())
    }

    /// Replace the whole route table, rebuilding the name index, every
    /// group key, and the `any_routes_configured` flag in one pass.
    pub fn set_routes(
        &mut self,
        configs: Vec<RouteConfig>,
        group_names: Option<RouteField<String>>,
        duplicates: DuplicateRoutes,
    ) -> Result<(), ConfigError> {
        self.groups.clear();
        self.by_name.clear();
        self.add_routes(configs, group_names, false, duplicates)?;
        self.any_routes_configured =
            !self.by_name.is_empty() || self.pre_matching_handler.is_some();
        Ok(())
    }

    /// Detach a route from matching: removed from every group key implied
    /// by its assignment, kept in the name index so reverse URL generation
    /// by name remains possible.
    pub fn remove_route(&mut self, name: &str) {
        let Some(route) = self.by_name.get(name).cloned() else {
            return;
        };
        for key in group_keys(route.group_assignment()) {
            if let Some(members) = self.groups.get_mut(&key) {
                members.retain(|member| member.name() != route.name());
            }
        }
    }

    // ==================== Lookup ====================

    /// Ordered routes registered under a group key.
    pub fn routes_for_group(&self, group_key: &str) -> &[Arc<LocalizedRoute>] {
        self.groups
            .get(group_key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// A route by name or controller:action identity.
    pub fn route_by_name_or_target(&self, key: &str) -> Option<Arc<LocalizedRoute>> {
        self.by_name.get(key).cloned()
    }

    /// Distinct registered routes (the controller:action aliases skipped).
    pub fn iter_routes(&self) -> impl Iterator<Item = &Arc<LocalizedRoute>> {
        self.by_name
            .iter()
            .filter(|(key, route)| key.as_str() == route.name())
            .map(|(_, route)| route)
    }

    pub fn any_routes_configured(&self) -> bool {
        self.any_routes_configured
    }

    // ==================== Pre-matching handler ====================

    pub fn set_pre_matching_handler(&mut self, handler: PreMatchingHandler) {
        self.pre_matching_handler = Some(handler);
        self.any_routes_configured = true;
    }

    pub fn clear_pre_matching_handler(&mut self) {
        self.pre_matching_handler = None;
        self.any_routes_configured = !self.by_name.is_empty();
    }

    pub fn pre_matching_handler(&self) -> Option<&PreMatchingHandler> {
        self.pre_matching_handler.as_ref()
    }

    /// Drop a route from both indexes (replacement path).
    fn purge(&mut self, identity: &str) {
        let Some(old) = self.by_name.remove(identity) else {
            return;
        };
        self.by_name.remove(old.name());
        if let Some(target) = old.controller_action() {
            self.by_name.remove(target);
        }
        for members in self.groups.values_mut() {
            members.retain(|member| member.name() != old.name());
        }
    }
}

fn group_keys(assignment: Option<&RouteField<String>>) -> Vec<String> {
    match assignment {
        None => vec![String::new()],
        Some(RouteField::Scalar(name)) => vec![name.clone()],
        Some(RouteField::PerLocale(map)) => map
            .iter()
            .map(|(locale_key, group)| format!("{locale_key}/{group}"))
            .collect(),
    }
}

impl fmt::Debug for RouteGroupRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteGroupRegistry")
            .field("groups", &self.groups.keys().collect::<Vec<_>>())
            .field("routes", &self.by_name.len())
            .field("any_routes_configured", &self.any_routes_configured)
            .field(
                "pre_matching_handler",
                &self.pre_matching_handler.is_some(),
            )
            .finish()
    }
}
