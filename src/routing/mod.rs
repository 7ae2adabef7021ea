//! Localized routing subsystem.
//!
//! - `param`: parameter values and the insertion-ordered parameter map
//! - `reverse`: reverse template parsing into literal/placeholder sections
//! - `route`: the route entity with per-locale records and reverse cache
//! - `registry`: locale-aware route grouping and name/target lookup
//! - `url`: the reverse URL builder

mod param;
mod registry;
mod reverse;
mod route;
mod url;

pub use param::{ParamMap, ParamValue};
pub use registry::{DuplicateRoutes, PreMatchingHandler, RouteGroupRegistry};
pub use reverse::{ReverseData, ReverseSection, ReverseToken};
pub use route::{LocalizedRoute, RouteConfig, RouteField};
pub use url::{
    RequestContext, UrlBuilder, URL_PARAM_BASEPATH, URL_PARAM_DOMAIN, URL_PARAM_HOST,
    URL_PARAM_SLD, URL_PARAM_TLD,
};
