//! Route composition and per-route service wiring
//!
//! The other half of the core: a [`ServerConfig`] carries the
//! configuration-scoped state (resolver settings, handler and filter
//! registrations, feature flags), and [`map_odata_service_route`] composes
//! one route from it: an isolated service container, a path handler bound to
//! the model and routing conventions through a [`PathRouteConstraint`], and a
//! synthesized `$batch` sub-route when a batch handler is registered.
//!
//! Composition runs once per route at configuration time, before the server
//! accepts requests; nothing here is touched on the request path except the
//! immutable [`ODataRoute`] registrations themselves.

mod compose;
mod config;
mod conventions;
mod etag;
mod handlers;
mod path;
mod query;
mod resolver;
mod route;

pub use compose::{
    ODataRouteBuilder, RouteError, add_default_framework_services, add_default_odata_services,
    map_odata_service_route,
};
pub use config::{ConfigError, ContainerBuilderFactory, ServerConfig};
pub use conventions::{
    AttributeRoutingConvention, EntityRoutingConvention, EntitySetRoutingConvention,
    MetadataRoutingConvention, RoutingConvention, default_conventions,
};
pub use etag::{DefaultETagHandler, ETagHandler};
pub use handlers::{BatchHandler, HandlerError, MessageHandler};
pub use path::{DefaultPathHandler, ODataPath, PathError, PathHandler, PathSegment};
pub use query::{EnableQueryFilter, QueryFilter};
pub use resolver::{
    CaseInsensitiveResolver, DefaultUriResolver, UriResolver, UriResolverSettings, UrlConventions,
};
pub use route::{BatchRoute, ODataRoute, PathRouteConstraint, RouteEntry, RouteTable,
    RouteTableError};

/// Reserved path segments with routing significance.
pub mod segments {
    pub const METADATA: &str = "$metadata";
    pub const BATCH: &str = "$batch";
    pub const COUNT: &str = "$count";
    pub const VALUE: &str = "$value";
}
