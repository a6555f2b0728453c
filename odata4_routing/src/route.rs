//! Route registrations, the path-matching constraint and the route table

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use odata4_container::ServiceProvider;
use odata4_edm::EdmModel;

use crate::conventions::RoutingConvention;
use crate::handlers::{BatchHandler, MessageHandler};
use crate::path::{ODataPath, PathHandler};

/// The path-matching constraint bound to one route: the path handler, the
/// model it parses against, the route's name, the ordered routing
/// conventions and the route-scoped service container.
#[derive(Debug)]
pub struct PathRouteConstraint {
    path_handler: Arc<dyn PathHandler>,
    model: Arc<EdmModel>,
    route_name: Arc<str>,
    routing_conventions: Vec<Arc<dyn RoutingConvention>>,
    container: Arc<ServiceProvider>,
}

impl PathRouteConstraint {
    pub fn new(
        path_handler: Arc<dyn PathHandler>,
        model: Arc<EdmModel>,
        route_name: Arc<str>,
        routing_conventions: Vec<Arc<dyn RoutingConvention>>,
        container: Arc<ServiceProvider>,
    ) -> Self {
        Self {
            path_handler,
            model,
            route_name,
            routing_conventions,
            container,
        }
    }

    pub fn route_name(&self) -> &str {
        &self.route_name
    }

    pub fn model(&self) -> &Arc<EdmModel> {
        &self.model
    }

    pub fn container(&self) -> &Arc<ServiceProvider> {
        &self.container
    }

    pub fn routing_conventions(&self) -> &[Arc<dyn RoutingConvention>] {
        &self.routing_conventions
    }

    /// Whether the prefix-relative request path parses as an OData path for
    /// this route's model.
    pub fn matches(&self, odata_path: &str) -> bool {
        match self.path_handler.parse(&self.model, "/", odata_path) {
            Ok(_) => true,
            Err(error) => {
                trace!(
                    route_name = self.route_name.as_ref(),
                    path = odata_path,
                    %error,
                    "path did not match route"
                );
                false
            }
        }
    }

    /// Parses the path and selects a controller through the conventions,
    /// first match wins.
    pub fn select_controller(&self, odata_path: &str) -> Option<Arc<str>> {
        let parsed = self.path_handler.parse(&self.model, "/", odata_path).ok()?;
        self.select_controller_for(&parsed)
    }

    pub fn select_controller_for(&self, path: &ODataPath) -> Option<Arc<str>> {
        self.routing_conventions
            .iter()
            .find_map(|convention| convention.select_controller(path))
    }
}

/// One composed OData route: immutable after registration.
#[derive(Debug)]
pub struct ODataRoute {
    name: Arc<str>,
    prefix: Arc<str>,
    constraint: PathRouteConstraint,
    message_handler: Option<Arc<dyn MessageHandler>>,
    root_container: Arc<ServiceProvider>,
}

impl ODataRoute {
    pub(crate) fn new(
        name: Arc<str>,
        prefix: Arc<str>,
        constraint: PathRouteConstraint,
        message_handler: Option<Arc<dyn MessageHandler>>,
        root_container: Arc<ServiceProvider>,
    ) -> Self {
        Self {
            name,
            prefix,
            constraint,
            message_handler,
            root_container,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The route's path prefix, trailing slash already stripped.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn constraint(&self) -> &PathRouteConstraint {
        &self.constraint
    }

    /// The explicit message handler, when the route dispatches directly and
    /// bypasses convention-based selection.
    pub fn message_handler(&self) -> Option<&Arc<dyn MessageHandler>> {
        self.message_handler.as_ref()
    }

    /// The route-scoped root container.
    pub fn root_container(&self) -> &Arc<ServiceProvider> {
        &self.root_container
    }

    /// Whether an absolute request path belongs to this route: the prefix
    /// must match and the remainder must parse.
    pub fn matches(&self, request_path: &str) -> bool {
        let Some(relative) = strip_prefix_path(request_path, &self.prefix) else {
            return false;
        };
        self.constraint.matches(relative)
    }
}

/// Strips the route prefix from an absolute request path, returning the
/// OData-relative remainder.
fn strip_prefix_path<'a>(request_path: &'a str, prefix: &str) -> Option<&'a str> {
    let path = request_path.trim_start_matches('/');
    if prefix.is_empty() {
        return Some(path);
    }
    match path.strip_prefix(prefix) {
        Some("") => Some(""),
        Some(rest) => rest.strip_prefix('/'),
        None => None,
    }
}

/// The synthesized `$batch` sub-route for a batch-enabled OData route.
#[derive(Debug)]
pub struct BatchRoute {
    name: Arc<str>,
    template: Arc<str>,
    handler: Arc<dyn BatchHandler>,
}

impl BatchRoute {
    pub(crate) fn new(name: Arc<str>, template: Arc<str>, handler: Arc<dyn BatchHandler>) -> Self {
        Self {
            name,
            template,
            handler,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The path template the batch endpoint answers, e.g. `api/$batch`.
    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn handler(&self) -> &Arc<dyn BatchHandler> {
        &self.handler
    }
}

/// A registered entry in the route table.
#[derive(Debug, Clone)]
pub enum RouteEntry {
    Service(Arc<ODataRoute>),
    Batch(Arc<BatchRoute>),
}

#[derive(Debug, thiserror::Error)]
pub enum RouteTableError {
    #[error("a route named `{name}` is already registered")]
    DuplicateName { name: String },
}

/// Routes registered by unique name. Name collisions are this table's
/// responsibility, not the composer's.
#[derive(Debug, Default)]
pub struct RouteTable {
    entries: RwLock<HashMap<Arc<str>, RouteEntry>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_route(&self, route: Arc<ODataRoute>) -> Result<(), RouteTableError> {
        self.insert(Arc::clone(&route.name), RouteEntry::Service(route))
    }

    pub fn add_batch_route(&self, route: Arc<BatchRoute>) -> Result<(), RouteTableError> {
        self.insert(Arc::clone(&route.name), RouteEntry::Batch(route))
    }

    fn insert(&self, name: Arc<str>, entry: RouteEntry) -> Result<(), RouteTableError> {
        let mut entries = self.entries.write();
        if entries.contains_key(&name) {
            return Err(RouteTableError::DuplicateName {
                name: name.to_string(),
            });
        }
        entries.insert(name, entry);
        Ok(())
    }

    pub fn entry(&self, name: &str) -> Option<RouteEntry> {
        self.entries.read().get(name).cloned()
    }

    /// The service route registered under `name`, if any.
    pub fn route(&self, name: &str) -> Option<Arc<ODataRoute>> {
        match self.entry(name) {
            Some(RouteEntry::Service(route)) => Some(route),
            _ => None,
        }
    }

    /// The batch route registered under `name`, if any.
    pub fn batch_route(&self, name: &str) -> Option<Arc<BatchRoute>> {
        match self.entry(name) {
            Some(RouteEntry::Batch(route)) => Some(route),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
