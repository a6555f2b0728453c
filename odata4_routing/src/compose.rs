//! Route composition: one isolated container and one registration per route

use std::sync::Arc;

use tracing::{debug, info};

use odata4_container::{ContainerBuilder, ContainerError, DefaultContainerBuilder, ServiceRegistry};
use odata4_edm::EdmModel;
use odata4_serialization::SerializerProvider;

use crate::config::ServerConfig;
use crate::conventions::{RoutingConvention, default_conventions};
use crate::handlers::{BatchHandler, MessageHandler};
use crate::path::{DefaultPathHandler, PathHandler};
use crate::route::{BatchRoute, ODataRoute, PathRouteConstraint, RouteTableError};
use crate::segments;

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    /// Invalid argument: the route name is required.
    #[error("route name must not be empty")]
    EmptyRouteName,
    /// Invalid operation: the registered container-builder factory failed.
    #[error("container builder factory failed: {source}")]
    BuilderFactory { source: ContainerError },
    /// Invalid operation: the builder produced no container.
    #[error("failed to build the route service container: {source}")]
    ContainerBuild { source: ContainerError },
    /// Invalid operation: a required service is missing from the container.
    #[error("required service missing from the route container: {source}")]
    MissingService { source: ContainerError },
    #[error(transparent)]
    RouteTable(#[from] RouteTableError),
}

/// Registers the default OData protocol services on a route container.
///
/// Caller registrations run after this bundle, so they override these
/// defaults. Routing conventions are deliberately not registered here: an
/// empty convention set falls back at composition time, which lets a caller
/// replace the whole set instead of appending to it.
pub fn add_default_odata_services(registry: &mut ServiceRegistry) {
    registry.add_singleton::<SerializerProvider, _>(|_| Arc::new(SerializerProvider::new()));
}

/// Registers the default framework-adapter services on a route container.
pub fn add_default_framework_services(registry: &mut ServiceRegistry) {
    registry.add_singleton::<dyn PathHandler, _>(|_| Arc::new(DefaultPathHandler::new()));
}

/// Maps an OData service route: builds the route's isolated service
/// container, applies resolver-setting fallbacks to the path handler,
/// selects the route shape and registers the result under `route_name`.
///
/// The `setup` callback runs against the container builder after the
/// defaults, so caller registrations override or extend them. A trailing
/// slash on `route_prefix` is stripped.
///
/// Runs once per route at configuration time. On failure nothing is
/// registered under `route_name`.
pub fn map_odata_service_route(
    config: &Arc<ServerConfig>,
    route_name: &str,
    route_prefix: &str,
    setup: impl FnOnce(&mut ServiceRegistry),
) -> Result<Arc<ODataRoute>, RouteError> {
    if route_name.is_empty() {
        return Err(RouteError::EmptyRouteName);
    }

    // 1) Build and configure the route's root container.
    let builder: Box<dyn ContainerBuilder> = match config.container_builder_factory() {
        Some(factory) => factory().map_err(|source| RouteError::BuilderFactory { source })?,
        None => Box::new(DefaultContainerBuilder::new()),
    };
    let mut registry = ServiceRegistry::new(builder);
    registry.add_instance::<ServerConfig>(Arc::clone(config));
    add_default_odata_services(&mut registry);
    add_default_framework_services(&mut registry);
    setup(&mut registry);

    let container = registry
        .build()
        .map_err(|source| RouteError::ContainerBuild { source })?;

    // 2) Resolve the path handler and apply the settings fallback.
    let path_handler = container
        .get_required::<dyn PathHandler>()
        .map_err(|source| RouteError::MissingService { source })?;
    apply_resolver_fallback(config, path_handler.as_ref());

    // 3) Resolve the model and conventions, then build the constraint.
    let model = container
        .get_required::<EdmModel>()
        .map_err(|source| RouteError::MissingService { source })?;
    let mut routing_conventions = container.get_all::<dyn RoutingConvention>();
    if routing_conventions.is_empty() {
        routing_conventions = default_conventions(config, &model);
    }

    let route_name: Arc<str> = Arc::from(route_name);
    let route_prefix: Arc<str> = Arc::from(strip_trailing_slash(route_prefix));
    let constraint = PathRouteConstraint::new(
        Arc::clone(&path_handler),
        Arc::clone(&model),
        Arc::clone(&route_name),
        routing_conventions,
        Arc::clone(&container),
    );

    // 4) Select the route shape and register.
    let message_handler = container.get::<dyn MessageHandler>();
    if message_handler.is_none() {
        if let Some(batch_handler) = container.get::<dyn BatchHandler>() {
            register_batch_route(config, &route_name, &route_prefix, batch_handler)?;
        }
    } else {
        debug!(
            route_name = route_name.as_ref(),
            "explicit message handler registered, batch route synthesis skipped"
        );
    }

    let route = Arc::new(ODataRoute::new(
        Arc::clone(&route_name),
        Arc::clone(&route_prefix),
        constraint,
        message_handler,
        container,
    ));
    config.routes().add_route(Arc::clone(&route))?;
    info!(
        route_name = route_name.as_ref(),
        route_prefix = route_prefix.as_ref(),
        "mapped OData service route"
    );
    Ok(route)
}

/// Copies unset resolver-setting fields from the configuration onto a path
/// handler that supports URI resolution. The fallback is per-field:
/// route-local values win where already set.
fn apply_resolver_fallback(config: &Arc<ServerConfig>, path_handler: &dyn PathHandler) {
    let Some(local) = path_handler.resolution_settings() else {
        return;
    };
    let global = config.resolver_settings();
    if local.uri_resolver().is_none() {
        if let Some(resolver) = global.uri_resolver() {
            local.set_uri_resolver(resolver);
        }
    }
    if local.url_conventions().is_none() {
        local.set_url_conventions(global.url_conventions());
    }
}

fn register_batch_route(
    config: &Arc<ServerConfig>,
    route_name: &str,
    route_prefix: &str,
    batch_handler: Arc<dyn BatchHandler>,
) -> Result<(), RouteError> {
    batch_handler.set_route_name(Arc::from(route_name));
    let template = if route_prefix.is_empty() {
        segments::BATCH.to_string()
    } else {
        format!("{route_prefix}/{}", segments::BATCH)
    };
    let batch_route = Arc::new(BatchRoute::new(
        Arc::from(format!("{route_name}Batch")),
        Arc::from(template),
        batch_handler,
    ));
    config.routes().add_batch_route(batch_route)?;
    Ok(())
}

fn strip_trailing_slash(route_prefix: &str) -> &str {
    route_prefix.strip_suffix('/').unwrap_or(route_prefix)
}

/// Builder for the typed route-mapping shapes: any combination of model,
/// path handler, routing conventions and a batch or explicit message
/// handler, all converging on [`map_odata_service_route`] by registering the
/// supplied pieces as singleton services.
#[derive(Debug, Default)]
pub struct ODataRouteBuilder {
    route_name: String,
    route_prefix: String,
    model: Option<Arc<EdmModel>>,
    path_handler: Option<Arc<dyn PathHandler>>,
    routing_conventions: Option<Vec<Arc<dyn RoutingConvention>>>,
    batch_handler: Option<Arc<dyn BatchHandler>>,
    message_handler: Option<Arc<dyn MessageHandler>>,
}

impl ODataRouteBuilder {
    pub fn new(route_name: impl Into<String>, route_prefix: impl Into<String>) -> Self {
        Self {
            route_name: route_name.into(),
            route_prefix: route_prefix.into(),
            ..Self::default()
        }
    }

    /// The EDM model to parse OData paths against. Required unless a custom
    /// setup registers one.
    pub fn model(mut self, model: Arc<EdmModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn path_handler(mut self, path_handler: Arc<dyn PathHandler>) -> Self {
        self.path_handler = Some(path_handler);
        self
    }

    pub fn routing_conventions(
        mut self,
        routing_conventions: Vec<Arc<dyn RoutingConvention>>,
    ) -> Self {
        self.routing_conventions = Some(routing_conventions);
        self
    }

    /// Registers a batch handler; composition will synthesize a `$batch`
    /// sub-route for it.
    pub fn batch_handler(mut self, batch_handler: Arc<dyn BatchHandler>) -> Self {
        self.batch_handler = Some(batch_handler);
        self
    }

    /// Registers an explicit message handler; the route dispatches to it
    /// directly and no batch route is synthesized.
    pub fn message_handler(mut self, message_handler: Arc<dyn MessageHandler>) -> Self {
        self.message_handler = Some(message_handler);
        self
    }

    pub fn map(self, config: &Arc<ServerConfig>) -> Result<Arc<ODataRoute>, RouteError> {
        let Self {
            route_name,
            route_prefix,
            model,
            path_handler,
            routing_conventions,
            batch_handler,
            message_handler,
        } = self;
        map_odata_service_route(config, &route_name, &route_prefix, move |registry| {
            if let Some(model) = model {
                registry.add_instance::<EdmModel>(model);
            }
            if let Some(path_handler) = path_handler {
                registry.add_instance::<dyn PathHandler>(path_handler);
            }
            if let Some(routing_conventions) = routing_conventions {
                for convention in routing_conventions {
                    registry.add_instance::<dyn RoutingConvention>(convention);
                }
            }
            if let Some(batch_handler) = batch_handler {
                registry.add_instance::<dyn BatchHandler>(batch_handler);
            }
            if let Some(message_handler) = message_handler {
                registry.add_instance::<dyn MessageHandler>(message_handler);
            }
        })
    }
}
