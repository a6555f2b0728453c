//! End-to-end route composition through the public API

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, Response};
use parking_lot::RwLock;

use odata4_container::ContainerError;
use pretty_assertions::assert_eq;
use odata4_edm::{EdmModel, EdmStructuredType, EdmTypeRef, PrimitiveKind};
use odata4_routing::{
    BatchHandler, CaseInsensitiveResolver, DefaultPathHandler, HandlerError, MessageHandler,
    ODataRouteBuilder, PathHandler, RouteError, ServerConfig, UrlConventions,
    map_odata_service_route,
};

fn model() -> Arc<EdmModel> {
    let mut model = EdmModel::new();
    let customer = model.add_structured_type(
        EdmStructuredType::entity("NS.Customer")
            .with_key("id")
            .with_property("id", EdmTypeRef::primitive(PrimitiveKind::Int32))
            .with_property("name", EdmTypeRef::primitive(PrimitiveKind::String)),
    );
    model.add_entity_set("Customers", customer);
    Arc::new(model)
}

#[derive(Debug, Default)]
struct NoopHandler;

#[async_trait]
impl MessageHandler for NoopHandler {
    async fn handle(&self, _request: Request<Bytes>) -> Result<Response<Bytes>, HandlerError> {
        Ok(Response::new(Bytes::new()))
    }
}

#[derive(Debug, Default)]
struct RecordingBatchHandler {
    route_name: RwLock<Option<Arc<str>>>,
}

#[async_trait]
impl MessageHandler for RecordingBatchHandler {
    async fn handle(&self, _request: Request<Bytes>) -> Result<Response<Bytes>, HandlerError> {
        Ok(Response::new(Bytes::new()))
    }
}

#[async_trait]
impl BatchHandler for RecordingBatchHandler {
    fn route_name(&self) -> Option<Arc<str>> {
        self.route_name.read().clone()
    }

    fn set_route_name(&self, name: Arc<str>) {
        *self.route_name.write() = Some(name);
    }
}

#[test_log::test]
fn plain_route_composes_with_empty_prefix() {
    let config = ServerConfig::new();
    let route = ODataRouteBuilder::new("odata", "")
        .model(model())
        .map(&config)
        .unwrap();

    assert_eq!(route.name(), "odata");
    assert_eq!(route.prefix(), "");
    assert!(config.routes().route("odata").is_some());
    assert!(route.message_handler().is_none());
    assert!(route.matches("/Customers"));
    assert!(route.matches("/Customers(1)/name/$value"));
    assert!(!route.matches("/Unknown"));
}

#[test_log::test]
fn trailing_slash_is_stripped_from_the_prefix() {
    let config = ServerConfig::new();
    let route = ODataRouteBuilder::new("odata", "odata/")
        .model(model())
        .map(&config)
        .unwrap();
    assert_eq!(route.prefix(), "odata");
    assert!(route.matches("/odata/Customers"));
    assert!(!route.matches("/Customers"));
}

#[test]
fn batch_handler_synthesizes_a_batch_sub_route() {
    let config = ServerConfig::new();
    let batch = Arc::new(RecordingBatchHandler::default());
    ODataRouteBuilder::new("odata", "api")
        .model(model())
        .batch_handler(Arc::clone(&batch) as Arc<dyn BatchHandler>)
        .map(&config)
        .unwrap();

    let batch_route = config.routes().batch_route("odataBatch").unwrap();
    assert_eq!(batch_route.template(), "api/$batch");
    assert_eq!(batch.route_name().as_deref(), Some("odata"));
    // The main route is registered alongside.
    assert!(config.routes().route("odata").is_some());
}

#[test]
fn empty_prefix_batch_template_is_bare() {
    let config = ServerConfig::new();
    ODataRouteBuilder::new("odata", "")
        .model(model())
        .batch_handler(Arc::new(RecordingBatchHandler::default()) as Arc<dyn BatchHandler>)
        .map(&config)
        .unwrap();
    assert_eq!(
        config.routes().batch_route("odataBatch").unwrap().template(),
        "$batch"
    );
}

#[test]
fn explicit_message_handler_wins_over_batch() {
    let config = ServerConfig::new();
    let route = ODataRouteBuilder::new("odata", "api")
        .model(model())
        .batch_handler(Arc::new(RecordingBatchHandler::default()) as Arc<dyn BatchHandler>)
        .message_handler(Arc::new(NoopHandler) as Arc<dyn MessageHandler>)
        .map(&config)
        .unwrap();

    assert!(route.message_handler().is_some());
    assert!(config.routes().batch_route("odataBatch").is_none());
    assert_eq!(config.routes().len(), 1);
}

#[test]
fn failing_builder_factory_registers_nothing() {
    let config = ServerConfig::new();
    config.use_custom_container_builder(|| {
        Err(ContainerError::BuildFailed {
            reason: "factory declined".to_string(),
        })
    });

    let err = ODataRouteBuilder::new("odata", "")
        .model(model())
        .map(&config)
        .unwrap_err();
    assert!(matches!(err, RouteError::BuilderFactory { .. }));
    assert!(config.routes().is_empty());
}

#[test]
fn global_resolver_settings_fall_back_per_field() {
    // Resolver unset locally, conventions set locally: only the resolver is
    // inherited.
    let config = ServerConfig::new();
    config.set_uri_resolver(Arc::new(CaseInsensitiveResolver));
    config.set_url_conventions(Some(UrlConventions::Parentheses));

    let handler = DefaultPathHandler::new();
    handler
        .resolution_settings()
        .unwrap()
        .set_url_conventions(Some(UrlConventions::KeyAsSegment));
    let handler: Arc<dyn PathHandler> = Arc::new(handler);

    let route = ODataRouteBuilder::new("odata", "")
        .model(model())
        .path_handler(Arc::clone(&handler))
        .map(&config)
        .unwrap();

    let settings = handler.resolution_settings().unwrap();
    assert!(settings.uri_resolver().unwrap().case_insensitive());
    // Route-local value untouched by the global Parentheses setting.
    assert_eq!(
        settings.url_conventions(),
        Some(UrlConventions::KeyAsSegment)
    );
    // The inherited policies are live on the route: case-insensitive set
    // names and segment keys both parse.
    assert!(route.matches("/customers/7"));
}

#[test]
fn locally_set_resolver_is_not_overwritten() {
    // Conventions unset locally, resolver set locally: only the conventions
    // are inherited.
    let config = ServerConfig::new();
    config.set_uri_resolver(Arc::new(CaseInsensitiveResolver));
    config.set_url_conventions(Some(UrlConventions::KeyAsSegment));

    let handler = DefaultPathHandler::new();
    handler
        .resolution_settings()
        .unwrap()
        .set_uri_resolver(Arc::new(odata4_routing::DefaultUriResolver));
    let handler: Arc<dyn PathHandler> = Arc::new(handler);

    ODataRouteBuilder::new("odata", "")
        .model(model())
        .path_handler(Arc::clone(&handler))
        .map(&config)
        .unwrap();

    let settings = handler.resolution_settings().unwrap();
    // Local exact-case resolver survives the global case-insensitive one.
    assert!(!settings.uri_resolver().unwrap().case_insensitive());
    assert_eq!(
        settings.url_conventions(),
        Some(UrlConventions::KeyAsSegment)
    );
}

#[test]
fn custom_setup_registers_services_for_the_route() {
    let config = ServerConfig::new();
    let model = model();
    let model_clone = Arc::clone(&model);
    let route = map_odata_service_route(&config, "odata", "v1", move |registry| {
        registry.add_instance::<EdmModel>(model_clone);
    })
    .unwrap();

    assert!(Arc::ptr_eq(
        &route.root_container().get_required::<EdmModel>().unwrap(),
        &model
    ));
    assert!(Arc::ptr_eq(
        &route
            .root_container()
            .get_required::<ServerConfig>()
            .unwrap(),
        &config
    ));
}

#[test]
fn constraint_selects_controllers_through_default_conventions() {
    let config = ServerConfig::new();
    let route = ODataRouteBuilder::new("odata", "")
        .model(model())
        .map(&config)
        .unwrap();

    let constraint = route.constraint();
    assert_eq!(constraint.select_controller("$metadata").as_deref(), Some("Metadata"));
    assert_eq!(constraint.select_controller("Customers").as_deref(), Some("Customers"));
    assert_eq!(
        constraint.select_controller("Customers(1)").as_deref(),
        Some("Customers")
    );
}

#[tokio::test]
async fn registered_handlers_remain_invocable() {
    let config = ServerConfig::new();
    let route = ODataRouteBuilder::new("odata", "")
        .model(model())
        .message_handler(Arc::new(NoopHandler) as Arc<dyn MessageHandler>)
        .map(&config)
        .unwrap();

    let handler = route.message_handler().unwrap();
    let response = handler
        .handle(Request::builder().uri("/odata/Customers").body(Bytes::new()).unwrap())
        .await
        .unwrap();
    assert!(response.status().is_success());
}

#[test]
fn duplicate_route_names_are_rejected_by_the_table() {
    let config = ServerConfig::new();
    ODataRouteBuilder::new("odata", "")
        .model(model())
        .map(&config)
        .unwrap();
    let err = ODataRouteBuilder::new("odata", "other")
        .model(model())
        .map(&config)
        .unwrap_err();
    assert!(matches!(err, RouteError::RouteTable(_)));
}
