//! The explicit server configuration object

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{FixedOffset, Offset, Utc};
use parking_lot::RwLock;

use odata4_container::{ContainerBuilder, ContainerError};

use crate::etag::{DefaultETagHandler, ETagHandler};
use crate::query::QueryFilter;
use crate::resolver::{UriResolver, UriResolverSettings, UrlConventions};
use crate::route::RouteTable;

/// A pluggable factory for the container builder used by route composition.
pub type ContainerBuilderFactory =
    dyn Fn() -> Result<Box<dyn ContainerBuilder>, ContainerError> + Send + Sync;

#[derive(Debug, Clone, Copy, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration property `{key}` does not have the requested shape")]
    PropertyShape { key: &'static str },
}

/// Configuration-scoped state, passed by reference to every operation that
/// needs it.
///
/// All mutation happens during configuration setup, before the server
/// accepts requests; concurrent setup mutation must be serialized by the
/// caller. The named-property bag backs arbitrary extension values; the
/// well-known settings are explicit fields initialized at construction, so
/// reads never race a first-time creation.
pub struct ServerConfig {
    properties: RwLock<HashMap<&'static str, Arc<dyn Any + Send + Sync>>>,
    resolver_settings: Arc<UriResolverSettings>,
    etag_handler: RwLock<Arc<dyn ETagHandler>>,
    time_zone: RwLock<FixedOffset>,
    continue_on_error: AtomicBool,
    serialize_null_dynamic: AtomicBool,
    query_filters: RwLock<Vec<Arc<dyn QueryFilter>>>,
    attribute_routes: RwLock<Vec<(Arc<str>, Arc<str>)>>,
    container_builder_factory: RwLock<Option<Arc<ContainerBuilderFactory>>>,
    routes: RouteTable,
}

impl ServerConfig {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            properties: RwLock::new(HashMap::new()),
            resolver_settings: Arc::new(UriResolverSettings::new()),
            etag_handler: RwLock::new(Arc::new(DefaultETagHandler)),
            time_zone: RwLock::new(Utc.fix()),
            continue_on_error: AtomicBool::new(false),
            serialize_null_dynamic: AtomicBool::new(false),
            query_filters: RwLock::new(Vec::new()),
            attribute_routes: RwLock::new(Vec::new()),
            container_builder_factory: RwLock::new(None),
            routes: RouteTable::new(),
        })
    }

    /// The route table owned by this configuration.
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// The configuration-wide URI-resolution settings. Always the same
    /// instance; both policies start unset.
    pub fn resolver_settings(&self) -> Arc<UriResolverSettings> {
        Arc::clone(&self.resolver_settings)
    }

    /// Sets the URI resolver used as the fallback for routes whose path
    /// handler leaves it unset.
    pub fn set_uri_resolver(&self, resolver: Arc<dyn UriResolver>) {
        self.resolver_settings.set_uri_resolver(resolver);
    }

    /// Sets the URL key conventions fallback; `None` clears it.
    pub fn set_url_conventions(&self, conventions: Option<UrlConventions>) {
        self.resolver_settings.set_url_conventions(conventions);
    }

    pub fn etag_handler(&self) -> Arc<dyn ETagHandler> {
        Arc::clone(&self.etag_handler.read())
    }

    pub fn set_etag_handler(&self, handler: Arc<dyn ETagHandler>) {
        *self.etag_handler.write() = handler;
    }

    pub fn time_zone(&self) -> FixedOffset {
        *self.time_zone.read()
    }

    pub fn set_time_zone(&self, time_zone: FixedOffset) {
        *self.time_zone.write() = time_zone;
    }

    /// Enables the continue-on-error preference for batch processing.
    pub fn enable_continue_on_error(&self) {
        self.continue_on_error.store(true, Ordering::Relaxed);
    }

    pub fn continue_on_error_enabled(&self) -> bool {
        self.continue_on_error.load(Ordering::Relaxed)
    }

    /// Whether null-valued dynamic properties are serialized.
    pub fn set_serialize_null_dynamic_property(&self, serialize: bool) {
        self.serialize_null_dynamic.store(serialize, Ordering::Relaxed);
    }

    pub fn serialize_null_dynamic_property(&self) -> bool {
        self.serialize_null_dynamic.load(Ordering::Relaxed)
    }

    /// Registers a query filter. Filters are drained by the request
    /// pipeline; execution is not part of this core.
    pub fn add_query_filter(&self, filter: Arc<dyn QueryFilter>) {
        self.query_filters.write().push(filter);
    }

    /// Registers the stock [`EnableQueryFilter`](crate::EnableQueryFilter)
    /// with its default settings.
    pub fn add_default_query_filter(&self) {
        self.add_query_filter(Arc::new(crate::query::EnableQueryFilter::new()));
    }

    pub fn query_filters(&self) -> Vec<Arc<dyn QueryFilter>> {
        self.query_filters.read().clone()
    }

    /// Registers an attribute route template for the attribute routing
    /// convention. Template discovery from controller metadata is external.
    pub fn register_attribute_route(
        &self,
        template: impl Into<Arc<str>>,
        controller: impl Into<Arc<str>>,
    ) {
        self.attribute_routes
            .write()
            .push((template.into(), controller.into()));
    }

    pub fn attribute_routes(&self) -> Vec<(Arc<str>, Arc<str>)> {
        self.attribute_routes.read().clone()
    }

    /// Overrides the container builder used by subsequent route composition.
    pub fn use_custom_container_builder<F>(&self, factory: F) -> &Self
    where
        F: Fn() -> Result<Box<dyn ContainerBuilder>, ContainerError> + Send + Sync + 'static,
    {
        *self.container_builder_factory.write() = Some(Arc::new(factory));
        self
    }

    pub(crate) fn container_builder_factory(&self) -> Option<Arc<ContainerBuilderFactory>> {
        self.container_builder_factory.read().clone()
    }

    /// Stores an arbitrary named property.
    pub fn set_property<T: Send + Sync + 'static>(&self, key: &'static str, value: T) {
        self.properties.write().insert(key, Arc::new(value));
    }

    /// Reads a named property back. A stored value of a different runtime
    /// shape is an invalid-operation error, not a silent miss.
    pub fn property<T: Clone + Send + Sync + 'static>(
        &self,
        key: &'static str,
    ) -> Result<Option<T>, ConfigError> {
        let properties = self.properties.read();
        let Some(value) = properties.get(key) else {
            return Ok(None);
        };
        match value.downcast_ref::<T>() {
            Some(value) => Ok(Some(value.clone())),
            None => Err(ConfigError::PropertyShape { key }),
        }
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("routes", &self.routes)
            .field("resolver_settings", &self.resolver_settings)
            .field("continue_on_error", &self.continue_on_error_enabled())
            .field(
                "serialize_null_dynamic",
                &self.serialize_null_dynamic_property(),
            )
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::CaseInsensitiveResolver;

    #[test]
    fn resolver_settings_are_one_instance_per_configuration() {
        let config = ServerConfig::new();
        let first = config.resolver_settings();
        let second = config.resolver_settings();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.uri_resolver().is_none());
        assert!(first.url_conventions().is_none());
    }

    #[test]
    fn set_uri_resolver_lands_on_the_shared_settings() {
        let config = ServerConfig::new();
        config.set_uri_resolver(Arc::new(CaseInsensitiveResolver));
        let settings = config.resolver_settings();
        assert!(settings.uri_resolver().unwrap().case_insensitive());
    }

    #[test]
    fn url_conventions_can_be_set_before_or_after_first_read() {
        let config = ServerConfig::new();
        let settings = config.resolver_settings();
        config.set_url_conventions(Some(UrlConventions::KeyAsSegment));
        assert_eq!(
            settings.url_conventions(),
            Some(UrlConventions::KeyAsSegment)
        );
        config.set_url_conventions(None);
        assert_eq!(settings.url_conventions(), None);
    }

    #[test]
    fn flags_default_off() {
        let config = ServerConfig::new();
        assert!(!config.continue_on_error_enabled());
        assert!(!config.serialize_null_dynamic_property());
        config.enable_continue_on_error();
        config.set_serialize_null_dynamic_property(true);
        assert!(config.continue_on_error_enabled());
        assert!(config.serialize_null_dynamic_property());
    }

    #[test]
    fn default_etag_handler_is_present_and_replaceable() {
        let config = ServerConfig::new();
        let handler = config.etag_handler();
        assert!(
            handler
                .create_etag(&[("v".into(), odata4_types::ODataValue::int32(1))])
                .is_some()
        );
    }

    #[test]
    fn query_filters_accumulate_in_registration_order() {
        let config = ServerConfig::new();
        assert!(config.query_filters().is_empty());
        config.add_default_query_filter();
        config.add_query_filter(Arc::new(
            crate::query::EnableQueryFilter::new().with_page_size(50),
        ));
        let filters = config.query_filters();
        assert_eq!(filters.len(), 2);
        assert!(filters[0].allowed_options().contains(&"$filter"));
    }

    #[test]
    fn property_bag_reports_shape_mismatches() {
        let config = ServerConfig::new();
        config.set_property("custom.flag", 7_i32);
        assert_eq!(config.property::<i32>("custom.flag").unwrap(), Some(7));
        assert!(config.property::<String>("custom.flag").is_err());
        assert_eq!(config.property::<i32>("custom.other").unwrap(), None);
    }
}
