//! Per-route service containers
//!
//! A pluggable register/resolve-by-type container abstraction. Each mapped
//! route builds its own isolated [`ServiceProvider`] through a
//! [`ContainerBuilder`] (the stock [`DefaultContainerBuilder`] or a
//! caller-supplied implementation); no service is shared across routes unless
//! the caller registers the same instance in both.
//!
//! Services are registered as type-erased factories at one of two lifetimes:
//! [`Singleton`](ServiceLifetime::Singleton) services are created once per
//! container, [`Transient`](ServiceLifetime::Transient) factories run on
//! every resolution.

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::Arc;

mod provider;

pub use provider::ServiceProvider;

/// How long a resolved service instance lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceLifetime {
    /// One instance for the lifetime of the container.
    Singleton,
    /// A new instance on every resolution.
    Transient,
}

#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("required service `{type_name}` is not registered in the container")]
    MissingService { type_name: &'static str },
    #[error("container builder failed to produce a container: {reason}")]
    BuildFailed { reason: String },
}

pub type Result<T, E = ContainerError> = std::result::Result<T, E>;

pub(crate) type BoxedService = Box<dyn Any + Send + Sync>;
pub(crate) type ServiceFactory = Arc<dyn Fn(&ServiceProvider) -> BoxedService + Send + Sync>;

/// A type-erased service registration: the service type, its lifetime and
/// the factory producing instances.
///
/// The service type may be unsized, so trait objects register directly:
/// `ServiceDescriptor::singleton::<dyn PathHandler, _>(|_| ...)`.
#[derive(Clone)]
pub struct ServiceDescriptor {
    service_type: TypeId,
    type_name: &'static str,
    lifetime: ServiceLifetime,
    factory: ServiceFactory,
}

impl ServiceDescriptor {
    pub fn new<T, F>(lifetime: ServiceLifetime, factory: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ServiceProvider) -> Arc<T> + Send + Sync + 'static,
    {
        Self {
            service_type: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            lifetime,
            factory: Arc::new(move |provider| Box::new(factory(provider)) as BoxedService),
        }
    }

    pub fn singleton<T, F>(factory: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ServiceProvider) -> Arc<T> + Send + Sync + 'static,
    {
        Self::new(ServiceLifetime::Singleton, factory)
    }

    pub fn transient<T, F>(factory: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ServiceProvider) -> Arc<T> + Send + Sync + 'static,
    {
        Self::new(ServiceLifetime::Transient, factory)
    }

    /// Registers an existing instance as a singleton.
    pub fn instance<T>(instance: Arc<T>) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        Self::singleton::<T, _>(move |_| Arc::clone(&instance))
    }

    pub fn service_type(&self) -> TypeId {
        self.service_type
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn lifetime(&self) -> ServiceLifetime {
        self.lifetime
    }

    pub(crate) fn create(&self, provider: &ServiceProvider) -> BoxedService {
        (self.factory)(provider)
    }
}

impl fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("type_name", &self.type_name)
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

/// The pluggable container-building contract.
///
/// Implementations collect [`ServiceDescriptor`]s and produce an immutable
/// [`ServiceProvider`]. A failing `build` is a configuration-time fatal
/// condition for the route being composed.
pub trait ContainerBuilder: fmt::Debug + Send {
    fn add(&mut self, descriptor: ServiceDescriptor);

    fn build(self: Box<Self>) -> Result<Arc<ServiceProvider>>;
}

/// The stock [`ContainerBuilder`].
#[derive(Debug, Default)]
pub struct DefaultContainerBuilder {
    descriptors: Vec<ServiceDescriptor>,
}

impl DefaultContainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContainerBuilder for DefaultContainerBuilder {
    fn add(&mut self, descriptor: ServiceDescriptor) {
        self.descriptors.push(descriptor);
    }

    fn build(self: Box<Self>) -> Result<Arc<ServiceProvider>> {
        Ok(Arc::new(ServiceProvider::new(self.descriptors)))
    }
}

/// Typed facade over a boxed [`ContainerBuilder`], handed to route setup
/// callbacks so registrations stay ergonomic while the builder itself
/// remains pluggable.
#[derive(Debug)]
pub struct ServiceRegistry {
    builder: Box<dyn ContainerBuilder>,
}

impl ServiceRegistry {
    pub fn new(builder: Box<dyn ContainerBuilder>) -> Self {
        Self { builder }
    }

    pub fn add(&mut self, descriptor: ServiceDescriptor) -> &mut Self {
        self.builder.add(descriptor);
        self
    }

    pub fn add_singleton<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ServiceProvider) -> Arc<T> + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::singleton::<T, _>(factory))
    }

    pub fn add_transient<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ServiceProvider) -> Arc<T> + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::transient::<T, _>(factory))
    }

    pub fn add_instance<T>(&mut self, instance: Arc<T>) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::instance(instance))
    }

    pub fn build(self) -> Result<Arc<ServiceProvider>> {
        self.builder.build()
    }
}
