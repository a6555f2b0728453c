//! Resolution side of the service container

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::{BoxedService, ContainerError, Result, ServiceDescriptor, ServiceLifetime};

struct ServiceEntry {
    descriptor: ServiceDescriptor,
    singleton: OnceLock<BoxedService>,
}

/// An isolated, immutable set of registered services.
///
/// Resolution is by service type: [`get`](Self::get) returns the most
/// recently registered service of that type (so caller registrations made
/// after the defaults override them), [`get_all`](Self::get_all) returns
/// every registration in order.
pub struct ServiceProvider {
    entries: HashMap<TypeId, Vec<ServiceEntry>>,
}

impl ServiceProvider {
    pub(crate) fn new(descriptors: Vec<ServiceDescriptor>) -> Self {
        let mut entries: HashMap<TypeId, Vec<ServiceEntry>> = HashMap::new();
        for descriptor in descriptors {
            entries
                .entry(descriptor.service_type())
                .or_default()
                .push(ServiceEntry {
                    descriptor,
                    singleton: OnceLock::new(),
                });
        }
        Self { entries }
    }

    fn resolve<T>(&self, entry: &ServiceEntry) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        match entry.descriptor.lifetime() {
            ServiceLifetime::Singleton => {
                let boxed = entry
                    .singleton
                    .get_or_init(|| entry.descriptor.create(self));
                boxed.downcast_ref::<Arc<T>>().map(Arc::clone)
            }
            ServiceLifetime::Transient => entry
                .descriptor
                .create(self)
                .downcast::<Arc<T>>()
                .ok()
                .map(|boxed| *boxed),
        }
    }

    /// Resolves the service of type `T`, or `None` when nothing of that type
    /// is registered. The last registration wins.
    pub fn get<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|entries| entries.last())
            .and_then(|entry| self.resolve(entry))
    }

    /// Resolves a required service; a missing registration is an
    /// invalid-operation failure for the caller.
    pub fn get_required<T>(&self) -> Result<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.get::<T>().ok_or(ContainerError::MissingService {
            type_name: std::any::type_name::<T>(),
        })
    }

    /// Resolves every registered service of type `T`, in registration order.
    pub fn get_all<T>(&self) -> Vec<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.entries
            .get(&TypeId::of::<T>())
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| self.resolve(entry))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of distinct service types registered.
    pub fn service_type_count(&self) -> usize {
        self.entries.len()
    }
}

impl fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self
            .entries
            .values()
            .flatten()
            .map(|entry| entry.descriptor.type_name())
            .collect();
        names.sort_unstable();
        f.debug_struct("ServiceProvider")
            .field("services", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{DefaultContainerBuilder, ServiceRegistry};

    trait Greeter: std::fmt::Debug + Send + Sync {
        fn greet(&self) -> &'static str;
    }

    #[derive(Debug)]
    struct English;

    impl Greeter for English {
        fn greet(&self) -> &'static str {
            "hello"
        }
    }

    #[derive(Debug)]
    struct French;

    impl Greeter for French {
        fn greet(&self) -> &'static str {
            "bonjour"
        }
    }

    fn registry() -> ServiceRegistry {
        ServiceRegistry::new(Box::new(DefaultContainerBuilder::new()))
    }

    #[test]
    fn singleton_resolves_to_the_same_instance() {
        let mut registry = registry();
        registry.add_singleton::<String, _>(|_| Arc::new("config".to_string()));
        let provider = registry.build().unwrap();

        let first = provider.get::<String>().unwrap();
        let second = provider.get::<String>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn transient_runs_the_factory_per_resolution() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);

        let mut registry = registry();
        registry.add_transient::<usize, _>(|_| {
            Arc::new(CALLS.fetch_add(1, Ordering::SeqCst))
        });
        let provider = registry.build().unwrap();

        let first = provider.get::<usize>().unwrap();
        let second = provider.get::<usize>().unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn last_registration_wins_and_get_all_keeps_order() {
        let mut registry = registry();
        registry
            .add_singleton::<dyn Greeter, _>(|_| Arc::new(English))
            .add_singleton::<dyn Greeter, _>(|_| Arc::new(French));
        let provider = registry.build().unwrap();

        assert_eq!(provider.get::<dyn Greeter>().unwrap().greet(), "bonjour");
        let all: Vec<_> = provider
            .get_all::<dyn Greeter>()
            .iter()
            .map(|g| g.greet())
            .collect();
        assert_eq!(all, vec!["hello", "bonjour"]);
    }

    #[test]
    fn missing_required_service_reports_the_type_name() {
        let provider = registry().build().unwrap();
        let err = provider.get_required::<dyn Greeter>().unwrap_err();
        assert!(err.to_string().contains("Greeter"));
    }

    #[test]
    fn factories_can_resolve_other_services() {
        let mut registry = registry();
        registry
            .add_singleton::<String, _>(|_| Arc::new("base".to_string()))
            .add_singleton::<Vec<String>, _>(|provider| {
                let base = provider.get_required::<String>().unwrap();
                Arc::new(vec![base.as_ref().clone(), "derived".to_string()])
            });
        let provider = registry.build().unwrap();

        assert_eq!(
            provider.get::<Vec<String>>().unwrap().as_slice(),
            ["base".to_string(), "derived".to_string()]
        );
    }
}
