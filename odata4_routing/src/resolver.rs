//! URI-resolution policy and the settings that carry it

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use odata4_edm::{EdmEntitySet, EdmModel};

/// How entity keys appear in request URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlConventions {
    /// Keys in parentheses: `Customers(1)`.
    Parentheses,
    /// Keys as their own path segment: `Customers/1`. Parenthesized keys
    /// remain accepted.
    KeyAsSegment,
}

/// Name-matching policy applied while parsing request paths.
pub trait UriResolver: fmt::Debug + Send + Sync {
    /// Whether schema-element name matching ignores ASCII case.
    fn case_insensitive(&self) -> bool {
        false
    }

    /// Resolves an entity set by name under this resolver's matching rules.
    fn resolve_entity_set(&self, model: &EdmModel, name: &str) -> Option<Arc<EdmEntitySet>> {
        if self.case_insensitive() {
            model
                .entity_sets()
                .find(|set| set.name().eq_ignore_ascii_case(name))
                .map(Arc::clone)
        } else {
            model.entity_set(name)
        }
    }
}

/// The stock resolver: exact-case matching.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultUriResolver;

impl UriResolver for DefaultUriResolver {}

/// A resolver that matches schema-element names case-insensitively.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaseInsensitiveResolver;

impl UriResolver for CaseInsensitiveResolver {
    fn case_insensitive(&self) -> bool {
        true
    }
}

/// A pair of independently settable URI-resolution policies: the resolver
/// itself and the URL key conventions.
///
/// One instance lives on the configuration as the global fallback; path
/// handlers that support resolution carry their own instance, and route
/// composition copies each unset field from the global settings
/// independently.
#[derive(Debug, Default)]
pub struct UriResolverSettings {
    uri_resolver: RwLock<Option<Arc<dyn UriResolver>>>,
    url_conventions: RwLock<Option<UrlConventions>>,
}

impl UriResolverSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uri_resolver(&self) -> Option<Arc<dyn UriResolver>> {
        self.uri_resolver.read().clone()
    }

    /// Sets the resolver. There is no null resolver; clearing is not
    /// supported on this field.
    pub fn set_uri_resolver(&self, resolver: Arc<dyn UriResolver>) {
        *self.uri_resolver.write() = Some(resolver);
    }

    pub fn url_conventions(&self) -> Option<UrlConventions> {
        *self.url_conventions.read()
    }

    /// Sets the URL conventions; `None` clears the setting.
    pub fn set_url_conventions(&self, conventions: Option<UrlConventions>) {
        *self.url_conventions.write() = conventions;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use odata4_edm::EdmStructuredType;

    fn model() -> EdmModel {
        let mut model = EdmModel::new();
        let customer = model.add_structured_type(EdmStructuredType::entity("NS.Customer"));
        model.add_entity_set("Customers", customer);
        model
    }

    #[test]
    fn default_resolver_matches_exact_case_only() {
        let model = model();
        assert!(DefaultUriResolver.resolve_entity_set(&model, "Customers").is_some());
        assert!(DefaultUriResolver.resolve_entity_set(&model, "customers").is_none());
    }

    #[test]
    fn case_insensitive_resolver_ignores_case() {
        let model = model();
        assert!(
            CaseInsensitiveResolver
                .resolve_entity_set(&model, "CUSTOMERS")
                .is_some()
        );
    }

    #[test]
    fn url_conventions_can_be_cleared() {
        let settings = UriResolverSettings::new();
        settings.set_url_conventions(Some(UrlConventions::KeyAsSegment));
        assert_eq!(settings.url_conventions(), Some(UrlConventions::KeyAsSegment));
        settings.set_url_conventions(None);
        assert_eq!(settings.url_conventions(), None);
    }
}
