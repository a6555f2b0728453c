//! In-memory EDM model

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::OnceLock;

use crate::reference::{EdmEnumType, EdmStructuredType, EdmTypeRef, PrimitiveKind};
use crate::type_cache::TypeMappingCache;

/// A named set of entities, bound to its element entity type.
#[derive(Debug)]
pub struct EdmEntitySet {
    name: Arc<str>,
    entity_type: Arc<EdmStructuredType>,
}

impl EdmEntitySet {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entity_type(&self) -> &Arc<EdmStructuredType> {
        &self.entity_type
    }

    /// The element type reference for payloads drawn from this set.
    pub fn element_type(&self) -> EdmTypeRef {
        EdmTypeRef::structured(Arc::clone(&self.entity_type))
    }
}

/// An immutable, pre-built graph of schema types reachable by name.
///
/// The model owns a single [`TypeMappingCache`], created lazily on first use
/// and living exactly as long as the model. Construction happens up front
/// through the `add_*`/`bind_*` methods; once the model is shared behind an
/// `Arc` it no longer changes.
#[derive(Debug, Default)]
pub struct EdmModel {
    schema_types: HashMap<Arc<str>, EdmTypeRef>,
    entity_sets: HashMap<Arc<str>, Arc<EdmEntitySet>>,
    bindings: HashMap<TypeId, Arc<str>>,
    type_cache: OnceLock<TypeMappingCache>,
}

impl EdmModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entity or complex type under its qualified name and
    /// returns the shared definition.
    pub fn add_structured_type(&mut self, definition: EdmStructuredType) -> Arc<EdmStructuredType> {
        let definition = Arc::new(definition);
        self.schema_types.insert(
            definition.name_arc(),
            EdmTypeRef::structured(Arc::clone(&definition)),
        );
        definition
    }

    /// Registers an enum type under its qualified name.
    pub fn add_enum_type(&mut self, definition: EdmEnumType) -> Arc<EdmEnumType> {
        let definition = Arc::new(definition);
        self.schema_types.insert(
            Arc::from(definition.name()),
            EdmTypeRef::enumeration(Arc::clone(&definition)),
        );
        definition
    }

    /// Declares an entity set over a previously added entity type.
    pub fn add_entity_set(
        &mut self,
        name: impl Into<Arc<str>>,
        entity_type: Arc<EdmStructuredType>,
    ) -> Arc<EdmEntitySet> {
        let set = Arc::new(EdmEntitySet {
            name: name.into(),
            entity_type,
        });
        self.entity_sets.insert(Arc::clone(&set.name), Arc::clone(&set));
        set
    }

    /// Binds a scalar runtime type to the schema type with the given
    /// qualified name. The binding is what first-time cache resolution
    /// traverses.
    pub fn bind_value_type<T: 'static>(&mut self, schema_type_name: impl Into<Arc<str>>) {
        self.bindings
            .insert(TypeId::of::<T>(), schema_type_name.into());
    }

    /// Looks up a schema type reference by qualified name. The `Edm.*`
    /// primitive types are intrinsic and resolve without registration.
    pub fn find_type(&self, name: &str) -> Option<EdmTypeRef> {
        if let Some(found) = self.schema_types.get(name) {
            return Some(found.clone());
        }
        PrimitiveKind::from_full_name(name).map(EdmTypeRef::primitive)
    }

    /// Looks up an entity set by exact name.
    pub fn entity_set(&self, name: &str) -> Option<Arc<EdmEntitySet>> {
        self.entity_sets.get(name).map(Arc::clone)
    }

    /// All entity sets, in no particular order.
    pub fn entity_sets(&self) -> impl Iterator<Item = &Arc<EdmEntitySet>> {
        self.entity_sets.values()
    }

    pub(crate) fn binding(&self, id: TypeId) -> Option<&Arc<str>> {
        self.bindings.get(&id)
    }

    /// The type-mapping cache attached to this model, created on first use.
    pub fn type_mapping_cache(&self) -> &TypeMappingCache {
        self.type_cache.get_or_init(TypeMappingCache::default)
    }
}
