//! Memoized runtime-type to EDM-type resolution

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tracing::trace;

use crate::model::EdmModel;
use crate::reference::EdmTypeRef;
use crate::value_type::ValueType;

/// Memoizes the mapping from a [`ValueType`] token to its [`EdmTypeRef`]
/// within one model.
///
/// Both successful and failed resolutions are cached, so repeated lookups of
/// the same token never traverse the model again. Entries are published
/// whole; when two threads race on a first-time resolution the computation
/// runs redundantly and the last insert wins, which is harmless because the
/// model is immutable and both threads compute the same mapping.
#[derive(Debug, Default)]
pub struct TypeMappingCache {
    map: DashMap<ValueType, Option<EdmTypeRef>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TypeMappingCache {
    /// Resolves the EDM type reference for `value_type`, or `None` when the
    /// model has no mapping for it. A `None` is a reportable no-serializer
    /// outcome for callers, not a failure.
    pub fn edm_type(&self, value_type: &ValueType, model: &EdmModel) -> Option<EdmTypeRef> {
        if let Some(entry) = self.map.get(value_type) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return entry.value().clone();
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let resolved = self.resolve(value_type, model);
        trace!(
            value_type = %value_type.describe(),
            resolved = ?resolved.as_ref().map(|r| r.full_name()),
            "computed EDM type mapping"
        );
        self.map.insert(value_type.clone(), resolved.clone());
        resolved
    }

    fn resolve(&self, value_type: &ValueType, model: &EdmModel) -> Option<EdmTypeRef> {
        if let Some(element) = value_type.element() {
            let element_type = self.edm_type(element, model)?;
            return Some(if value_type.is_delta() {
                EdmTypeRef::delta_collection_of(element_type)
            } else {
                EdmTypeRef::collection_of(element_type)
            });
        }

        let id = value_type.type_id()?;
        let name = model.binding(id)?;
        model.find_type(name)
    }

    /// Number of lookups answered from the cache.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Number of lookups that required a model traversal.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }
}
