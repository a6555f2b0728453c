//! The Entity Data Model (EDM) type system used for payload dispatch
//!
//! This crate holds the schema-level half of the serializer pipeline: the
//! [`EdmModel`] describes entity, complex, enum and primitive types reachable
//! by name, [`EdmTypeRef`] is the cheap handle the dispatcher branches on,
//! and the [`TypeMappingCache`] memoizes the mapping from runtime
//! [`ValueType`] tokens to their EDM counterparts for the lifetime of the
//! model.

mod model;
mod reference;
mod type_cache;
mod value_type;

pub use model::{EdmEntitySet, EdmModel};
pub use reference::{
    EdmEnumType, EdmProperty, EdmStructuredType, EdmTypeKind, EdmTypeRef, PrimitiveKind,
};
pub use type_cache::TypeMappingCache;
pub use value_type::ValueType;
