//! Runtime value-type tokens used as type-mapping cache keys

use std::any::{TypeId, type_name};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ValueShape {
    Scalar { id: TypeId, name: &'static str },
    Sequence(Box<ValueType>),
    Delta(Box<ValueType>),
}

/// A closed token describing the runtime shape of a value handed to the
/// serializer pipeline.
///
/// Scalars are identified by their `TypeId`; sequences and delta sets carry
/// their element token explicitly instead of relying on runtime inspection of
/// the container type. Tokens are the keys of the per-model
/// [`TypeMappingCache`](crate::TypeMappingCache).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValueType {
    shape: ValueShape,
}

impl ValueType {
    /// The token for a scalar runtime type.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            shape: ValueShape::Scalar {
                id: TypeId::of::<T>(),
                name: type_name::<T>(),
            },
        }
    }

    /// The token for a sequence of `element` values.
    pub fn sequence(element: ValueType) -> Self {
        Self {
            shape: ValueShape::Sequence(Box::new(element)),
        }
    }

    /// The token for a delta set of `element` values, mapped to a
    /// delta-flagged collection reference.
    pub fn delta(element: ValueType) -> Self {
        Self {
            shape: ValueShape::Delta(Box::new(element)),
        }
    }

    /// The `TypeId` of a scalar token, `None` for sequences and delta sets.
    pub fn type_id(&self) -> Option<TypeId> {
        match &self.shape {
            ValueShape::Scalar { id, .. } => Some(*id),
            _ => None,
        }
    }

    /// The element token of a sequence or delta set.
    pub fn element(&self) -> Option<&ValueType> {
        match &self.shape {
            ValueShape::Sequence(element) | ValueShape::Delta(element) => Some(element),
            ValueShape::Scalar { .. } => None,
        }
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self.shape, ValueShape::Sequence(_))
    }

    pub fn is_delta(&self) -> bool {
        matches!(self.shape, ValueShape::Delta(_))
    }

    /// A diagnostic rendering of the token.
    pub fn describe(&self) -> String {
        match &self.shape {
            ValueShape::Scalar { name, .. } => (*name).to_string(),
            ValueShape::Sequence(element) => format!("sequence of {}", element.describe()),
            ValueShape::Delta(element) => format!("delta of {}", element.describe()),
        }
    }
}
