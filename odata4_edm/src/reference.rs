//! Schema type definitions and the [`EdmTypeRef`] handle

use std::sync::Arc;

/// The kind of a schema-level type, as seen by serializer dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdmTypeKind {
    None,
    Primitive,
    Enum,
    Complex,
    Entity,
    Collection,
    Untyped,
}

/// The closed set of primitive EDM types this core distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Boolean,
    Int32,
    Int64,
    Double,
    String,
    Date,
    DateTimeOffset,
    Guid,
}

impl PrimitiveKind {
    /// Resolves a qualified `Edm.*` name back to its kind. The primitive
    /// types are intrinsic to every model.
    pub fn from_full_name(name: &str) -> Option<Self> {
        match name {
            "Edm.Boolean" => Some(Self::Boolean),
            "Edm.Int32" => Some(Self::Int32),
            "Edm.Int64" => Some(Self::Int64),
            "Edm.Double" => Some(Self::Double),
            "Edm.String" => Some(Self::String),
            "Edm.Date" => Some(Self::Date),
            "Edm.DateTimeOffset" => Some(Self::DateTimeOffset),
            "Edm.Guid" => Some(Self::Guid),
            _ => None,
        }
    }

    /// The qualified EDM name, e.g. `Edm.Int32`.
    pub fn full_name(&self) -> &'static str {
        match self {
            Self::Boolean => "Edm.Boolean",
            Self::Int32 => "Edm.Int32",
            Self::Int64 => "Edm.Int64",
            Self::Double => "Edm.Double",
            Self::String => "Edm.String",
            Self::Date => "Edm.Date",
            Self::DateTimeOffset => "Edm.DateTimeOffset",
            Self::Guid => "Edm.Guid",
        }
    }
}

/// A declared property on a structured type.
#[derive(Debug, Clone)]
pub struct EdmProperty {
    name: Arc<str>,
    property_type: EdmTypeRef,
}

impl EdmProperty {
    pub fn new(name: impl Into<Arc<str>>, property_type: EdmTypeRef) -> Self {
        Self {
            name: name.into(),
            property_type,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn property_type(&self) -> &EdmTypeRef {
        &self.property_type
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StructuredKind {
    Complex,
    Entity,
}

/// A named complex or entity type with its declared properties.
///
/// Entity types may additionally declare the names of their key properties;
/// complex types have no key.
#[derive(Debug)]
pub struct EdmStructuredType {
    name: Arc<str>,
    kind: StructuredKind,
    properties: Vec<EdmProperty>,
    key: Vec<Arc<str>>,
}

impl EdmStructuredType {
    /// Creates an entity type with the given qualified name.
    pub fn entity(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            kind: StructuredKind::Entity,
            properties: Vec::new(),
            key: Vec::new(),
        }
    }

    /// Creates a complex type with the given qualified name.
    pub fn complex(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            kind: StructuredKind::Complex,
            properties: Vec::new(),
            key: Vec::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<Arc<str>>, property_type: EdmTypeRef) -> Self {
        self.properties.push(EdmProperty::new(name, property_type));
        self
    }

    /// Declares a key property by name. Only meaningful on entity types.
    pub fn with_key(mut self, name: impl Into<Arc<str>>) -> Self {
        self.key.push(name.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn name_arc(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    pub fn is_entity(&self) -> bool {
        self.kind == StructuredKind::Entity
    }

    pub fn properties(&self) -> &[EdmProperty] {
        &self.properties
    }

    /// Looks up a declared property by name.
    pub fn property(&self, name: &str) -> Option<&EdmProperty> {
        self.properties.iter().find(|p| p.name() == name)
    }

    pub fn key(&self) -> &[Arc<str>] {
        &self.key
    }
}

/// A named enum type and its members.
#[derive(Debug)]
pub struct EdmEnumType {
    name: Arc<str>,
    members: Vec<Arc<str>>,
}

impl EdmEnumType {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    pub fn with_member(mut self, member: impl Into<Arc<str>>) -> Self {
        self.members.push(member.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[Arc<str>] {
        &self.members
    }

    pub fn has_member(&self, member: &str) -> bool {
        self.members.iter().any(|m| m.as_ref() == member)
    }
}

#[derive(Debug)]
enum RefInner {
    Primitive(PrimitiveKind),
    Enum(Arc<EdmEnumType>),
    Structured(Arc<EdmStructuredType>),
    Collection { element: EdmTypeRef, delta: bool },
    Untyped,
}

/// An opaque, cheaply clonable handle to a schema-level type.
///
/// Collection references carry their element reference and a delta-feed
/// flag; everything the dispatcher needs is answered through the predicates
/// here without touching the owning model.
#[derive(Debug, Clone)]
pub struct EdmTypeRef {
    inner: Arc<RefInner>,
}

impl EdmTypeRef {
    pub fn primitive(kind: PrimitiveKind) -> Self {
        Self {
            inner: Arc::new(RefInner::Primitive(kind)),
        }
    }

    pub fn enumeration(definition: Arc<EdmEnumType>) -> Self {
        Self {
            inner: Arc::new(RefInner::Enum(definition)),
        }
    }

    /// A reference to a complex or entity type; the kind comes from the
    /// definition itself.
    pub fn structured(definition: Arc<EdmStructuredType>) -> Self {
        Self {
            inner: Arc::new(RefInner::Structured(definition)),
        }
    }

    pub fn collection_of(element: EdmTypeRef) -> Self {
        Self {
            inner: Arc::new(RefInner::Collection {
                element,
                delta: false,
            }),
        }
    }

    /// A collection reference flagged as a delta feed. The element may be of
    /// any kind, including entity types.
    pub fn delta_collection_of(element: EdmTypeRef) -> Self {
        Self {
            inner: Arc::new(RefInner::Collection {
                element,
                delta: true,
            }),
        }
    }

    pub fn untyped() -> Self {
        Self {
            inner: Arc::new(RefInner::Untyped),
        }
    }

    pub fn kind(&self) -> EdmTypeKind {
        match self.inner.as_ref() {
            RefInner::Primitive(_) => EdmTypeKind::Primitive,
            RefInner::Enum(_) => EdmTypeKind::Enum,
            RefInner::Structured(def) if def.is_entity() => EdmTypeKind::Entity,
            RefInner::Structured(_) => EdmTypeKind::Complex,
            RefInner::Collection { .. } => EdmTypeKind::Collection,
            RefInner::Untyped => EdmTypeKind::Untyped,
        }
    }

    pub fn is_primitive(&self) -> bool {
        self.kind() == EdmTypeKind::Primitive
    }

    pub fn is_enum(&self) -> bool {
        self.kind() == EdmTypeKind::Enum
    }

    pub fn is_entity(&self) -> bool {
        self.kind() == EdmTypeKind::Entity
    }

    pub fn is_complex(&self) -> bool {
        self.kind() == EdmTypeKind::Complex
    }

    pub fn is_collection(&self) -> bool {
        self.kind() == EdmTypeKind::Collection
    }

    /// Whether this reference is a collection flagged as a delta feed.
    /// `false` for non-collections.
    pub fn is_delta_feed(&self) -> bool {
        matches!(self.inner.as_ref(), RefInner::Collection { delta: true, .. })
    }

    /// The element reference of a collection, `None` otherwise.
    pub fn element_type(&self) -> Option<&EdmTypeRef> {
        match self.inner.as_ref() {
            RefInner::Collection { element, .. } => Some(element),
            _ => None,
        }
    }

    /// The structured definition backing a complex or entity reference.
    pub fn structured_def(&self) -> Option<&Arc<EdmStructuredType>> {
        match self.inner.as_ref() {
            RefInner::Structured(def) => Some(def),
            _ => None,
        }
    }

    /// The enum definition backing an enum reference.
    pub fn enum_def(&self) -> Option<&Arc<EdmEnumType>> {
        match self.inner.as_ref() {
            RefInner::Enum(def) => Some(def),
            _ => None,
        }
    }

    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self.inner.as_ref() {
            RefInner::Primitive(kind) => Some(*kind),
            _ => None,
        }
    }

    /// The qualified name, e.g. `Edm.Int32`, `NS.Customer` or
    /// `Collection(NS.Customer)`.
    pub fn full_name(&self) -> String {
        match self.inner.as_ref() {
            RefInner::Primitive(kind) => kind.full_name().to_string(),
            RefInner::Enum(def) => def.name().to_string(),
            RefInner::Structured(def) => def.name().to_string(),
            RefInner::Collection { element, .. } => format!("Collection({})", element.full_name()),
            RefInner::Untyped => "Edm.Untyped".to_string(),
        }
    }
}

impl PartialEq for EdmTypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind()
            && self.is_delta_feed() == other.is_delta_feed()
            && self.full_name() == other.full_name()
    }
}

impl Eq for EdmTypeRef {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_ref_carries_element_and_delta_flag() {
        let element = EdmTypeRef::primitive(PrimitiveKind::Int32);
        let plain = EdmTypeRef::collection_of(element.clone());
        let delta = EdmTypeRef::delta_collection_of(element.clone());

        assert_eq!(plain.kind(), EdmTypeKind::Collection);
        assert!(!plain.is_delta_feed());
        assert!(delta.is_delta_feed());
        assert_eq!(plain.element_type(), Some(&element));
        assert_eq!(plain.full_name(), "Collection(Edm.Int32)");
        assert_ne!(plain, delta);
    }

    #[test]
    fn structured_kind_comes_from_definition() {
        let entity = Arc::new(EdmStructuredType::entity("NS.Customer").with_key("id"));
        let complex = Arc::new(EdmStructuredType::complex("NS.Address"));

        assert_eq!(
            EdmTypeRef::structured(entity).kind(),
            EdmTypeKind::Entity
        );
        assert_eq!(
            EdmTypeRef::structured(complex).kind(),
            EdmTypeKind::Complex
        );
    }

    #[test]
    fn equal_refs_compare_representationally() {
        let a = EdmTypeRef::collection_of(EdmTypeRef::primitive(PrimitiveKind::String));
        let b = EdmTypeRef::collection_of(EdmTypeRef::primitive(PrimitiveKind::String));
        assert_eq!(a, b);
    }
}
