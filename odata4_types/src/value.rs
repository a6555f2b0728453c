//! Runtime value model consumed by the serializer strategies

use std::sync::Arc;

/// A primitive value and its raw textual form.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveValue {
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Double(f64),
    String(String),
}

impl PrimitiveValue {
    /// The bare scalar rendering used by raw-value responses.
    pub fn to_raw(&self) -> String {
        match self {
            Self::Boolean(v) => v.to_string(),
            Self::Int32(v) => v.to_string(),
            Self::Int64(v) => v.to_string(),
            Self::Double(v) => v.to_string(),
            Self::String(v) => v.clone(),
        }
    }
}

/// A structured value: an entity or complex instance with named properties.
///
/// Properties keep their production order. Properties not declared on the
/// value's schema type are dynamic and serialized by shape.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResourceValue {
    type_name: Option<Arc<str>>,
    properties: Vec<(Arc<str>, ODataValue)>,
}

impl ResourceValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn typed(type_name: impl Into<Arc<str>>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            properties: Vec::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<Arc<str>>, value: ODataValue) -> Self {
        self.properties.push((name.into(), value));
        self
    }

    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    pub fn properties(&self) -> &[(Arc<str>, ODataValue)] {
        &self.properties
    }
}

/// The closed value model handed to serialization.
#[derive(Debug, Clone, PartialEq)]
pub enum ODataValue {
    Null,
    Primitive(PrimitiveValue),
    Enum {
        type_name: Arc<str>,
        member: Arc<str>,
    },
    Resource(ResourceValue),
    Collection(Vec<ODataValue>),
}

impl ODataValue {
    pub fn string(value: impl Into<String>) -> Self {
        Self::Primitive(PrimitiveValue::String(value.into()))
    }

    pub fn int32(value: i32) -> Self {
        Self::Primitive(PrimitiveValue::Int32(value))
    }

    pub fn int64(value: i64) -> Self {
        Self::Primitive(PrimitiveValue::Int64(value))
    }

    pub fn boolean(value: bool) -> Self {
        Self::Primitive(PrimitiveValue::Boolean(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}
