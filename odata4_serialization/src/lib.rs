//! Serializer strategies and the dispatch engine that selects them
//!
//! The [`SerializerProvider`] owns one singleton strategy per payload shape
//! and answers two questions: which strategy serializes a resolved EDM type,
//! and which strategy serializes an outgoing payload given its
//! [`PayloadTarget`] classification and the request's negotiation signals.
//! Wire encoding stays behind the [`ODataWriter`] collaborator trait; this
//! crate decides *who* writes, not *how* bytes look.

use std::fmt;

use odata4_edm::{EdmModel, EdmTypeRef, ValueType};
use odata4_types::{
    EntityReferenceLink, EntityReferenceLinks, HttpApiError, ODataError, ODataValue,
    ServiceDocument,
};

mod provider;
mod serializers;
#[cfg(test)]
pub(crate) mod test_helpers;
mod writer;

pub use provider::{EdmResolverHandle, SerializerProvider};
pub use serializers::{
    CollectionSerializer, DeltaFeedSerializer, EnumSerializer, ErrorSerializer,
    LinkCollectionSerializer, LinkSerializer, MetadataSerializer, PrimitiveSerializer,
    RawValueSerializer, ResourceSerializer, ResourceSetSerializer, ServiceDocumentSerializer,
};
pub use writer::{ODataWriter, WriteContext, WriteError};

/// Identifies the payload shape a strategy handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    ServiceDocument,
    EntityReferenceLink,
    EntityReferenceLinks,
    Error,
    Metadata,
    RawValue,
    Primitive,
    Enum,
    Resource,
    ResourceSet,
    Delta,
    Collection,
}

/// The closed classification of a value produced for serialization.
///
/// Classification happens once, when the payload is produced; dispatch
/// afterwards is purely on the tag. The detection order is total and
/// first-match-wins: service document, single reference link, link
/// collection, error, metadata document, then a typed value resolved through
/// the model's type-mapping cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadTarget {
    ServiceDocument,
    EntityReferenceLink,
    EntityReferenceLinks,
    Error,
    Metadata,
    Value(ValueType),
}

impl PayloadTarget {
    /// Classifies a runtime value-type token.
    pub fn classify(value_type: &ValueType) -> Self {
        if let Some(id) = value_type.type_id() {
            if id == std::any::TypeId::of::<ServiceDocument>() {
                return Self::ServiceDocument;
            }
            if id == std::any::TypeId::of::<url::Url>()
                || id == std::any::TypeId::of::<EntityReferenceLink>()
            {
                return Self::EntityReferenceLink;
            }
            if id == std::any::TypeId::of::<EntityReferenceLinks>() {
                return Self::EntityReferenceLinks;
            }
            if id == std::any::TypeId::of::<ODataError>()
                || id == std::any::TypeId::of::<HttpApiError>()
            {
                return Self::Error;
            }
            if id == std::any::TypeId::of::<EdmModel>() {
                return Self::Metadata;
            }
        } else if let Some(element) = value_type.element() {
            // A sequence of links is itself a link collection; checked before
            // the typed fallthrough so it never resolves as a plain
            // collection.
            if !value_type.is_delta()
                && matches!(Self::classify(element), Self::EntityReferenceLink)
            {
                return Self::EntityReferenceLinks;
            }
        }

        Self::Value(value_type.clone())
    }

    /// Classifies the scalar runtime type `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::classify(&ValueType::of::<T>())
    }
}

/// A payload handed to a strategy: the [`PayloadTarget`] tag with the value
/// attached.
#[derive(Debug, Clone, Copy)]
pub enum Payload<'a> {
    ServiceDocument(&'a ServiceDocument),
    EntityReferenceLink(&'a EntityReferenceLink),
    EntityReferenceLinks(&'a EntityReferenceLinks),
    Error(&'a ODataError),
    Metadata(&'a EdmModel),
    Value {
        value: &'a ODataValue,
        edm_type: &'a EdmTypeRef,
    },
}

impl Payload<'_> {
    pub(crate) fn shape_name(&self) -> &'static str {
        match self {
            Self::ServiceDocument(_) => "service document",
            Self::EntityReferenceLink(_) => "entity reference link",
            Self::EntityReferenceLinks(_) => "entity reference link collection",
            Self::Error(_) => "error",
            Self::Metadata(_) => "metadata document",
            Self::Value { .. } => "typed value",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error(transparent)]
    Write(#[from] WriteError),
    #[error("serializer for {expected:?} payloads received a {actual} payload")]
    PayloadMismatch {
        expected: PayloadKind,
        actual: &'static str,
    },
    #[error("no serializer handles EDM type `{type_name}`")]
    NoElementSerializer { type_name: String },
    #[error("value does not match EDM type `{type_name}`")]
    ValueTypeMismatch { type_name: String },
    #[error("member `{member}` is not declared on enum type `{type_name}`")]
    UndeclaredEnumMember { type_name: String, member: String },
    #[error("serializer provider was released while one of its strategies was in use")]
    ProviderReleased,
}

pub type Result<T, E = SerializeError> = std::result::Result<T, E>;

/// A serialization strategy for one payload shape.
pub trait ODataSerializer: fmt::Debug + Send + Sync {
    fn payload_kind(&self) -> PayloadKind;

    /// Writes the payload through the wire writer. Handing a strategy a
    /// payload of the wrong shape is an invalid-operation error, never a
    /// panic.
    fn write_payload(
        &self,
        payload: &Payload<'_>,
        writer: &mut dyn ODataWriter,
        ctx: &WriteContext<'_>,
    ) -> Result<()>;
}

/// A strategy for values backed by an EDM type; these can be resolved
/// recursively for collection elements and structured properties.
pub trait EdmTypeSerializer: ODataSerializer {
    fn write_value(
        &self,
        value: &ODataValue,
        edm_type: &EdmTypeRef,
        writer: &mut dyn ODataWriter,
        ctx: &WriteContext<'_>,
    ) -> Result<()>;
}

pub(crate) fn payload_mismatch(expected: PayloadKind, payload: &Payload<'_>) -> SerializeError {
    SerializeError::PayloadMismatch {
        expected,
        actual: payload.shape_name(),
    }
}
