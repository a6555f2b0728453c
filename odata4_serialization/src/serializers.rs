//! The serialization strategies, one per payload shape
//!
//! Strategies are stateless singletons owned by a
//! [`SerializerProvider`](crate::SerializerProvider). The element-dependent
//! ones (resource, resource set, delta feed, collection) hold a non-owning
//! [`EdmResolverHandle`](crate::EdmResolverHandle) back to their provider so
//! they can resolve nested element and property serializers.

use odata4_types::ODataValue;

use crate::provider::EdmResolverHandle;
use crate::writer::{ODataWriter, WriteContext};
use crate::{EdmTypeSerializer, ODataSerializer, Payload, PayloadKind, Result, SerializeError};
use odata4_edm::EdmTypeRef;

use crate::payload_mismatch;

/// Serializes the service document.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceDocumentSerializer;

impl ODataSerializer for ServiceDocumentSerializer {
    fn payload_kind(&self) -> PayloadKind {
        PayloadKind::ServiceDocument
    }

    fn write_payload(
        &self,
        payload: &Payload<'_>,
        writer: &mut dyn ODataWriter,
        _ctx: &WriteContext<'_>,
    ) -> Result<()> {
        match payload {
            Payload::ServiceDocument(document) => Ok(writer.service_document(document)?),
            other => Err(payload_mismatch(self.payload_kind(), other)),
        }
    }
}

/// Serializes a single entity reference link.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkSerializer;

impl ODataSerializer for LinkSerializer {
    fn payload_kind(&self) -> PayloadKind {
        PayloadKind::EntityReferenceLink
    }

    fn write_payload(
        &self,
        payload: &Payload<'_>,
        writer: &mut dyn ODataWriter,
        _ctx: &WriteContext<'_>,
    ) -> Result<()> {
        match payload {
            Payload::EntityReferenceLink(link) => Ok(writer.entity_reference_link(link)?),
            other => Err(payload_mismatch(self.payload_kind(), other)),
        }
    }
}

/// Serializes a collection of entity reference links.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkCollectionSerializer;

impl ODataSerializer for LinkCollectionSerializer {
    fn payload_kind(&self) -> PayloadKind {
        PayloadKind::EntityReferenceLinks
    }

    fn write_payload(
        &self,
        payload: &Payload<'_>,
        writer: &mut dyn ODataWriter,
        _ctx: &WriteContext<'_>,
    ) -> Result<()> {
        match payload {
            Payload::EntityReferenceLinks(links) => Ok(writer.entity_reference_links(links)?),
            other => Err(payload_mismatch(self.payload_kind(), other)),
        }
    }
}

/// Serializes OData and generic HTTP errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorSerializer;

impl ODataSerializer for ErrorSerializer {
    fn payload_kind(&self) -> PayloadKind {
        PayloadKind::Error
    }

    fn write_payload(
        &self,
        payload: &Payload<'_>,
        writer: &mut dyn ODataWriter,
        _ctx: &WriteContext<'_>,
    ) -> Result<()> {
        match payload {
            Payload::Error(error) => Ok(writer.error(error)?),
            other => Err(payload_mismatch(self.payload_kind(), other)),
        }
    }
}

/// Serializes the metadata document for a model.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataSerializer;

impl ODataSerializer for MetadataSerializer {
    fn payload_kind(&self) -> PayloadKind {
        PayloadKind::Metadata
    }

    fn write_payload(
        &self,
        payload: &Payload<'_>,
        writer: &mut dyn ODataWriter,
        _ctx: &WriteContext<'_>,
    ) -> Result<()> {
        match payload {
            Payload::Metadata(model) => Ok(writer.metadata_document(model)?),
            other => Err(payload_mismatch(self.payload_kind(), other)),
        }
    }
}

/// Serializes the bare scalar form of a primitive or enum value; also the
/// strategy behind count responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawValueSerializer;

impl ODataSerializer for RawValueSerializer {
    fn payload_kind(&self) -> PayloadKind {
        PayloadKind::RawValue
    }

    fn write_payload(
        &self,
        payload: &Payload<'_>,
        writer: &mut dyn ODataWriter,
        _ctx: &WriteContext<'_>,
    ) -> Result<()> {
        let Payload::Value { value, edm_type } = payload else {
            return Err(payload_mismatch(self.payload_kind(), payload));
        };
        match value {
            ODataValue::Primitive(primitive) => Ok(writer.raw_value(&primitive.to_raw())?),
            ODataValue::Enum { member, .. } => Ok(writer.raw_value(member)?),
            _ => Err(SerializeError::ValueTypeMismatch {
                type_name: edm_type.full_name(),
            }),
        }
    }
}

/// Serializes primitive values.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrimitiveSerializer;

impl ODataSerializer for PrimitiveSerializer {
    fn payload_kind(&self) -> PayloadKind {
        PayloadKind::Primitive
    }

    fn write_payload(
        &self,
        payload: &Payload<'_>,
        writer: &mut dyn ODataWriter,
        ctx: &WriteContext<'_>,
    ) -> Result<()> {
        match payload {
            Payload::Value { value, edm_type } => self.write_value(value, edm_type, writer, ctx),
            other => Err(payload_mismatch(self.payload_kind(), other)),
        }
    }
}

impl EdmTypeSerializer for PrimitiveSerializer {
    fn write_value(
        &self,
        value: &ODataValue,
        edm_type: &EdmTypeRef,
        writer: &mut dyn ODataWriter,
        _ctx: &WriteContext<'_>,
    ) -> Result<()> {
        match value {
            ODataValue::Primitive(primitive) => Ok(writer.primitive(primitive)?),
            ODataValue::Null => Ok(writer.null()?),
            _ => Err(SerializeError::ValueTypeMismatch {
                type_name: edm_type.full_name(),
            }),
        }
    }
}

/// Serializes enum values, validating the member against the declared enum
/// type when the reference carries one.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnumSerializer;

impl ODataSerializer for EnumSerializer {
    fn payload_kind(&self) -> PayloadKind {
        PayloadKind::Enum
    }

    fn write_payload(
        &self,
        payload: &Payload<'_>,
        writer: &mut dyn ODataWriter,
        ctx: &WriteContext<'_>,
    ) -> Result<()> {
        match payload {
            Payload::Value { value, edm_type } => self.write_value(value, edm_type, writer, ctx),
            other => Err(payload_mismatch(self.payload_kind(), other)),
        }
    }
}

impl EdmTypeSerializer for EnumSerializer {
    fn write_value(
        &self,
        value: &ODataValue,
        edm_type: &EdmTypeRef,
        writer: &mut dyn ODataWriter,
        _ctx: &WriteContext<'_>,
    ) -> Result<()> {
        match value {
            ODataValue::Enum { type_name, member } => {
                if let Some(definition) = edm_type.enum_def() {
                    if !definition.has_member(member) {
                        return Err(SerializeError::UndeclaredEnumMember {
                            type_name: definition.name().to_string(),
                            member: member.to_string(),
                        });
                    }
                }
                Ok(writer.enum_value(type_name, member)?)
            }
            ODataValue::Null => Ok(writer.null()?),
            _ => Err(SerializeError::ValueTypeMismatch {
                type_name: edm_type.full_name(),
            }),
        }
    }
}

/// Serializes an entity or complex resource, resolving property serializers
/// through the owning provider.
#[derive(Debug)]
pub struct ResourceSerializer {
    resolver: EdmResolverHandle,
}

impl ResourceSerializer {
    pub(crate) fn new(resolver: EdmResolverHandle) -> Self {
        Self { resolver }
    }
}

impl ODataSerializer for ResourceSerializer {
    fn payload_kind(&self) -> PayloadKind {
        PayloadKind::Resource
    }

    fn write_payload(
        &self,
        payload: &Payload<'_>,
        writer: &mut dyn ODataWriter,
        ctx: &WriteContext<'_>,
    ) -> Result<()> {
        match payload {
            Payload::Value { value, edm_type } => self.write_value(value, edm_type, writer, ctx),
            other => Err(payload_mismatch(self.payload_kind(), other)),
        }
    }
}

impl EdmTypeSerializer for ResourceSerializer {
    fn write_value(
        &self,
        value: &ODataValue,
        edm_type: &EdmTypeRef,
        writer: &mut dyn ODataWriter,
        ctx: &WriteContext<'_>,
    ) -> Result<()> {
        let resource = match value {
            ODataValue::Resource(resource) => resource,
            ODataValue::Null => return Ok(writer.null()?),
            _ => {
                return Err(SerializeError::ValueTypeMismatch {
                    type_name: edm_type.full_name(),
                });
            }
        };
        let Some(definition) = edm_type.structured_def() else {
            return Err(SerializeError::ValueTypeMismatch {
                type_name: edm_type.full_name(),
            });
        };

        writer.start_resource(resource.type_name().or(Some(definition.name())))?;
        for (name, property_value) in resource.properties() {
            match definition.property(name) {
                Some(declared) => {
                    writer.property(name)?;
                    let serializer = self.resolver.resolve(declared.property_type())?;
                    serializer.write_value(property_value, declared.property_type(), writer, ctx)?;
                }
                None => {
                    // Dynamic property: no declared type, serialized by shape.
                    if property_value.is_null() && !ctx.serialize_null_dynamic() {
                        continue;
                    }
                    writer.property(name)?;
                    write_dynamic(property_value, writer, ctx)?;
                }
            }
        }
        Ok(writer.end_resource()?)
    }
}

/// Serializes a resource set (feed) of entity or complex elements.
#[derive(Debug)]
pub struct ResourceSetSerializer {
    resolver: EdmResolverHandle,
}

impl ResourceSetSerializer {
    pub(crate) fn new(resolver: EdmResolverHandle) -> Self {
        Self { resolver }
    }
}

impl ODataSerializer for ResourceSetSerializer {
    fn payload_kind(&self) -> PayloadKind {
        PayloadKind::ResourceSet
    }

    fn write_payload(
        &self,
        payload: &Payload<'_>,
        writer: &mut dyn ODataWriter,
        ctx: &WriteContext<'_>,
    ) -> Result<()> {
        match payload {
            Payload::Value { value, edm_type } => self.write_value(value, edm_type, writer, ctx),
            other => Err(payload_mismatch(self.payload_kind(), other)),
        }
    }
}

impl EdmTypeSerializer for ResourceSetSerializer {
    fn write_value(
        &self,
        value: &ODataValue,
        edm_type: &EdmTypeRef,
        writer: &mut dyn ODataWriter,
        ctx: &WriteContext<'_>,
    ) -> Result<()> {
        let (items, element_type) = collection_parts(value, edm_type)?;
        let element_serializer = self.resolver.resolve(element_type)?;

        writer.start_resource_set(None)?;
        for item in items {
            element_serializer.write_value(item, element_type, writer, ctx)?;
        }
        Ok(writer.end_resource_set()?)
    }
}

/// Serializes a delta feed: incremental changes to a prior resource set.
#[derive(Debug)]
pub struct DeltaFeedSerializer {
    resolver: EdmResolverHandle,
}

impl DeltaFeedSerializer {
    pub(crate) fn new(resolver: EdmResolverHandle) -> Self {
        Self { resolver }
    }
}

impl ODataSerializer for DeltaFeedSerializer {
    fn payload_kind(&self) -> PayloadKind {
        PayloadKind::Delta
    }

    fn write_payload(
        &self,
        payload: &Payload<'_>,
        writer: &mut dyn ODataWriter,
        ctx: &WriteContext<'_>,
    ) -> Result<()> {
        match payload {
            Payload::Value { value, edm_type } => self.write_value(value, edm_type, writer, ctx),
            other => Err(payload_mismatch(self.payload_kind(), other)),
        }
    }
}

impl EdmTypeSerializer for DeltaFeedSerializer {
    fn write_value(
        &self,
        value: &ODataValue,
        edm_type: &EdmTypeRef,
        writer: &mut dyn ODataWriter,
        ctx: &WriteContext<'_>,
    ) -> Result<()> {
        let (items, element_type) = collection_parts(value, edm_type)?;
        let element_serializer = self.resolver.resolve(element_type)?;

        writer.start_delta_feed()?;
        for item in items {
            element_serializer.write_value(item, element_type, writer, ctx)?;
        }
        Ok(writer.end_delta_feed()?)
    }
}

/// Serializes a collection of non-entity, non-complex elements.
#[derive(Debug)]
pub struct CollectionSerializer {
    resolver: EdmResolverHandle,
}

impl CollectionSerializer {
    pub(crate) fn new(resolver: EdmResolverHandle) -> Self {
        Self { resolver }
    }
}

impl ODataSerializer for CollectionSerializer {
    fn payload_kind(&self) -> PayloadKind {
        PayloadKind::Collection
    }

    fn write_payload(
        &self,
        payload: &Payload<'_>,
        writer: &mut dyn ODataWriter,
        ctx: &WriteContext<'_>,
    ) -> Result<()> {
        match payload {
            Payload::Value { value, edm_type } => self.write_value(value, edm_type, writer, ctx),
            other => Err(payload_mismatch(self.payload_kind(), other)),
        }
    }
}

impl EdmTypeSerializer for CollectionSerializer {
    fn write_value(
        &self,
        value: &ODataValue,
        edm_type: &EdmTypeRef,
        writer: &mut dyn ODataWriter,
        ctx: &WriteContext<'_>,
    ) -> Result<()> {
        let (items, element_type) = collection_parts(value, edm_type)?;
        let element_serializer = self.resolver.resolve(element_type)?;

        writer.start_collection()?;
        for item in items {
            element_serializer.write_value(item, element_type, writer, ctx)?;
        }
        Ok(writer.end_collection()?)
    }
}

fn collection_parts<'a>(
    value: &'a ODataValue,
    edm_type: &'a EdmTypeRef,
) -> Result<(&'a [ODataValue], &'a EdmTypeRef)> {
    let ODataValue::Collection(items) = value else {
        return Err(SerializeError::ValueTypeMismatch {
            type_name: edm_type.full_name(),
        });
    };
    let Some(element_type) = edm_type.element_type() else {
        return Err(SerializeError::ValueTypeMismatch {
            type_name: edm_type.full_name(),
        });
    };
    Ok((items, element_type))
}

/// Writes a dynamic (undeclared) value by its shape alone.
fn write_dynamic(
    value: &ODataValue,
    writer: &mut dyn ODataWriter,
    ctx: &WriteContext<'_>,
) -> Result<()> {
    match value {
        ODataValue::Null => Ok(writer.null()?),
        ODataValue::Primitive(primitive) => Ok(writer.primitive(primitive)?),
        ODataValue::Enum { type_name, member } => Ok(writer.enum_value(type_name, member)?),
        ODataValue::Resource(resource) => {
            writer.start_resource(resource.type_name())?;
            for (name, property_value) in resource.properties() {
                if property_value.is_null() && !ctx.serialize_null_dynamic() {
                    continue;
                }
                writer.property(name)?;
                write_dynamic(property_value, writer, ctx)?;
            }
            Ok(writer.end_resource()?)
        }
        ODataValue::Collection(items) => {
            writer.start_collection()?;
            for item in items {
                write_dynamic(item, writer, ctx)?;
            }
            Ok(writer.end_collection()?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::RecordingWriter;
    use crate::{SerializerProvider, WriteContext};
    use odata4_edm::{EdmEnumType, EdmModel, EdmStructuredType, PrimitiveKind};
    use odata4_types::{PrimitiveValue, ResourceValue, ServiceDocument};

    fn model() -> EdmModel {
        let mut model = EdmModel::new();
        model.add_structured_type(
            EdmStructuredType::entity("NS.Customer")
                .with_key("id")
                .with_property("id", EdmTypeRef::primitive(PrimitiveKind::Int32))
                .with_property(
                    "color",
                    EdmTypeRef::enumeration(std::sync::Arc::new(
                        EdmEnumType::new("NS.Color").with_member("Red"),
                    )),
                ),
        );
        model
    }

    fn resource_serializer(
        provider: &SerializerProvider,
        edm_type: &EdmTypeRef,
    ) -> std::sync::Arc<dyn crate::EdmTypeSerializer> {
        provider.edm_type_serializer(edm_type).unwrap()
    }

    #[test]
    fn declared_properties_resolve_their_own_serializers() {
        let model = model();
        let provider = SerializerProvider::new();
        let entity_type = model.find_type("NS.Customer").unwrap();
        let serializer = resource_serializer(&provider, &entity_type);

        let value = ODataValue::Resource(
            ResourceValue::new()
                .with_property("id", ODataValue::int32(7))
                .with_property(
                    "color",
                    ODataValue::Enum {
                        type_name: "NS.Color".into(),
                        member: "Red".into(),
                    },
                ),
        );

        let mut writer = RecordingWriter::default();
        serializer
            .write_value(&value, &entity_type, &mut writer, &WriteContext::new(&model))
            .unwrap();

        assert_eq!(
            writer.events,
            vec![
                "start_resource NS.Customer",
                "property id",
                "primitive 7",
                "property color",
                "enum NS.Color/Red",
                "end_resource",
            ]
        );
    }

    #[test]
    fn null_dynamic_properties_are_skipped_unless_enabled() {
        let model = model();
        let provider = SerializerProvider::new();
        let entity_type = model.find_type("NS.Customer").unwrap();
        let serializer = resource_serializer(&provider, &entity_type);

        let value = ODataValue::Resource(
            ResourceValue::new()
                .with_property("id", ODataValue::int32(1))
                .with_property("nickname", ODataValue::Null),
        );

        let mut writer = RecordingWriter::default();
        serializer
            .write_value(&value, &entity_type, &mut writer, &WriteContext::new(&model))
            .unwrap();
        assert!(!writer.events.iter().any(|e| e == "property nickname"));

        let mut writer = RecordingWriter::default();
        let ctx = WriteContext::new(&model).with_serialize_null_dynamic(true);
        serializer
            .write_value(&value, &entity_type, &mut writer, &ctx)
            .unwrap();
        assert!(writer.events.iter().any(|e| e == "property nickname"));
        assert!(writer.events.iter().any(|e| e == "null"));
    }

    #[test]
    fn undeclared_enum_members_are_rejected() {
        let model = model();
        let provider = SerializerProvider::new();
        let enum_type = EdmTypeRef::enumeration(std::sync::Arc::new(
            EdmEnumType::new("NS.Color").with_member("Red"),
        ));
        let serializer = provider.edm_type_serializer(&enum_type).unwrap();

        let err = serializer
            .write_value(
                &ODataValue::Enum {
                    type_name: "NS.Color".into(),
                    member: "Chartreuse".into(),
                },
                &enum_type,
                &mut RecordingWriter::default(),
                &WriteContext::new(&model),
            )
            .unwrap_err();
        assert!(matches!(err, SerializeError::UndeclaredEnumMember { .. }));
    }

    #[test]
    fn raw_value_serializer_writes_bare_scalars() {
        let model = model();
        let serializer = RawValueSerializer;
        let edm_type = EdmTypeRef::primitive(PrimitiveKind::Int64);
        let value = ODataValue::Primitive(PrimitiveValue::Int64(42));

        let mut writer = RecordingWriter::default();
        serializer
            .write_payload(
                &Payload::Value {
                    value: &value,
                    edm_type: &edm_type,
                },
                &mut writer,
                &WriteContext::new(&model),
            )
            .unwrap();
        assert_eq!(writer.events, vec!["raw 42"]);
    }

    #[test]
    fn mismatched_payload_shapes_are_invalid_operations() {
        let model = model();
        let document = ServiceDocument::new();
        let err = ErrorSerializer
            .write_payload(
                &Payload::ServiceDocument(&document),
                &mut RecordingWriter::default(),
                &WriteContext::new(&model),
            )
            .unwrap_err();
        assert!(matches!(err, SerializeError::PayloadMismatch { .. }));
    }

    #[test]
    fn delta_feed_writes_through_its_own_scope() {
        let model = model();
        let provider = SerializerProvider::new();
        let entity_type = model.find_type("NS.Customer").unwrap();
        let delta_type = EdmTypeRef::delta_collection_of(entity_type);
        let serializer = provider.edm_type_serializer(&delta_type).unwrap();

        let value = ODataValue::Collection(vec![ODataValue::Resource(
            ResourceValue::new().with_property("id", ODataValue::int32(5)),
        )]);

        let mut writer = RecordingWriter::default();
        serializer
            .write_value(&value, &delta_type, &mut writer, &WriteContext::new(&model))
            .unwrap();
        assert_eq!(writer.events.first().map(String::as_str), Some("start_delta_feed"));
        assert_eq!(writer.events.last().map(String::as_str), Some("end_delta_feed"));
    }

    #[test]
    fn primitive_collections_use_the_generic_collection_scope() {
        let model = model();
        let provider = SerializerProvider::new();
        let collection_type =
            EdmTypeRef::collection_of(EdmTypeRef::primitive(PrimitiveKind::Int32));
        let serializer = provider.edm_type_serializer(&collection_type).unwrap();

        let value = ODataValue::Collection(vec![ODataValue::int32(1), ODataValue::int32(2)]);
        let mut writer = RecordingWriter::default();
        serializer
            .write_value(&value, &collection_type, &mut writer, &WriteContext::new(&model))
            .unwrap();
        assert_eq!(
            writer.events,
            vec![
                "start_collection",
                "primitive 1",
                "primitive 2",
                "end_collection",
            ]
        );
    }
}
