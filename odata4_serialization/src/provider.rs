//! The serializer registry and dispatch engine

use std::sync::{Arc, LazyLock, OnceLock, Weak};

use tracing::debug;

use odata4_edm::{EdmModel, EdmTypeKind, EdmTypeRef};
use odata4_types::RequestSignals;

use crate::serializers::{
    CollectionSerializer, DeltaFeedSerializer, EnumSerializer, ErrorSerializer,
    LinkCollectionSerializer, LinkSerializer, MetadataSerializer, PrimitiveSerializer,
    RawValueSerializer, ResourceSerializer, ResourceSetSerializer, ServiceDocumentSerializer,
};
use crate::{EdmTypeSerializer, ODataSerializer, PayloadTarget, Result, SerializeError};

#[derive(Debug)]
struct StrategyTable {
    service_document: Arc<ServiceDocumentSerializer>,
    link: Arc<LinkSerializer>,
    link_collection: Arc<LinkCollectionSerializer>,
    error: Arc<ErrorSerializer>,
    metadata: Arc<MetadataSerializer>,
    raw_value: Arc<RawValueSerializer>,
    primitive: Arc<PrimitiveSerializer>,
    enumeration: Arc<EnumSerializer>,
    resource: Arc<ResourceSerializer>,
    resource_set: Arc<ResourceSetSerializer>,
    delta_feed: Arc<DeltaFeedSerializer>,
    collection: Arc<CollectionSerializer>,
}

#[derive(Debug)]
pub(crate) struct ProviderInner {
    table: OnceLock<StrategyTable>,
}

impl ProviderInner {
    fn table(&self) -> &StrategyTable {
        self.table
            .get()
            .expect("strategy table is installed during provider construction")
    }

    fn edm_type_serializer(&self, edm_type: &EdmTypeRef) -> Option<Arc<dyn EdmTypeSerializer>> {
        let table = self.table();
        let strategy: Arc<dyn EdmTypeSerializer> = match edm_type.kind() {
            EdmTypeKind::Enum => Arc::clone(&table.enumeration) as Arc<dyn EdmTypeSerializer>,
            EdmTypeKind::Primitive => Arc::clone(&table.primitive) as Arc<dyn EdmTypeSerializer>,
            EdmTypeKind::Collection => {
                // Delta detection runs before the element-kind check: a delta
                // feed's element may itself be an entity type.
                if edm_type.is_delta_feed() {
                    Arc::clone(&table.delta_feed) as Arc<dyn EdmTypeSerializer>
                } else {
                    match edm_type.element_type().map(EdmTypeRef::kind) {
                        Some(EdmTypeKind::Entity | EdmTypeKind::Complex) => {
                            Arc::clone(&table.resource_set) as Arc<dyn EdmTypeSerializer>
                        }
                        _ => Arc::clone(&table.collection) as Arc<dyn EdmTypeSerializer>,
                    }
                }
            }
            EdmTypeKind::Complex | EdmTypeKind::Entity => {
                Arc::clone(&table.resource) as Arc<dyn EdmTypeSerializer>
            }
            EdmTypeKind::None | EdmTypeKind::Untyped => return None,
        };
        Some(strategy)
    }
}

/// A non-owning capability handle back to the provider that owns a strategy.
///
/// Element-dependent strategies use it to resolve serializers for collection
/// elements and structured properties. The handle is `Weak`, so the circular
/// shape of the original design (strategies pointing at their provider)
/// carries no ownership cycle.
#[derive(Debug, Clone)]
pub struct EdmResolverHandle {
    inner: Weak<ProviderInner>,
}

impl EdmResolverHandle {
    /// Resolves the strategy for an EDM type through the owning provider.
    pub fn resolve(&self, edm_type: &EdmTypeRef) -> Result<Arc<dyn EdmTypeSerializer>> {
        let inner = self
            .inner
            .upgrade()
            .ok_or(SerializeError::ProviderReleased)?;
        inner
            .edm_type_serializer(edm_type)
            .ok_or_else(|| SerializeError::NoElementSerializer {
                type_name: edm_type.full_name(),
            })
    }
}

/// The registry of serialization strategies and the dispatcher that selects
/// among them.
///
/// Construction order follows the provider-first design: the provider
/// allocation exists before any strategy, element-dependent strategies are
/// handed a [`Weak`] handle to it, and the complete strategy table is
/// installed exactly once after every strategy has been built.
#[derive(Debug)]
pub struct SerializerProvider {
    inner: Arc<ProviderInner>,
}

impl SerializerProvider {
    pub fn new() -> Self {
        let inner = Arc::new(ProviderInner {
            table: OnceLock::new(),
        });
        let handle = EdmResolverHandle {
            inner: Arc::downgrade(&inner),
        };

        let table = StrategyTable {
            service_document: Arc::new(ServiceDocumentSerializer),
            link: Arc::new(LinkSerializer),
            link_collection: Arc::new(LinkCollectionSerializer),
            error: Arc::new(ErrorSerializer),
            metadata: Arc::new(MetadataSerializer),
            raw_value: Arc::new(RawValueSerializer),
            primitive: Arc::new(PrimitiveSerializer),
            enumeration: Arc::new(EnumSerializer),
            resource: Arc::new(ResourceSerializer::new(handle.clone())),
            resource_set: Arc::new(ResourceSetSerializer::new(handle.clone())),
            delta_feed: Arc::new(DeltaFeedSerializer::new(handle.clone())),
            collection: Arc::new(CollectionSerializer::new(handle)),
        };
        inner
            .table
            .set(table)
            .expect("strategy table is installed exactly once");

        Self { inner }
    }

    /// The process-wide default provider.
    pub fn global() -> &'static SerializerProvider {
        static GLOBAL: LazyLock<SerializerProvider> = LazyLock::new(SerializerProvider::new);
        &GLOBAL
    }

    /// Selects the strategy for a resolved EDM type.
    ///
    /// Dispatch is by kind: enums and primitives go to their dedicated
    /// strategies; collections go to the delta-feed strategy when flagged,
    /// the resource-set strategy for entity/complex elements and the generic
    /// collection strategy otherwise; complex and entity types go to the
    /// resource strategy. Any other kind has no serializer.
    pub fn edm_type_serializer(&self, edm_type: &EdmTypeRef) -> Option<Arc<dyn EdmTypeSerializer>> {
        self.inner.edm_type_serializer(edm_type)
    }

    /// Selects the strategy for an outgoing payload.
    ///
    /// The five special payload shapes dispatch straight off their tag.
    /// Typed values resolve an EDM type through the model's mapping cache;
    /// an unmapped type has no serializer. Raw-value and count requests are
    /// response-shape overrides checked before the structural dispatch: a
    /// primitive or enum type under a raw-value request, or any resolvable
    /// type under a count request, serializes through the raw-value strategy.
    pub fn payload_serializer(
        &self,
        model: &EdmModel,
        target: &PayloadTarget,
        signals: RequestSignals,
    ) -> Option<Arc<dyn ODataSerializer>> {
        let table = self.inner.table();
        let strategy: Arc<dyn ODataSerializer> = match target {
            PayloadTarget::ServiceDocument => {
                Arc::clone(&table.service_document) as Arc<dyn ODataSerializer>
            }
            PayloadTarget::EntityReferenceLink => Arc::clone(&table.link) as Arc<dyn ODataSerializer>,
            PayloadTarget::EntityReferenceLinks => {
                Arc::clone(&table.link_collection) as Arc<dyn ODataSerializer>
            }
            PayloadTarget::Error => Arc::clone(&table.error) as Arc<dyn ODataSerializer>,
            PayloadTarget::Metadata => Arc::clone(&table.metadata) as Arc<dyn ODataSerializer>,
            PayloadTarget::Value(value_type) => {
                let Some(edm_type) = model.type_mapping_cache().edm_type(value_type, model) else {
                    debug!(
                        value_type = %value_type.describe(),
                        "value type has no EDM mapping, no serializer selected"
                    );
                    return None;
                };
                if ((edm_type.is_primitive() || edm_type.is_enum()) && signals.raw_value())
                    || signals.count()
                {
                    Arc::clone(&table.raw_value) as Arc<dyn ODataSerializer>
                } else {
                    return self
                        .edm_type_serializer(&edm_type)
                        .map(|serializer| serializer as Arc<dyn ODataSerializer>);
                }
            }
        };
        Some(strategy)
    }
}

impl Default for SerializerProvider {
    fn default() -> Self {
        Self::new()
    }
}
