//! The wire-writer collaborator contract

use odata4_edm::EdmModel;
use odata4_types::{
    EntityReferenceLink, EntityReferenceLinks, ODataError, PrimitiveValue, ServiceDocument,
};

/// A failure reported by the wire writer. Byte-level encoding is external to
/// this core; strategies only relay its errors.
#[derive(Debug, thiserror::Error)]
#[error("wire writer failure: {message}")]
pub struct WriteError {
    message: String,
}

impl WriteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The sink every strategy writes through. Implementations own the byte
/// encoding of each payload kind; the scoped `start_*`/`end_*` pairs nest for
/// structured and collection payloads.
pub trait ODataWriter {
    fn service_document(&mut self, document: &ServiceDocument) -> Result<(), WriteError>;

    fn entity_reference_link(&mut self, link: &EntityReferenceLink) -> Result<(), WriteError>;

    fn entity_reference_links(&mut self, links: &EntityReferenceLinks) -> Result<(), WriteError>;

    fn error(&mut self, error: &ODataError) -> Result<(), WriteError>;

    fn metadata_document(&mut self, model: &EdmModel) -> Result<(), WriteError>;

    fn raw_value(&mut self, raw: &str) -> Result<(), WriteError>;

    fn primitive(&mut self, value: &PrimitiveValue) -> Result<(), WriteError>;

    fn null(&mut self) -> Result<(), WriteError>;

    fn enum_value(&mut self, type_name: &str, member: &str) -> Result<(), WriteError>;

    fn start_resource(&mut self, type_name: Option<&str>) -> Result<(), WriteError>;

    fn property(&mut self, name: &str) -> Result<(), WriteError>;

    fn end_resource(&mut self) -> Result<(), WriteError>;

    fn start_resource_set(&mut self, count: Option<i64>) -> Result<(), WriteError>;

    fn end_resource_set(&mut self) -> Result<(), WriteError>;

    fn start_delta_feed(&mut self) -> Result<(), WriteError>;

    fn end_delta_feed(&mut self) -> Result<(), WriteError>;

    fn start_collection(&mut self) -> Result<(), WriteError>;

    fn end_collection(&mut self) -> Result<(), WriteError>;
}

/// Per-write state shared down the strategy recursion.
#[derive(Debug, Clone, Copy)]
pub struct WriteContext<'a> {
    model: &'a EdmModel,
    serialize_null_dynamic: bool,
}

impl<'a> WriteContext<'a> {
    pub fn new(model: &'a EdmModel) -> Self {
        Self {
            model,
            serialize_null_dynamic: false,
        }
    }

    /// Whether null-valued dynamic properties are written or skipped.
    pub fn with_serialize_null_dynamic(mut self, serialize: bool) -> Self {
        self.serialize_null_dynamic = serialize;
        self
    }

    pub fn model(&self) -> &'a EdmModel {
        self.model
    }

    pub fn serialize_null_dynamic(&self) -> bool {
        self.serialize_null_dynamic
    }
}
