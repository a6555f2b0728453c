//! Shared test doubles for the serializer strategies

use odata4_edm::EdmModel;
use odata4_types::{
    EntityReferenceLink, EntityReferenceLinks, ODataError, PrimitiveValue, ServiceDocument,
};

use crate::writer::{ODataWriter, WriteError};

/// A wire writer that records every call as a flat event string.
#[derive(Debug, Default)]
pub(crate) struct RecordingWriter {
    pub(crate) events: Vec<String>,
}

impl RecordingWriter {
    fn push(&mut self, event: impl Into<String>) -> Result<(), WriteError> {
        self.events.push(event.into());
        Ok(())
    }
}

impl ODataWriter for RecordingWriter {
    fn service_document(&mut self, document: &ServiceDocument) -> Result<(), WriteError> {
        self.push(format!(
            "service_document [{}]",
            document
                .entity_sets
                .iter()
                .map(|e| e.name.as_str())
                .collect::<Vec<_>>()
                .join(",")
        ))
    }

    fn entity_reference_link(&mut self, link: &EntityReferenceLink) -> Result<(), WriteError> {
        self.push(format!("link {}", link.url))
    }

    fn entity_reference_links(&mut self, links: &EntityReferenceLinks) -> Result<(), WriteError> {
        self.push(format!("links x{}", links.links.len()))
    }

    fn error(&mut self, error: &ODataError) -> Result<(), WriteError> {
        self.push(format!("error {}", error.code))
    }

    fn metadata_document(&mut self, _model: &EdmModel) -> Result<(), WriteError> {
        self.push("metadata")
    }

    fn raw_value(&mut self, raw: &str) -> Result<(), WriteError> {
        self.push(format!("raw {raw}"))
    }

    fn primitive(&mut self, value: &PrimitiveValue) -> Result<(), WriteError> {
        self.push(format!("primitive {}", value.to_raw()))
    }

    fn null(&mut self) -> Result<(), WriteError> {
        self.push("null")
    }

    fn enum_value(&mut self, type_name: &str, member: &str) -> Result<(), WriteError> {
        self.push(format!("enum {type_name}/{member}"))
    }

    fn start_resource(&mut self, type_name: Option<&str>) -> Result<(), WriteError> {
        match type_name {
            Some(name) => self.push(format!("start_resource {name}")),
            None => self.push("start_resource"),
        }
    }

    fn property(&mut self, name: &str) -> Result<(), WriteError> {
        self.push(format!("property {name}"))
    }

    fn end_resource(&mut self) -> Result<(), WriteError> {
        self.push("end_resource")
    }

    fn start_resource_set(&mut self, count: Option<i64>) -> Result<(), WriteError> {
        match count {
            Some(count) => self.push(format!("start_resource_set count={count}")),
            None => self.push("start_resource_set"),
        }
    }

    fn end_resource_set(&mut self) -> Result<(), WriteError> {
        self.push("end_resource_set")
    }

    fn start_delta_feed(&mut self) -> Result<(), WriteError> {
        self.push("start_delta_feed")
    }

    fn end_delta_feed(&mut self) -> Result<(), WriteError> {
        self.push("end_delta_feed")
    }

    fn start_collection(&mut self) -> Result<(), WriteError> {
        self.push("start_collection")
    }

    fn end_collection(&mut self) -> Result<(), WriteError> {
        self.push("end_collection")
    }
}
