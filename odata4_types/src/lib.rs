//! Payload value types shared across the OData core
//!
//! Everything a serializer can be handed lives here: the generic
//! [`ODataValue`] runtime value model, the special payload shapes (service
//! document, entity reference links, errors) and the [`RequestSignals`]
//! extracted from an inbound request.

mod payloads;
mod signals;
mod value;

pub use payloads::{
    EntityReferenceLink, EntityReferenceLinks, HttpApiError, ODataError, ODataErrorDetail,
    ServiceDocument, ServiceDocumentElement,
};
pub use signals::RequestSignals;
pub use value::{ODataValue, PrimitiveValue, ResourceValue};
