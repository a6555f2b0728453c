//! Special payload shapes with dedicated serializer strategies

use http::StatusCode;
use serde::Serialize;
use url::Url;

/// One entity set advertised by the service document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceDocumentElement {
    pub name: String,
    pub url: String,
}

/// The service document: the workspace listing of top-level entity sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServiceDocument {
    pub entity_sets: Vec<ServiceDocumentElement>,
}

impl ServiceDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity_set(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.entity_sets.push(ServiceDocumentElement {
            name: name.into(),
            url: url.into(),
        });
        self
    }
}

/// A single entity reference link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityReferenceLink {
    pub url: Url,
}

impl EntityReferenceLink {
    pub fn new(url: Url) -> Self {
        Self { url }
    }
}

/// A collection of entity reference links, with optional count and
/// continuation link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityReferenceLinks {
    pub links: Vec<EntityReferenceLink>,
    pub count: Option<i64>,
    pub next_link: Option<Url>,
}

impl EntityReferenceLinks {
    pub fn new(links: Vec<EntityReferenceLink>) -> Self {
        Self {
            links,
            count: None,
            next_link: None,
        }
    }
}

/// A nested detail entry of an [`ODataError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ODataErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// The OData error payload shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ODataError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<ODataErrorDetail>,
}

impl ODataError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            target: None,
            details: Vec::new(),
        }
    }
}

/// The generic HTTP error shape produced outside the OData pipeline. It
/// serializes through the same error strategy as [`ODataError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpApiError {
    pub status: StatusCode,
    pub message: String,
}

impl HttpApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<&HttpApiError> for ODataError {
    fn from(error: &HttpApiError) -> Self {
        ODataError::new(error.status.as_str(), error.message.clone())
    }
}
