//! Entity-tag generation for concurrency-enabled properties

use std::fmt;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use odata4_types::ODataValue;

/// Produces entity tags from the values of an entity's concurrency
/// properties.
pub trait ETagHandler: fmt::Debug + Send + Sync {
    /// The ETag for the given property values, or `None` when no properties
    /// participate in concurrency checks.
    fn create_etag(&self, properties: &[(Arc<str>, ODataValue)]) -> Option<String>;
}

/// The stock handler: a weak ETag over a hash of the property values.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultETagHandler;

impl ETagHandler for DefaultETagHandler {
    fn create_etag(&self, properties: &[(Arc<str>, ODataValue)]) -> Option<String> {
        if properties.is_empty() {
            return None;
        }
        let mut hasher = Sha256::new();
        for (name, value) in properties {
            hasher.update(name.as_bytes());
            hasher.update(format!("{value:?}").as_bytes());
        }
        let digest = hasher.finalize();
        Some(format!("W/\"{}\"", hex::encode(&digest[..16])))
    }
}
