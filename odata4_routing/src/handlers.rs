//! Message and batch handler contracts
//!
//! Handler *execution* belongs to the request pipeline; composition only
//! registers handlers, tags batch handlers with their route name, and stores
//! them on the resulting routes.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, Response};

/// A failure raised by a handler while servicing a request.
#[derive(Debug, thiserror::Error)]
#[error("handler failure: {message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A handler that services requests for a route directly, bypassing
/// convention-based controller selection.
#[async_trait]
pub trait MessageHandler: fmt::Debug + Send + Sync {
    async fn handle(&self, request: Request<Bytes>) -> Result<Response<Bytes>, HandlerError>;
}

/// A handler for the `$batch` endpoint: accepts a multi-request envelope and
/// dispatches the constituent requests internally.
#[async_trait]
pub trait BatchHandler: MessageHandler {
    /// The OData route this handler serves. Composition sets it before the
    /// batch sub-route is registered.
    fn route_name(&self) -> Option<Arc<str>>;

    fn set_route_name(&self, name: Arc<str>);
}
