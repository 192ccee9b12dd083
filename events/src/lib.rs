//! Queue message handling for the broadcast gateway.
//!
//! This crate maps raw queued messages onto the handler responsible for them.
//!
//! # Architecture
//!
//! - **MessageType**: the `type` envelope decoded ahead of everything else
//! - **MessageHandler**: trait implemented once per known message type
//! - **Dispatcher**: immutable `type -> handler` table built at startup
//!
//! The crate has no dependency on the queue transport or the SSE layer, so
//! handlers can live next to whatever they act on.

use async_trait::async_trait;
use log::*;
use std::collections::HashMap;
use std::sync::Arc;

pub mod error;
pub mod message;

pub use error::{DispatchErrorKind, Error};
use message::MessageType;

/// Handles every queued message of one type.
/// The handler owns full decoding of the body; the dispatcher only reads `type`.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// The `type` tag this handler is registered under.
    fn message_type(&self) -> &'static str;

    async fn handle(&self, body: &[u8]);
}

/// Immutable lookup table from message type to handler.
#[derive(Clone, Default)]
pub struct Dispatcher {
    handlers: Arc<HashMap<&'static str, Arc<dyn MessageHandler>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its message type.
    /// Registering a second handler for the same type replaces the first.
    pub fn with_handler(mut self, handler: Arc<dyn MessageHandler>) -> Self {
        let mut handlers = (*self.handlers).clone();
        if let Some(replaced) = handlers.insert(handler.message_type(), handler) {
            warn!(
                "Replacing previously registered handler for message type '{}'",
                replaced.message_type()
            );
        }
        self.handlers = Arc::new(handlers);
        self
    }

    /// Find the handler for a raw message body by its `type` field.
    pub fn dispatch(&self, body: &[u8]) -> Result<Arc<dyn MessageHandler>, Error> {
        let message_type = Self::message_type(body)?;

        self.handlers
            .get(message_type.as_str())
            .cloned()
            .ok_or_else(|| Error::kind(DispatchErrorKind::UnknownType(message_type)))
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    fn message_type(body: &[u8]) -> Result<String, Error> {
        let envelope: MessageType = serde_json::from_slice(body).map_err(Error::malformed)?;

        if envelope.message_type.is_empty() {
            return Err(Error::kind(DispatchErrorKind::MissingType));
        }

        Ok(envelope.message_type)
    }
}
