//! The event-bus interface consumed by the correlator.
//!
//! The bus is an external collaborator: the caller owns its connection
//! lifecycle (connect before, disconnect after) and the correlator only ever
//! registers handlers on it. Handlers are invoked once per delivered message,
//! on the bus's own delivery context, for the lifetime of the subscription.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::RigResult;
use crate::message::Message;

/// Callback invoked once per delivered [`Message`]. Handlers run on the bus's
/// delivery context and must be cheap; heavy work belongs elsewhere.
pub type MessageHandler = Arc<dyn Fn(Message) + Send + Sync>;

/// Client of a connected message broker.
#[async_trait]
pub trait EventBusClient: Send + Sync {
    /// Register `handler` for every message published on `topic`.
    ///
    /// Fails with [`crate::error::RigError::BusConnection`] if the transport
    /// rejects the subscription.
    async fn subscribe(&self, topic: &str, handler: MessageHandler) -> RigResult<()>;
}
