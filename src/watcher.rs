//! One-shot detection of the terminal `FINISHED` event.
//!
//! A [`CompletionWatcher`] is registered as a bus handler and resolves its
//! paired [`CompletionSignal`] exactly once, the first time a `FINISHED`
//! message arrives. The pair is built from a `tokio::sync::oneshot` channel
//! with the sender parked behind a mutex: resolving means taking the sender
//! out under the lock, which makes double delivery a harmless no-op even when
//! two `FINISHED` messages race on the delivery context.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::debug;

use crate::error::{RigError, RigResult};
use crate::message::Message;

/// Bus-side half of the completion pair. Observes every delivered message and
/// resolves the signal on the first `FINISHED`.
#[derive(Debug)]
pub struct CompletionWatcher {
    sender: Mutex<Option<oneshot::Sender<Message>>>,
}

/// Caller-side half: a single-assignment future holding the first `FINISHED`
/// message observed, awaited with a deadline.
#[derive(Debug)]
pub struct CompletionSignal {
    receiver: oneshot::Receiver<Message>,
}

impl CompletionWatcher {
    /// Create a watcher and the signal it resolves.
    pub fn pair() -> (Self, CompletionSignal) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                sender: Mutex::new(Some(tx)),
            },
            CompletionSignal { receiver: rx },
        )
    }

    /// Handle one delivered message. Resolves the signal on the first
    /// `FINISHED`; any other status, and any later `FINISHED`, is a no-op.
    pub fn observe(&self, message: &Message) {
        if !message.is_finished() {
            return;
        }
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match sender {
            // Send only fails if the caller already gave up waiting; the
            // aggregator still keeps the message either way.
            Some(tx) => {
                let _ = tx.send(message.clone());
            }
            None => debug!(topic = %message.topic, "further FINISHED event ignored by watcher"),
        }
    }
}

impl CompletionSignal {
    /// Block until the signal resolves or `limit` elapses. A lapse fails with
    /// [`RigError::CorrelationTimeout`]; there is no polling and no retry.
    pub async fn wait(self, limit: Duration) -> RigResult<Message> {
        match tokio::time::timeout(limit, self.receiver).await {
            Ok(Ok(message)) => Ok(message),
            // A dropped watcher can never resolve; report it as the deadline
            // outcome rather than hanging for the full limit elsewhere.
            Ok(Err(_)) | Err(_) => Err(RigError::CorrelationTimeout { waited: limit }),
        }
    }
}
