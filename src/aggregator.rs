//! Thread-safe accumulation of bus messages by status tag.
//!
//! The bus invokes [`EventAggregator::record`] from its own delivery context,
//! possibly interleaved with the caller's blocking wait and status query. The
//! log behind the mutex is the only mutable state this type shares between the
//! two contexts; the contract is that [`EventAggregator::snapshot`] is taken
//! once, after both completion paths have resolved.

use std::sync::{Mutex, PoisonError};

use crate::message::{EventLog, Message};

/// Accumulates every received [`Message`] for the lifetime of one correlated
/// run, grouped by status tag in arrival order.
#[derive(Debug, Default)]
pub struct EventAggregator {
    events: Mutex<EventLog>,
}

impl EventAggregator {
    /// Create an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the message's payload to the bucket keyed by its status,
    /// creating the bucket on first use. Safe to call concurrently.
    pub fn record(&self, message: &Message) {
        // A poisoned lock only means a handler panicked mid-append; the map
        // itself is still structurally sound, so keep recording.
        let mut log = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        log.append(&message.status, message.payload.clone());
    }

    /// Clone the current log. Called once, after the run has resolved.
    pub fn snapshot(&self) -> EventLog {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
