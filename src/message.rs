//! Bus message record and the per-run event log.
//!
//! A [`Message`] is an immutable record delivered over the pub/sub bus: a topic,
//! a status tag, and an open JSON payload. The [`EventLog`] is what one correlated
//! run hands back to its caller — every payload seen on the topic during the run,
//! grouped by status tag in arrival order.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Open key/value payload carried by bus messages and task requests.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// The only status tag with built-in meaning to the correlator: the terminal
/// success marker signalling that the expected output record was written.
pub const STATUS_FINISHED: &str = "FINISHED";

/// One record delivered over the bus. Immutable once delivered.
///
/// The status tag is an open string (`STARTED`, custom progress tags, ...);
/// everything except [`STATUS_FINISHED`] passes through unfiltered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Topic the message was published on.
    pub topic: String,
    /// Status tag, e.g. `STARTED` or `FINISHED`.
    pub status: String,
    /// Open payload; shape depends on the publisher.
    #[serde(default)]
    pub payload: Payload,
}

impl Message {
    /// Create a message with an empty payload.
    pub fn new(topic: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            status: status.into(),
            payload: Payload::new(),
        }
    }

    /// Attach a payload to the message.
    #[must_use]
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    /// Whether this message carries the terminal success marker.
    pub fn is_finished(&self) -> bool {
        self.status == STATUS_FINISHED
    }
}

/// Every payload observed during one correlated run, grouped by status tag.
///
/// Arrival order is preserved *within* a status bucket; there is no ordering
/// guarantee across buckets. The log is owned by a single run and discarded
/// after the caller is done with it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EventLog {
    events: HashMap<String, Vec<Payload>>,
}

impl EventLog {
    /// Payloads recorded under `status`, in arrival order. Empty if the status
    /// was never seen.
    pub fn bucket(&self, status: &str) -> &[Payload] {
        self.events.get(status).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Status tags seen during the run, in no particular order.
    pub fn statuses(&self) -> impl Iterator<Item = &str> {
        self.events.keys().map(String::as_str)
    }

    /// Total number of recorded payloads across all buckets.
    pub fn total(&self) -> usize {
        self.events.values().map(Vec::len).sum()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Consume the log, yielding the underlying map.
    pub fn into_inner(self) -> HashMap<String, Vec<Payload>> {
        self.events
    }

    pub(crate) fn append(&mut self, status: &str, payload: Payload) {
        // Explicit fetch-or-insert under the aggregator's lock; no ambient
        // default-map state survives past one run.
        self.events.entry(status.to_string()).or_default().push(payload);
    }
}
