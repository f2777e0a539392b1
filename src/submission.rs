//! Task model and the submission-service interface.
//!
//! One task is one scheduled acquisition-plan invocation on the remote
//! execution service. The service itself is external; this module defines the
//! values that cross its boundary and the trait the correlator consumes.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::RigResult;
use crate::message::Payload;

/// Immutable description of one task to submit. Opaque to the correlator
/// beyond pass-through to the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRequest {
    /// Name of the registered plan to run.
    pub name: String,
    /// Plan parameters, passed through verbatim.
    #[serde(default)]
    pub params: Payload,
    /// Instrument session the acquired data is booked against.
    #[serde(rename = "sessionContext")]
    pub instrument_session: String,
}

impl TaskRequest {
    /// Create a request with no parameters.
    pub fn new(name: impl Into<String>, instrument_session: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Payload::new(),
            instrument_session: instrument_session.into(),
        }
    }

    /// Add one plan parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }
}

/// Opaque identifier for a submitted task, owned by the correlator for the
/// duration of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskHandle(Uuid);

impl TaskHandle {
    /// Allocate a fresh handle.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Snapshot of remote task state. Queried, never cached beyond one read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Whether the service considers the task to have run to completion.
    pub complete: bool,
    /// Error descriptions the service recorded against the task, in order.
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Client of the remote execution service.
#[async_trait]
pub trait TaskSubmissionClient: Send + Sync {
    /// Submit a task and return its handle once the service reports the task
    /// has ended (the client applies its own execution timeout internally).
    ///
    /// Fails with [`crate::error::RigError::Submission`] if the service
    /// rejects the request.
    async fn submit(&self, request: &TaskRequest) -> RigResult<TaskHandle>;

    /// Query the current state of a previously submitted task.
    async fn status(&self, handle: TaskHandle) -> RigResult<TaskRecord>;
}
