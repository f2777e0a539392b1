//! In-memory doubles for the bus and the execution service.
//!
//! These stand in for the real broker connection and task-submission client
//! so that correlation runs can be exercised without any deployed
//! infrastructure. They back the integration tests and the `demo` subcommand
//! of the CLI.
//!
//! [`InMemoryBroker`] delivers each published message to every handler
//! subscribed on its topic, synchronously on the publisher's context. Tests
//! that need delivery concurrent with a waiting caller publish from a spawned
//! task (or from a [`ScriptedTaskClient`] submit hook, which runs after the
//! correlator has registered its handlers).

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::bus::{EventBusClient, MessageHandler};
use crate::error::{RigError, RigResult};
use crate::message::Message;
use crate::submission::{TaskHandle, TaskRecord, TaskRequest, TaskSubmissionClient};

type SubmitHook = Box<dyn Fn() + Send + Sync>;

/// Topic-routed in-process message fan-out implementing [`EventBusClient`].
#[derive(Default)]
pub struct InMemoryBroker {
    subscriptions: Mutex<Vec<(String, MessageHandler)>>,
    refuse_reason: Option<String>,
}

impl InMemoryBroker {
    /// Create a broker that accepts subscriptions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a broker whose subscriptions all fail, for exercising the
    /// transport failure path.
    pub fn refusing(reason: impl Into<String>) -> Self {
        Self {
            subscriptions: Mutex::new(Vec::new()),
            refuse_reason: Some(reason.into()),
        }
    }

    /// Deliver `message` to every handler subscribed on its topic, in
    /// subscription order.
    pub fn publish(&self, message: Message) {
        let handlers: Vec<MessageHandler> = {
            let subscriptions = self
                .subscriptions
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            subscriptions
                .iter()
                .filter(|(topic, _)| *topic == message.topic)
                .map(|(_, handler)| handler.clone())
                .collect()
        };
        for handler in handlers {
            handler(message.clone());
        }
    }

    /// Number of handlers currently subscribed on `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(t, _)| t == topic)
            .count()
    }
}

#[async_trait]
impl EventBusClient for InMemoryBroker {
    async fn subscribe(&self, topic: &str, handler: MessageHandler) -> RigResult<()> {
        if let Some(reason) = &self.refuse_reason {
            return Err(RigError::BusConnection(reason.clone()));
        }
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((topic.to_string(), handler));
        Ok(())
    }
}

/// Scripted [`TaskSubmissionClient`]: submissions succeed or are rejected as
/// configured, and every status query answers with the same canned record.
pub struct ScriptedTaskClient {
    record: TaskRecord,
    reject_reason: Option<String>,
    on_submit: Option<SubmitHook>,
    last_request: Mutex<Option<TaskRequest>>,
}

impl ScriptedTaskClient {
    fn with_record(record: TaskRecord) -> Self {
        Self {
            record,
            reject_reason: None,
            on_submit: None,
            last_request: Mutex::new(None),
        }
    }

    /// A client whose tasks complete cleanly.
    pub fn completing() -> Self {
        Self::with_record(TaskRecord {
            complete: true,
            errors: Vec::new(),
        })
    }

    /// A client whose tasks complete but record the given errors.
    pub fn with_errors(errors: Vec<String>) -> Self {
        Self::with_record(TaskRecord {
            complete: true,
            errors,
        })
    }

    /// A client whose tasks never report completion.
    pub fn incomplete() -> Self {
        Self::with_record(TaskRecord::default())
    }

    /// A client that rejects every submission.
    pub fn rejecting(reason: impl Into<String>) -> Self {
        let mut client = Self::completing();
        client.reject_reason = Some(reason.into());
        client
    }

    /// Run `hook` whenever a submission is accepted, after the caller has
    /// registered its bus handlers. Tests use this to publish the events the
    /// running task would raise.
    #[must_use]
    pub fn on_submit(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_submit = Some(Box::new(hook));
        self
    }

    /// The most recently submitted request, if any.
    pub fn last_request(&self) -> Option<TaskRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl TaskSubmissionClient for ScriptedTaskClient {
    async fn submit(&self, request: &TaskRequest) -> RigResult<TaskHandle> {
        if let Some(reason) = &self.reject_reason {
            return Err(RigError::Submission(reason.clone()));
        }
        *self
            .last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(request.clone());
        if let Some(hook) = &self.on_submit {
            hook();
        }
        Ok(TaskHandle::new())
    }

    async fn status(&self, _handle: TaskHandle) -> RigResult<TaskRecord> {
        Ok(self.record.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn broker_routes_by_topic() {
        let broker = InMemoryBroker::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        broker
            .subscribe(
                "a.topic",
                Arc::new(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .await
            .expect("subscribe should succeed");

        broker.publish(Message::new("a.topic", "STARTED"));
        broker.publish(Message::new("other.topic", "STARTED"));

        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(broker.subscriber_count("a.topic"), 1);
    }

    #[tokio::test]
    async fn refusing_broker_fails_subscriptions() {
        let broker = InMemoryBroker::refusing("down for maintenance");
        let result = broker.subscribe("a.topic", Arc::new(|_| {})).await;
        assert!(matches!(result, Err(RigError::BusConnection(_))));
    }

    #[tokio::test]
    async fn scripted_client_records_last_request() {
        let client = ScriptedTaskClient::completing();
        let request = TaskRequest::new("snapshot", "cm40661-1");
        let handle = client.submit(&request).await.expect("submit should succeed");

        assert_eq!(client.last_request(), Some(request));
        let record = client.status(handle).await.expect("status should succeed");
        assert!(record.complete);
    }
}
