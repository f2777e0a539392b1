//! Runs one task to a verified, artifact-confirmed completion.
//!
//! The correlator answers "did this task run to completion, and did its
//! expected output record actually appear" from two independently-timed signal
//! paths: a synchronous status query against the execution service and the
//! asynchronous event stream on the bus. Both must agree before a run is
//! considered successful; either failing independently fails the whole call.
//!
//! # Ordering
//!
//! The handler is registered on the topic *before* the task is submitted. The
//! bus offers no buffering or replay, so a `FINISHED` event published
//! immediately after submission would otherwise be lost. This is a correctness
//! requirement, not an optimization. Within the handler, a message is recorded
//! in the aggregator before the watcher sees it, so the log returned after the
//! signal resolves always contains the terminal entry.
//!
//! # Shared-topic caveat
//!
//! Messages carry no task-correlation identifier; every subscriber on the
//! deployment topic sees every task's events. Two runs sharing a connection
//! and topic will misattribute each other's events. Fixing that means adding a
//! correlation id to the wire format, which is a protocol change outside this
//! component's authority, so the limitation is documented rather than papered
//! over.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::aggregator::EventAggregator;
use crate::bus::{EventBusClient, MessageHandler};
use crate::error::{RigError, RigResult};
use crate::message::EventLog;
use crate::submission::{TaskRequest, TaskSubmissionClient};
use crate::watcher::CompletionWatcher;

/// Correlates one submitted task with the completion events observed on the
/// configured topic.
pub struct CompletionCorrelator {
    tasks: Arc<dyn TaskSubmissionClient>,
    bus: Arc<dyn EventBusClient>,
    topic: String,
}

impl CompletionCorrelator {
    /// Create a correlator over an already-connected bus. The bus connection
    /// stays owned by the caller; the correlator never closes it.
    pub fn new(
        tasks: Arc<dyn TaskSubmissionClient>,
        bus: Arc<dyn EventBusClient>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            tasks,
            bus,
            topic: topic.into(),
        }
    }

    /// Topic this correlator listens on.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Run `task` to a verified completion within `timeout`.
    ///
    /// Succeeds only if the service reports the task complete with no errors
    /// *and* a `FINISHED` event arrives on the topic before the deadline; a
    /// task that "completes" without ever producing its output record fails
    /// with [`RigError::CorrelationTimeout`]. On success, returns every
    /// message observed on the topic during the call, grouped by status.
    ///
    /// The exclusive borrow encodes the one-run-per-instance contract.
    /// Failure is fatal to the call: there is no internal retry, and a timeout
    /// does not cancel the remote task.
    pub async fn run(&mut self, task: &TaskRequest, timeout: Duration) -> RigResult<EventLog> {
        let (watcher, signal) = CompletionWatcher::pair();
        let watcher = Arc::new(watcher);
        let aggregator = Arc::new(EventAggregator::new());

        // One handler, registered before the task is submitted; the bus does
        // not replay messages published before a subscription. Recording
        // before observing keeps the terminal message in the snapshot taken
        // the moment the signal resolves.
        let handler: MessageHandler = {
            let watcher = Arc::clone(&watcher);
            let aggregator = Arc::clone(&aggregator);
            Arc::new(move |message| {
                aggregator.record(&message);
                watcher.observe(&message);
            })
        };
        self.bus.subscribe(&self.topic, handler).await?;
        debug!(topic = %self.topic, "handler registered");

        let handle = self.tasks.submit(task).await?;
        info!(plan = %task.name, %handle, "task submitted");

        let record = self.tasks.status(handle).await?;
        if !record.complete || !record.errors.is_empty() {
            return Err(RigError::TaskExecution {
                errors: record.errors,
            });
        }
        debug!(%handle, "task reported complete with no errors");

        let finished = signal.wait(timeout).await?;
        info!(plan = %task.name, payload_keys = finished.payload.len(), "terminal event observed");

        Ok(aggregator.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use crate::plans;
    use crate::testing::{InMemoryBroker, ScriptedTaskClient};
    use serde_json::json;

    const TOPIC: &str = "gda.messages.scan";

    fn correlator(
        tasks: ScriptedTaskClient,
        broker: &Arc<InMemoryBroker>,
    ) -> CompletionCorrelator {
        CompletionCorrelator::new(
            Arc::new(tasks),
            Arc::clone(broker) as Arc<dyn EventBusClient>,
            TOPIC,
        )
    }

    #[tokio::test]
    async fn successful_run_returns_full_event_log() {
        let broker = Arc::new(InMemoryBroker::new());
        let publisher = Arc::clone(&broker);
        let tasks = ScriptedTaskClient::completing().on_submit(move || {
            publisher.publish(Message::new(TOPIC, "STARTED"));
            publisher.publish(
                Message::new(TOPIC, "FINISHED").with_payload(
                    json!({"scanDimensions": [1]})
                        .as_object()
                        .cloned()
                        .unwrap_or_default(),
                ),
            );
        });

        let mut correlator = correlator(tasks, &broker);
        let log = correlator
            .run(
                &plans::count("cm40661-1", &["d1"], 5),
                Duration::from_secs(10),
            )
            .await
            .expect("run should succeed");

        assert_eq!(log.bucket("STARTED").len(), 1);
        assert_eq!(log.bucket("FINISHED").len(), 1);
        assert_eq!(log.bucket("FINISHED")[0]["scanDimensions"], json!([1]));
    }

    #[tokio::test]
    async fn task_errors_dominate_even_with_finished_event() {
        let broker = Arc::new(InMemoryBroker::new());
        let publisher = Arc::clone(&broker);
        let tasks = ScriptedTaskClient::with_errors(vec!["detector fault".into()])
            .on_submit(move || publisher.publish(Message::new(TOPIC, "FINISHED")));

        let mut correlator = correlator(tasks, &broker);
        let err = correlator
            .run(&plans::snapshot("cm40661-1"), Duration::from_secs(10))
            .await
            .expect_err("task errors must fail the run");

        assert!(matches!(
            err,
            RigError::TaskExecution { errors } if errors == vec!["detector fault".to_string()]
        ));
    }

    #[tokio::test]
    async fn incomplete_task_fails_as_task_execution() {
        let broker = Arc::new(InMemoryBroker::new());
        let tasks = ScriptedTaskClient::incomplete();

        let mut correlator = correlator(tasks, &broker);
        let err = correlator
            .run(&plans::snapshot("cm40661-1"), Duration::from_secs(10))
            .await
            .expect_err("incomplete task must fail the run");

        assert!(matches!(err, RigError::TaskExecution { errors } if errors.is_empty()));
    }

    #[tokio::test]
    async fn submission_rejection_propagates() {
        let broker = Arc::new(InMemoryBroker::new());
        let tasks = ScriptedTaskClient::rejecting("no such plan");

        let mut correlator = correlator(tasks, &broker);
        let err = correlator
            .run(&plans::snapshot("cm40661-1"), Duration::from_secs(10))
            .await
            .expect_err("rejected submission must fail the run");

        assert!(matches!(err, RigError::Submission(reason) if reason == "no such plan"));
    }

    #[tokio::test]
    async fn failed_subscription_propagates() {
        let broker = Arc::new(InMemoryBroker::refusing("broker unreachable"));
        let tasks = ScriptedTaskClient::completing();

        let mut correlator = correlator(tasks, &broker);
        let err = correlator
            .run(&plans::snapshot("cm40661-1"), Duration::from_secs(10))
            .await
            .expect_err("subscribe failure must fail the run");

        assert!(matches!(err, RigError::BusConnection(_)));
    }
}
