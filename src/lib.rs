//! # Scan-Rig Core Library
//!
//! This crate is the core library for the `scan-rig` commissioning tool. It submits
//! acquisition plans to a remote plan-execution service and correlates each submission
//! with the completion events observed on a message bus, producing a single race-free
//! pass/fail verdict per run. The service and the bus transport themselves are external
//! collaborators consumed behind traits; this crate owns only the correlation logic.
//!
//! ## Crate Structure
//!
//! The library is organized into several modules, each with a distinct responsibility:
//!
//! - **`aggregator`**: Thread-safe accumulation of bus messages grouped by status tag.
//! - **`bus`**: The `EventBusClient` trait consumed for topic subscriptions.
//! - **`config`**: Figment-based configuration loading and validation. See
//!   [`config::RigConfig`].
//! - **`correlator`**: The [`correlator::CompletionCorrelator`], which runs one plan to a
//!   verified, artifact-confirmed completion within a caller-supplied timeout.
//! - **`error`**: The [`error::RigError`] enum for centralized error handling.
//! - **`logging`**: Structured tracing initialization (`tracing` + `tracing-subscriber`).
//! - **`message`**: The wire-level [`message::Message`] record and the per-run
//!   [`message::EventLog`].
//! - **`plans`**: Request constructors for the well-known acquisition plans.
//! - **`submission`**: The task model and the `TaskSubmissionClient` trait.
//! - **`testing`**: In-memory doubles for the bus and the submission service, used by
//!   the integration tests and the demo binary.
//! - **`watcher`**: One-shot detection of the terminal `FINISHED` event.

pub mod aggregator;
pub mod bus;
pub mod config;
pub mod correlator;
pub mod error;
pub mod logging;
pub mod message;
pub mod plans;
pub mod submission;
pub mod testing;
pub mod watcher;
