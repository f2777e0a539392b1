//! Custom error types for the scan rig.
//!
//! This module defines the primary error type, `RigError`, using the `thiserror`
//! crate. Every way a correlated run can fail surfaces here as a distinct, typed
//! variant — never downgraded to a log line — because the crate exists to provide
//! a trustworthy pass/fail verdict:
//!
//! - **`Submission`**: the execution service rejected the task at submit time
//!   (malformed request, unreachable service). Not retried here.
//! - **`TaskExecution`**: the service reported the task incomplete, or complete
//!   with recorded errors. Carries the service's error list verbatim.
//! - **`CorrelationTimeout`**: no `FINISHED` event was observed on the bus within
//!   the caller's timeout, regardless of what the status query said.
//! - **`BusConnection`**: subscribe/connect failure at the transport layer.
//! - **`Config`** / **`ConfigValidation`**: configuration file and semantic
//!   validation failures, mirroring how the rest of the stack reports them.

use std::time::Duration;
use thiserror::Error;

/// Convenience alias for results using the rig error type.
pub type RigResult<T> = std::result::Result<T, RigError>;

#[derive(Error, Debug)]
pub enum RigError {
    #[error("Task submission rejected: {0}")]
    Submission(String),

    #[error("{}", task_execution_message(.errors))]
    TaskExecution { errors: Vec<String> },

    #[error("No FINISHED event observed within {waited:?}")]
    CorrelationTimeout { waited: Duration },

    #[error("Bus connection error: {0}")]
    BusConnection(String),

    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("Configuration validation error: {0}")]
    ConfigValidation(String),
}

fn task_execution_message(errors: &[String]) -> String {
    if errors.is_empty() {
        "Task did not run to completion".to_string()
    } else {
        format!("Task completed with errors: {}", errors.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_execution_display_includes_errors_verbatim() {
        let err = RigError::TaskExecution {
            errors: vec!["detector fault".into(), "stage overrun".into()],
        };
        let rendered = err.to_string();
        assert!(rendered.contains("detector fault"));
        assert!(rendered.contains("stage overrun"));
    }

    #[test]
    fn incomplete_task_display_has_no_dangling_separator() {
        let err = RigError::TaskExecution { errors: vec![] };
        assert_eq!(err.to_string(), "Task did not run to completion");
    }

    #[test]
    fn timeout_display_reports_wait_duration() {
        let err = RigError::CorrelationTimeout {
            waited: Duration::from_secs(10),
        };
        assert!(err.to_string().contains("10s"));
    }
}
