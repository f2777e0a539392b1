//! Request constructors for the well-known acquisition plans.
//!
//! The plans themselves live in the remote execution service; these helpers
//! only build the [`TaskRequest`] values that invoke them with the parameter
//! shapes the service expects.

use serde_json::json;

use crate::submission::TaskRequest;

/// Capture a single snapshot of the current beamline state on every detector.
pub fn snapshot(instrument_session: &str) -> TaskRequest {
    TaskRequest::new("snapshot", instrument_session)
}

/// Run the spectroscopy plan with its server-side defaults.
pub fn spectroscopy(instrument_session: &str) -> TaskRequest {
    TaskRequest::new("spectroscopy", instrument_session)
}

/// Take `num` readings from the named detectors.
pub fn count(instrument_session: &str, detectors: &[&str], num: u64) -> TaskRequest {
    TaskRequest::new("count", instrument_session)
        .with_param("detectors", json!(detectors))
        .with_param("num", json!(num))
}
