//! Tests for error types

use prometheus_request_gate::core::{RequestError, SchedulerError};

#[test]
fn test_proxy_already_bound_error() {
    let err = SchedulerError::ProxyAlreadyBound;
    assert_eq!(format!("{}", err), "result proxy already bound");
}

#[test]
fn test_queue_empty_error() {
    let err = SchedulerError::QueueEmpty;
    assert_eq!(format!("{}", err), "waiting queue is empty");
}

#[test]
fn test_nothing_in_flight_error() {
    let err = SchedulerError::NothingInFlight;
    assert_eq!(format!("{}", err), "completion reported with nothing in flight");
}

#[test]
fn test_invalid_config_error() {
    let err = SchedulerError::InvalidConfig("empty category".to_string());
    assert_eq!(format!("{}", err), "invalid config: empty category");
}

#[test]
fn test_request_error_display() {
    let failed: RequestError<String> = RequestError::Failed("503".to_string());
    assert_eq!(format!("{}", failed), "request failed: 503");

    let aborted: RequestError<String> = RequestError::Aborted("user".to_string());
    assert_eq!(format!("{}", aborted), "request aborted: user");
}
