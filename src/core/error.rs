//! Error types for scheduler operations.

use thiserror::Error;

/// Usage faults and invariant violations raised by the scheduler itself.
///
/// Transport outcomes never surface here; they reach the caller's handlers untouched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    /// A result proxy was bound to a second real handle.
    #[error("result proxy already bound")]
    ProxyAlreadyBound,
    /// Pull-next ran against an empty waiting queue.
    #[error("waiting queue is empty")]
    QueueEmpty,
    /// A completion arrived while no request was in flight.
    #[error("completion reported with nothing in flight")]
    NothingInFlight,
    /// Configuration failed validation.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Failure delivered by handles produced through the async runtime adapter.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError<E> {
    /// The request executor returned an error.
    #[error("request failed: {0}")]
    Failed(E),
    /// The request was aborted before it completed.
    #[error("request aborted: {0}")]
    Aborted(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
