//! Audit trail of admission decisions.
//!
//! Every decision the scheduler makes about a request is reported to an optional
//! [`AuditSink`]. The in-memory sink keeps a bounded window and is mostly useful
//! for tests and debugging dashboards.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::core::request::{Priority, RequestId};
use crate::util::clock::now_ms;

/// What happened to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    /// Sent at once because a slot was free.
    Dispatched,
    /// Sent at once because of a pre-send hook or synchronous flag.
    Bypassed,
    /// Sent at once because its priority resolved to zero.
    Expedited,
    /// Placed in the waiting queue at `index`.
    Queued {
        /// Position at insertion time.
        index: usize,
    },
    /// Taken off the waiting queue and sent.
    Released,
    /// The transport reported an outcome.
    Completed,
}

impl AuditAction {
    /// Short label used in logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Dispatched => "dispatched",
            Self::Bypassed => "bypassed",
            Self::Expedited => "expedited",
            Self::Queued { .. } => "queued",
            Self::Released => "released",
            Self::Completed => "completed",
        }
    }
}

/// Audit event structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Scheduler that made the decision.
    pub scheduler_id: Uuid,
    /// Request concerned. `None` for completions of requests the scheduler did not track.
    pub request_id: Option<RequestId>,
    /// Decision taken.
    pub action: AuditAction,
    /// Resolved priority, when one was resolved.
    pub priority: Option<Priority>,
    /// In-flight count right after the decision.
    pub in_flight: usize,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
}

/// Audit sink abstraction.
pub trait AuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: AuditEvent);
}

/// In-memory audit sink for testing and dev. Clones share the same buffer.
#[derive(Clone)]
pub struct InMemoryAuditSink {
    events: Arc<Mutex<VecDeque<AuditEvent>>>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer. A bound of 0 keeps nothing.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(max_events.min(1024)))),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Request ids in the order they were sent to the transport.
    #[must_use]
    pub fn dispatch_order(&self) -> Vec<RequestId> {
        self.events
            .lock()
            .iter()
            .filter(|e| {
                matches!(
                    e.action,
                    AuditAction::Dispatched
                        | AuditAction::Bypassed
                        | AuditAction::Expedited
                        | AuditAction::Released
                )
            })
            .filter_map(|e| e.request_id)
            .collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        if self.max_events == 0 {
            return;
        }
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// Helper to build an audit event stamped with the current time.
#[must_use]
pub fn build_audit_event(
    scheduler_id: Uuid,
    request_id: Option<RequestId>,
    action: AuditAction,
    priority: Option<Priority>,
    in_flight: usize,
) -> AuditEvent {
    AuditEvent {
        scheduler_id,
        request_id,
        action,
        priority,
        in_flight,
        created_at_ms: now_ms(),
    }
}
