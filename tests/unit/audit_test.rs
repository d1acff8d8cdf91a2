//! Tests for audit sink

use prometheus_request_gate::core::{AuditAction, AuditSink, InMemoryAuditSink, build_audit_event};
use uuid::Uuid;

#[test]
fn test_in_memory_audit_sink() {
    let sink = InMemoryAuditSink::new(10);
    let scheduler_id = Uuid::new_v4();

    sink.record(build_audit_event(scheduler_id, Some(1), AuditAction::Dispatched, None, 1));
    assert_eq!(sink.events().len(), 1);

    let events = sink.events();
    assert_eq!(events[0].scheduler_id, scheduler_id);
    assert_eq!(events[0].request_id, Some(1));
    assert_eq!(events[0].action, AuditAction::Dispatched);
    assert_eq!(events[0].in_flight, 1);
}

#[test]
fn test_audit_sink_overflow() {
    let sink = InMemoryAuditSink::new(2);
    let id = Uuid::new_v4();

    sink.record(build_audit_event(id, Some(1), AuditAction::Dispatched, None, 1));
    sink.record(build_audit_event(id, Some(2), AuditAction::Queued { index: 0 }, Some(5), 1));
    sink.record(build_audit_event(id, Some(1), AuditAction::Completed, None, 0));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].request_id, Some(2)); // First one popped
    assert_eq!(events[1].action, AuditAction::Completed);
}

#[test]
fn test_zero_capacity_sink_keeps_nothing() {
    let sink = InMemoryAuditSink::new(0);
    let id = Uuid::new_v4();

    sink.record(build_audit_event(id, Some(1), AuditAction::Dispatched, None, 1));
    sink.record(build_audit_event(id, Some(1), AuditAction::Completed, None, 0));

    assert!(sink.events().is_empty());
    assert!(sink.dispatch_order().is_empty());
}

#[test]
fn test_clones_share_buffer() {
    let sink = InMemoryAuditSink::new(4);
    let view = sink.clone();
    sink.record(build_audit_event(Uuid::new_v4(), Some(7), AuditAction::Released, Some(3), 2));
    assert_eq!(view.dispatch_order(), vec![7]);
}

#[test]
fn test_dispatch_order_skips_queue_and_completion_events() {
    let sink = InMemoryAuditSink::new(16);
    let id = Uuid::new_v4();
    sink.record(build_audit_event(id, Some(1), AuditAction::Dispatched, None, 1));
    sink.record(build_audit_event(id, Some(2), AuditAction::Queued { index: 0 }, Some(5), 1));
    sink.record(build_audit_event(id, Some(3), AuditAction::Expedited, Some(0), 2));
    sink.record(build_audit_event(id, Some(1), AuditAction::Completed, None, 1));
    sink.record(build_audit_event(id, Some(2), AuditAction::Released, Some(5), 2));
    sink.record(build_audit_event(id, Some(4), AuditAction::Bypassed, None, 3));
    assert_eq!(sink.dispatch_order(), vec![1, 3, 2, 4]);
}

#[test]
fn test_build_audit_event() {
    let event = build_audit_event(Uuid::nil(), None, AuditAction::Completed, None, 0);
    assert_eq!(event.request_id, None);
    assert_eq!(event.action.as_str(), "completed");
    assert!(event.created_at_ms > 0);
}
