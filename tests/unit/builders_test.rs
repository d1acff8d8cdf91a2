//! Tests for builder modules

use prometheus_request_gate::builders::SchedulerBuilder;
use prometheus_request_gate::config::SchedulerConfig;
use prometheus_request_gate::core::{
    CallbackHandle, InMemoryAuditSink, RequestDescriptor, Scheduler, SchedulerError,
};

type Handle = CallbackHandle<(), ()>;
type Transport = fn(RequestDescriptor<()>) -> Handle;

fn transport() -> Transport {
    |_| CallbackHandle::new()
}

#[test]
fn test_scheduler_builder_defaults() {
    let builder = SchedulerBuilder::new(transport());
    assert_eq!(builder.current_config(), &SchedulerConfig::default());
}

#[test]
fn test_scheduler_builder_overrides() {
    let scheduler: Scheduler<(), Transport> = SchedulerBuilder::new(transport())
        .max_connections(2)
        .default_priority(7)
        .category("csv", 3)
        .debug(false)
        .build()
        .expect("valid config");

    let config = scheduler.config();
    assert_eq!(config.max_connections, 2);
    assert_eq!(config.default_priority, 7);
    assert_eq!(config.category("csv"), Some(3));
    assert!(!config.debug);
}

#[test]
fn test_scheduler_builder_rejects_invalid_config() {
    let result: Result<Scheduler<(), Transport>, _> =
        SchedulerBuilder::new(transport()).category("", 1).build();
    assert!(matches!(result, Err(SchedulerError::InvalidConfig(_))));
}

#[test]
fn test_scheduler_builder_wires_audit_sink() {
    let sink = InMemoryAuditSink::new(16);
    let scheduler: Scheduler<(), Transport> = SchedulerBuilder::new(transport())
        .config(SchedulerConfig::default().with_max_connections(1))
        .audit(sink.clone())
        .build()
        .expect("valid config");

    let _ = scheduler.request(RequestDescriptor::new("/a", ()));
    let _ = scheduler.request(RequestDescriptor::new("/b", ()));

    let actions: Vec<&str> = sink.events().iter().map(|e| e.action.as_str()).collect();
    assert_eq!(actions, vec!["dispatched", "queued"]);
    assert!(sink.events().iter().all(|e| e.scheduler_id == scheduler.id()));
}
