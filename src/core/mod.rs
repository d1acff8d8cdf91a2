//! Core scheduling abstractions: handles, proxies, admission control and dispatch.

pub mod audit;
pub mod callback;
pub mod error;
pub mod executor;
pub mod handle;
pub mod proxy;
pub mod request;
pub mod scheduler;
pub mod transport;

pub use audit::{AuditAction, AuditEvent, AuditSink, InMemoryAuditSink, build_audit_event};
pub use callback::CallbackHandle;
pub use error::{AppResult, RequestError, SchedulerError};
pub use executor::{RequestExecutor, Spawn};
pub use handle::{RequestHandle, ResultHandle};
pub use proxy::{ResultProxy, Settlement};
pub use request::{Priority, RequestDescriptor, RequestId, resolve_priority};
pub use scheduler::{Scheduler, SchedulerSnapshot};
pub use transport::Transport;
