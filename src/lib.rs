//! # Prometheus Request Gate
//!
//! Priority-ordered admission control in front of an asynchronous request function.
//!
//! Browsers and HTTP clients cap the number of simultaneous connections to a host;
//! once the cap is reached, requests leave in whatever order the client happens to
//! pick. This crate puts a scheduler in front of the request function so that the
//! cap is enforced by the application and waiting requests leave strictly by
//! priority.
//!
//! ## How it works
//!
//! - **Admission**: a request is sent immediately while fewer than
//!   `max_connections` requests are in flight. Requests with a pre-send hook, the
//!   synchronous flag, or a resolved priority of `0` are always sent immediately.
//! - **Queueing**: everything else waits in a queue sorted by ascending priority,
//!   first-come first-served within a priority.
//! - **Release**: each completion, success or failure, frees a slot and sends the
//!   head of the queue.
//! - **Proxies**: a waiting request is represented by a [`core::ResultProxy`] that
//!   records `done`/`fail`/`always`/... calls and replays them onto the real handle
//!   once the request is sent.
//!
//! Priorities come from the request itself, from a category (data type) table, or
//! from the configured default.
//!
//! ```rust,ignore
//! use prometheus_request_gate::builders::SchedulerBuilder;
//! use prometheus_request_gate::core::{RequestDescriptor, ResultHandle};
//! use prometheus_request_gate::runtime::FutureTransport;
//!
//! let transport = FutureTransport::on_current_runtime(HttpExecutor::default())?;
//! let scheduler = SchedulerBuilder::new(transport).max_connections(4).build()?;
//!
//! scheduler
//!     .request(RequestDescriptor::new("/api/items", ()).with_category("json"))
//!     .done(|body| println!("{body}"))
//!     .fail(|err| eprintln!("{err}"));
//! ```
//!
//! For complete examples, see:
//! - `tests/admission_test.rs` - Admission and ordering scenarios
//! - `tests/runtime_test.rs` - Tokio-backed transport

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling abstractions and capacity accounting.
pub mod core;
/// Configuration models for the scheduler.
pub mod config;
/// Builders to construct schedulers from configuration.
pub mod builders;
/// Infrastructure: the waiting queue.
pub mod infra;
/// Tokio runtime adapter.
#[cfg(feature = "tokio-runtime")]
pub mod runtime;
/// Shared utilities.
pub mod util;
