//! Admission control and dispatch.
//!
//! The [`Scheduler`] sits in front of a [`Transport`] and bounds how many requests
//! are in flight at once. Each new request either goes straight to the transport
//! or waits in a priority queue behind a [`ResultProxy`]; each completion frees a
//! slot and releases the most urgent waiting request.
//!
//! All bookkeeping (in-flight count and queue) happens under one mutex that is
//! never held while calling the transport or caller handlers, so transports that
//! settle synchronously and handlers that submit new requests are both safe.
//!
//! Releases run in a loop owned by a single drainer. A completion that fires
//! while the queue is being drained (on any thread, including synchronously from
//! inside the transport) only frees its slot; the drainer picks the slack up on
//! its next iteration, so stack depth stays constant however long the queue is.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::SchedulerConfig;
use crate::core::audit::{build_audit_event, AuditAction, AuditSink};
use crate::core::error::SchedulerError;
use crate::core::handle::{RequestHandle, ResultHandle};
use crate::core::proxy::{ResultProxy, Settlement};
use crate::core::request::{Priority, RequestDescriptor, RequestId, EXPEDITED};
use crate::core::transport::Transport;
use crate::infra::queue::{Prioritized, PriorityQueue};

/// Point-in-time view of a scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerSnapshot {
    /// Scheduler identifier.
    pub id: Uuid,
    /// Requests dispatched and not yet completed.
    pub in_flight: usize,
    /// Requests waiting for a slot.
    pub queued: usize,
    /// Current concurrency ceiling.
    pub max_connections: usize,
    /// Priorities of waiting requests in dispatch order.
    pub queued_priorities: Vec<Priority>,
}

struct QueuedEntry<P, H: ResultHandle> {
    id: RequestId,
    priority: Priority,
    request: RequestDescriptor<P>,
    proxy: ResultProxy<H>,
}

impl<P, H: ResultHandle> Prioritized for QueuedEntry<P, H> {
    fn priority(&self) -> Priority {
        self.priority
    }
}

struct SchedulerState<P, H: ResultHandle> {
    in_flight: usize,
    queue: PriorityQueue<QueuedEntry<P, H>>,
    draining: bool,
}

impl<P, H: ResultHandle> SchedulerState<P, H> {
    /// Reserve a slot for the head of the queue and take it.
    fn pull_next(&mut self) -> Result<QueuedEntry<P, H>, SchedulerError> {
        let entry = self.queue.pop_front().ok_or(SchedulerError::QueueEmpty)?;
        self.in_flight += 1;
        Ok(entry)
    }

    /// Whether the head of the queue may leave now. A zero in-flight count always
    /// qualifies, so a zero ceiling drains one request at a time.
    fn can_release(&self, max_connections: usize) -> bool {
        !self.queue.is_empty() && (self.in_flight < max_connections || self.in_flight == 0)
    }

    fn release(&mut self) -> Result<(), SchedulerError> {
        self.in_flight = self
            .in_flight
            .checked_sub(1)
            .ok_or(SchedulerError::NothingInFlight)?;
        Ok(())
    }
}

/// Hands the drain back if a launch unwinds, so the queue does not stall.
struct DrainGuard<'a, P, H: ResultHandle> {
    state: &'a Mutex<SchedulerState<P, H>>,
}

impl<P, H: ResultHandle> Drop for DrainGuard<'_, P, H> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.state.lock().draining = false;
        }
    }
}

enum Admission<P, H: ResultHandle> {
    Immediate {
        request: RequestDescriptor<P>,
        action: AuditAction,
        in_flight: usize,
    },
    Queued {
        proxy: ResultProxy<H>,
        index: usize,
        priority: Priority,
        in_flight: usize,
    },
}

struct SchedulerInner<P, T: Transport<P>> {
    id: Uuid,
    config: RwLock<SchedulerConfig>,
    state: Mutex<SchedulerState<P, T::Handle>>,
    transport: T,
    audit: Option<Arc<dyn AuditSink>>,
    next_request: AtomicU64,
}

/// Priority-aware admission controller and dispatcher in front of a transport.
///
/// Cloning is cheap and yields another handle to the same scheduler. Independent
/// schedulers share nothing.
pub struct Scheduler<P, T: Transport<P>> {
    inner: Arc<SchedulerInner<P, T>>,
}

impl<P, T: Transport<P>> Clone for Scheduler<P, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P, T> fmt::Debug for Scheduler<P, T>
where
    P: Send + 'static,
    T: Transport<P>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("Scheduler")
            .field("id", &snapshot.id)
            .field("in_flight", &snapshot.in_flight)
            .field("queued", &snapshot.queued)
            .field("max_connections", &snapshot.max_connections)
            .finish()
    }
}

impl<P, T> Scheduler<P, T>
where
    P: Send + 'static,
    T: Transport<P>,
{
    /// Create a scheduler in front of `transport`.
    pub fn new(config: SchedulerConfig, transport: T) -> Self {
        Self::from_parts(config, transport, None)
    }

    pub(crate) fn from_parts(
        config: SchedulerConfig,
        transport: T,
        audit: Option<Arc<dyn AuditSink>>,
    ) -> Self {
        let id = Uuid::new_v4();
        tracing::debug!(scheduler = %id, max_connections = config.max_connections, "scheduler created");
        Self {
            inner: Arc::new(SchedulerInner {
                id,
                config: RwLock::new(config),
                state: Mutex::new(SchedulerState {
                    in_flight: 0,
                    queue: PriorityQueue::new(),
                    draining: false,
                }),
                transport,
                audit,
                next_request: AtomicU64::new(1),
            }),
        }
    }

    /// Scheduler identifier, attached to every log event and audit record.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// The wrapped transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    /// Copy of the current configuration.
    #[must_use]
    pub fn config(&self) -> SchedulerConfig {
        self.inner.config.read().clone()
    }

    /// Mutate the configuration in place. Takes effect on the next decision.
    pub fn update_config<F>(&self, update: F)
    where
        F: FnOnce(&mut SchedulerConfig),
    {
        update(&mut self.inner.config.write());
    }

    /// Change the concurrency ceiling. Requests already in flight are unaffected.
    pub fn set_max_connections(&self, max_connections: usize) {
        self.update_config(|cfg| cfg.max_connections = max_connections);
    }

    /// Requests dispatched and not yet completed.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.inner.state.lock().in_flight
    }

    /// Requests waiting for a slot.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.inner.state.lock().queue.len()
    }

    /// Point-in-time view of counters and queue order.
    #[must_use]
    pub fn snapshot(&self) -> SchedulerSnapshot {
        let max_connections = self.inner.config.read().max_connections;
        let state = self.inner.state.lock();
        SchedulerSnapshot {
            id: self.inner.id,
            in_flight: state.in_flight,
            queued: state.queue.len(),
            max_connections,
            queued_priorities: state.queue.priorities(),
        }
    }

    /// Submit a request.
    ///
    /// Returns the transport's own handle when the request is sent right away, or
    /// a proxy when it has to wait; both expose the same [`ResultHandle`] surface.
    pub fn request(&self, request: RequestDescriptor<P>) -> RequestHandle<T::Handle> {
        let id = self.inner.next_request.fetch_add(1, Ordering::Relaxed);
        let (admission, debug) = {
            let config = self.inner.config.read();
            let mut state = self.inner.state.lock();
            (Self::admit(&config, &mut state, id, request), config.debug)
        };

        match admission {
            Admission::Immediate {
                request,
                action,
                in_flight,
            } => {
                if debug {
                    tracing::debug!(
                        scheduler = %self.inner.id,
                        request = id,
                        url = %request.url,
                        action = action.as_str(),
                        in_flight,
                        "request executed immediately"
                    );
                }
                self.record(Some(id), action, request.priority, in_flight);
                let handle = self.inner.transport.dispatch(request);
                self.watch_completion(&handle, id);
                RequestHandle::Dispatched(handle)
            }
            Admission::Queued {
                proxy,
                index,
                priority,
                in_flight,
            } => {
                if debug {
                    tracing::debug!(
                        scheduler = %self.inner.id,
                        request = id,
                        priority,
                        index,
                        "added to queue"
                    );
                }
                self.record(Some(id), AuditAction::Queued { index }, Some(priority), in_flight);
                // Only does anything with nothing in flight (a zero ceiling); otherwise
                // no completion would ever come to release the queue.
                self.drain();
                RequestHandle::Queued(proxy)
            }
        }
    }

    /// Submit a request to `url`, overriding the descriptor's address.
    pub fn request_to(
        &self,
        url: impl Into<String>,
        mut request: RequestDescriptor<P>,
    ) -> RequestHandle<T::Handle> {
        request.url = url.into();
        self.request(request)
    }

    /// Submit a request to `url` with default parameters.
    pub fn request_url(&self, url: impl Into<String>) -> RequestHandle<T::Handle>
    where
        P: Default,
    {
        self.request(RequestDescriptor::get(url))
    }

    /// Decide between immediate dispatch and queueing. Runs under both locks.
    fn admit(
        config: &SchedulerConfig,
        state: &mut SchedulerState<P, T::Handle>,
        id: RequestId,
        request: RequestDescriptor<P>,
    ) -> Admission<P, T::Handle> {
        let has_capacity = state.in_flight < config.max_connections;
        if has_capacity || request.is_bypass() {
            state.in_flight += 1;
            return Admission::Immediate {
                request,
                action: if has_capacity {
                    AuditAction::Dispatched
                } else {
                    AuditAction::Bypassed
                },
                in_flight: state.in_flight,
            };
        }

        let request = request.resolved(config);
        let priority = request.priority.unwrap_or(config.default_priority);
        if priority == EXPEDITED {
            state.in_flight += 1;
            return Admission::Immediate {
                request,
                action: AuditAction::Expedited,
                in_flight: state.in_flight,
            };
        }

        let proxy = ResultProxy::new(id);
        let index = state.queue.insertion_index(priority);
        state.queue.insert(
            index,
            QueuedEntry {
                id,
                priority,
                request,
                proxy: proxy.clone(),
            },
        );
        Admission::Queued {
            proxy,
            index,
            priority,
            in_flight: state.in_flight,
        }
    }

    /// Release queued requests while capacity allows.
    ///
    /// Only one caller drains at a time; a nested or concurrent call returns at
    /// once and leaves the work to the active drainer, which re-checks capacity
    /// after every launch.
    fn drain(&self) {
        {
            let mut state = self.inner.state.lock();
            if state.draining {
                return;
            }
            state.draining = true;
        }
        let _guard = DrainGuard {
            state: &self.inner.state,
        };

        loop {
            let (max_connections, debug) = {
                let config = self.inner.config.read();
                (config.max_connections, config.debug)
            };
            let (entry, in_flight) = {
                let mut state = self.inner.state.lock();
                if !state.can_release(max_connections) {
                    state.draining = false;
                    return;
                }
                match state.pull_next() {
                    Ok(entry) => (entry, state.in_flight),
                    Err(err) => {
                        tracing::error!(scheduler = %self.inner.id, error = %err, "queue release failed");
                        state.draining = false;
                        return;
                    }
                }
            };
            self.launch(entry, in_flight, debug);
        }
    }

    /// Send a dequeued entry and bind its proxy to the live handle.
    fn launch(&self, entry: QueuedEntry<P, T::Handle>, in_flight: usize, debug: bool) {
        let QueuedEntry {
            id,
            priority,
            request,
            proxy,
        } = entry;

        if debug {
            tracing::debug!(
                scheduler = %self.inner.id,
                request = id,
                priority,
                url = %request.url,
                "released from queue"
            );
        }
        self.record(Some(id), AuditAction::Released, Some(priority), in_flight);

        let handle = self.inner.transport.dispatch(request);
        self.watch_completion(&handle, id);

        let resolved = proxy.clone();
        let rejected = proxy.clone();
        handle
            .done(move |_| resolved.settle(Settlement::Resolved))
            .fail(move |_| rejected.settle(Settlement::Rejected));

        if let Err(err) = proxy.bind(handle) {
            tracing::error!(scheduler = %self.inner.id, request = id, error = %err, "proxy bind failed");
        }
    }

    /// Arrange for the completion step to run when `handle` settles either way.
    fn watch_completion(&self, handle: &T::Handle, id: RequestId) {
        let scheduler: Weak<SchedulerInner<P, T>> = Arc::downgrade(&self.inner);
        handle.always(move |_| {
            if let Some(inner) = scheduler.upgrade() {
                Self { inner }.on_complete(id);
            }
        });
    }

    /// Free the slot held by `id` and release the next waiting request if allowed.
    fn on_complete(&self, id: RequestId) {
        let in_flight = {
            let mut state = self.inner.state.lock();
            if let Err(err) = state.release() {
                tracing::error!(scheduler = %self.inner.id, request = id, error = %err, "completion accounting");
            }
            state.in_flight
        };

        if self.inner.config.read().debug {
            tracing::debug!(
                scheduler = %self.inner.id,
                request = id,
                in_flight,
                "request completed"
            );
        }
        self.record(Some(id), AuditAction::Completed, None, in_flight);
        self.drain();
    }

    fn record(
        &self,
        request_id: Option<RequestId>,
        action: AuditAction,
        priority: Option<Priority>,
        in_flight: usize,
    ) {
        if let Some(audit) = &self.inner.audit {
            audit.record(build_audit_event(
                self.inner.id,
                request_id,
                action,
                priority,
                in_flight,
            ));
        }
    }
}
