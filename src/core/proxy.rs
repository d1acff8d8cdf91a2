//! Result proxy: a stand-in handle for requests still waiting in the queue.
//!
//! A proxy starts `Unbound`, recording every call made on it. When the dispatcher
//! sends the request it binds the proxy to the transport's real handle, which
//! replays the recorded calls in their original order. From then on every call is
//! forwarded straight to the real handle.
//!
//! Calls that only make sense on a live request (`abort`, header reads) are
//! recorded like any other call; an abort issued while queued therefore reaches
//! the transport only after the request has been sent.
//!
//! No proxy lock is held while a call runs against the real handle. Calls that
//! arrive during the replay are appended to the batch still being replayed.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::core::error::SchedulerError;
use crate::core::handle::{
    CompleteCallback, FailureCallback, ProgressCallback, ResultHandle, SuccessCallback,
};
use crate::core::request::RequestId;

/// Outcome of the deferred result behind a proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// No outcome yet.
    Pending,
    /// The real request succeeded.
    Resolved,
    /// The real request failed.
    Rejected,
}

enum BufferedCall<T, E> {
    Done(SuccessCallback<T>),
    Fail(FailureCallback<E>),
    Always(CompleteCallback<T, E>),
    Progress(ProgressCallback),
    Abort(String),
    SetRequestHeader(String, String),
    OverrideMimeType(String),
    ResponseHeader(String),
    AllResponseHeaders,
}

impl<T, E> BufferedCall<T, E>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    fn replay<H>(self, handle: &H)
    where
        H: ResultHandle<Output = T, Error = E>,
    {
        match self {
            Self::Done(handler) => {
                handle.done(handler);
            }
            Self::Fail(handler) => {
                handle.fail(handler);
            }
            Self::Always(handler) => {
                handle.always(handler);
            }
            Self::Progress(handler) => {
                handle.progress(handler);
            }
            Self::Abort(reason) => {
                handle.abort(&reason);
            }
            Self::SetRequestHeader(name, value) => {
                handle.set_request_header(&name, &value);
            }
            Self::OverrideMimeType(mime) => {
                handle.override_mime_type(&mime);
            }
            Self::ResponseHeader(name) => {
                let _ = handle.response_header(&name);
            }
            Self::AllResponseHeaders => {
                let _ = handle.all_response_headers();
            }
        }
    }
}

type CallBatch<H> = Vec<BufferedCall<<H as ResultHandle>::Output, <H as ResultHandle>::Error>>;

enum ProxyState<H: ResultHandle> {
    Unbound { calls: CallBatch<H> },
    // Handle attached, recorded calls still being replayed.
    Binding { handle: Arc<H>, calls: CallBatch<H> },
    Bound { handle: Arc<H> },
}

struct ProxyInner<H: ResultHandle> {
    id: RequestId,
    state: Mutex<ProxyState<H>>,
    settlement: Mutex<Settlement>,
    settled: Condvar,
}

/// Placeholder handle returned for queued requests. Cloning shares the proxy.
pub struct ResultProxy<H: ResultHandle> {
    inner: Arc<ProxyInner<H>>,
}

impl<H: ResultHandle> Clone for ResultProxy<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<H: ResultHandle> fmt::Debug for ResultProxy<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultProxy")
            .field("id", &self.inner.id)
            .field("bound", &self.is_bound())
            .field("settlement", &self.settlement())
            .finish()
    }
}

impl<H: ResultHandle> ResultProxy<H> {
    /// Create an unbound proxy for request `id`.
    #[must_use]
    pub fn new(id: RequestId) -> Self {
        Self {
            inner: Arc::new(ProxyInner {
                id,
                state: Mutex::new(ProxyState::Unbound { calls: Vec::new() }),
                settlement: Mutex::new(Settlement::Pending),
                settled: Condvar::new(),
            }),
        }
    }

    /// Request this proxy stands in for.
    #[must_use]
    pub fn id(&self) -> RequestId {
        self.inner.id
    }

    /// Whether the proxy has been bound to a real handle.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        !matches!(&*self.inner.state.lock(), ProxyState::Unbound { .. })
    }

    /// Number of calls waiting for replay. Zero once bound.
    #[must_use]
    pub fn buffered(&self) -> usize {
        match &*self.inner.state.lock() {
            ProxyState::Unbound { calls } | ProxyState::Binding { calls, .. } => calls.len(),
            ProxyState::Bound { .. } => 0,
        }
    }

    /// Bind to the real handle and replay every buffered call against it.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::ProxyAlreadyBound`] if the proxy was bound before; the
    /// offered handle is dropped and the original binding stays in place.
    pub fn bind(&self, handle: H) -> Result<(), SchedulerError> {
        let handle = Arc::new(handle);
        let mut batch = {
            let mut state = self.inner.state.lock();
            let ProxyState::Unbound { calls } = &mut *state else {
                return Err(SchedulerError::ProxyAlreadyBound);
            };
            let calls = std::mem::take(calls);
            *state = ProxyState::Binding {
                handle: Arc::clone(&handle),
                calls: Vec::new(),
            };
            calls
        };

        loop {
            for call in batch {
                call.replay(&*handle);
            }
            let mut state = self.inner.state.lock();
            batch = match &mut *state {
                ProxyState::Binding { calls, .. } => std::mem::take(calls),
                _ => Vec::new(),
            };
            if batch.is_empty() {
                *state = ProxyState::Bound { handle };
                return Ok(());
            }
        }
    }

    /// Current state of the deferred result.
    #[must_use]
    pub fn settlement(&self) -> Settlement {
        *self.inner.settlement.lock()
    }

    /// Block until the deferred result settles or `timeout` elapses, returning the
    /// state observed last.
    #[must_use]
    pub fn wait_settled(&self, timeout: Duration) -> Settlement {
        let mut settlement = self.inner.settlement.lock();
        if *settlement == Settlement::Pending {
            let _ = self
                .inner
                .settled
                .wait_while_for(&mut settlement, |s| *s == Settlement::Pending, timeout);
        }
        *settlement
    }

    /// Settle the deferred result. Only the first settlement sticks.
    pub(crate) fn settle(&self, outcome: Settlement) {
        let mut settlement = self.inner.settlement.lock();
        if *settlement == Settlement::Pending {
            *settlement = outcome;
            drop(settlement);
            self.inner.settled.notify_all();
        }
    }

    /// Apply a call to the bound handle, or record it if still unbound.
    fn forward(&self, call: BufferedCall<H::Output, H::Error>) {
        let handle = {
            let mut state = self.inner.state.lock();
            match &mut *state {
                ProxyState::Bound { handle } => Arc::clone(handle),
                ProxyState::Unbound { calls } | ProxyState::Binding { calls, .. } => {
                    calls.push(call);
                    return;
                }
            }
        };
        call.replay(&*handle);
    }

    /// Read from the attached handle; unbound proxies record the read and yield `None`.
    fn read<R>(
        &self,
        read: impl FnOnce(&H) -> Option<R>,
        call: BufferedCall<H::Output, H::Error>,
    ) -> Option<R> {
        let handle = {
            let mut state = self.inner.state.lock();
            match &mut *state {
                ProxyState::Bound { handle } | ProxyState::Binding { handle, .. } => {
                    Arc::clone(handle)
                }
                ProxyState::Unbound { calls } => {
                    calls.push(call);
                    return None;
                }
            }
        };
        read(&*handle)
    }
}

impl<H: ResultHandle> ResultHandle for ResultProxy<H> {
    type Output = H::Output;
    type Error = H::Error;

    fn done<F>(&self, handler: F) -> &Self
    where
        F: FnOnce(&Self::Output) + Send + 'static,
    {
        self.forward(BufferedCall::Done(Box::new(handler)));
        self
    }

    fn fail<F>(&self, handler: F) -> &Self
    where
        F: FnOnce(&Self::Error) + Send + 'static,
    {
        self.forward(BufferedCall::Fail(Box::new(handler)));
        self
    }

    fn always<F>(&self, handler: F) -> &Self
    where
        F: FnOnce(Result<&Self::Output, &Self::Error>) + Send + 'static,
    {
        self.forward(BufferedCall::Always(Box::new(handler)));
        self
    }

    fn progress<F>(&self, handler: F) -> &Self
    where
        F: FnMut(u64, Option<u64>) + Send + 'static,
    {
        self.forward(BufferedCall::Progress(Box::new(handler)));
        self
    }

    fn abort(&self, reason: &str) -> &Self {
        self.forward(BufferedCall::Abort(reason.to_string()));
        self
    }

    fn set_request_header(&self, name: &str, value: &str) -> &Self {
        self.forward(BufferedCall::SetRequestHeader(
            name.to_string(),
            value.to_string(),
        ));
        self
    }

    fn override_mime_type(&self, mime: &str) -> &Self {
        self.forward(BufferedCall::OverrideMimeType(mime.to_string()));
        self
    }

    fn response_header(&self, name: &str) -> Option<String> {
        self.read(
            |h| h.response_header(name),
            BufferedCall::ResponseHeader(name.to_string()),
        )
    }

    fn all_response_headers(&self) -> Option<String> {
        self.read(|h| h.all_response_headers(), BufferedCall::AllResponseHeaders)
    }
}
