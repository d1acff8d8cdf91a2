//! Settle-once result handle with a callback registry.
//!
//! Transports produce a [`CallbackHandle`] per request and settle it exactly once
//! when the response (or failure) arrives. Handlers registered before settlement
//! run at settlement in registration order. A handler registered afterwards runs
//! immediately on the registering thread, unless another thread is still firing
//! earlier handlers; then it is queued behind them and run by that thread.
//! Handlers of one handle therefore never overlap and always run in registration
//! order.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::handle::{
    CompleteCallback, FailureCallback, ProgressCallback, ResultHandle, SuccessCallback,
};

/// Hook invoked when a caller aborts an unsettled handle.
pub type AbortHook = Box<dyn FnOnce(String) + Send>;

enum Listener<T, E> {
    Done(SuccessCallback<T>),
    Fail(FailureCallback<E>),
    Always(CompleteCallback<T, E>),
}

impl<T, E> Listener<T, E> {
    fn fire(self, outcome: &Result<T, E>) {
        match (self, outcome) {
            (Self::Done(handler), Ok(value)) => handler(value),
            (Self::Fail(handler), Err(err)) => handler(err),
            (Self::Always(handler), outcome) => handler(outcome.as_ref()),
            _ => {}
        }
    }
}

struct CallbackState<T, E> {
    outcome: Option<Arc<Result<T, E>>>,
    listeners: Vec<Listener<T, E>>,
    firing: bool,
    progress: Vec<ProgressCallback>,
    on_abort: Option<AbortHook>,
    request_headers: Vec<(String, String)>,
    response_headers: Vec<(String, String)>,
    mime_override: Option<String>,
}

/// Cloneable settle-once handle. All clones observe the same outcome.
pub struct CallbackHandle<T, E> {
    state: Arc<Mutex<CallbackState<T, E>>>,
}

impl<T, E> Clone for CallbackHandle<T, E> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T, E> Default for CallbackHandle<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> fmt::Debug for CallbackHandle<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("CallbackHandle")
            .field("settled", &state.outcome.is_some())
            .field("listeners", &state.listeners.len())
            .finish_non_exhaustive()
    }
}

impl<T, E> CallbackHandle<T, E> {
    /// Create an unsettled handle.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(CallbackState {
                outcome: None,
                listeners: Vec::new(),
                firing: false,
                progress: Vec::new(),
                on_abort: None,
                request_headers: Vec::new(),
                response_headers: Vec::new(),
                mime_override: None,
            })),
        }
    }

    /// Whether an outcome has been recorded.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.state.lock().outcome.is_some()
    }

    /// Install the hook run by [`ResultHandle::abort`] while unsettled.
    pub fn set_abort_hook<F>(&self, hook: F)
    where
        F: FnOnce(String) + Send + 'static,
    {
        self.state.lock().on_abort = Some(Box::new(hook));
    }

    /// Record response headers, normally right before settling.
    pub fn set_response_headers<I, K, V>(&self, headers: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.state.lock().response_headers = headers
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
    }

    /// Request headers set by callers so far.
    #[must_use]
    pub fn request_headers(&self) -> Vec<(String, String)> {
        self.state.lock().request_headers.clone()
    }

    /// MIME override set by callers, if any.
    #[must_use]
    pub fn mime_override(&self) -> Option<String> {
        self.state.lock().mime_override.clone()
    }

    /// Forward a progress notification to every progress handler.
    pub fn notify_progress(&self, loaded: u64, total: Option<u64>) {
        let mut handlers = {
            let mut state = self.state.lock();
            if state.outcome.is_some() {
                return;
            }
            std::mem::take(&mut state.progress)
        };
        for handler in &mut handlers {
            handler(loaded, total);
        }
        let mut state = self.state.lock();
        if state.outcome.is_none() {
            handlers.append(&mut state.progress);
            state.progress = handlers;
        }
    }

    /// Settle successfully. Returns `false` if the handle was already settled.
    pub fn resolve(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Settle with a failure. Returns `false` if the handle was already settled.
    pub fn reject(&self, err: E) -> bool {
        self.settle(Err(err))
    }

    /// Record the outcome and run pending listeners outside the lock.
    pub fn settle(&self, outcome: Result<T, E>) -> bool {
        let (outcome, listeners) = {
            let mut state = self.state.lock();
            if state.outcome.is_some() {
                return false;
            }
            let outcome = Arc::new(outcome);
            state.outcome = Some(Arc::clone(&outcome));
            state.on_abort = None;
            state.progress.clear();
            state.firing = true;
            (outcome, std::mem::take(&mut state.listeners))
        };
        self.fire_all(&outcome, listeners);
        true
    }

    fn register(&self, listener: Listener<T, E>) {
        let outcome = {
            let mut state = self.state.lock();
            match state.outcome.clone() {
                Some(outcome) if !state.firing => {
                    state.firing = true;
                    outcome
                }
                _ => {
                    state.listeners.push(listener);
                    return;
                }
            }
        };
        self.fire_all(&outcome, vec![listener]);
    }

    /// Run `batch`, then whatever was queued meanwhile, until nothing is left.
    /// The caller must have set `firing`.
    fn fire_all(&self, outcome: &Result<T, E>, mut batch: Vec<Listener<T, E>>) {
        let _guard = FiringGuard { state: &self.state };
        loop {
            for listener in batch {
                listener.fire(outcome);
            }
            let mut state = self.state.lock();
            if state.listeners.is_empty() {
                state.firing = false;
                break;
            }
            batch = std::mem::take(&mut state.listeners);
        }
    }
}

/// Clears `firing` if a listener panics so the handle does not stall.
struct FiringGuard<'a, T, E> {
    state: &'a Mutex<CallbackState<T, E>>,
}

impl<T, E> Drop for FiringGuard<'_, T, E> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.state.lock().firing = false;
        }
    }
}

impl<T, E> ResultHandle for CallbackHandle<T, E>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    type Output = T;
    type Error = E;

    fn done<F>(&self, handler: F) -> &Self
    where
        F: FnOnce(&T) + Send + 'static,
    {
        self.register(Listener::Done(Box::new(handler)));
        self
    }

    fn fail<F>(&self, handler: F) -> &Self
    where
        F: FnOnce(&E) + Send + 'static,
    {
        self.register(Listener::Fail(Box::new(handler)));
        self
    }

    fn always<F>(&self, handler: F) -> &Self
    where
        F: FnOnce(Result<&T, &E>) + Send + 'static,
    {
        self.register(Listener::Always(Box::new(handler)));
        self
    }

    fn progress<F>(&self, handler: F) -> &Self
    where
        F: FnMut(u64, Option<u64>) + Send + 'static,
    {
        let mut state = self.state.lock();
        if state.outcome.is_none() {
            state.progress.push(Box::new(handler));
        }
        drop(state);
        self
    }

    fn abort(&self, reason: &str) -> &Self {
        let hook = self.state.lock().on_abort.take();
        if let Some(hook) = hook {
            hook(reason.to_string());
        }
        self
    }

    fn set_request_header(&self, name: &str, value: &str) -> &Self {
        self.state
            .lock()
            .request_headers
            .push((name.to_string(), value.to_string()));
        self
    }

    fn override_mime_type(&self, mime: &str) -> &Self {
        self.state.lock().mime_override = Some(mime.to_string());
        self
    }

    fn response_header(&self, name: &str) -> Option<String> {
        let state = self.state.lock();
        state.outcome.as_ref()?;
        state
            .response_headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.clone())
    }

    fn all_response_headers(&self) -> Option<String> {
        let state = self.state.lock();
        state.outcome.as_ref()?;
        Some(
            state
                .response_headers
                .iter()
                .map(|(key, value)| format!("{key}: {value}\r\n"))
                .collect(),
        )
    }
}
