//! Transport that runs an async executor per request on a spawner.

use tokio::runtime::TryCurrentError;
use tokio::sync::oneshot;

use crate::core::callback::CallbackHandle;
use crate::core::error::RequestError;
use crate::core::request::RequestDescriptor;
use crate::core::{RequestExecutor, Spawn, Transport};
use crate::runtime::TokioSpawner;

/// Handle produced by [`FutureTransport`].
pub type FutureHandle<T, E> = CallbackHandle<T, RequestError<E>>;

/// Adapts a [`RequestExecutor`] to the [`Transport`] seam.
///
/// Each dispatch runs the pre-send hook (a `false` return rejects the handle with
/// [`RequestError::Aborted`] without executing), then spawns the executor. An
/// `abort` on the handle races the execution and wins if it arrives first.
#[derive(Clone, Debug)]
pub struct FutureTransport<X, S> {
    executor: X,
    spawner: S,
}

impl<X, S> FutureTransport<X, S> {
    /// Create a transport from an executor and a spawner.
    pub const fn new(executor: X, spawner: S) -> Self {
        Self { executor, spawner }
    }
}

impl<X> FutureTransport<X, TokioSpawner> {
    /// Transport spawning onto the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Fails when called outside a tokio runtime context.
    pub fn on_current_runtime(executor: X) -> Result<Self, TryCurrentError> {
        Ok(Self::new(executor, TokioSpawner::current()?))
    }
}

impl<P, X, S> Transport<P> for FutureTransport<X, S>
where
    P: Send + 'static,
    X: RequestExecutor<P>,
    S: Spawn + Send + Sync + 'static,
{
    type Handle = FutureHandle<X::Output, X::Error>;

    fn dispatch(&self, mut request: RequestDescriptor<P>) -> Self::Handle {
        let handle = CallbackHandle::new();

        if let Some(hook) = request.before_send.clone() {
            if !hook(&mut request.params) {
                tracing::debug!(url = %request.url, "request cancelled by pre-send hook");
                handle.reject(RequestError::Aborted("cancelled by pre-send hook".into()));
                return handle;
            }
        }

        let (abort_tx, abort_rx) = oneshot::channel::<String>();
        handle.set_abort_hook(move |reason| {
            let _ = abort_tx.send(reason);
        });

        let executor = self.executor.clone();
        let settle = handle.clone();
        self.spawner.spawn(async move {
            let url = request.url.clone();
            let outcome = tokio::select! {
                biased;
                Ok(reason) = abort_rx => Err(RequestError::Aborted(reason)),
                result = executor.execute(request) => result.map_err(RequestError::Failed),
            };
            tracing::trace!(%url, ok = outcome.is_ok(), "request finished");
            settle.settle(outcome);
        });

        handle
    }
}
