//! The asynchronous result-handle interface shared by real transport handles and
//! result proxies.

use crate::core::proxy::ResultProxy;

/// Handler run once with the success payload.
pub type SuccessCallback<T> = Box<dyn FnOnce(&T) + Send>;
/// Handler run once with the failure payload.
pub type FailureCallback<E> = Box<dyn FnOnce(&E) + Send>;
/// Handler run once with whichever outcome arrived.
pub type CompleteCallback<T, E> = Box<dyn FnOnce(Result<&T, &E>) + Send>;
/// Handler run on every progress notification with `(loaded, total)`.
pub type ProgressCallback = Box<dyn FnMut(u64, Option<u64>) + Send>;

/// Completion hooks and accessors of an in-flight request.
///
/// Registration methods return the handle itself so calls chain. Implementations
/// must run handlers registered after the outcome is known immediately, in
/// registration order, so late binding through a [`ResultProxy`] loses nothing.
pub trait ResultHandle: Send + Sync + 'static {
    /// Success payload.
    type Output: Send + Sync + 'static;
    /// Failure payload.
    type Error: Send + Sync + 'static;

    /// Register a success handler.
    fn done<F>(&self, handler: F) -> &Self
    where
        F: FnOnce(&Self::Output) + Send + 'static;

    /// Register a failure handler.
    fn fail<F>(&self, handler: F) -> &Self
    where
        F: FnOnce(&Self::Error) + Send + 'static;

    /// Register a handler that runs on either outcome.
    fn always<F>(&self, handler: F) -> &Self
    where
        F: FnOnce(Result<&Self::Output, &Self::Error>) + Send + 'static;

    /// Register a progress handler. Transports without progress reporting ignore it.
    fn progress<F>(&self, handler: F) -> &Self
    where
        F: FnMut(u64, Option<u64>) + Send + 'static,
    {
        drop(handler);
        self
    }

    /// Ask the transport to abandon the request.
    fn abort(&self, reason: &str) -> &Self;

    /// Set a request header. Transports that already sent the request ignore it.
    fn set_request_header(&self, name: &str, value: &str) -> &Self {
        let _ = (name, value);
        self
    }

    /// Override the response MIME type.
    fn override_mime_type(&self, mime: &str) -> &Self {
        let _ = mime;
        self
    }

    /// Read a response header, if the response has arrived.
    fn response_header(&self, name: &str) -> Option<String> {
        let _ = name;
        None
    }

    /// Read all response headers as a raw header block, if the response has arrived.
    fn all_response_headers(&self) -> Option<String> {
        None
    }

    /// Alias of [`ResultHandle::done`].
    fn success<F>(&self, handler: F) -> &Self
    where
        F: FnOnce(&Self::Output) + Send + 'static,
    {
        self.done(handler)
    }

    /// Alias of [`ResultHandle::fail`].
    fn error<F>(&self, handler: F) -> &Self
    where
        F: FnOnce(&Self::Error) + Send + 'static,
    {
        self.fail(handler)
    }

    /// Alias of [`ResultHandle::always`].
    fn complete<F>(&self, handler: F) -> &Self
    where
        F: FnOnce(Result<&Self::Output, &Self::Error>) + Send + 'static,
    {
        self.always(handler)
    }

    /// Register a success and a failure handler in one call.
    fn then<D, R>(&self, on_done: D, on_fail: R) -> &Self
    where
        D: FnOnce(&Self::Output) + Send + 'static,
        R: FnOnce(&Self::Error) + Send + 'static,
    {
        self.done(on_done).fail(on_fail)
    }
}

/// What the scheduler hands back for every request.
///
/// Immediate dispatches return the transport's own handle; queued requests return
/// a [`ResultProxy`] that is bound once the request leaves the queue. Both forward
/// the complete [`ResultHandle`] surface, so callers never need to tell them apart.
pub enum RequestHandle<H: ResultHandle> {
    /// Dispatched at admission time.
    Dispatched(H),
    /// Waiting (or waited) in the priority queue.
    Queued(ResultProxy<H>),
}

impl<H: ResultHandle> RequestHandle<H> {
    /// Whether the request went through the waiting queue.
    #[must_use]
    pub const fn is_queued(&self) -> bool {
        matches!(self, Self::Queued(_))
    }

    /// The proxy for a queued request.
    #[must_use]
    pub const fn proxy(&self) -> Option<&ResultProxy<H>> {
        match self {
            Self::Queued(proxy) => Some(proxy),
            Self::Dispatched(_) => None,
        }
    }
}

impl<H: ResultHandle + Clone> Clone for RequestHandle<H> {
    fn clone(&self) -> Self {
        match self {
            Self::Dispatched(handle) => Self::Dispatched(handle.clone()),
            Self::Queued(proxy) => Self::Queued(proxy.clone()),
        }
    }
}

impl<H: ResultHandle> ResultHandle for RequestHandle<H> {
    type Output = H::Output;
    type Error = H::Error;

    fn done<F>(&self, handler: F) -> &Self
    where
        F: FnOnce(&Self::Output) + Send + 'static,
    {
        match self {
            Self::Dispatched(handle) => {
                handle.done(handler);
            }
            Self::Queued(proxy) => {
                proxy.done(handler);
            }
        }
        self
    }

    fn fail<F>(&self, handler: F) -> &Self
    where
        F: FnOnce(&Self::Error) + Send + 'static,
    {
        match self {
            Self::Dispatched(handle) => {
                handle.fail(handler);
            }
            Self::Queued(proxy) => {
                proxy.fail(handler);
            }
        }
        self
    }

    fn always<F>(&self, handler: F) -> &Self
    where
        F: FnOnce(Result<&Self::Output, &Self::Error>) + Send + 'static,
    {
        match self {
            Self::Dispatched(handle) => {
                handle.always(handler);
            }
            Self::Queued(proxy) => {
                proxy.always(handler);
            }
        }
        self
    }

    fn progress<F>(&self, handler: F) -> &Self
    where
        F: FnMut(u64, Option<u64>) + Send + 'static,
    {
        match self {
            Self::Dispatched(handle) => {
                handle.progress(handler);
            }
            Self::Queued(proxy) => {
                proxy.progress(handler);
            }
        }
        self
    }

    fn abort(&self, reason: &str) -> &Self {
        match self {
            Self::Dispatched(handle) => {
                handle.abort(reason);
            }
            Self::Queued(proxy) => {
                proxy.abort(reason);
            }
        }
        self
    }

    fn set_request_header(&self, name: &str, value: &str) -> &Self {
        match self {
            Self::Dispatched(handle) => {
                handle.set_request_header(name, value);
            }
            Self::Queued(proxy) => {
                proxy.set_request_header(name, value);
            }
        }
        self
    }

    fn override_mime_type(&self, mime: &str) -> &Self {
        match self {
            Self::Dispatched(handle) => {
                handle.override_mime_type(mime);
            }
            Self::Queued(proxy) => {
                proxy.override_mime_type(mime);
            }
        }
        self
    }

    fn response_header(&self, name: &str) -> Option<String> {
        match self {
            Self::Dispatched(handle) => handle.response_header(name),
            Self::Queued(proxy) => proxy.response_header(name),
        }
    }

    fn all_response_headers(&self) -> Option<String> {
        match self {
            Self::Dispatched(handle) => handle.all_response_headers(),
            Self::Queued(proxy) => proxy.all_response_headers(),
        }
    }
}
