//! The transport seam: the underlying request function being throttled.

use crate::core::handle::ResultHandle;
use crate::core::request::RequestDescriptor;

/// Performs a request and returns its live result handle.
///
/// The scheduler calls `dispatch` exactly once per admitted request and never
/// inspects the descriptor beyond its priority fields. Implementations may settle
/// the returned handle synchronously; the scheduler holds no locks across the call.
///
/// Any `Fn(RequestDescriptor<P>) -> H` closure is a transport.
pub trait Transport<P>: Send + Sync + 'static {
    /// Handle type produced per request.
    type Handle: ResultHandle;

    /// Start the request.
    fn dispatch(&self, request: RequestDescriptor<P>) -> Self::Handle;
}

impl<P, H, F> Transport<P> for F
where
    F: Fn(RequestDescriptor<P>) -> H + Send + Sync + 'static,
    H: ResultHandle,
{
    type Handle = H;

    fn dispatch(&self, request: RequestDescriptor<P>) -> H {
        self(request)
    }
}
