//! Async execution traits used by the runtime transport adapter.

use std::future::Future;

use async_trait::async_trait;

use crate::core::request::RequestDescriptor;

/// Abstraction for spawning request execution on a runtime.
pub trait Spawn {
    /// Spawn a detached future.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// Performs the network I/O for one request.
///
/// The executor carries the actual business logic of talking to the server. It
/// receives the descriptor after admission (priority already resolved and the
/// pre-send hook already run) and returns the response or failure.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use prometheus_request_gate::core::{RequestDescriptor, RequestExecutor};
///
/// #[derive(Clone)]
/// struct HttpExecutor {
///     client: reqwest::Client,
/// }
///
/// #[async_trait]
/// impl RequestExecutor<()> for HttpExecutor {
///     type Output = String;
///     type Error = String;
///
///     async fn execute(&self, request: RequestDescriptor<()>) -> Result<String, String> {
///         let response = self.client.get(&request.url).send().await.map_err(|e| e.to_string())?;
///         response.text().await.map_err(|e| e.to_string())
///     }
/// }
/// ```
#[async_trait]
pub trait RequestExecutor<P>: Send + Sync + Clone + 'static
where
    P: Send + 'static,
{
    /// Success payload.
    type Output: Send + Sync + 'static;
    /// Failure payload.
    type Error: Send + Sync + 'static;

    /// Execute the request.
    async fn execute(&self, request: RequestDescriptor<P>) -> Result<Self::Output, Self::Error>;
}
