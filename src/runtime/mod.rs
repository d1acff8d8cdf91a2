//! Tokio runtime adapter: run an async [`RequestExecutor`](crate::core::RequestExecutor)
//! behind the callback-style [`Transport`](crate::core::Transport) seam.

pub mod future_transport;
pub mod tokio_spawner;

pub use future_transport::{FutureHandle, FutureTransport};
pub use tokio_spawner::TokioSpawner;
