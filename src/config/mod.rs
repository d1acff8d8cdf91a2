//! Configuration models for the request scheduler.

pub mod scheduler;

pub use scheduler::{SchedulerConfig, ENV_DEBUG, ENV_DEFAULT_PRIORITY, ENV_MAX_CONNECTIONS};
