//! Validating builder for [`Scheduler`].

use std::sync::Arc;

use crate::config::SchedulerConfig;
use crate::core::{AuditSink, Priority, Scheduler, SchedulerError, Transport};

/// Assembles a [`Scheduler`] from a transport, configuration and optional audit sink.
pub struct SchedulerBuilder<T> {
    transport: T,
    config: SchedulerConfig,
    audit: Option<Arc<dyn AuditSink>>,
}

impl<T> SchedulerBuilder<T> {
    /// Start from the default configuration.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            config: SchedulerConfig::default(),
            audit: None,
        }
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the concurrency ceiling.
    #[must_use]
    pub fn max_connections(mut self, max_connections: usize) -> Self {
        self.config.max_connections = max_connections;
        self
    }

    /// Set the fallback priority.
    #[must_use]
    pub fn default_priority(mut self, priority: Priority) -> Self {
        self.config.default_priority = priority;
        self
    }

    /// Map a category to a priority.
    #[must_use]
    pub fn category(mut self, category: impl Into<String>, priority: Priority) -> Self {
        self.config.category_priority.insert(category.into(), priority);
        self
    }

    /// Toggle per-decision debug events.
    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Report admission decisions to `sink`.
    #[must_use]
    pub fn audit<A>(mut self, sink: A) -> Self
    where
        A: AuditSink + 'static,
    {
        self.audit = Some(Arc::new(sink));
        self
    }

    /// Configuration the scheduler will start with.
    #[must_use]
    pub const fn current_config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Validate the configuration and build the scheduler.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::InvalidConfig`] when validation fails.
    pub fn build<P>(self) -> Result<Scheduler<P, T>, SchedulerError>
    where
        P: Send + 'static,
        T: Transport<P>,
    {
        self.config.validate().map_err(SchedulerError::InvalidConfig)?;
        Ok(Scheduler::from_parts(self.config, self.transport, self.audit))
    }
}
