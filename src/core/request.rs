//! Request descriptors and priority resolution.

use std::fmt;
use std::sync::Arc;

use crate::config::SchedulerConfig;

/// Dispatch urgency. Lower values dispatch sooner; `0` always skips the queue.
pub type Priority = u32;

/// Priority that dispatches immediately regardless of capacity.
pub const EXPEDITED: Priority = 0;

/// Per-scheduler request identifier, assigned in submission order.
pub type RequestId = u64;

/// Hook run by the transport right before sending. Returning `false` cancels the send.
pub type BeforeSendHook<P> = Arc<dyn Fn(&mut P) -> bool + Send + Sync>;

/// Caller-supplied description of one logical request.
///
/// `params` is opaque to the scheduler and handed to the transport untouched. Only
/// the priority, category and bypass flags are consulted for admission.
pub struct RequestDescriptor<P> {
    /// Destination address.
    pub url: String,
    /// Transport-specific request parameters.
    pub params: P,
    /// Explicit priority; derived from `category` when absent.
    pub priority: Option<Priority>,
    /// Data-type hint used for the category lookup.
    pub category: Option<String>,
    /// Pre-send hook. Its presence forces immediate dispatch.
    pub before_send: Option<BeforeSendHook<P>>,
    /// Synchronous-style request. Forces immediate dispatch.
    pub synchronous: bool,
}

impl<P> RequestDescriptor<P> {
    /// Create a descriptor with no priority hints.
    pub fn new(url: impl Into<String>, params: P) -> Self {
        Self {
            url: url.into(),
            params,
            priority: None,
            category: None,
            before_send: None,
            synchronous: false,
        }
    }

    /// Set an explicit priority.
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Set the category hint.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Attach a pre-send hook.
    #[must_use]
    pub fn with_before_send<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut P) -> bool + Send + Sync + 'static,
    {
        self.before_send = Some(Arc::new(hook));
        self
    }

    /// Mark the request as synchronous-style.
    #[must_use]
    pub fn with_synchronous(mut self, synchronous: bool) -> Self {
        self.synchronous = synchronous;
        self
    }

    /// Whether the request must skip the queue irrespective of capacity.
    #[must_use]
    pub const fn is_bypass(&self) -> bool {
        self.before_send.is_some() || self.synchronous
    }

    /// Return the descriptor with its priority resolved against `config`.
    #[must_use]
    pub fn resolved(mut self, config: &SchedulerConfig) -> Self {
        self.priority = Some(resolve_priority(
            self.priority,
            self.category.as_deref(),
            config,
        ));
        self
    }
}

impl<P: Default> RequestDescriptor<P> {
    /// Descriptor for a bare address with default parameters.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(url, P::default())
    }
}

impl<P: Clone> Clone for RequestDescriptor<P> {
    fn clone(&self) -> Self {
        Self {
            url: self.url.clone(),
            params: self.params.clone(),
            priority: self.priority,
            category: self.category.clone(),
            before_send: self.before_send.clone(),
            synchronous: self.synchronous,
        }
    }
}

impl<P: fmt::Debug> fmt::Debug for RequestDescriptor<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestDescriptor")
            .field("url", &self.url)
            .field("params", &self.params)
            .field("priority", &self.priority)
            .field("category", &self.category)
            .field("before_send", &self.before_send.is_some())
            .field("synchronous", &self.synchronous)
            .finish()
    }
}

/// Resolve a request's priority: explicit value, else category table, else default.
#[must_use]
pub fn resolve_priority(
    explicit: Option<Priority>,
    category: Option<&str>,
    config: &SchedulerConfig,
) -> Priority {
    explicit
        .or_else(|| category.and_then(|name| config.category(name)))
        .unwrap_or(config.default_priority)
}
