//! Scheduler configuration: concurrency ceiling and priority tables.

use std::collections::HashMap;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::error::AppResult;
use crate::core::request::Priority;

/// Environment variable overriding [`SchedulerConfig::max_connections`].
pub const ENV_MAX_CONNECTIONS: &str = "REQUEST_GATE_MAX_CONNECTIONS";
/// Environment variable overriding [`SchedulerConfig::default_priority`].
pub const ENV_DEFAULT_PRIORITY: &str = "REQUEST_GATE_DEFAULT_PRIORITY";
/// Environment variable overriding [`SchedulerConfig::debug`].
pub const ENV_DEBUG: &str = "REQUEST_GATE_DEBUG";

/// Runtime-mutable scheduler settings.
///
/// Changes take effect on the next admission or completion decision; requests
/// already in flight are never touched retroactively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Maximum simultaneous requests before new ones are queued. Zero forces every
    /// non-bypass request through the queue.
    pub max_connections: usize,
    /// Priority used when neither an explicit priority nor a category entry applies.
    pub default_priority: Priority,
    /// Category (data type) to priority lookup.
    pub category_priority: HashMap<String, Priority>,
    /// Emit per-decision debug events.
    pub debug: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        let category_priority = [
            ("html", 5),
            ("xml", 5),
            ("script", 5),
            ("text", 4),
            ("json", 0),
            ("jsonp", 0),
        ]
        .into_iter()
        .map(|(name, priority)| (name.to_string(), priority))
        .collect();

        Self {
            max_connections: 6,
            default_priority: 5,
            category_priority,
            debug: true,
        }
    }
}

impl SchedulerConfig {
    /// Builder-style override of the concurrency ceiling.
    #[must_use]
    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Builder-style override of the fallback priority.
    #[must_use]
    pub fn with_default_priority(mut self, priority: Priority) -> Self {
        self.default_priority = priority;
        self
    }

    /// Map a category to a priority, replacing any previous entry.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>, priority: Priority) -> Self {
        self.category_priority.insert(category.into(), priority);
        self
    }

    /// Toggle per-decision debug events.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Priority configured for a category, if any.
    #[must_use]
    pub fn category(&self, category: &str) -> Option<Priority> {
        self.category_priority.get(category).copied()
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid entry.
    pub fn validate(&self) -> Result<(), String> {
        if self.category_priority.keys().any(|name| name.trim().is_empty()) {
            return Err("category names must not be empty".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate. Missing fields keep
    /// their defaults.
    ///
    /// # Errors
    ///
    /// Returns a parse or validation message.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load defaults overlaid with `REQUEST_GATE_*` variables, reading a `.env`
    /// file first when one is present.
    ///
    /// # Errors
    ///
    /// Fails when a variable is set but cannot be parsed.
    pub fn from_env() -> AppResult<Self> {
        let _ = dotenvy::dotenv();
        Self::default().overlay_env(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a variable lookup on top of `self`.
    ///
    /// # Errors
    ///
    /// Fails when a present value cannot be parsed or the result is invalid.
    pub fn overlay_env<F>(mut self, lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_MAX_CONNECTIONS) {
            self.max_connections = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_MAX_CONNECTIONS}={raw}"))?;
        }
        if let Some(raw) = lookup(ENV_DEFAULT_PRIORITY) {
            self.default_priority = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_DEFAULT_PRIORITY}={raw}"))?;
        }
        if let Some(raw) = lookup(ENV_DEBUG) {
            self.debug = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                other => anyhow::bail!("{ENV_DEBUG}={other} is not a boolean"),
            };
        }
        self.validate().map_err(anyhow::Error::msg)?;
        Ok(self)
    }
}
