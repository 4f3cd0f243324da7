//! Relay limits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Maximum prompt or response size in UTF-8 bytes (128 KiB).
pub const MAX_MESSAGE_BYTES: usize = 128 * 1024;

/// Limits applied by the relay engines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Size cap for prompt and response text.
    pub max_message_bytes: usize,
    /// Long-poll wait used when the caller does not pass one.
    pub default_poll_timeout_secs: u64,
    /// Upper bound for a single long-poll wait.
    pub max_poll_timeout_secs: u64,
    /// Interval between pings on a live connection.
    pub heartbeat_interval_secs: u64,
    /// History page size used when the caller does not pass one.
    pub default_history_limit: usize,
    /// Upper bound for a history page.
    pub max_history_limit: usize,
    /// Outbound queue depth per live connection.
    pub subscriber_buffer: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_message_bytes: MAX_MESSAGE_BYTES,
            default_poll_timeout_secs: 30,
            max_poll_timeout_secs: 300,
            heartbeat_interval_secs: 30,
            default_history_limit: 100,
            max_history_limit: 1000,
            subscriber_buffer: 256,
        }
    }
}

impl RelayConfig {
    /// Heartbeat interval as a `Duration` (never zero).
    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs.max(1))
    }
}
