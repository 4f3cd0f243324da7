//! Relay handle tying the session store to the delivery engines.

use std::sync::Arc;

use relay_core::{Clock, HistoryPage, HistoryQuery, RelayConfig, RelayError};
use serde::{Deserialize, Serialize};

use crate::{Session, SessionStore};

/// Result of `HealthCheck`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub ok: bool,
    pub timestamp: u64,
}

/// The relay.
///
/// Created once at process start and shared with the transport as
/// `Arc<Relay>`. Prompt, response and subscriber operations live in the
/// `prompts`, `responses` and `broadcast` modules.
pub struct Relay {
    pub(crate) store: SessionStore,
    pub(crate) config: RelayConfig,
    pub(crate) clock: Clock,
}

impl Default for Relay {
    fn default() -> Self {
        Self::new(RelayConfig::default())
    }
}

impl Relay {
    /// Create a relay with the given limits.
    #[must_use]
    pub fn new(config: RelayConfig) -> Self {
        Self {
            store: SessionStore::new(),
            config,
            clock: Clock::new(),
        }
    }

    /// Active limits.
    #[must_use]
    pub const fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Session registry.
    #[must_use]
    pub const fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Current relay time in epoch milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Liveness check. Always succeeds.
    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            ok: true,
            timestamp: self.now_ms(),
        }
    }

    /// Look up a session without creating it.
    ///
    /// # Errors
    /// Returns `SessionNotFound` if the session does not exist.
    pub async fn require_session(&self, session_id: &str) -> Result<Arc<Session>, RelayError> {
        self.store
            .get(session_id)
            .await
            .ok_or_else(|| RelayError::SessionNotFound(session_id.to_string()))
    }

    /// Page through a session's history in arrival order.
    ///
    /// # Errors
    /// Returns `OutOfRange` for a limit outside `[1, max_history_limit]` and
    /// `SessionNotFound` for an unknown session.
    pub async fn history(
        &self,
        session_id: &str,
        query: HistoryQuery,
    ) -> Result<HistoryPage, RelayError> {
        let max = self.config.max_history_limit;
        let limit = query.limit.unwrap_or(self.config.default_history_limit);
        if limit == 0 || limit > max {
            return Err(RelayError::OutOfRange {
                field: "limit",
                reason: format!("must be between 1 and {max}"),
            });
        }

        let session = self.require_session(session_id).await?;
        let (messages, total) = {
            let state = session.lock().await;
            let matching: Vec<_> = state
                .history()
                .iter()
                .filter(|entry| query.since.is_none_or(|since| entry.ts() > since))
                .collect();
            let total = matching.len();
            let page = matching
                .into_iter()
                .skip(query.offset)
                .take(limit)
                .cloned()
                .collect();
            (page, total)
        };

        Ok(HistoryPage {
            session_id: session_id.to_string(),
            messages,
            total,
            limit,
            offset: query.offset,
        })
    }
}
