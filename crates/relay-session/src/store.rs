//! Process-scoped session registry.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;

use crate::Session;

/// In-memory session registry.
///
/// Sessions are created lazily and live until the store is dropped; there is
/// no eviction. Data is lost on restart.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl SessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an existing session.
    pub async fn get(&self, session_id: &str) -> Option<Arc<Session>> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Look up a session, creating it on first access.
    ///
    /// Exactly one `Session` is created per id even when several callers
    /// race on the first access.
    pub async fn get_or_create(&self, session_id: &str) -> Arc<Session> {
        if let Some(session) = self.get(session_id).await {
            return session;
        }

        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(session_id.to_string()).or_insert_with(|| {
            tracing::debug!(session_id, "Created session");
            Arc::new(Session::new(session_id))
        });
        Arc::clone(session)
    }

    /// Number of sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether no session exists yet.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
