//! Per-session state.

use std::{collections::HashMap, sync::Arc, time::Duration};

use relay_core::{HistoryEntry, Prompt, Response, Subscriber, SubscriberId};
use tokio::{
    sync::{Mutex, MutexGuard, Notify},
    time::{Instant, timeout_at},
};

/// Mutable data of one session. Only reachable through `Session::lock`.
#[derive(Default)]
pub struct SessionState {
    prompts: HashMap<String, Prompt>,
    /// Correlation ids in arrival order.
    prompt_order: Vec<String>,
    responses_by_client: HashMap<String, Arc<Response>>,
    responses_by_assistant: HashMap<String, Arc<Response>>,
    subscribers: HashMap<SubscriberId, Arc<dyn Subscriber>>,
    history: Vec<HistoryEntry>,
}

impl SessionState {
    /// Whether a prompt with this correlation id is stored.
    #[must_use]
    pub fn has_prompt(&self, client_msg_id: &str) -> bool {
        self.prompts.contains_key(client_msg_id)
    }

    /// Whether a response is recorded for this correlation id.
    #[must_use]
    pub fn has_response_for(&self, client_msg_id: &str) -> bool {
        self.responses_by_client.contains_key(client_msg_id)
    }

    /// Whether a response with this id is recorded.
    #[must_use]
    pub fn has_response(&self, assistant_msg_id: &str) -> bool {
        self.responses_by_assistant.contains_key(assistant_msg_id)
    }

    /// Store a prompt and append it to history.
    ///
    /// Returns `false` without touching anything if the correlation id is
    /// already taken.
    pub fn insert_prompt(&mut self, prompt: Prompt) -> bool {
        if self.prompts.contains_key(&prompt.client_msg_id) {
            return false;
        }
        self.prompt_order.push(prompt.client_msg_id.clone());
        self.history.push(HistoryEntry::Prompt(prompt.clone()));
        self.prompts.insert(prompt.client_msg_id.clone(), prompt);
        true
    }

    /// Store a response under both ids and append it to history.
    pub fn record_response(&mut self, response: Response) {
        self.history.push(HistoryEntry::Response(response.clone()));
        let response = Arc::new(response);
        self.responses_by_client
            .insert(response.client_msg_id.clone(), Arc::clone(&response));
        self.responses_by_assistant
            .insert(response.assistant_msg_id.clone(), response);
    }

    /// Prompts without a recorded response, oldest first.
    #[must_use]
    pub fn pending_prompts(&self) -> Vec<Prompt> {
        let mut pending: Vec<Prompt> = self
            .prompt_order
            .iter()
            .filter(|id| !self.responses_by_client.contains_key(*id))
            .filter_map(|id| self.prompts.get(id))
            .cloned()
            .collect();
        pending.sort_by_key(|p| p.ts);
        pending
    }

    /// Full history in arrival order.
    #[must_use]
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Register a live subscriber.
    pub fn add_subscriber(&mut self, subscriber: Arc<dyn Subscriber>) {
        self.subscribers.insert(subscriber.id(), subscriber);
    }

    /// Remove a live subscriber. Returns whether it was registered.
    pub fn remove_subscriber(&mut self, id: SubscriberId) -> bool {
        self.subscribers.remove(&id).is_some()
    }

    /// Whether the subscriber is currently registered.
    #[must_use]
    pub fn is_subscribed(&self, id: SubscriberId) -> bool {
        self.subscribers.contains_key(&id)
    }

    /// Snapshot of the subscriber set.
    #[must_use]
    pub fn subscribers(&self) -> Vec<Arc<dyn Subscriber>> {
        self.subscribers.values().cloned().collect()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

/// One relay session: its state plus the wake signal for long-poll waiters.
pub struct Session {
    id: String,
    state: Mutex<SessionState>,
    wake: Notify,
}

impl Session {
    /// Create an empty session.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: Mutex::new(SessionState::default()),
            wake: Notify::new(),
        }
    }

    /// Session identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Acquire the session lock.
    pub async fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().await
    }

    /// Wake every task blocked in `wait_for_pending`.
    pub fn notify_waiters(&self) {
        self.wake.notify_waiters();
    }

    /// Return pending prompts, waiting up to `wait` for one to arrive.
    ///
    /// `None` or a zero duration checks once. The predicate is re-evaluated
    /// under the lock after every wake-up; an elapsed deadline yields an
    /// empty list.
    pub async fn wait_for_pending(&self, wait: Option<Duration>) -> Vec<Prompt> {
        let deadline = wait.filter(|d| !d.is_zero()).map(|d| Instant::now() + d);

        loop {
            // Register before checking so a notify between the check and
            // the await is not lost.
            let notified = self.wake.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let pending = self.lock().await.pending_prompts();
            if !pending.is_empty() {
                return pending;
            }

            let Some(deadline) = deadline else {
                return pending;
            };
            if timeout_at(deadline, notified).await.is_err() {
                return Vec::new();
            }
        }
    }
}
