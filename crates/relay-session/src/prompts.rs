//! Prompt intake and long-poll delivery.

use std::time::Duration;

use relay_core::{
    NewPrompt, Prompt, PromptReceipt, RelayError,
    validate::{ensure_size, optional_id, required_id},
};
use uuid::Uuid;

use crate::Relay;

impl Relay {
    /// Store a prompt and wake long-poll waiters.
    ///
    /// Re-submitting an existing `client_msg_id` returns it unchanged without
    /// storing anything.
    ///
    /// # Errors
    /// Returns a validation error for a blank session id, blank prompt text,
    /// blank `client_msg_id` or oversized prompt.
    pub async fn create_prompt(&self, req: NewPrompt) -> Result<PromptReceipt, RelayError> {
        let session_id = required_id(&req.session_id, "session_id")?;
        if req.prompt.trim().is_empty() {
            return Err(RelayError::MissingField { field: "prompt" });
        }
        ensure_size(&req.prompt, "prompt", self.config.max_message_bytes)?;
        let client_msg_id = optional_id(req.client_msg_id.as_deref(), "client_msg_id")?
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let session = self.store.get_or_create(&session_id).await;
        let mut state = session.lock().await;
        if state.has_prompt(&client_msg_id) {
            tracing::debug!(%session_id, %client_msg_id, "Duplicate prompt ignored");
            return Ok(PromptReceipt {
                stored: true,
                client_msg_id,
            });
        }

        let prompt = Prompt {
            session_id: session_id.clone(),
            client_msg_id: client_msg_id.clone(),
            prompt: req.prompt,
            metadata: req.metadata,
            ts: self.clock.now_ms(),
        };
        state.insert_prompt(prompt);
        session.notify_waiters();
        drop(state);

        tracing::info!(%session_id, %client_msg_id, "Stored prompt");
        Ok(PromptReceipt {
            stored: true,
            client_msg_id,
        })
    }

    /// Fetch unanswered prompts, oldest first.
    ///
    /// With `wait` set and a non-zero timeout, blocks until a prompt is
    /// pending or the timeout elapses, in which case the result is empty.
    /// `timeout_secs` defaults to the configured poll timeout.
    ///
    /// # Errors
    /// Returns `OutOfRange` when the timeout exceeds the configured maximum
    /// and `SessionNotFound` for an unknown session.
    pub async fn fetch_pending_prompts(
        &self,
        session_id: &str,
        timeout_secs: Option<u64>,
        wait: bool,
    ) -> Result<Vec<Prompt>, RelayError> {
        let max = self.config.max_poll_timeout_secs;
        let timeout_secs = timeout_secs.unwrap_or(self.config.default_poll_timeout_secs);
        if timeout_secs > max {
            return Err(RelayError::OutOfRange {
                field: "timeout",
                reason: format!("must be between 0 and {max}"),
            });
        }

        let session = self.require_session(session_id).await?;
        let wait = wait.then(|| Duration::from_secs(timeout_secs));
        let pending = session.wait_for_pending(wait).await;
        tracing::debug!(session_id, count = pending.len(), "Served pending prompts");
        Ok(pending)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use relay_core::{HistoryQuery, NewResponse, config::MAX_MESSAGE_BYTES};
    use tokio::time::Instant;
    use tokio_test::{assert_pending, assert_ready, task};

    use super::*;

    #[tokio::test]
    async fn test_generates_client_msg_id() {
        let relay = Relay::default();
        let receipt = relay.create_prompt(NewPrompt::new("s", "hi")).await.unwrap();
        assert!(receipt.stored);
        assert!(Uuid::parse_str(&receipt.client_msg_id).is_ok());
    }

    #[tokio::test]
    async fn test_resubmission_is_idempotent() {
        let relay = Relay::default();
        let first = relay
            .create_prompt(NewPrompt::new("s", "hi").with_client_msg_id("c1"))
            .await
            .unwrap();
        let second = relay
            .create_prompt(NewPrompt::new("s", "changed").with_client_msg_id("c1"))
            .await
            .unwrap();
        assert_eq!(first, second);

        let page = relay.history("s", HistoryQuery::default()).await.unwrap();
        assert_eq!(page.total, 1);
        let pending = relay.fetch_pending_prompts("s", None, false).await.unwrap();
        assert_eq!(pending[0].prompt, "hi");
    }

    #[tokio::test]
    async fn test_ids_are_trimmed() {
        let relay = Relay::default();
        let receipt = relay
            .create_prompt(NewPrompt::new("  s ", "hi").with_client_msg_id(" c1 "))
            .await
            .unwrap();
        assert_eq!(receipt.client_msg_id, "c1");
        assert!(relay.store().get("s").await.is_some());
    }

    #[tokio::test]
    async fn test_validation() {
        let relay = Relay::default();
        let cases = [
            (NewPrompt::new("", "hi"), "session_id"),
            (NewPrompt::new("s", "   "), "prompt"),
            (NewPrompt::new("s", "hi").with_client_msg_id(" "), "client_msg_id"),
        ];
        for (req, field) in cases {
            let err = relay.create_prompt(req).await.unwrap_err();
            assert_eq!(err, RelayError::MissingField { field });
        }
        assert!(relay.store().is_empty().await);
    }

    #[tokio::test]
    async fn test_size_cap_boundary() {
        let relay = Relay::default();
        let exact = "a".repeat(MAX_MESSAGE_BYTES);
        assert!(relay.create_prompt(NewPrompt::new("s", exact)).await.is_ok());

        let over = "a".repeat(MAX_MESSAGE_BYTES + 1);
        let err = relay.create_prompt(NewPrompt::new("s", over)).await.unwrap_err();
        assert!(matches!(err, RelayError::TooLarge { field: "prompt", .. }));
    }

    #[tokio::test]
    async fn test_fetch_unknown_session() {
        let relay = Relay::default();
        let err = relay
            .fetch_pending_prompts("nope", Some(0), true)
            .await
            .unwrap_err();
        assert_eq!(err, RelayError::SessionNotFound("nope".into()));
    }

    #[tokio::test]
    async fn test_fetch_timeout_bound() {
        let relay = Relay::default();
        relay.create_prompt(NewPrompt::new("s", "hi")).await.unwrap();
        let err = relay
            .fetch_pending_prompts("s", Some(301), true)
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::OutOfRange { field: "timeout", .. }));
    }

    #[tokio::test]
    async fn test_pending_excludes_answered_prompts() {
        let relay = Relay::default();
        for id in ["a", "b"] {
            relay
                .create_prompt(NewPrompt::new("s", id).with_client_msg_id(id))
                .await
                .unwrap();
        }
        relay
            .create_response(NewResponse::new("s", "a", "done"))
            .await
            .unwrap();

        let pending = relay.fetch_pending_prompts("s", Some(5), true).await.unwrap();
        let ids: Vec<_> = pending.iter().map(|p| p.client_msg_id.as_str()).collect();
        assert_eq!(ids, ["b"]);
    }

    #[tokio::test]
    async fn test_non_blocking_fetch_returns_empty() {
        let relay = Relay::default();
        relay
            .create_prompt(NewPrompt::new("s", "a").with_client_msg_id("a"))
            .await
            .unwrap();
        relay
            .create_response(NewResponse::new("s", "a", "done"))
            .await
            .unwrap();

        let mut fetch = task::spawn(relay.fetch_pending_prompts("s", Some(30), false));
        let pending = assert_ready!(fetch.poll()).unwrap();
        assert!(pending.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_poll_wakes_on_new_prompt() {
        let relay = Arc::new(Relay::default());
        relay
            .create_prompt(NewPrompt::new("s", "seed").with_client_msg_id("seed"))
            .await
            .unwrap();
        relay
            .create_response(NewResponse::new("s", "seed", "done"))
            .await
            .unwrap();

        let start = Instant::now();
        let poller = {
            let relay = Arc::clone(&relay);
            tokio::spawn(async move { relay.fetch_pending_prompts("s", Some(5), true).await })
        };

        tokio::time::sleep(Duration::from_secs(1)).await;
        relay
            .create_prompt(NewPrompt::new("s", "A").with_client_msg_id("A"))
            .await
            .unwrap();

        let pending = poller.await.unwrap().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].client_msg_id, "A");
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_poll_times_out_empty() {
        let relay = Relay::default();
        relay
            .create_prompt(NewPrompt::new("s", "seed").with_client_msg_id("seed"))
            .await
            .unwrap();
        relay
            .create_response(NewResponse::new("s", "seed", "done"))
            .await
            .unwrap();

        let start = Instant::now();
        let pending = relay.fetch_pending_prompts("s", Some(5), true).await.unwrap();
        assert!(pending.is_empty());
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_long_poll_pending_until_prompt() {
        let relay = Relay::default();
        relay
            .create_prompt(NewPrompt::new("s", "seed").with_client_msg_id("seed"))
            .await
            .unwrap();
        relay
            .create_response(NewResponse::new("s", "seed", "done"))
            .await
            .unwrap();

        let mut fetch = task::spawn(relay.fetch_pending_prompts("s", Some(60), true));
        assert_pending!(fetch.poll());

        relay
            .create_prompt(NewPrompt::new("s", "next").with_client_msg_id("next"))
            .await
            .unwrap();
        assert!(fetch.is_woken());
        let pending = assert_ready!(fetch.poll()).unwrap();
        assert_eq!(pending[0].client_msg_id, "next");
    }
}
