//! Response intake with dual-id deduplication.

use relay_core::{
    NewResponse, RelayError, Response, ResponseReceipt,
    validate::{ensure_size, optional_id, required_id},
};
use uuid::Uuid;

use crate::Relay;

/// Characters of response text included in the receipt log line.
const LOG_PREVIEW_CHARS: usize = 200;

impl Relay {
    /// Record an agent response and push it to live subscribers.
    ///
    /// A response whose `client_msg_id` matches no prompt is stored as a
    /// standalone message. A repeated `assistant_msg_id` reports success
    /// without storing anything. Delivery failures never fail the call.
    ///
    /// # Errors
    /// Returns a validation error for blank ids, empty or oversized text,
    /// and `Conflict` when a real prompt already has a response.
    pub async fn create_response(&self, req: NewResponse) -> Result<ResponseReceipt, RelayError> {
        let session_id = required_id(&req.session_id, "session_id")?;
        let client_msg_id = required_id(&req.client_msg_id, "client_msg_id")?;
        if req.text.is_empty() {
            return Err(RelayError::MissingField { field: "text" });
        }
        ensure_size(&req.text, "text", self.config.max_message_bytes)?;
        let assistant_msg_id = optional_id(req.assistant_msg_id.as_deref(), "assistant_msg_id")?
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        tracing::info!(
            %session_id,
            %client_msg_id,
            %assistant_msg_id,
            preview = %preview(&req.text),
            has_metadata = req.metadata.is_some(),
            "Received response"
        );

        let receipt = ResponseReceipt {
            ok: true,
            assistant_msg_id: assistant_msg_id.clone(),
            delivered: true,
        };

        let session = self.store.get_or_create(&session_id).await;
        let response = {
            let mut state = session.lock().await;
            if state.has_response(&assistant_msg_id) {
                tracing::debug!(%session_id, %assistant_msg_id, "Duplicate response ignored");
                return Ok(receipt);
            }

            let has_prompt = state.has_prompt(&client_msg_id);
            if !has_prompt {
                tracing::warn!(
                    %session_id,
                    %client_msg_id,
                    "No matching prompt, storing standalone response"
                );
            } else if state.has_response_for(&client_msg_id) {
                return Err(RelayError::Conflict(client_msg_id));
            }

            let response = Response {
                session_id,
                assistant_msg_id,
                client_msg_id,
                text: req.text,
                metadata: req.metadata,
                ts: req
                    .ts
                    .filter(|ts| *ts > 0)
                    .unwrap_or_else(|| self.clock.now_ms()),
            };
            state.record_response(response.clone());
            response
        };

        self.broadcast(&session, &response).await;
        Ok(receipt)
    }
}

fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(LOG_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use relay_core::{HistoryEntry, HistoryQuery, NewPrompt, config::MAX_MESSAGE_BYTES};

    use super::*;

    async fn relay_with_prompt(id: &str) -> Relay {
        let relay = Relay::default();
        relay
            .create_prompt(NewPrompt::new("s", "question").with_client_msg_id(id))
            .await
            .unwrap();
        relay
    }

    async fn history_len(relay: &Relay) -> usize {
        relay.history("s", HistoryQuery::default()).await.unwrap().total
    }

    #[tokio::test]
    async fn test_generates_assistant_msg_id() {
        let relay = relay_with_prompt("c1").await;
        let receipt = relay
            .create_response(NewResponse::new("s", "c1", "answer"))
            .await
            .unwrap();
        assert!(receipt.ok && receipt.delivered);
        assert!(Uuid::parse_str(&receipt.assistant_msg_id).is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_assistant_id_is_idempotent() {
        let relay = relay_with_prompt("c1").await;
        let req = NewResponse::new("s", "c1", "answer").with_assistant_msg_id("a1");

        let first = relay.create_response(req.clone()).await.unwrap();
        let second = relay.create_response(req).await.unwrap();
        assert_eq!(first, second);
        assert!(second.delivered);
        assert_eq!(history_len(&relay).await, 2);
    }

    #[tokio::test]
    async fn test_second_response_to_real_prompt_conflicts() {
        let relay = relay_with_prompt("c1").await;
        relay
            .create_response(NewResponse::new("s", "c1", "first").with_assistant_msg_id("a1"))
            .await
            .unwrap();
        let err = relay
            .create_response(NewResponse::new("s", "c1", "second").with_assistant_msg_id("a2"))
            .await
            .unwrap_err();
        assert_eq!(err, RelayError::Conflict("c1".into()));
        assert_eq!(history_len(&relay).await, 2);
    }

    #[tokio::test]
    async fn test_standalone_responses_allow_repeats() {
        let relay = Relay::default();
        for text in ["status 1", "status 2"] {
            let receipt = relay
                .create_response(NewResponse::new("s", "monitor", text))
                .await
                .unwrap();
            assert!(receipt.ok);
        }
        // Auto-created session holds both.
        assert_eq!(history_len(&relay).await, 2);
    }

    #[tokio::test]
    async fn test_timestamp_assignment() {
        let relay = Relay::default();
        relay
            .create_response(NewResponse::new("s", "x", "given").with_ts(1234))
            .await
            .unwrap();
        relay
            .create_response(NewResponse::new("s", "y", "zero").with_ts(0))
            .await
            .unwrap();

        let page = relay.history("s", HistoryQuery::default()).await.unwrap();
        let ts: Vec<u64> = page.messages.iter().map(HistoryEntry::ts).collect();
        assert_eq!(ts[0], 1234);
        assert!(ts[1] > 1234);
    }

    #[tokio::test]
    async fn test_validation() {
        let relay = Relay::default();
        let err = relay
            .create_response(NewResponse::new("s", " ", "text"))
            .await
            .unwrap_err();
        assert_eq!(err, RelayError::MissingField { field: "client_msg_id" });

        let err = relay
            .create_response(NewResponse::new("s", "c", ""))
            .await
            .unwrap_err();
        assert_eq!(err, RelayError::MissingField { field: "text" });

        let err = relay
            .create_response(NewResponse::new("s", "c", "t").with_assistant_msg_id(""))
            .await
            .unwrap_err();
        assert_eq!(err, RelayError::MissingField { field: "assistant_msg_id" });
    }

    #[tokio::test]
    async fn test_size_cap_boundary() {
        let relay = Relay::default();
        let exact = "é".repeat(MAX_MESSAGE_BYTES / 2);
        assert!(
            relay
                .create_response(NewResponse::new("s", "c1", exact))
                .await
                .is_ok()
        );

        let over = format!("{}a", "é".repeat(MAX_MESSAGE_BYTES / 2));
        let err = relay
            .create_response(NewResponse::new("s", "c2", over))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::TooLarge { field: "text", .. }));
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let long = "ü".repeat(250);
        let short = preview(&long);
        assert!(short.ends_with("..."));
        assert_eq!(short.chars().count(), LOG_PREVIEW_CHARS + 3);
        assert_eq!(preview("short"), "short");
    }
}
