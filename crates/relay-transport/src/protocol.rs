//! Live-channel wire protocol.
//!
//! Outbound events are `relay_core::LiveEvent`. The only inbound message is
//! the heartbeat echo; everything else is answered with an error event and
//! the channel stays open.

use relay_core::LiveEvent;
use serde::Deserialize;
use serde_json::Value;

/// Close code sent when subscribing to an unknown session.
pub const SESSION_NOT_FOUND_CLOSE_CODE: u16 = 4404;

/// Close code sent after the relay evicts a subscriber (1013, try again
/// later). The peer may reconnect.
pub const EVICTED_CLOSE_CODE: u16 = 1013;

/// Close reason sent with [`EVICTED_CLOSE_CODE`].
pub const EVICTED_CLOSE_REASON: &str = "Subscriber evicted";

/// Message from a subscriber, as far as the relay understands it.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Heartbeat echo. The echoed value is accepted, not checked.
    Pong { ts: Option<Value> },
    /// Valid JSON that is not a pong.
    Unsupported,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    Pong {
        #[serde(default)]
        ts: Option<Value>,
    },
}

/// Classify an inbound text frame.
///
/// # Errors
/// Returns the parse error if the payload is not JSON.
pub fn parse_inbound(text: &str) -> Result<Inbound, serde_json::Error> {
    let value: Value = serde_json::from_str(text)?;
    Ok(match serde_json::from_value::<ClientMessage>(value) {
        Ok(ClientMessage::Pong { ts }) => Inbound::Pong { ts },
        Err(_) => Inbound::Unsupported,
    })
}

/// Reply to a payload that is not JSON.
#[must_use]
pub fn invalid_json() -> LiveEvent {
    LiveEvent::error("Invalid JSON", "WebSocket payload must be valid JSON")
}

/// Reply to a JSON message other than a pong.
#[must_use]
pub fn unsupported_type() -> LiveEvent {
    LiveEvent::error(
        "Unsupported message type",
        "Only pong messages are accepted",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pong_accepted() {
        assert_eq!(
            parse_inbound(r#"{"type":"pong","ts":123}"#).unwrap(),
            Inbound::Pong {
                ts: Some(Value::from(123))
            }
        );
        assert_eq!(
            parse_inbound(r#"{"type":"pong"}"#).unwrap(),
            Inbound::Pong { ts: None }
        );
    }

    #[test]
    fn test_other_shapes_unsupported() {
        for text in [
            r#"{"type":"message","data":{}}"#,
            r#"{"ts":1}"#,
            "[1,2,3]",
            "42",
        ] {
            assert_eq!(parse_inbound(text).unwrap(), Inbound::Unsupported, "{text}");
        }
    }

    #[test]
    fn test_malformed_payload() {
        assert!(parse_inbound("{not json").is_err());
    }

    #[test]
    fn test_rejection_shapes() {
        let json = serde_json::to_value(unsupported_type()).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["error"], "Unsupported message type");
        assert_eq!(json["details"], "Only pong messages are accepted");

        let json = serde_json::to_value(invalid_json()).unwrap();
        assert_eq!(json["error"], "Invalid JSON");
    }
}
