//! Live subscriber abstraction.

use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::Response;

/// Live subscriber identifier.
pub type SubscriberId = Uuid;

/// Event pushed to a live subscriber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveEvent {
    /// A newly accepted response.
    Message { data: Response },
    /// Liveness check; the peer echoes `ts` in a pong.
    Ping { ts: u64 },
    /// Rejection of an inbound message. The channel stays open.
    Error {
        error: String,
        details: Option<String>,
    },
}

impl LiveEvent {
    /// Build an error event.
    #[must_use]
    pub fn error(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Error {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// Delivery error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("Subscriber connection closed")]
    Closed,
    #[error("Subscriber is not keeping up")]
    Lagging,
}

/// Lifecycle of a subscriber connection.
///
/// `Connecting → Subscribed → Stale | Closed`. `Stale` and `Closed` are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ConnectionState {
    Connecting = 0,
    Subscribed = 1,
    /// A delivery attempt failed.
    Stale = 2,
    /// The peer or the server closed the connection.
    Closed = 3,
}

impl ConnectionState {
    /// Whether no further transitions are allowed.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Stale | Self::Closed)
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Connecting,
            1 => Self::Subscribed,
            2 => Self::Stale,
            _ => Self::Closed,
        }
    }

    const fn allows(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Connecting, Self::Subscribed | Self::Closed)
                | (Self::Subscribed, Self::Stale | Self::Closed)
        )
    }
}

/// Atomic holder for a `ConnectionState`.
#[derive(Debug)]
pub struct ConnectionStateCell(AtomicU8);

impl Default for ConnectionStateCell {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionStateCell {
    /// Start in `Connecting`.
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicU8::new(ConnectionState::Connecting as u8))
    }

    /// Current state.
    #[must_use]
    pub fn get(&self) -> ConnectionState {
        ConnectionState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Move to `next` if the lifecycle allows it.
    ///
    /// Returns `false` when the transition is not allowed, including any
    /// transition out of a terminal state.
    pub fn advance(&self, next: ConnectionState) -> bool {
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
                ConnectionState::from_u8(cur)
                    .allows(next)
                    .then_some(next as u8)
            })
            .is_ok()
    }
}

/// A live push connection attached to a session.
///
/// The relay only attempts deliveries; the connection's lifecycle is owned
/// by whoever registered it.
pub trait Subscriber: Send + Sync {
    /// Stable identifier of this connection.
    fn id(&self) -> SubscriberId;

    /// Attempt delivery without waiting on peer I/O.
    ///
    /// # Errors
    /// Returns a `DeliveryError` when the connection cannot take the event.
    fn try_send(&self, event: LiveEvent) -> Result<(), DeliveryError>;

    /// Current lifecycle state.
    fn state(&self) -> ConnectionState;

    /// Move the connection to `next`; `false` if the lifecycle forbids it.
    fn advance(&self, next: ConnectionState) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle() {
        let cell = ConnectionStateCell::new();
        assert_eq!(cell.get(), ConnectionState::Connecting);
        assert!(!cell.advance(ConnectionState::Stale));
        assert!(cell.advance(ConnectionState::Subscribed));
        assert!(cell.advance(ConnectionState::Stale));
        assert!(cell.get().is_terminal());
        assert!(!cell.advance(ConnectionState::Closed));
        assert!(!cell.advance(ConnectionState::Subscribed));
        assert_eq!(cell.get(), ConnectionState::Stale);
    }

    #[test]
    fn test_close_before_subscribe() {
        let cell = ConnectionStateCell::new();
        assert!(cell.advance(ConnectionState::Closed));
        assert!(!cell.advance(ConnectionState::Subscribed));
    }

    #[test]
    fn test_live_event_wire_shape() {
        let ping = serde_json::to_value(LiveEvent::Ping { ts: 5 }).unwrap();
        assert_eq!(ping, serde_json::json!({"type": "ping", "ts": 5}));

        let err = serde_json::to_value(LiveEvent::error("Invalid JSON", "bad")).unwrap();
        assert_eq!(err["type"], "error");
        assert_eq!(err["details"], "bad");
    }
}
