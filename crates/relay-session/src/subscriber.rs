//! Queue-backed live subscriber.

use std::sync::Arc;

use relay_core::{
    ConnectionState, ConnectionStateCell, DeliveryError, LiveEvent, Subscriber, SubscriberId,
};
use tokio::sync::{
    Notify,
    mpsc::{self, error::TrySendError},
};
use uuid::Uuid;

/// Subscriber that hands events to a bounded queue.
///
/// The owner drains the receiver and writes to the actual connection; once
/// that writer stops, deliveries fail and the relay evicts the subscriber.
/// The owner learns about eviction through [`ChannelSubscriber::ended`].
pub struct ChannelSubscriber {
    id: SubscriberId,
    tx: mpsc::Sender<LiveEvent>,
    state: ConnectionStateCell,
    ended: Notify,
}

impl ChannelSubscriber {
    /// Create a subscriber with a queue of `buffer` events.
    #[must_use]
    pub fn new(buffer: usize) -> (Arc<Self>, mpsc::Receiver<LiveEvent>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let subscriber = Arc::new(Self {
            id: Uuid::new_v4(),
            tx,
            state: ConnectionStateCell::new(),
            ended: Notify::new(),
        });
        (subscriber, rx)
    }

    /// Mark the connection closed. Further deliveries fail.
    pub fn close(&self) {
        self.advance(ConnectionState::Closed);
    }

    /// Resolve once the subscriber is `Stale` or `Closed`.
    pub async fn ended(&self) {
        // Created before the check so a transition in between still wakes it.
        let notified = self.ended.notified();
        if self.state.get().is_terminal() {
            return;
        }
        notified.await;
    }
}

impl Subscriber for ChannelSubscriber {
    fn id(&self) -> SubscriberId {
        self.id
    }

    fn try_send(&self, event: LiveEvent) -> Result<(), DeliveryError> {
        if self.state.get().is_terminal() {
            return Err(DeliveryError::Closed);
        }
        self.tx.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::Lagging,
            TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }

    fn state(&self) -> ConnectionState {
        self.state.get()
    }

    fn advance(&self, next: ConnectionState) -> bool {
        let moved = self.state.advance(next);
        if moved {
            tracing::debug!(subscriber_id = %self.id, state = ?next, "Subscriber state changed");
            if next.is_terminal() {
                self.ended.notify_waiters();
            }
        }
        moved
    }
}
