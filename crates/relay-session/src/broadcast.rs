//! Live subscriber registration and response fan-out.

use std::sync::Arc;

use relay_core::{ConnectionState, LiveEvent, RelayError, Response, Subscriber, SubscriberId};

use crate::{Relay, Session};

impl Relay {
    /// Attach a live subscriber to an existing session.
    ///
    /// # Errors
    /// Returns `SessionNotFound` if the session does not exist. Live
    /// subscriptions never create sessions.
    pub async fn subscribe(
        &self,
        session_id: &str,
        subscriber: Arc<dyn Subscriber>,
    ) -> Result<(), RelayError> {
        let session = self.require_session(session_id).await?;
        let subscriber_id = subscriber.id();
        subscriber.advance(ConnectionState::Subscribed);
        let count = {
            let mut state = session.lock().await;
            state.add_subscriber(subscriber);
            state.subscriber_count()
        };
        tracing::info!(session_id, %subscriber_id, subscribers = count, "Subscriber attached");
        Ok(())
    }

    /// Detach a live subscriber. Safe to call repeatedly.
    ///
    /// Returns whether the subscriber was still registered.
    pub async fn unsubscribe(&self, session_id: &str, subscriber_id: SubscriberId) -> bool {
        let Some(session) = self.store.get(session_id).await else {
            return false;
        };
        let removed = session.lock().await.remove_subscriber(subscriber_id);
        if removed {
            tracing::info!(session_id, %subscriber_id, "Subscriber detached");
        }
        removed
    }

    /// Whether the subscriber is registered on the session.
    pub async fn is_subscribed(&self, session_id: &str, subscriber_id: SubscriberId) -> bool {
        match self.store.get(session_id).await {
            Some(session) => session.lock().await.is_subscribed(subscriber_id),
            None => false,
        }
    }

    /// Push a response to every live subscriber of the session.
    ///
    /// The subscriber set is snapshotted under the lock and delivery happens
    /// outside it. Subscribers that fail are marked stale and removed in a
    /// second lock acquisition. Returns the number of successful deliveries.
    pub async fn broadcast(&self, session: &Session, response: &Response) -> usize {
        let subscribers = session.lock().await.subscribers();

        let mut delivered = 0;
        let mut stale = Vec::new();
        for subscriber in &subscribers {
            let event = LiveEvent::Message {
                data: response.clone(),
            };
            match subscriber.try_send(event) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(
                        session_id = session.id(),
                        subscriber_id = %subscriber.id(),
                        error = %e,
                        "Delivery failed, evicting subscriber"
                    );
                    subscriber.advance(ConnectionState::Stale);
                    stale.push(subscriber.id());
                }
            }
        }

        if !stale.is_empty() {
            let mut state = session.lock().await;
            for id in stale {
                state.remove_subscriber(id);
            }
        }

        tracing::debug!(
            session_id = session.id(),
            assistant_msg_id = %response.assistant_msg_id,
            recipients = subscribers.len(),
            delivered,
            "Broadcast response"
        );
        delivered
    }
}
