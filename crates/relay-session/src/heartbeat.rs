//! Periodic liveness pings for live subscribers.

use std::{sync::Arc, time::Duration};

use relay_core::{ConnectionState, LiveEvent, Subscriber};
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::Relay;

/// Outcome of the heartbeat loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatResult {
    /// A ping could not be delivered; the subscriber was evicted.
    Stale,
    /// The subscriber was no longer registered.
    Deregistered,
}

impl Relay {
    /// Ping a subscriber every `interval` while it stays registered.
    ///
    /// Each ping carries the relay time the peer is expected to echo. Echoes
    /// are not enforced: a dead peer is only detected when a ping cannot be
    /// delivered. The caller aborts the task when the connection ends.
    pub async fn run_heartbeat(
        &self,
        session_id: &str,
        subscriber: Arc<dyn Subscriber>,
        interval: Duration,
    ) -> HeartbeatResult {
        let subscriber_id = subscriber.id();
        let mut ticker = time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if !self.is_subscribed(session_id, subscriber_id).await {
                return HeartbeatResult::Deregistered;
            }

            let ts = self.now_ms();
            if let Err(e) = subscriber.try_send(LiveEvent::Ping { ts }) {
                tracing::warn!(session_id, %subscriber_id, error = %e, "Heartbeat failed");
                subscriber.advance(ConnectionState::Stale);
                self.unsubscribe(session_id, subscriber_id).await;
                return HeartbeatResult::Stale;
            }
            tracing::trace!(session_id, %subscriber_id, ts, "Sent ping");
        }
    }
}

#[cfg(test)]
mod tests {
    use relay_core::NewPrompt;

    use super::*;
    use crate::ChannelSubscriber;

    async fn relay_with_session() -> Arc<Relay> {
        let relay = Arc::new(Relay::default());
        relay.create_prompt(NewPrompt::new("s", "hi")).await.unwrap();
        relay
    }

    #[tokio::test(start_paused = true)]
    async fn test_pings_at_interval() {
        let relay = relay_with_session().await;
        let (sub, mut rx) = ChannelSubscriber::new(8);
        relay.subscribe("s", sub.clone()).await.unwrap();

        let task = {
            let relay = Arc::clone(&relay);
            let sub = sub.clone();
            tokio::spawn(async move {
                relay
                    .run_heartbeat("s", sub, Duration::from_secs(30))
                    .await
            })
        };

        let start = Instant::now();
        for _ in 0..2 {
            match rx.recv().await.unwrap() {
                LiveEvent::Ping { ts } => assert!(ts > 0),
                other => panic!("unexpected event: {other:?}"),
            }
        }
        assert!(start.elapsed() >= Duration::from_secs(60));
        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_ping_evicts() {
        let relay = relay_with_session().await;
        let (sub, rx) = ChannelSubscriber::new(8);
        relay.subscribe("s", sub.clone()).await.unwrap();
        drop(rx);

        let result = relay
            .run_heartbeat("s", sub.clone(), Duration::from_secs(30))
            .await;
        assert_eq!(result, HeartbeatResult::Stale);
        assert_eq!(sub.state(), ConnectionState::Stale);
        assert!(!relay.is_subscribed("s", sub.id()).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_after_unsubscribe() {
        let relay = relay_with_session().await;
        let (sub, _rx) = ChannelSubscriber::new(8);
        relay.subscribe("s", sub.clone()).await.unwrap();
        relay.unsubscribe("s", sub.id()).await;

        let result = relay
            .run_heartbeat("s", sub, Duration::from_secs(30))
            .await;
        assert_eq!(result, HeartbeatResult::Deregistered);
    }
}
