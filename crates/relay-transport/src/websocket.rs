//! Live channel: one WebSocket per subscriber.

use std::sync::Arc;

use axum::{
    extract::{
        Path, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use relay_core::{LiveEvent, Subscriber};
use relay_session::{ChannelSubscriber, Relay};

use crate::protocol::{
    self, EVICTED_CLOSE_CODE, EVICTED_CLOSE_REASON, Inbound, SESSION_NOT_FOUND_CLOSE_CODE,
};

/// GET /ws/{session_id}
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(session_id): Path<String>,
    State(relay): State<Arc<Relay>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, session_id, relay))
}

async fn handle_socket(mut socket: WebSocket, session_id: String, relay: Arc<Relay>) {
    let (subscriber, mut rx) = ChannelSubscriber::new(relay.config().subscriber_buffer);

    if let Err(e) = relay.subscribe(&session_id, subscriber.clone()).await {
        tracing::info!(session_id, error = %e, "Rejected live subscription");
        subscriber.close();
        let frame = CloseFrame {
            code: SESSION_NOT_FOUND_CLOSE_CODE,
            reason: e.summary().into(),
        };
        let _ = socket.send(Message::Close(Some(frame))).await;
        return;
    }
    let subscriber_id = subscriber.id();

    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Forward queued events to the socket; close it once the relay evicts us
    let mut send_task = {
        let subscriber = Arc::clone(&subscriber);
        tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    biased;
                    Some(event) = rx.recv() => event,
                    () = subscriber.ended() => break,
                };
                let json = match serde_json::to_string(&event) {
                    Ok(j) => j,
                    Err(e) => {
                        tracing::error!("Failed to serialize live event: {e}");
                        continue;
                    }
                };
                if ws_sender.send(Message::Text(json.into())).await.is_err() {
                    return;
                }
            }

            let frame = CloseFrame {
                code: EVICTED_CLOSE_CODE,
                reason: EVICTED_CLOSE_REASON.into(),
            };
            let _ = ws_sender.send(Message::Close(Some(frame))).await;
        })
    };

    let heartbeat_task = {
        let relay = Arc::clone(&relay);
        let session_id = session_id.clone();
        let sub: Arc<dyn Subscriber> = subscriber.clone();
        let interval = relay.config().heartbeat_interval();
        tokio::spawn(async move { relay.run_heartbeat(&session_id, sub, interval).await })
    };

    loop {
        let msg = tokio::select! {
            msg = ws_receiver.next() => msg,
            _ = &mut send_task => {
                tracing::debug!(session_id, %subscriber_id, state = ?subscriber.state(), "Writer finished");
                break;
            }
        };
        let Some(msg) = msg else { break };
        let text = match msg {
            Ok(Message::Text(t)) => t.as_str().to_owned(),
            Ok(Message::Binary(b)) => match String::from_utf8(b.to_vec()) {
                Ok(s) => s,
                Err(_) => {
                    reply(&subscriber, protocol::invalid_json());
                    continue;
                }
            },
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => continue,
        };

        if text.trim().is_empty() {
            continue;
        }

        match protocol::parse_inbound(&text) {
            Ok(Inbound::Pong { ts }) => {
                tracing::trace!(session_id, %subscriber_id, ?ts, "Received pong");
            }
            Ok(Inbound::Unsupported) => reply(&subscriber, protocol::unsupported_type()),
            Err(e) => {
                tracing::debug!(session_id, %subscriber_id, error = %e, "Invalid live payload");
                reply(&subscriber, protocol::invalid_json());
            }
        }
    }

    send_task.abort();
    heartbeat_task.abort();
    subscriber.close();
    relay.unsubscribe(&session_id, subscriber_id).await;
    tracing::debug!(session_id, %subscriber_id, "Live connection ended");
}

fn reply(subscriber: &ChannelSubscriber, event: LiveEvent) {
    if let Err(e) = subscriber.try_send(event) {
        tracing::debug!(subscriber_id = %subscriber.id(), error = %e, "Dropped reply");
    }
}
