//! Live channel client: streams responses, answers pings.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use relay_core::{LiveEvent, Response};
use serde_json::json;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

use crate::error::{ClientError, Result};

/// Close code the relay uses for an unknown session.
pub const SESSION_NOT_FOUND_CLOSE_CODE: u16 = 4404;

/// Delay before reconnecting a dropped live channel.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Something worth showing to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    Message(Response),
    ServerError {
        error: String,
        details: Option<String>,
    },
}

#[derive(Debug, PartialEq)]
enum Frame {
    Update(Update),
    Reply(Message),
    Closed(Option<u16>),
    Skip,
}

fn classify(msg: Message) -> Frame {
    let text = match msg {
        Message::Text(t) => t,
        Message::Close(frame) => return Frame::Closed(frame.map(|f| u16::from(f.code))),
        _ => return Frame::Skip,
    };

    match serde_json::from_str::<LiveEvent>(text.as_str()) {
        Ok(LiveEvent::Message { data }) => Frame::Update(Update::Message(data)),
        Ok(LiveEvent::Ping { ts }) => {
            Frame::Reply(Message::text(json!({ "type": "pong", "ts": ts }).to_string()))
        }
        Ok(LiveEvent::Error { error, details }) => {
            Frame::Update(Update::ServerError { error, details })
        }
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring unrecognized live frame");
            Frame::Skip
        }
    }
}

/// An open live channel for one session.
pub struct LiveChannel {
    ws: WsStream,
    session_id: String,
}

impl LiveChannel {
    /// Connect to `url`.
    ///
    /// # Errors
    /// Returns an error if the WebSocket handshake fails.
    pub async fn connect(url: &str, session_id: &str) -> Result<Self> {
        let (ws, _) = connect_async(url).await?;
        tracing::debug!(url, "Live channel connected");
        Ok(Self {
            ws,
            session_id: session_id.to_string(),
        })
    }

    /// Next user-visible update. Pings are answered along the way.
    ///
    /// Returns `None` once the relay closes the channel.
    ///
    /// # Errors
    /// Returns `SessionNotFound` if the relay rejected the subscription,
    /// or the transport error if the connection broke.
    pub async fn next_update(&mut self) -> Result<Option<Update>> {
        while let Some(msg) = self.ws.next().await {
            match classify(msg?) {
                Frame::Update(update) => return Ok(Some(update)),
                Frame::Reply(reply) => self.ws.send(reply).await?,
                Frame::Closed(Some(SESSION_NOT_FOUND_CLOSE_CODE)) => {
                    return Err(ClientError::SessionNotFound(self.session_id.clone()));
                }
                Frame::Closed(_) => return Ok(None),
                Frame::Skip => {}
            }
        }
        Ok(None)
    }

    /// Wait for the response to `client_msg_id`, skipping other traffic.
    ///
    /// # Errors
    /// Same as [`Self::next_update`].
    pub async fn wait_for_response(&mut self, client_msg_id: &str) -> Result<Option<Response>> {
        while let Some(update) = self.next_update().await? {
            match update {
                Update::Message(r) if r.client_msg_id == client_msg_id => return Ok(Some(r)),
                Update::Message(r) => {
                    tracing::debug!(client_msg_id = %r.client_msg_id, "Skipping unrelated response");
                }
                Update::ServerError { error, details } => {
                    tracing::warn!(error, ?details, "Relay reported an error");
                }
            }
        }
        Ok(None)
    }

    /// Close the channel.
    pub async fn close(mut self) {
        let _ = self.ws.close(None).await;
    }
}
