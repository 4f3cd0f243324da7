//! Terminal client for the prompt relay.
//!
//! Sends prompts over HTTP and receives responses over the live channel.

pub mod client;
pub mod display;
pub mod error;
pub mod live;

use std::time::Duration;

use relay_core::Response;

pub use client::RelayClient;
pub use error::{ClientError, Result};
pub use live::{LiveChannel, Update};

/// How long a one-shot prompt waits for its response.
pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(120);

/// Entries scanned when looking for a response that beat the live channel.
const LOOKBACK: usize = 100;

/// Send one prompt and wait for its response.
///
/// The prompt is posted first so the session exists when the live channel
/// subscribes; history is checked once after subscribing in case the
/// response arrived in between.
///
/// # Errors
/// Returns `Timeout` if no response arrives within `wait`, or the
/// underlying HTTP or WebSocket error.
pub async fn ask(client: &RelayClient, prompt: &str, wait: Duration) -> Result<Response> {
    let receipt = client.send_prompt(prompt).await?;
    let client_msg_id = receipt.client_msg_id;
    tracing::debug!(%client_msg_id, "Prompt stored");

    let mut live = client.connect_live().await?;
    if let Some(response) = client.find_response(&client_msg_id, LOOKBACK).await? {
        live.close().await;
        return Ok(response);
    }

    let outcome = tokio::time::timeout(wait, live.wait_for_response(&client_msg_id)).await;
    match outcome {
        Ok(Ok(Some(response))) => {
            live.close().await;
            Ok(response)
        }
        Ok(Err(e)) => Err(e),
        // Closed or timed out: the response may still have landed before
        // the subscription was registered.
        Ok(Ok(None)) | Err(_) => client
            .find_response(&client_msg_id, LOOKBACK)
            .await?
            .ok_or(ClientError::Timeout(wait.as_secs())),
    }
}
