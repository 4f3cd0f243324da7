//! HTTP side of the relay client.

use relay_core::{HistoryEntry, HistoryPage, NewPrompt, PromptReceipt, Response};
use serde::de::DeserializeOwned;

use crate::{
    error::{ClientError, Result},
    live::LiveChannel,
};

/// Client bound to one relay server and session.
#[derive(Debug, Clone)]
pub struct RelayClient {
    http: reqwest::Client,
    server_url: String,
    session_id: String,
}

impl RelayClient {
    #[must_use]
    pub fn new(server_url: impl Into<String>, session_id: impl Into<String>) -> Self {
        let server_url: String = server_url.into();
        Self {
            http: reqwest::Client::new(),
            server_url: server_url.trim_end_matches('/').to_string(),
            session_id: session_id.into(),
        }
    }

    #[must_use]
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Live-channel URL for this session.
    #[must_use]
    pub fn live_url(&self) -> String {
        let base = if let Some(rest) = self.server_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.server_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            self.server_url.clone()
        };
        format!("{base}/ws/{}", self.session_id)
    }

    /// Submit a prompt; the relay assigns the correlation id.
    ///
    /// # Errors
    /// Returns an error if the request fails or the relay rejects it.
    pub async fn send_prompt(&self, prompt: &str) -> Result<PromptReceipt> {
        let body = NewPrompt::new(&self.session_id, prompt);
        let resp = self
            .http
            .post(format!("{}/prompt", self.server_url))
            .json(&body)
            .send()
            .await?;
        decode(resp).await
    }

    /// Fetch one page of history, oldest first.
    ///
    /// # Errors
    /// Returns an error if the request fails or the session is unknown.
    pub async fn history(&self, limit: usize, offset: usize) -> Result<HistoryPage> {
        let resp = self
            .http
            .get(format!("{}/messages/{}", self.server_url, self.session_id))
            .query(&[("limit", limit), ("offset", offset)])
            .send()
            .await?;
        decode(resp).await
    }

    /// Fetch the last `count` history entries.
    ///
    /// # Errors
    /// Returns an error if the request fails or the session is unknown.
    pub async fn recent_history(&self, count: usize) -> Result<HistoryPage> {
        let page = self.history(count, 0).await?;
        if page.total <= count {
            return Ok(page);
        }
        self.history(count, page.total - count).await
    }

    /// Look up an already stored response to a prompt.
    ///
    /// # Errors
    /// Returns an error if the history request fails.
    pub async fn find_response(&self, client_msg_id: &str, limit: usize) -> Result<Option<Response>> {
        let page = self.recent_history(limit).await?;
        Ok(page.messages.into_iter().find_map(|entry| match entry {
            HistoryEntry::Response(r) if r.client_msg_id == client_msg_id => Some(r),
            _ => None,
        }))
    }

    /// Open the live channel.
    ///
    /// # Errors
    /// Returns an error if the handshake fails.
    pub async fn connect_live(&self) -> Result<LiveChannel> {
        LiveChannel::connect(&self.live_url(), &self.session_id).await
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::Server {
            status: status.as_u16(),
            body,
        });
    }
    Ok(resp.json().await?)
}
