//! Relayed data model.
//!
//! Field names match the JSON wire format used by prompt producers and
//! agents, so these types are serialized as-is by the transport layer.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque key/value bag attached to prompts and responses.
pub type Metadata = HashMap<String, Value>;

/// A prompt stored in a session, waiting for (or answered by) a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    /// Session the prompt belongs to.
    pub session_id: String,
    /// Correlation id chosen by the prompt producer.
    pub client_msg_id: String,
    /// Prompt text.
    pub prompt: String,
    /// Caller-supplied metadata.
    pub metadata: Option<Metadata>,
    /// Creation time, milliseconds since the Unix epoch.
    pub ts: u64,
}

/// An agent response, optionally correlated to a prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Session the response belongs to.
    pub session_id: String,
    /// Id of this response; generated by the relay when the agent omits it.
    pub assistant_msg_id: String,
    /// Correlation id of the originating prompt. The prompt may not exist.
    pub client_msg_id: String,
    /// Response text.
    pub text: String,
    /// Caller-supplied metadata.
    pub metadata: Option<Metadata>,
    /// Milliseconds since the Unix epoch.
    pub ts: u64,
}

/// One entry of a session's append-only history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum HistoryEntry {
    /// A prompt, as first accepted.
    Prompt(Prompt),
    /// A response, as first accepted.
    #[serde(rename = "assistant")]
    Response(Response),
}

impl HistoryEntry {
    /// Timestamp of the underlying message.
    #[must_use]
    pub const fn ts(&self) -> u64 {
        match self {
            Self::Prompt(p) => p.ts,
            Self::Response(r) => r.ts,
        }
    }
}

/// Prompt submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPrompt {
    pub session_id: String,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_msg_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl NewPrompt {
    /// Build a plain prompt submission without id or metadata.
    #[must_use]
    pub fn new(session_id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            prompt: prompt.into(),
            client_msg_id: None,
            metadata: None,
        }
    }

    /// Set the correlation id.
    #[must_use]
    pub fn with_client_msg_id(mut self, id: impl Into<String>) -> Self {
        self.client_msg_id = Some(id.into());
        self
    }

    /// Attach metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Response submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewResponse {
    pub session_id: String,
    pub client_msg_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant_msg_id: Option<String>,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<u64>,
}

impl NewResponse {
    /// Build a response submission for the given correlation id.
    #[must_use]
    pub fn new(
        session_id: impl Into<String>,
        client_msg_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            client_msg_id: client_msg_id.into(),
            assistant_msg_id: None,
            text: text.into(),
            metadata: None,
            ts: None,
        }
    }

    /// Set the response id.
    #[must_use]
    pub fn with_assistant_msg_id(mut self, id: impl Into<String>) -> Self {
        self.assistant_msg_id = Some(id.into());
        self
    }

    /// Set the caller timestamp.
    #[must_use]
    pub const fn with_ts(mut self, ts: u64) -> Self {
        self.ts = Some(ts);
        self
    }
}

/// Result of `CreatePrompt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptReceipt {
    pub stored: bool,
    pub client_msg_id: String,
}

/// Result of `CreateResponse`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseReceipt {
    pub ok: bool,
    pub assistant_msg_id: String,
    pub delivered: bool,
}

/// Paging and filtering for `GetHistory`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    /// Page size; the configured default applies when absent.
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
    /// Only entries with `ts` strictly greater than this value.
    #[serde(default)]
    pub since: Option<u64>,
}

/// One page of a session's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPage {
    pub session_id: String,
    pub messages: Vec<HistoryEntry>,
    /// Number of entries matching the filter, before paging.
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}
