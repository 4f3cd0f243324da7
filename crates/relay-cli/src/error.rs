use relay_core::ErrorKind;
use thiserror::Error;

/// Client error.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("No response received after {0} seconds")]
    Timeout(u64),
}

impl ClientError {
    /// Relay error kind, when the failure maps onto one.
    #[must_use]
    pub const fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Timeout(_) => Some(ErrorKind::Timeout),
            Self::SessionNotFound(_) | Self::Server { status: 404, .. } => {
                Some(ErrorKind::NotFound)
            }
            Self::Server { status: 400, .. } => Some(ErrorKind::ValidationError),
            Self::Server { status: 409, .. } => Some(ErrorKind::Conflict),
            Self::Http(_) | Self::WebSocket(_) | Self::Server { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
