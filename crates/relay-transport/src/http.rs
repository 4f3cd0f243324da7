//! REST handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use relay_core::{
    ErrorKind, HistoryPage, HistoryQuery, NewPrompt, NewResponse, Prompt, PromptReceipt,
    RelayError, ResponseReceipt,
};
use relay_session::{HealthStatus, Relay};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// API error.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] RelayError);

impl ApiError {
    /// Underlying relay error.
    #[must_use]
    pub const fn relay_error(&self) -> &RelayError {
        &self.0
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(RelayError::InvalidRequest(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(RelayError::InvalidRequest(rejection.body_text()))
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    kind: ErrorKind,
    details: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status = match kind {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            // `Timeout` is never produced by `RelayError::kind`
            ErrorKind::ValidationError | ErrorKind::Timeout => StatusCode::BAD_REQUEST,
        };
        tracing::debug!(status = %status, error = %self.0, "Request failed");

        let body = ErrorBody {
            error: self.0.summary(),
            kind,
            details: self.0.details(),
        };
        (status, Json(body)).into_response()
    }
}

/// Query parameters for the long-poll endpoint.
#[derive(Debug, Deserialize)]
pub struct PromptsParams {
    /// Seconds to wait; the relay default applies when absent.
    pub timeout: Option<u64>,
    #[serde(default = "default_wait")]
    pub wait: bool,
}

const fn default_wait() -> bool {
    true
}

/// GET /
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Prompt relay" }))
}

/// GET /healthz
pub async fn healthz(State(relay): State<Arc<Relay>>) -> Json<HealthStatus> {
    Json(relay.health())
}

/// POST /prompt
pub async fn create_prompt(
    State(relay): State<Arc<Relay>>,
    payload: Result<Json<NewPrompt>, JsonRejection>,
) -> Result<Json<PromptReceipt>, ApiError> {
    let Json(req) = payload?;
    Ok(Json(relay.create_prompt(req).await?))
}

/// GET /prompts/{session_id}
pub async fn fetch_prompts(
    State(relay): State<Arc<Relay>>,
    Path(session_id): Path<String>,
    params: Result<Query<PromptsParams>, QueryRejection>,
) -> Result<Json<Vec<Prompt>>, ApiError> {
    let Query(params) = params?;
    let prompts = relay
        .fetch_pending_prompts(&session_id, params.timeout, params.wait)
        .await?;
    Ok(Json(prompts))
}

/// POST /response
pub async fn create_response(
    State(relay): State<Arc<Relay>>,
    payload: Result<Json<NewResponse>, JsonRejection>,
) -> Result<Json<ResponseReceipt>, ApiError> {
    let Json(req) = payload?;
    Ok(Json(relay.create_response(req).await?))
}

/// GET /messages/{session_id}
pub async fn get_messages(
    State(relay): State<Arc<Relay>>,
    Path(session_id): Path<String>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<HistoryPage>, ApiError> {
    let Query(query) = query?;
    Ok(Json(relay.history(&session_id, query).await?))
}
