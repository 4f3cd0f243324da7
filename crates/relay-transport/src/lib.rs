//! HTTP and WebSocket transport for the prompt relay.
//!
//! Provides:
//! - Inbound live-channel protocol (pong only)
//! - REST routes for prompts, responses, history and health
//! - WebSocket live channel with heartbeat

pub mod http;
pub mod protocol;
pub mod websocket;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use relay_session::Relay;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use http::ApiError;
pub use protocol::{Inbound, parse_inbound};

/// Build the relay router.
///
/// # Example
/// ```ignore
/// let relay = Arc::new(Relay::new(RelayConfig::default()));
/// axum::serve(listener, relay_transport::router(relay)).await?;
/// ```
pub fn router(relay: Arc<Relay>) -> Router {
    Router::new()
        .route("/", get(http::root))
        .route("/healthz", get(http::healthz))
        .route("/prompt", post(http::create_prompt))
        .route("/prompts/{session_id}", get(http::fetch_prompts))
        .route("/response", post(http::create_response))
        .route("/messages/{session_id}", get(http::get_messages))
        .route("/ws/{session_id}", get(websocket::ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(relay)
}
