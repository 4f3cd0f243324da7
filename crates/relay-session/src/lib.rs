//! Session state and delivery engines for the prompt relay.
//!
//! Provides:
//! - `Relay` - process-scoped handle exposing every relay operation
//! - `SessionStore` / `Session` - per-session state behind its own lock
//! - `ChannelSubscriber` - queue-backed live subscriber
//! - Heartbeat loop for live connections

pub mod broadcast;
pub mod heartbeat;
pub mod prompts;
pub mod relay;
pub mod responses;
pub mod state;
pub mod store;
pub mod subscriber;

pub use heartbeat::HeartbeatResult;
pub use relay::{HealthStatus, Relay};
pub use state::Session;
pub use store::SessionStore;
pub use subscriber::ChannelSubscriber;
