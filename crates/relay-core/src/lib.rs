//! Core abstractions for the prompt relay.
//!
//! This crate provides the fundamental building blocks:
//! - `Prompt`, `Response`, `HistoryEntry` - the relayed data model
//! - `RelayError` - caller-facing error taxonomy
//! - `RelayConfig` - limits shared by every layer
//! - `Subscriber` - the seam between the relay and live push connections
//! - `Clock` - monotonic millisecond timestamps

pub mod clock;
pub mod config;
pub mod error;
pub mod traits;
pub mod types;
pub mod validate;

pub use clock::Clock;
pub use config::RelayConfig;
pub use error::{ErrorKind, RelayError};
pub use traits::{
    ConnectionState, ConnectionStateCell, DeliveryError, LiveEvent, Subscriber, SubscriberId,
};
pub use types::{
    HistoryEntry, HistoryPage, HistoryQuery, Metadata, NewPrompt, NewResponse, Prompt,
    PromptReceipt, Response, ResponseReceipt,
};
