//! Controller-side connection lifecycle.
//!
//! A [`ControllerClient`] keeps one outbound WebSocket to the relay:
//! it registers as a controller on open, immediately pushes a full
//! state snapshot (the relay retains none across reconnects), coalesces
//! rapid local mutations into debounced pushes, answers `request-state`
//! hints with an immediate re-push, and reconnects with geometric
//! backoff when the transport drops. While disconnected, mutations
//! keep updating the local snapshot; the next successful open pushes
//! the latest state — there is no message queue.

mod client;
mod types;

pub use client::ControllerClient;
pub use types::{ClientConfig, ConnectionStatus, ReconnectConfig, RemoteEvent, SpinParams};

/// Errors produced by the controller client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("not connected")]
    Closed,
}
