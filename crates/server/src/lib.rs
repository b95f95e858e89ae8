//! HTTP + WebSocket front end for the reelcast relay.
//!
//! One listener serves three surfaces:
//! - `GET /ws` — the persistent duplex connection controllers and
//!   displays register over
//! - `GET /catalog/*` — asset-manifest discovery for the selection UI
//! - `GET|POST /trigger` — single-shot command injection for external
//!   automation tools, no persistent connection required
//!
//! Process restart clears all channel membership; every client must
//! re-register and re-push state.

mod routes;
mod server;
mod ws;

pub use server::{AppState, RelayServer, ServerConfig, router};

/// Errors produced by the relay server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid listen address: {0}")]
    Addr(#[from] std::net::AddrParseError),
}
