//! Channel-scoped relay hub.
//!
//! Tracks which connections hold which role in which channel and fans
//! frames out between them: state and commands flow controller →
//! displays, events and state requests flow display → controllers.
//! Delivery is best-effort and at-most-once; a slow or closed peer
//! never blocks delivery to the others.

mod hub;

pub use hub::{ClientSender, ConnId, RelayHub};

/// Errors produced by the relay hub.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The connection already holds a role in a channel. The first
    /// registration stays authoritative.
    #[error("connection already registered")]
    AlreadyRegistered,
}
