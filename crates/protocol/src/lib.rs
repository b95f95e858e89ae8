//! Wire protocol for reelcast controller/display synchronization.
//!
//! Controllers and displays exchange JSON frames over a persistent
//! WebSocket connection, scoped by named channels. The frame set is
//! closed: routing rules are written once against the [`Frame`] enum
//! rather than scattered per message type.

pub mod constants;
pub mod frame;

// Re-export primary types for convenience.
pub use constants::{DEFAULT_CHANNEL, SEND_BUFFER_SIZE, WS_MAX_FRAME_SIZE};
pub use frame::{Frame, Role};
