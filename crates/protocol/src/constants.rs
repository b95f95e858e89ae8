//! Shared protocol constants.

/// Channel joined when a client registers without naming one.
///
/// Kept as a wire-level default so a bare `{"type":"register",...}`
/// from a hand-written client still lands somewhere predictable.
pub const DEFAULT_CHANNEL: &str = "reelcast";

/// Maximum inbound text frame size in bytes (1 MiB).
///
/// State snapshots are small JSON documents; anything larger is a
/// misbehaving client and is dropped without a reply.
pub const WS_MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Capacity of each connection's outbound send buffer.
///
/// Delivery is best-effort: when a peer's buffer is full the hub
/// drops the frame for that peer instead of blocking the broadcast,
/// so the buffer only needs to absorb short bursts.
pub const SEND_BUFFER_SIZE: usize = 64;
