//! The hub: channel registry plus routing rules.

use std::collections::HashMap;

use tokio::sync::{RwLock, mpsc};
use tracing::{debug, warn};
use uuid::Uuid;

use reelcast_protocol::{Frame, Role};

use crate::RelayError;

/// Opaque connection identifier, assigned at accept time.
pub type ConnId = Uuid;

/// Handle for delivering serialized frames to one connection.
///
/// Wraps a bounded channel drained by the connection's write task.
/// Sending never blocks: a full or closed buffer drops the frame for
/// that peer only.
#[derive(Clone)]
pub struct ClientSender {
    tx: mpsc::Sender<String>,
}

impl ClientSender {
    pub fn new(tx: mpsc::Sender<String>) -> Self {
        Self { tx }
    }

    /// Enqueues a frame for delivery. Returns `false` if the frame
    /// was dropped (peer buffer full or peer gone).
    pub fn send(&self, text: String) -> bool {
        match self.tx.try_send(text) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!("peer send buffer full, dropping frame");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }
}

/// Both role-sets of one channel.
#[derive(Default)]
struct ChannelEntry {
    controllers: HashMap<ConnId, ClientSender>,
    displays: HashMap<ConnId, ClientSender>,
}

impl ChannelEntry {
    fn set(&self, role: Role) -> &HashMap<ConnId, ClientSender> {
        match role {
            Role::Controller => &self.controllers,
            Role::Display => &self.displays,
        }
    }

    fn set_mut(&mut self, role: Role) -> &mut HashMap<ConnId, ClientSender> {
        match role {
            Role::Controller => &mut self.controllers,
            Role::Display => &mut self.displays,
        }
    }

    fn is_empty(&self) -> bool {
        self.controllers.is_empty() && self.displays.is_empty()
    }
}

#[derive(Default)]
struct Registry {
    channels: HashMap<String, ChannelEntry>,
    /// Reverse index guaranteeing a connection holds at most one role
    /// in at most one channel.
    members: HashMap<ConnId, (String, Role)>,
}

/// The relay hub. One instance per process, shared behind `Arc`.
#[derive(Default)]
pub struct RelayHub {
    registry: RwLock<Registry>,
}

impl RelayHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection to a channel under a role.
    ///
    /// A connection may register at most once; a second attempt fails
    /// with [`RelayError::AlreadyRegistered`] and the earlier
    /// registration stays authoritative. The channel entry is created
    /// on first registration.
    pub async fn register(
        &self,
        id: ConnId,
        role: Role,
        channel: &str,
        sender: ClientSender,
    ) -> Result<(), RelayError> {
        let mut reg = self.registry.write().await;
        if reg.members.contains_key(&id) {
            return Err(RelayError::AlreadyRegistered);
        }
        reg.members.insert(id, (channel.to_string(), role));
        reg.channels
            .entry(channel.to_string())
            .or_default()
            .set_mut(role)
            .insert(id, sender);

        debug!(conn = %id, %role, channel, "registered");
        Ok(())
    }

    /// Removes a connection from whichever set holds it.
    ///
    /// Idempotent: unknown or already-removed connections are a no-op.
    /// Deletes the channel entry when both role-sets become empty, so
    /// connection churn never grows the registry.
    pub async fn unregister(&self, id: ConnId) {
        let mut reg = self.registry.write().await;
        let Some((channel, role)) = reg.members.remove(&id) else {
            return;
        };
        if let Some(entry) = reg.channels.get_mut(&channel) {
            entry.set_mut(role).remove(&id);
            if entry.is_empty() {
                reg.channels.remove(&channel);
                debug!(channel, "channel empty, removed");
            }
        }
        debug!(conn = %id, %role, channel, "unregistered");
    }

    /// Routes a frame into a channel on behalf of a given origin role.
    ///
    /// State and commands broadcast to every display in the channel;
    /// events and state requests broadcast to every controller. A
    /// frame is never forwarded to the origin's own role-peers, and a
    /// frame whose kind does not match the origin role is ignored.
    /// The frame's channel field is rewritten to the routed channel.
    ///
    /// Returns the number of peers the frame was enqueued for. An
    /// unknown or empty channel delivers to nobody — not an error.
    pub async fn route(&self, origin: Role, channel: &str, mut frame: Frame) -> usize {
        let targets = match (&frame, origin) {
            (Frame::State { .. } | Frame::Cmd { .. }, Role::Controller) => Role::Display,
            (Frame::Event { .. } | Frame::RequestState { .. }, Role::Display) => Role::Controller,
            _ => {
                debug!(kind = frame.kind(), %origin, channel, "frame not routable from this role");
                return 0;
            }
        };

        frame.set_channel(channel);
        let text = match frame.to_text() {
            Ok(t) => t,
            Err(e) => {
                warn!(kind = frame.kind(), "failed to serialize frame: {e}");
                return 0;
            }
        };

        // Snapshot the target set, then send without holding the lock
        // so registration in other channels is never blocked.
        let senders: Vec<ClientSender> = {
            let reg = self.registry.read().await;
            match reg.channels.get(channel) {
                Some(entry) => entry.set(targets).values().cloned().collect(),
                None => return 0,
            }
        };

        let mut delivered = 0;
        for sender in senders {
            if sender.send(text.clone()) {
                delivered += 1;
            }
        }
        delivered
    }

    /// Routes a frame from a registered connection, using its
    /// registration-time channel and role. Frames from unregistered
    /// connections are ignored.
    pub async fn route_from(&self, id: ConnId, frame: Frame) -> usize {
        let Some((channel, role)) = self.membership(id).await else {
            debug!(conn = %id, kind = frame.kind(), "frame from unregistered connection dropped");
            return 0;
        };
        self.route(role, &channel, frame).await
    }

    /// The channel and role a connection registered with, if any.
    pub async fn membership(&self, id: ConnId) -> Option<(String, Role)> {
        self.registry.read().await.members.get(&id).cloned()
    }

    /// Number of live channels.
    pub async fn channel_count(&self) -> usize {
        self.registry.read().await.channels.len()
    }

    /// Number of connections holding `role` in `channel`.
    pub async fn role_count(&self, channel: &str, role: Role) -> usize {
        self.registry
            .read()
            .await
            .channels
            .get(channel)
            .map(|e| e.set(role).len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelcast_protocol::SEND_BUFFER_SIZE;
    use serde_json::json;

    fn client() -> (ClientSender, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(SEND_BUFFER_SIZE);
        (ClientSender::new(tx), rx)
    }

    fn state_frame(channel: &str) -> Frame {
        Frame::State {
            channel: channel.into(),
            payload: json!({"current": 3}),
        }
    }

    // -----------------------------------------------------------------------
    // registration
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn register_creates_channel() {
        let hub = RelayHub::new();
        let (tx, _rx) = client();
        let id = Uuid::new_v4();

        hub.register(id, Role::Display, "demo", tx).await.unwrap();

        assert_eq!(hub.channel_count().await, 1);
        assert_eq!(hub.role_count("demo", Role::Display).await, 1);
        assert_eq!(hub.role_count("demo", Role::Controller).await, 0);
        assert_eq!(hub.membership(id).await, Some(("demo".into(), Role::Display)));
    }

    #[tokio::test]
    async fn duplicate_register_rejected_first_wins() {
        let hub = RelayHub::new();
        let (tx1, _rx1) = client();
        let (tx2, _rx2) = client();
        let id = Uuid::new_v4();

        hub.register(id, Role::Controller, "a", tx1).await.unwrap();
        let second = hub.register(id, Role::Display, "b", tx2).await;
        assert!(matches!(second, Err(RelayError::AlreadyRegistered)));

        // Earlier registration is untouched; no channel "b" exists.
        assert_eq!(hub.membership(id).await, Some(("a".into(), Role::Controller)));
        assert_eq!(hub.channel_count().await, 1);
        assert_eq!(hub.role_count("b", Role::Display).await, 0);
    }

    #[tokio::test]
    async fn unregister_removes_and_collects_channel() {
        let hub = RelayHub::new();
        let (ctl, _rx1) = client();
        let (dsp, _rx2) = client();
        let ctl_id = Uuid::new_v4();
        let dsp_id = Uuid::new_v4();

        hub.register(ctl_id, Role::Controller, "demo", ctl).await.unwrap();
        hub.register(dsp_id, Role::Display, "demo", dsp).await.unwrap();

        hub.unregister(ctl_id).await;
        // One member left — channel survives.
        assert_eq!(hub.channel_count().await, 1);

        hub.unregister(dsp_id).await;
        // Both sets empty — channel entry deleted.
        assert_eq!(hub.channel_count().await, 0);
    }

    #[tokio::test]
    async fn unregister_is_idempotent() {
        let hub = RelayHub::new();
        let (tx, _rx) = client();
        let id = Uuid::new_v4();

        hub.register(id, Role::Display, "demo", tx).await.unwrap();
        hub.unregister(id).await;
        hub.unregister(id).await; // closing twice is safe
        hub.unregister(Uuid::new_v4()).await; // never registered

        assert_eq!(hub.channel_count().await, 0);
        assert!(hub.membership(id).await.is_none());
    }

    // -----------------------------------------------------------------------
    // routing
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn state_reaches_displays_not_controllers() {
        let hub = RelayHub::new();
        let (ctl_a, mut ctl_a_rx) = client();
        let (ctl_b, mut ctl_b_rx) = client();
        let (dsp, mut dsp_rx) = client();

        hub.register(Uuid::new_v4(), Role::Controller, "demo", ctl_a).await.unwrap();
        hub.register(Uuid::new_v4(), Role::Controller, "demo", ctl_b).await.unwrap();
        hub.register(Uuid::new_v4(), Role::Display, "demo", dsp).await.unwrap();

        let n = hub.route(Role::Controller, "demo", state_frame("demo")).await;
        assert_eq!(n, 1);

        let text = dsp_rx.recv().await.unwrap();
        let frame = Frame::parse(&text).unwrap();
        assert!(matches!(frame, Frame::State { .. }));

        // No controller ever sees another controller's traffic.
        assert!(ctl_a_rx.try_recv().is_err());
        assert!(ctl_b_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn event_reaches_controllers_only() {
        let hub = RelayHub::new();
        let (ctl, mut ctl_rx) = client();
        let (dsp_a, mut dsp_a_rx) = client();
        let (dsp_b, mut dsp_b_rx) = client();

        hub.register(Uuid::new_v4(), Role::Controller, "demo", ctl).await.unwrap();
        hub.register(Uuid::new_v4(), Role::Display, "demo", dsp_a).await.unwrap();
        hub.register(Uuid::new_v4(), Role::Display, "demo", dsp_b).await.unwrap();

        let frame = Frame::Event {
            channel: "demo".into(),
            event: "spinResult".into(),
            payload: Some(json!({"index": 2})),
        };
        let n = hub.route(Role::Display, "demo", frame).await;
        assert_eq!(n, 1);

        assert!(ctl_rx.recv().await.is_some());
        assert!(dsp_a_rx.try_recv().is_err());
        assert!(dsp_b_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn request_state_forwarded_to_controllers() {
        let hub = RelayHub::new();
        let (ctl, mut ctl_rx) = client();
        let (dsp, mut dsp_rx) = client();

        hub.register(Uuid::new_v4(), Role::Controller, "demo", ctl).await.unwrap();
        hub.register(Uuid::new_v4(), Role::Display, "demo", dsp).await.unwrap();

        let frame = Frame::RequestState {
            channel: "demo".into(),
        };
        let n = hub.route(Role::Display, "demo", frame).await;
        assert_eq!(n, 1);

        let text = ctl_rx.recv().await.unwrap();
        assert!(matches!(Frame::parse(&text).unwrap(), Frame::RequestState { .. }));
        assert!(dsp_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn channels_are_isolated() {
        let hub = RelayHub::new();
        let (dsp_x, mut x_rx) = client();
        let (dsp_y, mut y_rx) = client();

        hub.register(Uuid::new_v4(), Role::Display, "x", dsp_x).await.unwrap();
        hub.register(Uuid::new_v4(), Role::Display, "y", dsp_y).await.unwrap();

        let n = hub.route(Role::Controller, "x", state_frame("x")).await;
        assert_eq!(n, 1);

        assert!(x_rx.recv().await.is_some());
        assert!(y_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn wrong_role_frames_ignored() {
        let hub = RelayHub::new();
        let (ctl, mut ctl_rx) = client();
        let (dsp, mut dsp_rx) = client();

        hub.register(Uuid::new_v4(), Role::Controller, "demo", ctl).await.unwrap();
        hub.register(Uuid::new_v4(), Role::Display, "demo", dsp).await.unwrap();

        // A display has no business sending cmd; a controller none
        // sending event. Both are dropped.
        let cmd = Frame::Cmd {
            channel: "demo".into(),
            cmd: "next".into(),
            payload: None,
        };
        assert_eq!(hub.route(Role::Display, "demo", cmd).await, 0);

        let event = Frame::Event {
            channel: "demo".into(),
            event: "done".into(),
            payload: None,
        };
        assert_eq!(hub.route(Role::Controller, "demo", event).await, 0);

        assert!(ctl_rx.try_recv().is_err());
        assert!(dsp_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn empty_channel_routes_to_nobody() {
        let hub = RelayHub::new();
        let n = hub.route(Role::Controller, "ghost", state_frame("ghost")).await;
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn rebroadcast_carries_registered_channel() {
        let hub = RelayHub::new();
        let (dsp, mut dsp_rx) = client();
        hub.register(Uuid::new_v4(), Role::Display, "actual", dsp).await.unwrap();

        // Sender lies about the channel inside the frame; the routed
        // channel wins.
        let n = hub.route(Role::Controller, "actual", state_frame("claimed")).await;
        assert_eq!(n, 1);

        let text = dsp_rx.recv().await.unwrap();
        assert_eq!(Frame::parse(&text).unwrap().channel(), "actual");
    }

    #[tokio::test]
    async fn route_from_uses_registration_not_frame() {
        let hub = RelayHub::new();
        let (ctl, _ctl_rx) = client();
        let (dsp, mut dsp_rx) = client();
        let ctl_id = Uuid::new_v4();

        hub.register(ctl_id, Role::Controller, "home", ctl).await.unwrap();
        hub.register(Uuid::new_v4(), Role::Display, "home", dsp).await.unwrap();

        // Frame names a different channel; routing follows the
        // sender's registration.
        let n = hub.route_from(ctl_id, state_frame("elsewhere")).await;
        assert_eq!(n, 1);
        assert_eq!(Frame::parse(&dsp_rx.recv().await.unwrap()).unwrap().channel(), "home");
    }

    #[tokio::test]
    async fn route_from_unregistered_is_dropped() {
        let hub = RelayHub::new();
        let n = hub.route_from(Uuid::new_v4(), state_frame("demo")).await;
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn full_peer_buffer_drops_silently() {
        let hub = RelayHub::new();
        let (tx, mut rx) = mpsc::channel(1);
        hub.register(Uuid::new_v4(), Role::Display, "demo", ClientSender::new(tx))
            .await
            .unwrap();

        // First frame fills the capacity-1 buffer.
        assert_eq!(hub.route(Role::Controller, "demo", state_frame("demo")).await, 1);
        // Second is dropped for the backpressured peer, no blocking.
        assert_eq!(hub.route(Role::Controller, "demo", state_frame("demo")).await, 0);

        // Drain one; delivery resumes.
        assert!(rx.recv().await.is_some());
        assert_eq!(hub.route(Role::Controller, "demo", state_frame("demo")).await, 1);
    }

    #[tokio::test]
    async fn closed_peer_drops_silently() {
        let hub = RelayHub::new();
        let (tx, rx) = mpsc::channel(4);
        hub.register(Uuid::new_v4(), Role::Display, "demo", ClientSender::new(tx))
            .await
            .unwrap();
        drop(rx);

        // Peer is gone but not yet unregistered — send is a no-op.
        assert_eq!(hub.route(Role::Controller, "demo", state_frame("demo")).await, 0);
    }
}
