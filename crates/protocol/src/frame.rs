//! Frame and role types exchanged over the relay.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::DEFAULT_CHANNEL;

/// The role a connection holds for its lifetime.
///
/// Controllers originate state and commands; displays originate
/// events and state requests. The legacy `panel`/`overlay` names are
/// accepted on input for older clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[serde(alias = "panel")]
    Controller,
    #[serde(alias = "overlay")]
    Display,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Controller => write!(f, "controller"),
            Role::Display => write!(f, "display"),
        }
    }
}

/// A wire frame.
///
/// JSON objects with a `type` discriminator. Payloads are opaque to
/// the relay: they are carried as raw JSON values, never inspected or
/// merged. A missing `channel` falls back to [`DEFAULT_CHANNEL`];
/// unknown `type` values fail to parse and the input is dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Frame {
    /// First frame on every connection: claim a role in a channel.
    Register {
        role: Role,
        #[serde(default = "default_channel")]
        channel: String,
    },

    /// Whole-snapshot application state, controller → displays.
    /// Latest write wins; the relay holds no copy after forwarding.
    State {
        #[serde(default = "default_channel")]
        channel: String,
        payload: Value,
    },

    /// Fire-and-forget command, controller → displays.
    Cmd {
        #[serde(default = "default_channel")]
        channel: String,
        cmd: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<Value>,
    },

    /// Fire-and-forget event, display → controllers.
    Event {
        #[serde(default = "default_channel")]
        channel: String,
        event: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<Value>,
    },

    /// Hint from a display that it has no state yet; controllers
    /// should re-push a fresh snapshot. The relay retains none.
    RequestState {
        #[serde(default = "default_channel")]
        channel: String,
    },
}

fn default_channel() -> String {
    DEFAULT_CHANNEL.to_string()
}

impl Frame {
    /// Parses a frame from inbound text.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Serializes the frame to wire text.
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// The channel named in the frame.
    pub fn channel(&self) -> &str {
        match self {
            Frame::Register { channel, .. }
            | Frame::State { channel, .. }
            | Frame::Cmd { channel, .. }
            | Frame::Event { channel, .. }
            | Frame::RequestState { channel } => channel,
        }
    }

    /// Rewrites the channel, used when rebroadcasting: the channel a
    /// connection registered with is authoritative, not whatever the
    /// sender put in the frame.
    pub fn set_channel(&mut self, name: &str) {
        match self {
            Frame::Register { channel, .. }
            | Frame::State { channel, .. }
            | Frame::Cmd { channel, .. }
            | Frame::Event { channel, .. }
            | Frame::RequestState { channel } => {
                name.clone_into(channel);
            }
        }
    }

    /// Short kind name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Frame::Register { .. } => "register",
            Frame::State { .. } => "state",
            Frame::Cmd { .. } => "cmd",
            Frame::Event { .. } => "event",
            Frame::RequestState { .. } => "request-state",
        }
    }
}
