//! Public types for the controller client.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use reelcast_protocol::DEFAULT_CHANNEL;

/// Connection status surfaced to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// First connection attempt in progress.
    Connecting,
    /// Registered and pushing state.
    Connected,
    /// Connection lost, attempting to reconnect.
    Reconnecting { attempt: u32 },
    /// Connection lost.
    Disconnected,
}

/// An event received from a display (relayed through the hub).
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteEvent {
    pub event: String,
    pub payload: Option<Value>,
}

/// Configuration for automatic reconnection with geometric backoff.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt.
    pub initial_delay: Duration,
    /// Maximum delay between attempts (backoff cap).
    pub max_delay: Duration,
    /// Multiplier for each subsequent attempt.
    pub backoff_factor: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(800),
            max_delay: Duration::from_secs(5),
            backoff_factor: 1.6,
        }
    }
}

impl ReconnectConfig {
    /// Calculates the delay for a given attempt number (1-based).
    /// The attempt counter resets on every successful open, so the
    /// first drop after a good connection waits `initial_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(63) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.backoff_factor.powi(exp);
        Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()))
    }
}

/// Controller client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Relay WebSocket URL.
    pub url: String,
    /// Channel to register in.
    pub channel: String,
    /// Quiet interval for coalescing state pushes.
    pub debounce: Duration,
    pub reconnect: ReconnectConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:17311/ws".into(),
            channel: DEFAULT_CHANNEL.into(),
            debounce: Duration::from_millis(60),
            reconnect: ReconnectConfig::default(),
        }
    }
}

/// Canonical wheel-spin command payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpinParams {
    pub vel: f64,
    pub friction: f64,
}

impl Default for SpinParams {
    fn default() -> Self {
        Self {
            vel: 0.24,
            friction: 0.985,
        }
    }
}
