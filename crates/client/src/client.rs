//! The controller client: connect loop, debounced pushes, reconnect.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, Notify, RwLock, mpsc, watch};
use tokio::time::Instant;
use tokio_tungstenite::tungstenite;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use reelcast_protocol::{Frame, Role};

use crate::ClientError;
use crate::types::{ClientConfig, ConnectionStatus, RemoteEvent};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Capacity for the outbound frame buffer and the inbound event buffer.
const BUFFER_SIZE: usize = 64;

/// A controller's connection to the relay.
///
/// Owns the local state snapshot. Mutations mark it dirty; pushes are
/// debounced behind a timer-armed deadline, except the explicit
/// push-now paths (right after (re)connecting, and on `request-state`
/// from a display).
pub struct ControllerClient {
    config: ClientConfig,
    state: RwLock<Value>,
    dirty: Notify,
    /// Sender into the live connection's write loop; `None` while
    /// disconnected, in which case sends fail with [`ClientError::Closed`].
    conn_tx: Mutex<Option<mpsc::Sender<String>>>,
    status_tx: watch::Sender<ConnectionStatus>,
    events_tx: mpsc::Sender<RemoteEvent>,
    events_rx: Mutex<Option<mpsc::Receiver<RemoteEvent>>>,
    cancel: CancellationToken,
}

impl ControllerClient {
    pub fn new(config: ClientConfig) -> Arc<Self> {
        let (status_tx, _) = watch::channel(ConnectionStatus::Disconnected);
        let (events_tx, events_rx) = mpsc::channel(BUFFER_SIZE);
        Arc::new(Self {
            config,
            state: RwLock::new(Value::Null),
            dirty: Notify::new(),
            conn_tx: Mutex::new(None),
            status_tx,
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
            cancel: CancellationToken::new(),
        })
    }

    /// Subscribes to connection status changes.
    pub fn status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_tx.subscribe()
    }

    /// Takes the receiver for events relayed from displays. Can only
    /// be called once.
    pub async fn take_events(&self) -> Option<mpsc::Receiver<RemoteEvent>> {
        self.events_rx.lock().await.take()
    }

    /// Stops the run loop and closes the connection.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Mutates the local state snapshot and schedules a debounced push.
    ///
    /// Works while disconnected too: the snapshot keeps the latest
    /// value and the next successful open pushes it in full.
    pub async fn update_state(&self, mutate: impl FnOnce(&mut Value)) {
        {
            let mut state = self.state.write().await;
            mutate(&mut state);
        }
        self.dirty.notify_one();
    }

    /// Replaces the whole state snapshot (latest write wins).
    pub async fn set_state(&self, value: Value) {
        self.update_state(|state| *state = value).await;
    }

    /// Pushes the current snapshot immediately, bypassing the debounce.
    pub async fn push_state_now(&self) -> Result<(), ClientError> {
        let frame = self.state_frame().await;
        self.send_frame(frame).await
    }

    /// Sends a fire-and-forget command to the displays in the channel.
    pub async fn send_cmd(&self, cmd: &str, payload: Option<Value>) -> Result<(), ClientError> {
        let frame = Frame::Cmd {
            channel: self.config.channel.clone(),
            cmd: cmd.to_string(),
            payload,
        };
        self.send_frame(frame).await
    }

    /// Runs the connect/reconnect loop until [`shutdown`](Self::shutdown).
    ///
    /// Backoff grows geometrically per failed attempt and resets on
    /// every successful open.
    pub async fn run(&self) {
        let mut attempt: u32 = 0;
        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            let status = if attempt == 0 {
                ConnectionStatus::Connecting
            } else {
                ConnectionStatus::Reconnecting { attempt }
            };
            let _ = self.status_tx.send(status);

            match tokio_tungstenite::connect_async(&self.config.url).await {
                Ok((ws, _)) => {
                    info!(url = %self.config.url, channel = %self.config.channel, "connected");
                    attempt = 0;
                    let _ = self.status_tx.send(ConnectionStatus::Connected);
                    self.run_connection(ws).await;
                    let _ = self.status_tx.send(ConnectionStatus::Disconnected);
                    if self.cancel.is_cancelled() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(url = %self.config.url, "connect failed: {e}");
                    let _ = self.status_tx.send(ConnectionStatus::Disconnected);
                }
            }

            attempt = attempt.saturating_add(1);
            let delay = self.config.reconnect.delay_for_attempt(attempt);
            debug!(attempt, delay_ms = delay.as_millis() as u64, "reconnecting after backoff");
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }
        let _ = self.status_tx.send(ConnectionStatus::Disconnected);
    }

    /// Drives one live connection until it drops or the client stops.
    async fn run_connection(&self, ws: WsStream) {
        let (mut write, mut read) = ws.split();

        // Register, then an undebounced full-state push: the relay
        // holds no snapshot for late-joining displays.
        let register = Frame::Register {
            role: Role::Controller,
            channel: self.config.channel.clone(),
        };
        for frame in [register, self.state_frame().await] {
            let Ok(text) = frame.to_text() else { return };
            if write
                .send(tungstenite::Message::Text(text.into()))
                .await
                .is_err()
            {
                return;
            }
        }

        let (conn_tx, mut conn_rx) = mpsc::channel::<String>(BUFFER_SIZE);
        *self.conn_tx.lock().await = Some(conn_tx);

        // Debounce deadline; armed by the first mutation after a push.
        let mut push_at: Option<Instant> = None;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    let _ = write.send(tungstenite::Message::Close(None)).await;
                    break;
                }

                Some(text) = conn_rx.recv() => {
                    if write.send(tungstenite::Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }

                msg = read.next() => {
                    match msg {
                        Some(Ok(tungstenite::Message::Text(text))) => {
                            match Frame::parse(&text) {
                                Ok(Frame::RequestState { .. }) => {
                                    // A display with no state yet; re-push
                                    // immediately and disarm the debounce.
                                    push_at = None;
                                    if self.write_state(&mut write).await.is_err() {
                                        break;
                                    }
                                }
                                Ok(Frame::Event { event, payload, .. }) => {
                                    if self.events_tx.try_send(RemoteEvent { event, payload }).is_err() {
                                        debug!("event buffer full, dropping event");
                                    }
                                }
                                Ok(other) => {
                                    debug!(kind = other.kind(), "ignoring frame");
                                }
                                Err(e) => debug!("dropping malformed frame: {e}"),
                            }
                        }
                        Some(Ok(tungstenite::Message::Ping(data))) => {
                            let _ = write.send(tungstenite::Message::Pong(data)).await;
                        }
                        Some(Ok(tungstenite::Message::Close(_))) | None => {
                            debug!("connection closed by peer");
                            break;
                        }
                        Some(Err(e)) => {
                            warn!("read error: {e}");
                            break;
                        }
                        Some(Ok(_)) => {}
                    }
                }

                _ = self.dirty.notified() => {
                    // Arm the deadline if not already armed; further
                    // mutations inside the window coalesce into one push.
                    if push_at.is_none() {
                        push_at = Some(Instant::now() + self.config.debounce);
                    }
                }

                _ = maybe_sleep_until(push_at) => {
                    push_at = None;
                    if self.write_state(&mut write).await.is_err() {
                        break;
                    }
                }
            }
        }

        *self.conn_tx.lock().await = None;
    }

    async fn state_frame(&self) -> Frame {
        Frame::State {
            channel: self.config.channel.clone(),
            payload: self.state.read().await.clone(),
        }
    }

    async fn write_state<S>(&self, write: &mut S) -> Result<(), ()>
    where
        S: SinkExt<tungstenite::Message, Error = tungstenite::Error> + Unpin,
    {
        let frame = self.state_frame().await;
        let Ok(text) = frame.to_text() else {
            return Ok(());
        };
        write
            .send(tungstenite::Message::Text(text.into()))
            .await
            .map_err(|e| {
                warn!("write error: {e}");
            })
    }

    async fn send_frame(&self, frame: Frame) -> Result<(), ClientError> {
        let text = frame.to_text()?;
        let guard = self.conn_tx.lock().await;
        match guard.as_ref() {
            Some(tx) if tx.try_send(text).is_ok() => Ok(()),
            _ => Err(ClientError::Closed),
        }
    }
}

/// Sleeps until the deadline, or forever when none is armed (the
/// branch is then effectively disabled in `select!`).
async fn maybe_sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
