//! WebSocket upgrade and per-connection relay loop.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use reelcast_protocol::{Frame, SEND_BUFFER_SIZE, WS_MAX_FRAME_SIZE};
use reelcast_relay::{ClientSender, ConnId, RelayError};

use crate::server::AppState;

pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

/// Runs one connection: parse inbound frames, register on `register`,
/// hand everything else to the hub, drain the outbound buffer.
///
/// Whatever ends the loop — clean close, transport error, cancelled
/// task — the connection is unregistered, so a connection is never
/// left behind in a role-set.
async fn handle_connection(socket: WebSocket, state: AppState) {
    let conn_id: ConnId = Uuid::new_v4();
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (out_tx, mut out_rx) = mpsc::channel::<String>(SEND_BUFFER_SIZE);

    debug!(conn = %conn_id, "connection open");

    loop {
        tokio::select! {
            Some(text) = out_rx.recv() => {
                if ws_tx.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }

            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if text.len() > WS_MAX_FRAME_SIZE {
                            debug!(conn = %conn_id, len = text.len(), "oversized frame dropped");
                            continue;
                        }
                        let frame = match Frame::parse(&text) {
                            Ok(frame) => frame,
                            Err(e) => {
                                // Malformed or unknown kind: drop, no
                                // reply, connection stays open.
                                debug!(conn = %conn_id, "dropping undecodable message: {e}");
                                continue;
                            }
                        };
                        match frame {
                            Frame::Register { role, channel } => {
                                let sender = ClientSender::new(out_tx.clone());
                                match state.hub.register(conn_id, role, &channel, sender).await {
                                    Ok(()) => {}
                                    Err(RelayError::AlreadyRegistered) => {
                                        warn!(conn = %conn_id, "duplicate register ignored");
                                    }
                                }
                            }
                            other => {
                                state.hub.route_from(conn_id, other).await;
                            }
                        }
                    }
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        debug!(conn = %conn_id, "read error: {e}");
                        break;
                    }
                    Some(Ok(Message::Binary(_))) => {} // not part of the protocol
                }
            }
        }
    }

    state.hub.unregister(conn_id).await;
    debug!(conn = %conn_id, "connection closed");
}
