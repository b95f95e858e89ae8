//! Catalog endpoints and the trigger gateway.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use reelcast_catalog::GameManifest;
use reelcast_protocol::{DEFAULT_CHANNEL, Frame, Role};

use crate::server::AppState;

/// `GET /catalog/games`
pub async fn list_games(State(state): State<AppState>) -> Json<Value> {
    let games = state.catalog.discover_games();
    Json(json!({ "games": games }))
}

#[derive(Debug, Deserialize)]
pub struct ManifestQuery {
    game: Option<String>,
}

/// `GET /catalog/manifest?game=<id>`
///
/// An unreadable content root or unknown game is not an error: the
/// manifest comes back with empty pools.
pub async fn manifest(
    State(state): State<AppState>,
    Query(query): Query<ManifestQuery>,
) -> Json<GameManifest> {
    Json(state.catalog.manifest(query.game.as_deref()))
}

#[derive(Debug, Deserialize)]
pub struct TriggerParams {
    channel: Option<String>,
    cmd: Option<String>,
    payload: Option<String>,
}

/// `GET|POST /trigger?channel=<c>&cmd=<name>[&payload=<json>]`
///
/// Lets an external automation tool inject a command without holding
/// a connection. The command is routed exactly as if a controller had
/// sent it; delivery stays best-effort, so an empty channel is still
/// a 200 — the frame just reaches nobody.
pub async fn trigger(
    State(state): State<AppState>,
    Query(params): Query<TriggerParams>,
    body: String,
) -> (StatusCode, Json<Value>) {
    let Some(cmd) = params.cmd.filter(|c| !c.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "missing cmd parameter"})),
        );
    };
    let channel = params
        .channel
        .unwrap_or_else(|| DEFAULT_CHANNEL.to_string());

    // Prefer a JSON request body, fall back to the query parameter.
    // Unparseable payloads mean "no payload", not an error.
    let payload: Option<Value> = if !body.is_empty() {
        serde_json::from_str(&body).ok()
    } else {
        params.payload.and_then(|p| serde_json::from_str(&p).ok())
    };

    let frame = Frame::Cmd {
        channel: channel.clone(),
        cmd: cmd.clone(),
        payload,
    };
    let delivered = state.hub.route(Role::Controller, &channel, frame).await;
    debug!(%channel, %cmd, delivered, "trigger injected");

    (
        StatusCode::OK,
        Json(json!({"ok": true, "channel": channel, "cmd": cmd})),
    )
}
