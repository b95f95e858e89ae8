//! Server assembly: config, shared state, router, run loop.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use reelcast_catalog::Catalog;
use reelcast_relay::RelayHub;

use crate::ServerError;
use crate::{routes, ws};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address.
    pub host: String,
    /// TCP port to listen on (0 = OS-assigned).
    pub port: u16,
    /// Content root scanned for game asset folders.
    pub content_root: PathBuf,
    /// Game id used when a manifest is requested without one.
    pub default_game: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 17311,
            content_root: "Assets".into(),
            default_game: "ApexLegends".into(),
        }
    }
}

/// Shared state handed to every request handler.
///
/// The hub is the only shared mutable resource; there is no ambient
/// global — handlers get this by extraction.
#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<RelayHub>,
    pub catalog: Catalog,
}

/// Builds the full application router over the given state.
pub fn router(state: AppState) -> Router {
    // Controllers and overlays run in browsers (OBS sources, file://
    // pages), so the HTTP surface is open to any origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws::ws_upgrade))
        .route("/catalog/games", get(routes::list_games))
        .route("/catalog/manifest", get(routes::manifest))
        .route("/trigger", get(routes::trigger).post(routes::trigger))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The relay server. Binds a listener and serves until cancelled.
pub struct RelayServer {
    config: ServerConfig,
    state: AppState,
    cancel: CancellationToken,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl RelayServer {
    pub fn new(config: ServerConfig) -> Arc<Self> {
        let state = AppState {
            hub: Arc::new(RelayHub::new()),
            catalog: Catalog::new(&config.content_root, &config.default_game),
        };
        Arc::new(Self {
            config,
            state,
            cancel: CancellationToken::new(),
            local_addr: Mutex::new(None),
        })
    }

    /// The hub instance, for embedding and tests.
    pub fn hub(&self) -> Arc<RelayHub> {
        Arc::clone(&self.state.hub)
    }

    /// Returns the bound address. Only available after [`run`](Self::run)
    /// binds the socket.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().await
    }

    /// Returns the listening port (0 if not yet bound).
    pub async fn port(&self) -> u16 {
        self.local_addr.lock().await.map(|a| a.port()).unwrap_or(0)
    }

    /// Gracefully shuts down the server.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Runs the server until cancellation.
    pub async fn run(self: &Arc<Self>) -> Result<(), ServerError> {
        let host: IpAddr = self.config.host.parse()?;
        let addr = SocketAddr::from((host, self.config.port));
        let listener = TcpListener::bind(addr).await?;

        let local_addr = listener.local_addr()?;
        *self.local_addr.lock().await = Some(local_addr);
        info!(
            addr = %local_addr,
            content_root = %self.config.content_root.display(),
            "relay server listening"
        );

        let app = router(self.state.clone());
        let cancel = self.cancel.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { cancel.cancelled().await })
            .await?;

        info!("relay server stopped");
        Ok(())
    }
}
