//! reelcast relay daemon entry point.

mod config;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use reelcast_server::{RelayServer, ServerConfig};

fn main() -> anyhow::Result<()> {
    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "starting reelcast relay"
    );

    // Load configuration.
    let config = config::Config::load()?;
    tracing::info!(host = %config.host, port = config.port, "configuration loaded");

    // Build and run the tokio runtime.
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(config))?;

    tracing::info!("relay shut down cleanly");
    Ok(())
}

async fn run(config: config::Config) -> anyhow::Result<()> {
    let server = RelayServer::new(ServerConfig {
        host: config.host,
        port: config.port,
        content_root: config.content_root.into(),
        default_game: config.default_game,
    });

    let runner = Arc::clone(&server);
    let handle = tokio::spawn(async move { runner.run().await });

    tokio::signal::ctrl_c().await?;
    tracing::info!("SIGINT received, shutting down");

    server.shutdown();
    handle.await??;
    Ok(())
}
