use axum::{Router, routing::get};
use huddle_server::{Coordinator, ServerConfig, SignalingService, ws_handler};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = ServerConfig::from_env()?;

    let (coordinator_tx, coordinator_rx) = mpsc::channel(config.command_buffer);
    let service = SignalingService::new(coordinator_tx);

    let coordinator = Coordinator::new(Arc::new(service.clone()));
    tokio::spawn(coordinator.run(coordinator_rx));

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .with_state(service);

    info!("Signaling server listening on http://{}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
