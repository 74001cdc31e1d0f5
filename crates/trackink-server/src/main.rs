//! trackink relay server binary.

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use trackink_server::{Relay, ServerConfig, serve};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trackink_server=info,tower_http=info".into()),
        )
        .init();

    let config = ServerConfig::parse();
    let relay = Arc::new(Relay::new(config.channel_capacity));

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("trackink relay server listening on {}", addr);
    info!("WebSocket endpoint: ws://{}/ws?channel=<name>", addr);

    serve(listener, relay).await.context("relay server stopped")?;
    Ok(())
}
