//! trackink WebSocket relay.
//!
//! Peers connect to `/ws?channel=<name>` (default `board`) and exchange
//! JSON frames tagged with an event name:
//! ```json
//! { "event": "pointer-event", "data": { "kind": "move", "x": 50.0, "y": 50.0, "timestampMs": 2 } }
//! { "event": "board-command", "data": { "action": "clear" } }
//! ```
//! Pointer events and board commands are fanned out to every other peer on
//! the channel. The relay itself sends `joined`, `peer-joined`, `peer-left`
//! and `error` frames.

pub mod config;
pub mod relay;
pub mod routes;

pub use config::ServerConfig;
pub use relay::{Relay, Subscription};

use axum::{Router, routing::get};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the relay's HTTP routes.
pub fn router(relay: Arc<Relay>) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/ws", get(routes::ws_handler))
        .route("/health", get(routes::health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(relay)
}

/// Serve the relay on an already bound listener until the process stops.
pub async fn serve(listener: TcpListener, relay: Arc<Relay>) -> std::io::Result<()> {
    axum::serve(listener, router(relay)).await
}
