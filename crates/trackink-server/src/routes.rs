//! HTTP and WebSocket handlers.

use crate::relay::{Relay, Subscription};
use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use trackink_core::{DEFAULT_CHANNEL, WireMessage};
use uuid::Uuid;

/// Query string accepted by `/ws`.
#[derive(Debug, Default, Deserialize)]
pub struct WsParams {
    pub channel: Option<String>,
}

impl WsParams {
    pub fn channel(&self) -> String {
        self.channel
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CHANNEL)
            .to_string()
    }
}

/// Index page
pub async fn index() -> &'static str {
    "trackink relay server - connect via WebSocket at /ws?channel=<name>"
}

/// Health check
pub async fn health() -> &'static str {
    "ok"
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(relay): State<Arc<Relay>>,
) -> impl IntoResponse {
    let channel = params.channel();
    ws.on_upgrade(move |socket| handle_socket(socket, relay, channel))
}

/// Serve one peer until its socket closes.
async fn handle_socket(socket: WebSocket, relay: Arc<Relay>, channel: String) {
    let peer_id = Uuid::new_v4().to_string();
    info!("New connection: {}", peer_id);

    let (mut sender, mut receiver) = socket.split();
    let mut subscription = relay.join(&channel, &peer_id);

    let joined = WireMessage::Joined {
        channel: channel.clone(),
        peer_count: relay.peer_count(&channel),
    };
    let announced = send_frame(&mut sender, &joined).await;
    if announced {
        relay.publish(
            &channel,
            &peer_id,
            WireMessage::PeerJoined {
                peer_id: peer_id.clone(),
            },
        );

        loop {
            tokio::select! {
                incoming = receiver.next() => {
                    match incoming {
                        Some(Ok(Message::Text(text))) => {
                            if let Some(reply) = route_frame(&relay, &channel, &peer_id, text.as_str()) {
                                if !send_frame(&mut sender, &reply).await {
                                    break;
                                }
                            }
                        }
                        Some(Ok(Message::Binary(_))) => {
                            warn!("Binary frame from {} ignored", peer_id);
                        }
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Ok(_)) => {} // ping/pong
                        Some(Err(e)) => {
                            warn!("WebSocket error for {}: {}", peer_id, e);
                            break;
                        }
                    }
                }

                outgoing = subscription.recv() => {
                    match outgoing {
                        Some(message) => {
                            if !send_frame(&mut sender, &message).await {
                                break;
                            }
                        }
                        None => break,
                    }
                }
            }
        }
    }

    depart(&relay, subscription, announced);
    info!("Connection closed: {}", peer_id);
}

/// Leave the channel. Others hear `peer-left` only if they heard
/// `peer-joined` for this peer.
fn depart(relay: &Relay, subscription: Subscription, announced: bool) {
    let channel = subscription.channel().to_string();
    let peer_id = subscription.peer_id().to_string();
    relay.leave(subscription);
    if announced {
        relay.publish(
            &channel,
            &peer_id,
            WireMessage::PeerLeft {
                peer_id: peer_id.clone(),
            },
        );
    } else {
        debug!("Peer {} left before its join was announced", peer_id);
    }
}

/// Decide what to do with one text frame from a peer.
///
/// Peer traffic is fanned out. Anything else earns the sender an error
/// frame; the connection stays open.
fn route_frame(relay: &Relay, channel: &str, peer_id: &str, text: &str) -> Option<WireMessage> {
    match WireMessage::from_json(text) {
        Ok(message) if message.is_peer_traffic() => {
            relay.publish(channel, peer_id, message);
            None
        }
        Ok(message) => {
            warn!(
                "Peer {} sent relay-only frame {}",
                peer_id,
                message.event_name()
            );
            Some(WireMessage::Error {
                message: format!("{} frames are sent by the relay only", message.event_name()),
            })
        }
        Err(e) => {
            warn!("Invalid message from {}: {}", peer_id, e);
            Some(WireMessage::Error {
                message: format!("Invalid message: {}", e),
            })
        }
    }
}

/// Returns `false` when the socket is gone.
async fn send_frame(sender: &mut SplitSink<WebSocket, Message>, message: &WireMessage) -> bool {
    let json = match message.to_json() {
        Ok(json) => json,
        Err(e) => {
            warn!("Failed to encode {}: {}", message.event_name(), e);
            return true;
        }
    };
    debug!("Sending {}", message.event_name());
    sender.send(Message::Text(json.into())).await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_channel() {
        assert_eq!(WsParams::default().channel(), "board");
        let blank = WsParams {
            channel: Some("  ".to_string()),
        };
        assert_eq!(blank.channel(), "board");
        let named = WsParams {
            channel: Some("lab".to_string()),
        };
        assert_eq!(named.channel(), "lab");
    }

    #[test]
    fn test_route_frame() {
        let relay = Relay::default();
        let _a = relay.join("board", "a");
        let mut b = relay.join("board", "b");

        let undo = r#"{"event":"board-command","data":{"action":"undo"}}"#;
        assert!(route_frame(&relay, "board", "a", undo).is_none());
        assert!(b.try_recv().is_some());

        let spoofed = r#"{"event":"peer-left","data":{"peerId":"b"}}"#;
        assert!(matches!(
            route_frame(&relay, "board", "a", spoofed),
            Some(WireMessage::Error { .. })
        ));
        assert!(b.try_recv().is_none());

        assert!(matches!(
            route_frame(&relay, "board", "a", "{oops"),
            Some(WireMessage::Error { .. })
        ));
    }

    #[test]
    fn test_unannounced_peer_leaves_silently() {
        let relay = Relay::default();
        let mut watcher = relay.join("board", "w");

        let quiet = relay.join("board", "q");
        depart(&relay, quiet, false);
        assert!(watcher.try_recv().is_none());
        assert_eq!(relay.peer_count("board"), 1);

        let loud = relay.join("board", "l");
        depart(&relay, loud, true);
        assert!(matches!(
            watcher.try_recv(),
            Some(WireMessage::PeerLeft { peer_id }) if peer_id == "l"
        ));
    }
}
