//! Channel registry and fan-out.
//!
//! Every channel owns a broadcast sender and the set of peers joined to it.
//! A frame published by a peer reaches everyone subscribed at that moment
//! except the sender. Per-sender order follows from the broadcast queue;
//! nothing orders frames from different senders.

use dashmap::DashMap;
use std::collections::HashSet;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, info, warn};
use trackink_core::WireMessage;

/// Default per-channel queue depth.
pub const CHANNEL_CAPACITY: usize = 256;

/// A frame tagged with the peer that published it.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub from: String,
    pub message: WireMessage,
}

struct Channel {
    tx: broadcast::Sender<Envelope>,
    peers: HashSet<String>,
}

impl Channel {
    fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            peers: HashSet::new(),
        }
    }
}

/// Registry of active channels. One instance is shared by every connection.
pub struct Relay {
    channels: DashMap<String, Channel>,
    capacity: usize,
}

impl Default for Relay {
    fn default() -> Self {
        Self::new(CHANNEL_CAPACITY)
    }
}

impl Relay {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Join `peer_id` to `channel`, creating the channel if needed.
    pub fn join(&self, channel: &str, peer_id: &str) -> Subscription {
        let mut entry = self
            .channels
            .entry(channel.to_string())
            .or_insert_with(|| Channel::new(self.capacity));
        entry.peers.insert(peer_id.to_string());
        let rx = entry.tx.subscribe();
        info!(
            "Peer {} joined channel {} ({} connected)",
            peer_id,
            channel,
            entry.peers.len()
        );
        Subscription {
            channel: channel.to_string(),
            peer_id: peer_id.to_string(),
            rx,
        }
    }

    /// Remove the subscription's peer from its channel. Empty channels are
    /// dropped. Returns how many peers remain.
    pub fn leave(&self, subscription: Subscription) -> usize {
        let Subscription {
            channel, peer_id, ..
        } = subscription;
        let remaining = match self.channels.get_mut(&channel) {
            Some(mut entry) => {
                entry.peers.remove(&peer_id);
                entry.peers.len()
            }
            None => 0,
        };
        self.channels.remove_if(&channel, |_, c| c.peers.is_empty());
        info!(
            "Peer {} left channel {} ({} connected)",
            peer_id, channel, remaining
        );
        remaining
    }

    /// Fan `message` out to every other peer on `channel`.
    ///
    /// Returns the number of peers it was offered to. Publishing into an
    /// empty audience is a no-op.
    pub fn publish(&self, channel: &str, from: &str, message: WireMessage) -> usize {
        let Some(entry) = self.channels.get(channel) else {
            debug!("Publish to unknown channel {} dropped", channel);
            return 0;
        };
        let audience = entry.peers.iter().filter(|p| p.as_str() != from).count();
        if audience == 0 {
            debug!(
                "No other peers on {}, dropping {}",
                channel,
                message.event_name()
            );
            return 0;
        }
        debug!(
            "Relaying {} from {} to {} peer(s) on {}",
            message.event_name(),
            from,
            audience,
            channel
        );
        // Errors only when every receiver is already gone.
        let _ = entry.tx.send(Envelope {
            from: from.to_string(),
            message,
        });
        audience
    }

    pub fn peer_count(&self, channel: &str) -> usize {
        self.channels
            .get(channel)
            .map(|entry| entry.peers.len())
            .unwrap_or(0)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

/// A peer's membership in one channel.
#[derive(Debug)]
pub struct Subscription {
    channel: String,
    peer_id: String,
    rx: broadcast::Receiver<Envelope>,
}

impl Subscription {
    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn peer_id(&self) -> &str {
        &self.peer_id
    }

    /// Wait for the next frame from another peer.
    ///
    /// Returns `None` once the channel is gone.
    pub async fn recv(&mut self) -> Option<WireMessage> {
        loop {
            match self.rx.recv().await {
                Ok(envelope) if envelope.from == self.peer_id => continue,
                Ok(envelope) => return Some(envelope.message),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(
                        "Peer {} lagged on {}, skipped {} frame(s)",
                        self.peer_id, self.channel, skipped
                    );
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next pending frame from another peer, without waiting.
    pub fn try_recv(&mut self) -> Option<WireMessage> {
        loop {
            match self.rx.try_recv() {
                Ok(envelope) if envelope.from == self.peer_id => continue,
                Ok(envelope) => return Some(envelope.message),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(
                        "Peer {} lagged on {}, skipped {} frame(s)",
                        self.peer_id, self.channel, skipped
                    );
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }
}
