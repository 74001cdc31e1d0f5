//! Transport-independent view of a peer's connection to the relay.
//!
//! The socket itself lives in [`RelayClient`](crate::client::RelayClient);
//! this module only tracks connection state and the frames waiting to go
//! out, so that controllers can be driven and tested without a network.

use crate::protocol::WireMessage;

/// Connection status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Connection status plus the last transport error seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionState {
    pub status: LinkStatus,
    pub last_error: Option<String>,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        self.status == LinkStatus::Connected
    }
}

/// Events produced by the relay connection
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    /// Socket opened
    Connected,
    /// Socket closed
    Disconnected,
    /// Frame received from the relay
    Message(WireMessage),
    /// Transport failure
    Error { message: String },
}

/// Outgoing side of a peer's relay connection.
#[derive(Debug, Clone, Default)]
pub struct Link {
    state: ConnectionState,
    outgoing: Vec<String>,
}

impl Link {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Mark the link as connecting.
    pub fn connecting(&mut self) {
        self.state.status = LinkStatus::Connecting;
    }

    /// Update the connection state from a transport event.
    ///
    /// Returns the received frame for [`LinkEvent::Message`].
    pub fn handle_event(&mut self, event: LinkEvent) -> Option<WireMessage> {
        match event {
            LinkEvent::Connected => {
                log::info!("Relay link connected");
                self.state.status = LinkStatus::Connected;
                self.state.last_error = None;
                None
            }
            LinkEvent::Disconnected => {
                log::info!("Relay link disconnected");
                self.state.status = LinkStatus::Disconnected;
                self.outgoing.clear();
                None
            }
            LinkEvent::Error { message } => {
                log::error!("Relay link error: {}", message);
                self.state.status = LinkStatus::Error;
                self.state.last_error = Some(message);
                self.outgoing.clear();
                None
            }
            LinkEvent::Message(message) => Some(message),
        }
    }

    /// Queue a frame for sending. Frames are dropped while not connected.
    pub fn send(&mut self, message: &WireMessage) -> bool {
        if !self.is_connected() {
            log::warn!(
                "Dropping {} while {:?}",
                message.event_name(),
                self.state.status
            );
            return false;
        }
        match message.to_json() {
            Ok(json) => {
                self.outgoing.push(json);
                true
            }
            Err(e) => {
                log::warn!("Failed to encode {}: {}", message.event_name(), e);
                false
            }
        }
    }

    /// Take the frames queued since the last call.
    pub fn take_outgoing(&mut self) -> Vec<String> {
        std::mem::take(&mut self.outgoing)
    }

    pub fn has_outgoing(&self) -> bool {
        !self.outgoing.is_empty()
    }
}
