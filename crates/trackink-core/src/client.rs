//! Blocking WebSocket client for native peers.
//!
//! The socket is owned by a background thread; the caller sends frames
//! through a channel and polls for [`LinkEvent`]s without blocking.

use crate::error::ClientError;
use crate::link::{LinkEvent, LinkStatus};
use crate::protocol::WireMessage;
use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tungstenite::{Message, connect};
use url::Url;

/// Read timeout on the socket, so the thread can interleave sends.
const READ_POLL: Duration = Duration::from_millis(50);
const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Commands sent to the socket thread.
enum SocketCommand {
    Send(String),
    Close,
}

/// Build the `/ws` URL for `channel` on a relay at `server`.
///
/// `server` may be the bare relay origin (`ws://host:3030`) or already point
/// at `/ws`.
pub fn channel_url(server: &str, channel: &str) -> Result<Url, ClientError> {
    let mut url = Url::parse(server).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
    if url.scheme() != "ws" && url.scheme() != "wss" {
        return Err(ClientError::InvalidScheme(url.scheme().to_string()));
    }
    if url.path() == "/" || url.path().is_empty() {
        url.set_path("/ws");
    }
    url.query_pairs_mut().clear().append_pair("channel", channel);
    Ok(url)
}

/// Relay client backed by a socket thread.
pub struct RelayClient {
    status: LinkStatus,
    events: Vec<LinkEvent>,
    cmd_tx: Option<Sender<SocketCommand>>,
    event_rx: Option<Receiver<LinkEvent>>,
    _thread: Option<JoinHandle<()>>,
}

impl RelayClient {
    pub fn new() -> Self {
        Self {
            status: LinkStatus::Disconnected,
            events: Vec::new(),
            cmd_tx: None,
            event_rx: None,
            _thread: None,
        }
    }

    /// Start connecting to `url`. Progress is reported through
    /// [`poll_events`](Self::poll_events).
    pub fn connect(&mut self, url: &Url) -> Result<(), ClientError> {
        if self.cmd_tx.is_some() {
            return Err(ClientError::AlreadyConnected);
        }
        if url.scheme() != "ws" && url.scheme() != "wss" {
            return Err(ClientError::InvalidScheme(url.scheme().to_string()));
        }

        self.status = LinkStatus::Connecting;
        let (cmd_tx, cmd_rx) = channel::<SocketCommand>();
        let (event_tx, event_rx) = channel::<LinkEvent>();
        let url = url.to_string();

        let handle = thread::spawn(move || run_socket(&url, &cmd_rx, &event_tx));

        self.cmd_tx = Some(cmd_tx);
        self.event_rx = Some(event_rx);
        self._thread = Some(handle);
        Ok(())
    }

    /// Ask the socket thread to close.
    pub fn disconnect(&mut self) {
        if let Some(tx) = self.cmd_tx.take() {
            let _ = tx.send(SocketCommand::Close);
        }
        self.event_rx = None;
        self._thread = None;
        self.status = LinkStatus::Disconnected;
    }

    /// Queue raw text for the socket thread.
    pub fn send_text(&self, text: String) -> Result<(), ClientError> {
        match &self.cmd_tx {
            Some(tx) => tx
                .send(SocketCommand::Send(text))
                .map_err(|e| ClientError::SendFailed(e.to_string())),
            None => Err(ClientError::NotConnected),
        }
    }

    /// Encode and queue a frame.
    pub fn send(&self, message: &WireMessage) -> Result<(), ClientError> {
        self.send_text(message.to_json()?)
    }

    /// Drain events from the socket thread (non-blocking).
    pub fn poll_events(&mut self) -> Vec<LinkEvent> {
        if let Some(rx) = &self.event_rx {
            while let Ok(event) = rx.try_recv() {
                match &event {
                    LinkEvent::Connected => self.status = LinkStatus::Connected,
                    LinkEvent::Disconnected => self.status = LinkStatus::Disconnected,
                    LinkEvent::Error { .. } => self.status = LinkStatus::Error,
                    LinkEvent::Message(_) => {}
                }
                self.events.push(event);
            }
        }
        std::mem::take(&mut self.events)
    }

    pub fn status(&self) -> LinkStatus {
        self.status
    }

    pub fn is_open(&self) -> bool {
        self.status == LinkStatus::Connected
    }
}

impl Default for RelayClient {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RelayClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn run_socket(url: &str, cmd_rx: &Receiver<SocketCommand>, event_tx: &Sender<LinkEvent>) {
    log::info!("Connecting to relay at {}", url);
    let (mut socket, response) = match connect(url) {
        Ok(pair) => pair,
        Err(e) => {
            log::error!("Relay connection failed: {}", e);
            let _ = event_tx.send(LinkEvent::Error {
                message: format!("Connection failed: {}", e),
            });
            return;
        }
    };
    log::info!("Relay connected, status: {}", response.status());
    let _ = event_tx.send(LinkEvent::Connected);

    match socket.get_mut() {
        tungstenite::stream::MaybeTlsStream::Plain(tcp) => {
            let _ = tcp.set_read_timeout(Some(READ_POLL));
            let _ = tcp.set_write_timeout(Some(WRITE_TIMEOUT));
        }
        #[allow(unreachable_patterns)]
        _ => log::debug!("Non-plain stream, using default timeouts"),
    }

    loop {
        match cmd_rx.try_recv() {
            Ok(SocketCommand::Send(text)) => {
                log::trace!("Sending {}", text);
                if let Err(e) = socket.send(Message::Text(text)) {
                    log::error!("Relay send error: {}", e);
                    let _ = event_tx.send(LinkEvent::Error {
                        message: format!("Send failed: {}", e),
                    });
                    return;
                }
            }
            Ok(SocketCommand::Close) => {
                log::info!("Closing relay connection");
                let _ = socket.close(None);
                break;
            }
            Err(TryRecvError::Disconnected) => break,
            Err(TryRecvError::Empty) => {}
        }

        match socket.read() {
            Ok(Message::Text(text)) => match WireMessage::from_json(&text) {
                Ok(message) => {
                    let _ = event_tx.send(LinkEvent::Message(message));
                }
                Err(e) => log::warn!("Unreadable frame from relay: {}", e),
            },
            Ok(Message::Ping(data)) => {
                let _ = socket.send(Message::Pong(data));
            }
            Ok(Message::Close(_)) => {
                log::info!("Relay closed the connection");
                break;
            }
            Ok(_) => {}
            Err(tungstenite::Error::Io(ref e))
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut => {}
            Err(e) => {
                log::error!("Relay read error: {}", e);
                let _ = event_tx.send(LinkEvent::Error {
                    message: e.to_string(),
                });
                return;
            }
        }
    }

    let _ = event_tx.send(LinkEvent::Disconnected);
}
