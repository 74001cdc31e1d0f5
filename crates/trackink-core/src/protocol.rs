//! Wire protocol spoken between peers through the relay.
//!
//! Every frame is a JSON object tagged with the event name and carrying its
//! payload under `data`:
//! ```json
//! { "event": "pointer-event", "data": { "kind": "down", "x": 10.0, "y": 10.0, "timestampMs": 1 } }
//! { "event": "board-command", "data": { "action": "undo" } }
//! { "event": "joined", "data": { "channel": "board", "peerCount": 2 } }
//! ```
//! The event names used by older web clients (`cursor-event`,
//! `whiteboard-command`) and their `type`/`timestamp` field names are accepted
//! on input.

use crate::error::ProtocolError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Channel joined when a peer does not ask for one.
pub const DEFAULT_CHANNEL: &str = "board";

/// Drawing tool carried by pointer events and paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    #[default]
    Pen,
    Eraser,
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tool::Pen => f.write_str("pen"),
            Tool::Eraser => f.write_str("eraser"),
        }
    }
}

/// An opaque RGB color, written as `#rrggbb` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl HexColor {
    pub const BLACK: HexColor = HexColor::new(0, 0, 0);
    pub const WHITE: HexColor = HexColor::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl Default for HexColor {
    fn default() -> Self {
        Self::BLACK
    }
}

impl FromStr for HexColor {
    type Err = ProtocolError;

    /// Parses `#rrggbb` or the `#rgb` shorthand, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ProtocolError::InvalidColor(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid());

        match hex.len() {
            6 => Ok(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => Ok(Self::new(
                channel(&hex[0..1])? * 17,
                channel(&hex[1..2])? * 17,
                channel(&hex[2..3])? * 17,
            )),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for HexColor {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.to_string()
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Phase of a pointer interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerKind {
    #[serde(alias = "mousedown", alias = "touchstart")]
    Down,
    #[serde(alias = "mousemove", alias = "touchmove")]
    Move,
    #[serde(alias = "mouseup", alias = "touchend")]
    Up,
}

/// Device-independent pointer sample.
///
/// `x` and `y` are percentages (0..=100) of the emitting device's input
/// surface. Tool, color and width travel with every event so the receiver
/// never has to share tool state with the sender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerEvent {
    #[serde(alias = "type")]
    pub kind: PointerKind,
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
    #[serde(alias = "timestamp")]
    pub timestamp_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<Tool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<HexColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
}

impl PointerEvent {
    /// Create a bare event with no tool metadata.
    pub fn new(kind: PointerKind, x: f64, y: f64, timestamp_ms: u64) -> Self {
        Self {
            kind,
            x,
            y,
            pressure: None,
            timestamp_ms,
            tool: None,
            color: None,
            stroke_width: None,
        }
    }

    pub fn with_tool(mut self, tool: Tool) -> Self {
        self.tool = Some(tool);
        self
    }

    pub fn with_color(mut self, color: HexColor) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_stroke_width(mut self, width: f64) -> Self {
        self.stroke_width = Some(width);
        self
    }

    pub fn with_pressure(mut self, pressure: f64) -> Self {
        self.pressure = Some(pressure);
        self
    }
}

/// Control-plane action applied directly to the drawing history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandAction {
    Clear,
    Undo,
}

impl CommandAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandAction::Clear => "clear",
            CommandAction::Undo => "undo",
        }
    }
}

impl FromStr for CommandAction {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clear" => Ok(CommandAction::Clear),
            "undo" => Ok(CommandAction::Undo),
            other => Err(ProtocolError::UnknownAction(other.to_string())),
        }
    }
}

impl fmt::Display for CommandAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A board command as it travels on the wire.
///
/// The action stays a plain string so that frames with unknown actions are
/// still well-formed and can be relayed; receivers validate with
/// [`BoardCommand::action`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardCommand {
    pub action: String,
}

impl BoardCommand {
    pub fn new(action: CommandAction) -> Self {
        Self {
            action: action.as_str().to_string(),
        }
    }

    /// Parse the action tag.
    pub fn action(&self) -> Result<CommandAction, ProtocolError> {
        self.action.parse()
    }
}

impl From<CommandAction> for BoardCommand {
    fn from(action: CommandAction) -> Self {
        Self::new(action)
    }
}

/// A frame exchanged with the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum WireMessage {
    /// Pointer sample from a controller.
    #[serde(alias = "cursor-event")]
    PointerEvent(PointerEvent),
    /// Clear/undo command.
    #[serde(alias = "whiteboard-command")]
    BoardCommand(BoardCommand),
    /// Sent by the relay to a peer that just joined a channel.
    Joined {
        channel: String,
        #[serde(rename = "peerCount")]
        peer_count: usize,
    },
    /// Another peer joined the channel.
    PeerJoined {
        #[serde(rename = "peerId")]
        peer_id: String,
    },
    /// Another peer left the channel.
    PeerLeft {
        #[serde(rename = "peerId")]
        peer_id: String,
    },
    /// The relay rejected a frame.
    Error { message: String },
}

impl WireMessage {
    /// Decode a frame from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Encode the frame as JSON text.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Whether this frame is peer-to-peer traffic the relay should fan out.
    /// Presence and error frames are only ever produced by the relay itself.
    pub fn is_peer_traffic(&self) -> bool {
        matches!(self, WireMessage::PointerEvent(_) | WireMessage::BoardCommand(_))
    }

    /// Short name for logging.
    pub fn event_name(&self) -> &'static str {
        match self {
            WireMessage::PointerEvent(_) => "pointer-event",
            WireMessage::BoardCommand(_) => "board-command",
            WireMessage::Joined { .. } => "joined",
            WireMessage::PeerJoined { .. } => "peer-joined",
            WireMessage::PeerLeft { .. } => "peer-left",
            WireMessage::Error { .. } => "error",
        }
    }
}

impl From<PointerEvent> for WireMessage {
    fn from(event: PointerEvent) -> Self {
        WireMessage::PointerEvent(event)
    }
}

impl From<CommandAction> for WireMessage {
    fn from(action: CommandAction) -> Self {
        WireMessage::BoardCommand(BoardCommand::new(action))
    }
}
