//! trackink Core Library
//!
//! Platform-agnostic pieces of the trackink remote whiteboard: the wire
//! protocol spoken through the relay, the stroke state machines that turn
//! pointer events into committed paths, and the board that owns the shared
//! drawing history.

pub mod auth;
pub mod board;
pub mod client;
pub mod command;
pub mod config;
pub mod controller;
pub mod error;
pub mod history;
pub mod interpreter;
pub mod link;
pub mod normalizer;
pub mod protocol;
pub mod shortcuts;
pub mod stroke;
pub mod surface;

pub use auth::{AllowAll, AuthGuard, TokenGuard};
pub use board::{Board, Dispatch};
pub use client::RelayClient;
pub use command::UndoDebounce;
pub use config::BoardConfig;
pub use controller::Controller;
pub use error::{AuthError, ClientError, ProtocolError};
pub use history::{DrawingHistory, Origin, Path};
pub use interpreter::RemoteInterpreter;
pub use link::{ConnectionState, Link, LinkEvent, LinkStatus};
pub use normalizer::{Orientation, PointerNormalizer, RawInput, RawKind, normalize};
pub use protocol::{
    BoardCommand, CommandAction, DEFAULT_CHANNEL, HexColor, PointerEvent, PointerKind, Tool,
    WireMessage,
};
pub use shortcuts::{Shortcut, ShortcutRegistry};
pub use stroke::{
    CoordinateMapper, IdentityMapper, PercentMapper, StrokeMachine, StrokeStyle, ToolSettings,
};
pub use surface::{RecordingSurface, RenderSurface};
