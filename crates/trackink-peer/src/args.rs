//! Command-line arguments.

use clap::{Parser, ValueEnum};
use std::time::Duration;
use trackink_core::{CommandAction, DEFAULT_CHANNEL, HexColor, Tool, ToolSettings};

/// Which end of the whiteboard this process plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Role {
    /// Emit pointer events and commands.
    Controller,
    /// Receive events and render committed paths.
    Surface,
}

/// trackink peer
#[derive(Debug, Clone, Parser)]
#[command(name = "trackink-peer", version, about)]
pub struct PeerArgs {
    /// Relay origin or full /ws URL
    #[arg(long, env = "TRACKINK_SERVER", default_value = "ws://127.0.0.1:3030")]
    pub server: String,

    /// Channel to join
    #[arg(long, default_value = DEFAULT_CHANNEL)]
    pub channel: String,

    #[arg(long, value_enum, default_value_t = Role::Surface)]
    pub role: Role,

    /// Token presented to the auth guard
    #[arg(long, env = "TRACKINK_TOKEN")]
    pub token: Option<String>,

    /// Token the auth guard expects; when unset every peer is allowed
    #[arg(long, env = "TRACKINK_EXPECTED_TOKEN")]
    pub expected_token: Option<String>,

    /// Canvas or input surface width in pixels
    #[arg(long, default_value_t = 800.0)]
    pub width: f64,

    /// Canvas or input surface height in pixels
    #[arg(long, default_value_t = 500.0)]
    pub height: f64,

    /// Surface role: delay before the canvas is attached
    #[arg(long, default_value_t = 0)]
    pub ready_after_ms: u64,

    /// Controller role: command to send after connecting
    #[arg(long)]
    pub command: Option<CommandAction>,

    /// Controller role: send the diagonal test stroke
    #[arg(long)]
    pub test_stroke: bool,

    /// Controller role: read drawing commands from stdin
    #[arg(long)]
    pub interactive: bool,

    /// Draw with the eraser
    #[arg(long)]
    pub eraser: bool,

    #[arg(long, default_value = "#000000")]
    pub color: HexColor,

    #[arg(long, default_value_t = 2.0)]
    pub stroke_width: f64,
}

impl PeerArgs {
    pub fn tool_settings(&self) -> ToolSettings {
        let tool = if self.eraser { Tool::Eraser } else { Tool::Pen };
        ToolSettings::new(tool, self.color, self.stroke_width)
    }

    pub fn ready_after(&self) -> Duration {
        Duration::from_millis(self.ready_after_ms)
    }
}
