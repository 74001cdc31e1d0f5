//! Controller and surface sessions over a live relay connection.

use crate::args::PeerArgs;
use crate::script::{ScriptCommand, parse_line};
use crate::surface::LogSurface;
use kurbo::{Point, Rect, Size};
use std::io::BufRead;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use trackink_core::client::channel_url;
use trackink_core::controller::{TEST_STROKE_SPACING_MS, test_stroke};
use trackink_core::{
    AuthError, Board, BoardConfig, ClientError, Controller, Link, LinkStatus, RawInput, RawKind,
    RelayClient, WireMessage,
};

const POLL_INTERVAL: Duration = Duration::from_millis(10);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum PeerError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("Relay link failed: {0}")]
    Link(String),
    #[error("Timed out connecting to the relay")]
    ConnectTimeout,
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Open the socket and block until the relay accepts it.
fn open(args: &PeerArgs, link: &mut Link) -> Result<RelayClient, PeerError> {
    let url = channel_url(&args.server, &args.channel)?;
    let mut client = RelayClient::new();
    link.connecting();
    client.connect(&url)?;

    let deadline = Instant::now() + CONNECT_TIMEOUT;
    while !link.is_connected() {
        for event in client.poll_events() {
            link.handle_event(event);
        }
        if link.state().status == LinkStatus::Error {
            let reason = link.state().last_error.clone().unwrap_or_default();
            return Err(PeerError::Link(reason));
        }
        if Instant::now() >= deadline {
            return Err(PeerError::ConnectTimeout);
        }
        thread::sleep(POLL_INTERVAL);
    }
    Ok(client)
}

/// Hand everything the controller queued to the socket thread.
fn flush(controller: &mut Controller, client: &RelayClient) -> Result<(), PeerError> {
    for frame in controller.link_mut().take_outgoing() {
        client.send_text(frame)?;
    }
    Ok(())
}

/// Render relayed strokes until the relay goes away.
pub fn run_surface(args: &PeerArgs) -> Result<(), PeerError> {
    let mut link = Link::new();
    let mut client = open(args, &mut link)?;

    let mut board: Board<LogSurface> = Board::new(BoardConfig::default());
    let mut pending = Some(LogSurface::new(Size::new(args.width, args.height)));
    let ready_at = Instant::now() + args.ready_after();

    loop {
        for event in client.poll_events() {
            if let Some(message) = link.handle_event(event) {
                board.handle_message(&message, Instant::now());
            }
        }
        match link.state().status {
            LinkStatus::Connected => {}
            LinkStatus::Error => {
                let reason = link.state().last_error.clone().unwrap_or_default();
                return Err(PeerError::Link(reason));
            }
            LinkStatus::Disconnected | LinkStatus::Connecting => break,
        }

        if Instant::now() >= ready_at {
            if let Some(surface) = pending.take() {
                let replayed = board.attach_surface(surface);
                log::info!("Canvas ready ({} queued frame(s) replayed)", replayed);
            }
        }
        thread::sleep(POLL_INTERVAL);
    }

    log::info!("Session ended with {} path(s)", board.history().len());
    Ok(())
}

/// Send the scripted controller traffic, then disconnect.
pub fn run_controller(args: &PeerArgs) -> Result<(), PeerError> {
    let mut controller = Controller::new(args.tool_settings());
    let mut client = open(args, controller.link_mut())?;
    let bounds = Rect::new(0.0, 0.0, args.width, args.height);
    log::info!(
        "Input surface {}x{} ({:?})",
        args.width,
        args.height,
        controller.orientation(bounds)
    );

    if args.test_stroke {
        send_paced_test_stroke(&mut controller, &client)?;
    }
    if let Some(action) = args.command {
        controller.send_command(action);
        flush(&mut controller, &client)?;
    }
    if args.interactive {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = line?;
            match parse_line(&line) {
                Ok(Some(ScriptCommand::Quit)) => break,
                Ok(Some(command)) => {
                    apply_script(&mut controller, &client, command, bounds)?;
                }
                Ok(None) => {}
                Err(e) => log::warn!("{}", e),
            }
            for event in client.poll_events() {
                controller.link_mut().handle_event(event);
            }
            if !controller.link().is_connected() {
                log::warn!("Relay link lost");
                break;
            }
        }
    }

    client.disconnect();
    Ok(())
}

fn send_paced_test_stroke(controller: &mut Controller, client: &RelayClient) -> Result<(), PeerError> {
    for event in test_stroke(controller.settings(), now_ms()) {
        controller.link_mut().send(&WireMessage::PointerEvent(event));
        flush(controller, client)?;
        thread::sleep(Duration::from_millis(TEST_STROKE_SPACING_MS));
    }
    Ok(())
}

fn apply_script(
    controller: &mut Controller,
    client: &RelayClient,
    command: ScriptCommand,
    bounds: Rect,
) -> Result<(), PeerError> {
    let raw = |kind, position: Point| RawInput::new(kind, position, now_ms());
    match command {
        ScriptCommand::Down(position) => {
            controller.handle_input(&raw(RawKind::MouseDown, position), bounds);
        }
        ScriptCommand::Move(position) => {
            controller.handle_input(&raw(RawKind::MouseMove, position), bounds);
        }
        ScriptCommand::Up(position) => {
            let position = position.unwrap_or(Point::ZERO);
            controller.handle_input(&raw(RawKind::MouseUp, position), bounds);
        }
        ScriptCommand::Command(action) => {
            controller.send_command(action);
        }
        ScriptCommand::Shortcut { key, ctrl } => {
            if controller.handle_shortcut(&key, ctrl).is_none() {
                log::warn!("No shortcut bound to {}", key);
            }
        }
        ScriptCommand::TestStroke => return send_paced_test_stroke(controller, client),
        ScriptCommand::Quit => {}
    }
    flush(controller, client)
}
