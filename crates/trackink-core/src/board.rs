//! The board: shared drawing history plus the local and remote stroke
//! machines that feed it.

use crate::command::UndoDebounce;
use crate::config::BoardConfig;
use crate::history::{DrawingHistory, Path};
use crate::interpreter::RemoteInterpreter;
use crate::protocol::{BoardCommand, CommandAction, PointerEvent, WireMessage};
use crate::stroke::{IdentityMapper, StrokeMachine, StrokeStyle, ToolSettings};
use crate::surface::RenderSurface;
use kurbo::{Point, Size};
use std::collections::VecDeque;
use std::time::Instant;

/// Outcome of handing a frame to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The frame changed board state without committing a path.
    Applied,
    /// A path was committed to the history.
    Committed,
    /// An undo fell inside the debounce window and was dropped.
    Debounced,
    /// The surface is not attached yet; the frame is queued.
    Deferred,
    /// Nothing to do with this frame.
    Ignored,
}

/// Work held until a surface is attached.
#[derive(Debug, Clone)]
enum Deferred {
    Pointer(PointerEvent),
    Command { action: CommandAction, at: Instant },
}

/// Owns the drawing history and routes local input, relayed pointer events
/// and commands into it.
///
/// Remote traffic needs the surface bounds to be interpreted, so until a
/// surface is attached it is queued in arrival order and replayed on
/// [`attach_surface`](Board::attach_surface). Queued commands keep their
/// arrival time for the undo debounce and are never dropped. A queued
/// `clear` supersedes everything queued before it. When the queue is full
/// the oldest pointer frame makes room.
pub struct Board<S> {
    config: BoardConfig,
    settings: ToolSettings,
    history: DrawingHistory,
    local: StrokeMachine<IdentityMapper>,
    remote: RemoteInterpreter,
    undo_debounce: UndoDebounce,
    surface: Option<S>,
    deferred: VecDeque<Deferred>,
}

impl<S: RenderSurface> Board<S> {
    /// Create a board with no surface attached.
    pub fn new(config: BoardConfig) -> Self {
        Self {
            local: StrokeMachine::local(config.min_commit_points),
            remote: RemoteInterpreter::new(config.min_commit_points),
            undo_debounce: UndoDebounce::new(config.undo_debounce),
            settings: ToolSettings::default(),
            history: DrawingHistory::new(),
            surface: None,
            deferred: VecDeque::new(),
            config,
        }
    }

    /// Create a board that is ready immediately.
    pub fn with_surface(config: BoardConfig, surface: S) -> Self {
        let mut board = Self::new(config);
        board.surface = Some(surface);
        board
    }

    /// Attach the rendering surface and replay queued work.
    ///
    /// Paths committed while detached are painted first. Returns the number
    /// of queued frames that were replayed.
    pub fn attach_surface(&mut self, surface: S) -> usize {
        self.surface = Some(surface);
        self.repaint();
        let queued = std::mem::take(&mut self.deferred);
        let count = queued.len();
        if count > 0 {
            log::info!("Surface attached, replaying {} queued frame(s)", count);
        }
        for item in queued {
            match item {
                Deferred::Pointer(event) => {
                    self.on_pointer_event(&event);
                }
                Deferred::Command { action, at } => {
                    self.apply_command(action, at);
                }
            }
        }
        count
    }

    /// Detach the surface. Later remote traffic is queued again.
    pub fn detach_surface(&mut self) -> Option<S> {
        self.surface.take()
    }

    pub fn is_ready(&self) -> bool {
        self.surface.is_some()
    }

    /// Number of frames waiting for a surface.
    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    /// Route a frame received from the relay.
    pub fn handle_message(&mut self, message: &WireMessage, now: Instant) -> Dispatch {
        match message {
            WireMessage::PointerEvent(event) => self.on_pointer_event(event),
            WireMessage::BoardCommand(command) => self.on_command(command, now),
            WireMessage::Joined {
                channel,
                peer_count,
            } => {
                log::info!("Joined channel {} with {} peer(s)", channel, peer_count);
                Dispatch::Ignored
            }
            WireMessage::PeerJoined { peer_id } => {
                log::info!("Peer {} joined", peer_id);
                Dispatch::Ignored
            }
            WireMessage::PeerLeft { peer_id } => {
                log::info!("Peer {} left", peer_id);
                Dispatch::Ignored
            }
            WireMessage::Error { message } => {
                log::warn!("Relay reported an error: {}", message);
                Dispatch::Ignored
            }
        }
    }

    /// Interpret a relayed pointer event.
    pub fn on_pointer_event(&mut self, event: &PointerEvent) -> Dispatch {
        let Some(surface) = self.surface.as_mut() else {
            return self.defer(Deferred::Pointer(event.clone()));
        };

        log::trace!("Remote {:?} at ({}, {})", event.kind, event.x, event.y);
        let committed =
            self.remote
                .on_event(event, surface.bounds(), &self.settings, &self.config);
        if let Some(cursor) = self.remote.cursor() {
            surface.move_cursor(cursor);
        }

        match committed {
            Some(path) => {
                surface.render_path(&path);
                self.history.append(path);
                Dispatch::Committed
            }
            None => Dispatch::Applied,
        }
    }

    /// Handle a relayed command. Unknown actions are logged and dropped.
    pub fn on_command(&mut self, command: &BoardCommand, now: Instant) -> Dispatch {
        match command.action() {
            Ok(action) => {
                if self.surface.is_none() {
                    return self.defer(Deferred::Command { action, at: now });
                }
                self.apply_command(action, now)
            }
            Err(e) => {
                log::warn!("Ignoring command: {}", e);
                Dispatch::Ignored
            }
        }
    }

    /// Apply a relayed command. Undos go through the debounce.
    pub fn apply_command(&mut self, action: CommandAction, at: Instant) -> Dispatch {
        match action {
            CommandAction::Clear => {
                let removed = self.clear();
                log::debug!("Remote clear removed {} path(s)", removed);
                Dispatch::Applied
            }
            CommandAction::Undo => {
                if !self.undo_debounce.admit(at) {
                    log::debug!("Remote undo debounced");
                    return Dispatch::Debounced;
                }
                self.undo();
                Dispatch::Applied
            }
        }
    }

    fn defer(&mut self, item: Deferred) -> Dispatch {
        if matches!(
            item,
            Deferred::Command {
                action: CommandAction::Clear,
                ..
            }
        ) {
            if !self.deferred.is_empty() {
                log::debug!(
                    "Queued clear supersedes {} earlier frame(s)",
                    self.deferred.len()
                );
                self.deferred.clear();
            }
        } else if self.deferred.len() >= self.config.deferred_capacity {
            let oldest_pointer = self
                .deferred
                .iter()
                .position(|queued| matches!(queued, Deferred::Pointer(_)));
            match oldest_pointer {
                Some(index) => {
                    log::warn!(
                        "Surface not ready and {} frame(s) queued, dropping oldest pointer frame",
                        self.deferred.len()
                    );
                    self.deferred.remove(index);
                }
                None if matches!(item, Deferred::Pointer(_)) => {
                    log::warn!(
                        "Surface not ready and {} command(s) queued, dropping pointer frame",
                        self.deferred.len()
                    );
                    return Dispatch::Ignored;
                }
                // Commands wait for the surface however long the queue grows.
                None => {}
            }
        }
        self.deferred.push_back(item);
        Dispatch::Deferred
    }

    /// Local pointer pressed at `point` in canvas pixels.
    pub fn pointer_down(&mut self, point: Point) {
        let style = StrokeStyle::local(&self.settings, &self.config);
        let bounds = self.bounds();
        self.local.begin(point.x, point.y, bounds, style);
    }

    /// Local pointer moved. Returns `false` when no stroke is active.
    pub fn pointer_move(&mut self, point: Point) -> bool {
        let bounds = self.bounds();
        self.local.extend(point.x, point.y, bounds).is_some()
    }

    /// Local pointer released. Returns `true` if a path was committed.
    pub fn pointer_up(&mut self, point: Point) -> bool {
        let bounds = self.bounds();
        match self.local.release(point.x, point.y, bounds) {
            Some(path) => {
                if let Some(surface) = self.surface.as_mut() {
                    surface.render_path(&path);
                }
                self.history.append(path);
                true
            }
            None => false,
        }
    }

    /// Remove the last committed path, bypassing the debounce.
    pub fn undo(&mut self) -> Option<Path> {
        let removed = self.history.remove_last();
        if removed.is_some() {
            self.repaint();
        }
        removed
    }

    /// Empty the history and drop both in-progress strokes.
    pub fn clear(&mut self) -> usize {
        self.local.cancel();
        self.remote.cancel();
        let removed = self.history.clear();
        self.repaint();
        removed
    }

    fn repaint(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            surface.reset();
            for path in self.history.iter() {
                surface.render_path(path);
            }
        }
    }

    fn bounds(&self) -> Size {
        self.surface
            .as_ref()
            .map(|surface| surface.bounds())
            .unwrap_or(Size::ZERO)
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn history(&self) -> &DrawingHistory {
        &self.history
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut ToolSettings {
        &mut self.settings
    }

    pub fn remote_cursor(&self) -> Option<Point> {
        self.remote.cursor()
    }

    pub fn local_in_progress(&self) -> Option<&Path> {
        self.local.in_progress()
    }

    pub fn remote_in_progress(&self) -> Option<&Path> {
        self.remote.in_progress()
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::Origin;
    use crate::protocol::{HexColor, PointerKind, Tool};
    use crate::surface::RecordingSurface;
    use std::time::Duration;

    fn board() -> Board<RecordingSurface> {
        Board::with_surface(
            BoardConfig::default(),
            RecordingSurface::new(Size::new(800.0, 500.0)),
        )
    }

    fn pen(kind: PointerKind, x: f64, y: f64) -> WireMessage {
        PointerEvent::new(kind, x, y, 0)
            .with_tool(Tool::Pen)
            .with_color(HexColor::BLACK)
            .with_stroke_width(2.0)
            .into()
    }

    fn local_stroke(board: &mut Board<RecordingSurface>, from: f64, to: f64) -> bool {
        board.pointer_down(Point::new(from, from));
        board.pointer_move(Point::new(to, to));
        board.pointer_up(Point::new(to, to))
    }

    #[test]
    fn test_local_tap_commits_nothing() {
        let mut board = board();
        board.pointer_down(Point::new(10.0, 10.0));
        assert!(!board.pointer_up(Point::new(10.0, 10.0)));
        assert!(board.history().is_empty());
        assert!(board.local_in_progress().is_none());
    }

    #[test]
    fn test_local_stroke_commits() {
        let mut board = board();
        assert!(local_stroke(&mut board, 10.0, 50.0));
        let path = board.history().last().unwrap();
        assert_eq!(path.origin(), Origin::Local);
        assert_eq!(path.len(), 3);
        assert_eq!(board.surface().unwrap().rendered().len(), 1);
    }

    #[test]
    fn test_local_move_without_down() {
        let mut board = board();
        assert!(!board.pointer_move(Point::new(1.0, 1.0)));
        assert!(!board.pointer_up(Point::new(1.0, 1.0)));
        assert!(board.history().is_empty());
    }

    #[test]
    fn test_remote_end_to_end_stroke() {
        let mut board = board();
        let now = Instant::now();
        assert_eq!(board.handle_message(&pen(PointerKind::Down, 10.0, 10.0), now), Dispatch::Applied);
        assert_eq!(board.handle_message(&pen(PointerKind::Move, 50.0, 50.0), now), Dispatch::Applied);
        assert_eq!(board.handle_message(&pen(PointerKind::Up, 50.0, 50.0), now), Dispatch::Committed);

        assert_eq!(board.history().len(), 1);
        let path = board.history().last().unwrap();
        assert_eq!(
            path.points(),
            &[
                Point::new(80.0, 50.0),
                Point::new(400.0, 250.0),
                Point::new(400.0, 250.0)
            ]
        );
        assert_eq!(path.color, HexColor::BLACK);
        assert_eq!(path.stroke_width, 2.0);
        assert_eq!(path.tool, Tool::Pen);
        assert_eq!(board.remote_cursor(), Some(Point::new(400.0, 250.0)));
        assert_eq!(
            board.surface().unwrap().cursor(),
            Some(Point::new(400.0, 250.0))
        );
    }

    #[test]
    fn test_remote_eraser_paints_background() {
        let mut board = board();
        let now = Instant::now();
        let down = PointerEvent::new(PointerKind::Down, 0.0, 0.0, 0)
            .with_tool(Tool::Eraser)
            .with_color(HexColor::new(255, 0, 0))
            .with_stroke_width(3.0);
        board.handle_message(&down.into(), now);
        board.handle_message(&pen(PointerKind::Move, 10.0, 10.0), now);
        board.handle_message(&pen(PointerKind::Up, 10.0, 10.0), now);

        let path = board.history().last().unwrap();
        assert_eq!(path.tool, Tool::Eraser);
        assert_eq!(path.color, HexColor::WHITE);
        assert_eq!(path.stroke_width, 20.0);
    }

    #[test]
    fn test_local_and_remote_share_history() {
        let mut board = board();
        let now = Instant::now();
        board.pointer_down(Point::new(1.0, 1.0));
        board.handle_message(&pen(PointerKind::Down, 10.0, 10.0), now);
        board.pointer_move(Point::new(2.0, 2.0));
        board.handle_message(&pen(PointerKind::Move, 20.0, 20.0), now);
        board.handle_message(&pen(PointerKind::Up, 20.0, 20.0), now);
        board.pointer_up(Point::new(2.0, 2.0));

        let origins: Vec<Origin> = board.history().iter().map(Path::origin).collect();
        assert_eq!(origins, vec![Origin::Remote, Origin::Local]);
    }

    #[test]
    fn test_undo_debounce() {
        let mut board = board();
        for i in 0..3 {
            local_stroke(&mut board, i as f64, i as f64 + 5.0);
        }
        let t0 = Instant::now();
        let undo = WireMessage::from(CommandAction::Undo);

        assert_eq!(board.handle_message(&undo, t0), Dispatch::Applied);
        assert_eq!(
            board.handle_message(&undo, t0 + Duration::from_millis(50)),
            Dispatch::Debounced
        );
        assert_eq!(board.history().len(), 2);

        assert_eq!(
            board.handle_message(&undo, t0 + Duration::from_millis(200)),
            Dispatch::Applied
        );
        assert_eq!(board.history().len(), 1);
    }

    #[test]
    fn test_local_undo_is_not_debounced() {
        let mut board = board();
        local_stroke(&mut board, 0.0, 5.0);
        local_stroke(&mut board, 5.0, 10.0);
        assert!(board.undo().is_some());
        assert!(board.undo().is_some());
        assert!(board.undo().is_none());
    }

    #[test]
    fn test_undo_repaints_remaining_history() {
        let mut board = board();
        local_stroke(&mut board, 0.0, 5.0);
        local_stroke(&mut board, 5.0, 10.0);
        board.undo();
        let surface = board.surface().unwrap();
        assert_eq!(surface.resets(), 1);
        assert_eq!(surface.rendered().len(), 1);
        assert_eq!(surface.rendered()[0].id(), board.history().paths()[0].id());
    }

    #[test]
    fn test_clear_then_undo_stays_empty() {
        let mut board = board();
        local_stroke(&mut board, 0.0, 5.0);
        local_stroke(&mut board, 5.0, 10.0);
        let t0 = Instant::now();
        assert_eq!(
            board.handle_message(&CommandAction::Clear.into(), t0),
            Dispatch::Applied
        );
        for i in 0..5 {
            board.handle_message(
                &CommandAction::Undo.into(),
                t0 + Duration::from_millis(200 * i),
            );
        }
        assert!(board.history().is_empty());
        assert!(board.surface().unwrap().rendered().is_empty());
    }

    #[test]
    fn test_clear_discards_in_progress_strokes() {
        let mut board = board();
        let now = Instant::now();
        board.pointer_down(Point::new(1.0, 1.0));
        board.handle_message(&pen(PointerKind::Down, 10.0, 10.0), now);
        board.clear();
        assert!(board.local_in_progress().is_none());
        assert!(board.remote_in_progress().is_none());

        board.handle_message(&pen(PointerKind::Move, 20.0, 20.0), now);
        board.handle_message(&pen(PointerKind::Up, 20.0, 20.0), now);
        assert!(board.history().is_empty());
    }

    #[test]
    fn test_malformed_command_is_ignored() {
        let mut board = board();
        local_stroke(&mut board, 0.0, 5.0);
        let redo = WireMessage::BoardCommand(BoardCommand {
            action: "redo".to_string(),
        });
        assert_eq!(board.handle_message(&redo, Instant::now()), Dispatch::Ignored);
        assert_eq!(board.history().len(), 1);
    }

    #[test]
    fn test_presence_frames_are_ignored() {
        let mut board = board();
        let joined = WireMessage::Joined {
            channel: "board".to_string(),
            peer_count: 2,
        };
        assert_eq!(board.handle_message(&joined, Instant::now()), Dispatch::Ignored);
    }

    #[test]
    fn test_frames_wait_for_surface() {
        let mut board: Board<RecordingSurface> = Board::new(BoardConfig::default());
        let t0 = Instant::now();
        assert!(!board.is_ready());

        let frames = [
            pen(PointerKind::Down, 10.0, 10.0),
            pen(PointerKind::Move, 50.0, 50.0),
            pen(PointerKind::Up, 50.0, 50.0),
            pen(PointerKind::Down, 0.0, 0.0),
            pen(PointerKind::Move, 10.0, 10.0),
            pen(PointerKind::Up, 10.0, 10.0),
            CommandAction::Undo.into(),
        ];
        for frame in &frames {
            assert_eq!(board.handle_message(frame, t0), Dispatch::Deferred);
        }
        assert_eq!(board.deferred_len(), frames.len());
        assert!(board.history().is_empty());

        let replayed = board.attach_surface(RecordingSurface::new(Size::new(800.0, 500.0)));
        assert_eq!(replayed, frames.len());
        assert_eq!(board.deferred_len(), 0);
        assert_eq!(board.history().len(), 1);
        assert_eq!(
            board.history().paths()[0].points()[0],
            Point::new(80.0, 50.0)
        );
    }

    #[test]
    fn test_queued_undos_keep_arrival_time() {
        let mut board: Board<RecordingSurface> = Board::new(BoardConfig::default());
        let t0 = Instant::now();
        let surface = RecordingSurface::new(Size::new(100.0, 100.0));
        board.attach_surface(surface);
        for i in 0..3 {
            local_stroke(&mut board, i as f64, i as f64 + 5.0);
        }
        let surface = board.detach_surface().unwrap();

        board.handle_message(&CommandAction::Undo.into(), t0);
        board.handle_message(&CommandAction::Undo.into(), t0 + Duration::from_millis(10));
        board.handle_message(&CommandAction::Undo.into(), t0 + Duration::from_millis(300));
        board.attach_surface(surface);
        assert_eq!(board.history().len(), 1);
    }

    fn small_queue(capacity: usize) -> Board<RecordingSurface> {
        Board::new(BoardConfig {
            deferred_capacity: capacity,
            ..BoardConfig::default()
        })
    }

    #[test]
    fn test_full_queue_evicts_oldest_pointer() {
        let mut board = small_queue(2);
        let now = Instant::now();
        assert_eq!(board.handle_message(&pen(PointerKind::Down, 0.0, 0.0), now), Dispatch::Deferred);
        assert_eq!(board.handle_message(&pen(PointerKind::Move, 1.0, 1.0), now), Dispatch::Deferred);
        assert_eq!(board.handle_message(&pen(PointerKind::Up, 1.0, 1.0), now), Dispatch::Deferred);
        assert_eq!(board.deferred_len(), 2);

        // The down was evicted, so the replayed move and up draw nothing.
        board.attach_surface(RecordingSurface::new(Size::new(800.0, 500.0)));
        assert!(board.history().is_empty());
    }

    #[test]
    fn test_full_queue_still_applies_clear() {
        let mut board = small_queue(3);
        let now = Instant::now();
        board.attach_surface(RecordingSurface::new(Size::new(800.0, 500.0)));
        assert!(local_stroke(&mut board, 0.0, 5.0));
        let surface = board.detach_surface().unwrap();

        for kind in [PointerKind::Down, PointerKind::Move, PointerKind::Up] {
            board.handle_message(&pen(kind, 10.0, 10.0), now);
        }
        assert_eq!(board.deferred_len(), 3);
        assert_eq!(
            board.handle_message(&CommandAction::Clear.into(), now),
            Dispatch::Deferred
        );
        assert_eq!(board.deferred_len(), 1);

        board.attach_surface(surface);
        assert!(board.history().is_empty());
        assert!(board.surface().unwrap().rendered().is_empty());
    }

    #[test]
    fn test_commands_are_never_dropped() {
        let mut board = small_queue(1);
        let now = Instant::now();
        board.attach_surface(RecordingSurface::new(Size::new(800.0, 500.0)));
        for i in 0..3 {
            local_stroke(&mut board, i as f64, i as f64 + 5.0);
        }
        let surface = board.detach_surface().unwrap();

        let undo = WireMessage::from(CommandAction::Undo);
        assert_eq!(board.handle_message(&undo, now), Dispatch::Deferred);
        assert_eq!(
            board.handle_message(&undo, now + Duration::from_millis(200)),
            Dispatch::Deferred
        );
        assert_eq!(
            board.handle_message(&pen(PointerKind::Down, 0.0, 0.0), now),
            Dispatch::Ignored
        );
        assert_eq!(board.deferred_len(), 2);

        board.attach_surface(surface);
        assert_eq!(board.history().len(), 1);
    }

    #[test]
    fn test_attach_paints_paths_committed_while_detached() {
        let mut board: Board<RecordingSurface> = Board::new(BoardConfig::default());
        assert!(local_stroke(&mut board, 0.0, 5.0));
        assert!(local_stroke(&mut board, 5.0, 10.0));

        board.attach_surface(RecordingSurface::new(Size::new(800.0, 500.0)));
        let rendered: Vec<_> = board
            .surface()
            .unwrap()
            .rendered()
            .iter()
            .map(|path| path.id().to_string())
            .collect();
        let committed: Vec<_> = board
            .history()
            .iter()
            .map(|path| path.id().to_string())
            .collect();
        assert_eq!(rendered.len(), 2);
        assert_eq!(rendered, committed);
    }

    #[test]
    fn test_surface_resize_mid_stroke() {
        let mut board = board();
        let now = Instant::now();
        board.handle_message(&pen(PointerKind::Down, 10.0, 10.0), now);
        board
            .surface_mut()
            .unwrap()
            .resize(Size::new(400.0, 400.0));
        board.handle_message(&pen(PointerKind::Move, 10.0, 10.0), now);

        let points = board.remote_in_progress().unwrap().points().to_vec();
        assert_eq!(points, vec![Point::new(80.0, 50.0), Point::new(40.0, 40.0)]);
        assert_eq!(board.remote_cursor(), Some(Point::new(40.0, 40.0)));
    }

    #[test]
    fn test_remote_fallback_uses_local_settings() {
        let mut board = board();
        board.settings_mut().color = HexColor::new(0, 0, 255);
        for kind in [PointerKind::Down, PointerKind::Move, PointerKind::Up] {
            board.on_pointer_event(&PointerEvent::new(kind, 50.0, 50.0, 0));
        }
        let path = board.history().last().unwrap();
        assert_eq!(path.color, HexColor::new(0, 0, 255));
        assert_eq!(path.stroke_width, 2.0);
    }
}
