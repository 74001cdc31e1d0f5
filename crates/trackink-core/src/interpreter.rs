//! Turns relayed pointer events into remote paths.

use crate::config::BoardConfig;
use crate::history::Path;
use crate::protocol::{PointerEvent, PointerKind};
use crate::stroke::{PercentMapper, StrokeMachine, StrokeStyle, ToolSettings};
use kurbo::{Point, Size};

/// Interprets pointer events from a remote controller.
///
/// Coordinates arrive as percentages and are mapped with the canvas bounds
/// current at the time each event is handled, so a resize in the middle of a
/// stroke affects only the samples that follow it.
#[derive(Debug, Clone)]
pub struct RemoteInterpreter {
    stroke: StrokeMachine<PercentMapper>,
    cursor: Option<Point>,
}

impl RemoteInterpreter {
    pub fn new(min_points: usize) -> Self {
        Self {
            stroke: StrokeMachine::remote(min_points),
            cursor: None,
        }
    }

    /// Feed one event. Returns a path when the event finishes a stroke that
    /// should be committed.
    pub fn on_event(
        &mut self,
        event: &PointerEvent,
        bounds: Size,
        fallback: &ToolSettings,
        config: &BoardConfig,
    ) -> Option<Path> {
        self.cursor = Some(self.stroke.map(event.x, event.y, bounds));

        match event.kind {
            PointerKind::Down => {
                let style = StrokeStyle::remote(event, fallback, config);
                self.stroke.begin(event.x, event.y, bounds, style);
                None
            }
            PointerKind::Move => {
                if self.stroke.extend(event.x, event.y, bounds).is_none() {
                    log::debug!("Remote move without a stroke in progress");
                }
                None
            }
            PointerKind::Up => self.stroke.release(event.x, event.y, bounds),
        }
    }

    /// Last mapped remote pointer position.
    pub fn cursor(&self) -> Option<Point> {
        self.cursor
    }

    pub fn in_progress(&self) -> Option<&Path> {
        self.stroke.in_progress()
    }

    pub fn is_tracking(&self) -> bool {
        self.stroke.is_tracking()
    }

    /// Drop the remote stroke in progress.
    pub fn cancel(&mut self) -> bool {
        self.stroke.cancel()
    }
}
