//! Input normalization for the controller side.
//!
//! Raw mouse and touch samples arrive in the input surface's pixel space.
//! They leave as [`PointerEvent`]s in percentage space carrying the tool
//! selection, so any surface can replay them at its own resolution.

use crate::protocol::{HexColor, PointerEvent, PointerKind, Tool};
use crate::stroke::ToolSettings;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Pressure reported for touch input when the device gives no force reading.
pub const DEFAULT_TOUCH_PRESSURE: f64 = 0.5;

/// Raw input kinds from mouse and touch devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RawKind {
    MouseDown,
    MouseMove,
    MouseUp,
    TouchStart,
    TouchMove,
    TouchEnd,
}

impl RawKind {
    pub fn pointer_kind(self) -> PointerKind {
        match self {
            RawKind::MouseDown | RawKind::TouchStart => PointerKind::Down,
            RawKind::MouseMove | RawKind::TouchMove => PointerKind::Move,
            RawKind::MouseUp | RawKind::TouchEnd => PointerKind::Up,
        }
    }

    pub fn is_touch(self) -> bool {
        matches!(
            self,
            RawKind::TouchStart | RawKind::TouchMove | RawKind::TouchEnd
        )
    }
}

/// A single raw sample in input-surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawInput {
    pub kind: RawKind,
    pub position: Point,
    /// Touch force, if the device reports one.
    pub force: Option<f64>,
    pub timestamp_ms: u64,
}

impl RawInput {
    pub fn new(kind: RawKind, position: Point, timestamp_ms: u64) -> Self {
        Self {
            kind,
            position,
            force: None,
            timestamp_ms,
        }
    }

    pub fn with_force(mut self, force: f64) -> Self {
        self.force = Some(force);
        self
    }
}

/// Orientation of the input surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    /// Square surfaces count as landscape.
    pub fn of(bounds: Rect) -> Self {
        if bounds.height() > bounds.width() {
            Orientation::Portrait
        } else {
            Orientation::Landscape
        }
    }
}

/// Map `position` into `[0, 100]` percentages of `bounds`, clamping samples
/// that fall outside.
pub fn to_percent(position: Point, bounds: Rect) -> Point {
    let axis = |value: f64, origin: f64, extent: f64| {
        if extent > 0.0 && extent.is_finite() && value.is_finite() {
            ((value - origin) / extent * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        }
    };
    Point::new(
        axis(position.x, bounds.x0, bounds.width()),
        axis(position.y, bounds.y0, bounds.height()),
    )
}

/// Build a self-describing pointer event from one raw sample.
pub fn normalize(
    raw: &RawInput,
    bounds: Rect,
    tool: Tool,
    color: HexColor,
    stroke_width: f64,
) -> PointerEvent {
    let percent = to_percent(raw.position, bounds);
    let mut event = PointerEvent::new(raw.kind.pointer_kind(), percent.x, percent.y, raw.timestamp_ms)
        .with_tool(tool)
        .with_color(color)
        .with_stroke_width(stroke_width);
    if raw.kind.is_touch() {
        event = event.with_pressure(raw.force.unwrap_or(DEFAULT_TOUCH_PRESSURE));
    } else if let Some(force) = raw.force {
        event = event.with_pressure(force);
    }
    event
}

/// Stateful normalizer that decides which samples are worth sending.
///
/// Moves are only emitted while a stroke is active, and the `up` is emitted
/// at the last position seen during the stroke. Timestamps never go
/// backwards even if the input clock does.
#[derive(Debug, Clone, Default)]
pub struct PointerNormalizer {
    drawing: bool,
    cursor: Option<PointerEvent>,
    last_timestamp: u64,
}

impl PointerNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    /// Feed one raw sample. Returns the event to send, if any.
    pub fn process(
        &mut self,
        raw: &RawInput,
        bounds: Rect,
        settings: &ToolSettings,
    ) -> Option<PointerEvent> {
        let timestamp_ms = raw.timestamp_ms.max(self.last_timestamp);
        self.last_timestamp = timestamp_ms;
        let raw = RawInput {
            timestamp_ms,
            ..*raw
        };
        let event = normalize(
            &raw,
            bounds,
            settings.tool,
            settings.color,
            settings.stroke_width(),
        );

        match event.kind {
            PointerKind::Down => {
                self.drawing = true;
                self.cursor = Some(event.clone());
                Some(event)
            }
            PointerKind::Move => {
                if !self.drawing {
                    return None;
                }
                self.cursor = Some(event.clone());
                Some(event)
            }
            PointerKind::Up => {
                if !self.drawing {
                    return None;
                }
                self.drawing = false;
                // Release where the stroke was last seen.
                let last = self.cursor.take().unwrap_or(event);
                Some(PointerEvent {
                    kind: PointerKind::Up,
                    timestamp_ms,
                    ..last
                })
            }
        }
    }
}
