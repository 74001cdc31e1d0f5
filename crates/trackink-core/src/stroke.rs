//! Stroke state machine shared by local and remote drawing.
//!
//! A [`StrokeMachine`] is either idle or tracking one in-progress [`Path`].
//! Local input and relayed pointer events drive the same machine; they only
//! differ in their [`Origin`] tag and in how incoming coordinates are mapped
//! into canvas pixels.

use crate::config::{BoardConfig, MAX_STROKE_WIDTH, MIN_STROKE_WIDTH};
use crate::history::{Origin, Path};
use crate::protocol::{HexColor, PointerEvent, Tool};
use kurbo::{Point, Size};

/// Maps incoming coordinates into canvas pixel space.
pub trait CoordinateMapper {
    /// `bounds` is the canvas size at the moment the sample is interpreted.
    fn map(&self, x: f64, y: f64, bounds: Size) -> Point;
}

/// Coordinates are already canvas pixels.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityMapper;

impl CoordinateMapper for IdentityMapper {
    fn map(&self, x: f64, y: f64, _bounds: Size) -> Point {
        Point::new(x, y)
    }
}

/// Coordinates are percentages of the sender's input surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct PercentMapper;

impl CoordinateMapper for PercentMapper {
    fn map(&self, x: f64, y: f64, bounds: Size) -> Point {
        Point::new(x / 100.0 * bounds.width, y / 100.0 * bounds.height)
    }
}

/// Tool, color and width currently selected in a peer's UI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolSettings {
    pub tool: Tool,
    pub color: HexColor,
    stroke_width: f64,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            tool: Tool::Pen,
            color: HexColor::BLACK,
            stroke_width: 2.0,
        }
    }
}

impl ToolSettings {
    pub fn new(tool: Tool, color: HexColor, stroke_width: f64) -> Self {
        let mut settings = Self {
            tool,
            color,
            stroke_width: 0.0,
        };
        settings.set_stroke_width(stroke_width);
        settings
    }

    pub fn stroke_width(&self) -> f64 {
        self.stroke_width
    }

    /// Set the width, clamped to the range offered by the width slider.
    pub fn set_stroke_width(&mut self, width: f64) {
        self.stroke_width = if width.is_finite() {
            width.clamp(MIN_STROKE_WIDTH, MAX_STROKE_WIDTH)
        } else {
            MIN_STROKE_WIDTH
        };
    }
}

/// Resolved appearance of a stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub tool: Tool,
    pub color: HexColor,
    pub stroke_width: f64,
}

impl StrokeStyle {
    /// Style for a stroke drawn with the local UI selection.
    pub fn local(settings: &ToolSettings, config: &BoardConfig) -> Self {
        Self::resolve(settings.tool, settings.color, settings.stroke_width, config)
    }

    /// Style for a relayed stroke.
    ///
    /// Fields missing from the event fall back to the receiver's tool and
    /// color; a missing width falls back to the pen default.
    pub fn remote(event: &PointerEvent, fallback: &ToolSettings, config: &BoardConfig) -> Self {
        let tool = event.tool.unwrap_or(fallback.tool);
        let color = event.color.unwrap_or(fallback.color);
        let width = event
            .stroke_width
            .filter(|w| w.is_finite() && *w > 0.0)
            .unwrap_or(config.default_pen_width);
        Self::resolve(tool, color, width, config)
    }

    /// Erasers always paint the background at the fixed eraser width.
    fn resolve(tool: Tool, color: HexColor, stroke_width: f64, config: &BoardConfig) -> Self {
        match tool {
            Tool::Eraser => Self {
                tool,
                color: config.background,
                stroke_width: config.eraser_width,
            },
            Tool::Pen => Self {
                tool,
                color,
                stroke_width,
            },
        }
    }
}

/// State of a stroke machine.
#[derive(Debug, Clone, Default)]
pub enum StrokeState {
    /// Waiting for a `down`.
    #[default]
    Idle,
    /// Accumulating points into the in-progress path.
    Tracking(Path),
}

/// Accumulates samples into an in-progress path and hands it back on release
/// when it has enough points.
#[derive(Debug, Clone)]
pub struct StrokeMachine<M> {
    origin: Origin,
    mapper: M,
    min_points: usize,
    state: StrokeState,
}

impl StrokeMachine<IdentityMapper> {
    /// Machine for strokes drawn directly on this canvas.
    pub fn local(min_points: usize) -> Self {
        Self::new(Origin::Local, IdentityMapper, min_points)
    }
}

impl StrokeMachine<PercentMapper> {
    /// Machine for strokes driven through the relay.
    pub fn remote(min_points: usize) -> Self {
        Self::new(Origin::Remote, PercentMapper, min_points)
    }
}

impl<M: CoordinateMapper> StrokeMachine<M> {
    pub fn new(origin: Origin, mapper: M, min_points: usize) -> Self {
        Self {
            origin,
            mapper,
            min_points,
            state: StrokeState::Idle,
        }
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn state(&self) -> &StrokeState {
        &self.state
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self.state, StrokeState::Tracking(_))
    }

    /// The path being drawn, if any.
    pub fn in_progress(&self) -> Option<&Path> {
        match &self.state {
            StrokeState::Tracking(path) => Some(path),
            StrokeState::Idle => None,
        }
    }

    /// Map a sample without touching the stroke state.
    pub fn map(&self, x: f64, y: f64, bounds: Size) -> Point {
        self.mapper.map(x, y, bounds)
    }

    /// Start a stroke. A stroke that is still in progress is dropped.
    pub fn begin(&mut self, x: f64, y: f64, bounds: Size, style: StrokeStyle) -> Point {
        let point = self.mapper.map(x, y, bounds);
        if let StrokeState::Tracking(abandoned) = &self.state {
            log::debug!(
                "{} stroke restarted, dropping {} ({} points)",
                self.origin,
                abandoned.id(),
                abandoned.len()
            );
        }
        self.state = StrokeState::Tracking(Path::start(self.origin, point, style));
        point
    }

    /// Append a sample. Ignored while idle.
    pub fn extend(&mut self, x: f64, y: f64, bounds: Size) -> Option<Point> {
        match &mut self.state {
            StrokeState::Tracking(path) => {
                let point = self.mapper.map(x, y, bounds);
                path.push(point);
                Some(point)
            }
            StrokeState::Idle => None,
        }
    }

    /// Finish the stroke and return to idle.
    ///
    /// Returns the finished path if it reached the point threshold before the
    /// release; the release sample becomes its last point. Shorter strokes
    /// are discarded.
    pub fn release(&mut self, x: f64, y: f64, bounds: Size) -> Option<Path> {
        match std::mem::take(&mut self.state) {
            StrokeState::Tracking(mut path) => {
                if path.len() < self.min_points {
                    log::debug!(
                        "{} stroke discarded with {} point(s)",
                        self.origin,
                        path.len()
                    );
                    return None;
                }
                path.push(self.mapper.map(x, y, bounds));
                Some(path)
            }
            StrokeState::Idle => None,
        }
    }

    /// Drop the in-progress path, if any.
    pub fn cancel(&mut self) -> bool {
        matches!(
            std::mem::take(&mut self.state),
            StrokeState::Tracking(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDS: Size = Size::new(800.0, 500.0);

    fn pen() -> StrokeStyle {
        StrokeStyle::local(&ToolSettings::default(), &BoardConfig::default())
    }

    #[test]
    fn test_tap_is_not_committed() {
        let mut machine = StrokeMachine::local(2);
        machine.begin(10.0, 10.0, BOUNDS, pen());
        assert!(machine.is_tracking());
        assert!(machine.release(10.0, 10.0, BOUNDS).is_none());
        assert!(!machine.is_tracking());
    }

    #[test]
    fn test_stroke_commits_with_release_point() {
        let mut machine = StrokeMachine::local(2);
        machine.begin(10.0, 10.0, BOUNDS, pen());
        machine.extend(20.0, 20.0, BOUNDS);
        let path = machine.release(20.0, 20.0, BOUNDS).unwrap();
        assert_eq!(
            path.points(),
            &[
                Point::new(10.0, 10.0),
                Point::new(20.0, 20.0),
                Point::new(20.0, 20.0)
            ]
        );
        assert_eq!(path.origin(), Origin::Local);
        assert!(machine.in_progress().is_none());
    }

    #[test]
    fn test_move_while_idle_is_ignored() {
        let mut machine = StrokeMachine::remote(2);
        assert!(machine.extend(50.0, 50.0, BOUNDS).is_none());
        assert!(machine.release(50.0, 50.0, BOUNDS).is_none());
        assert!(!machine.is_tracking());
    }

    #[test]
    fn test_repeated_down_restarts_stroke() {
        let mut machine = StrokeMachine::local(2);
        machine.begin(1.0, 1.0, BOUNDS, pen());
        machine.extend(2.0, 2.0, BOUNDS);
        machine.begin(5.0, 5.0, BOUNDS, pen());
        let path = machine.in_progress().unwrap();
        assert_eq!(path.points(), &[Point::new(5.0, 5.0)]);
    }

    #[test]
    fn test_percent_mapping_uses_given_bounds() {
        let mut machine = StrokeMachine::remote(2);
        let first = machine.begin(50.0, 50.0, BOUNDS, pen());
        assert_eq!(first, Point::new(400.0, 250.0));
        let resized = machine
            .extend(50.0, 50.0, Size::new(1000.0, 1000.0))
            .unwrap();
        assert_eq!(resized, Point::new(500.0, 500.0));
    }

    #[test]
    fn test_cancel() {
        let mut machine = StrokeMachine::local(2);
        assert!(!machine.cancel());
        machine.begin(0.0, 0.0, BOUNDS, pen());
        assert!(machine.cancel());
        assert!(machine.in_progress().is_none());
    }

    #[test]
    fn test_eraser_overrides_color_and_width() {
        let config = BoardConfig::default();
        let settings = ToolSettings::new(Tool::Eraser, HexColor::new(255, 0, 0), 3.0);
        let style = StrokeStyle::local(&settings, &config);
        assert_eq!(style.color, config.background);
        assert_eq!(style.stroke_width, config.eraser_width);

        let event = PointerEvent::new(crate::protocol::PointerKind::Down, 0.0, 0.0, 0)
            .with_tool(Tool::Eraser)
            .with_color(HexColor::new(0, 0, 255))
            .with_stroke_width(4.0);
        let style = StrokeStyle::remote(&event, &ToolSettings::default(), &config);
        assert_eq!(style.color, config.background);
        assert_eq!(style.stroke_width, config.eraser_width);
    }

    #[test]
    fn test_remote_style_fallbacks() {
        let config = BoardConfig::default();
        let local = ToolSettings::new(Tool::Pen, HexColor::new(0, 128, 0), 9.0);
        let event = PointerEvent::new(crate::protocol::PointerKind::Down, 0.0, 0.0, 0);
        let style = StrokeStyle::remote(&event, &local, &config);
        assert_eq!(style.tool, Tool::Pen);
        assert_eq!(style.color, HexColor::new(0, 128, 0));
        assert_eq!(style.stroke_width, config.default_pen_width);
    }

    #[test]
    fn test_stroke_width_is_clamped() {
        let mut settings = ToolSettings::default();
        settings.set_stroke_width(64.0);
        assert_eq!(settings.stroke_width(), 20.0);
        settings.set_stroke_width(0.0);
        assert_eq!(settings.stroke_width(), 1.0);
        settings.set_stroke_width(f64::NAN);
        assert_eq!(settings.stroke_width(), 1.0);
    }
}
