//! Board configuration.

use crate::protocol::HexColor;
use std::time::Duration;

/// Width forced onto eraser strokes.
pub const ERASER_WIDTH: f64 = 20.0;

/// Pen width used when a remote event does not carry one.
pub const DEFAULT_PEN_WIDTH: f64 = 2.0;

/// Range accepted for user-selected stroke widths.
pub const MIN_STROKE_WIDTH: f64 = 1.0;
pub const MAX_STROKE_WIDTH: f64 = 20.0;

/// Strokes with fewer points than this at release time are discarded.
pub const MIN_COMMIT_POINTS: usize = 2;

/// Remote undos closer together than this collapse into one.
pub const UNDO_DEBOUNCE: Duration = Duration::from_millis(100);

/// Maximum number of events held while the surface is not attached.
pub const DEFAULT_DEFERRED_CAPACITY: usize = 4096;

/// Tunables for a [`Board`](crate::board::Board).
#[derive(Debug, Clone, PartialEq)]
pub struct BoardConfig {
    /// Canvas background; eraser strokes are painted in this color.
    pub background: HexColor,
    pub eraser_width: f64,
    pub default_pen_width: f64,
    pub min_commit_points: usize,
    pub undo_debounce: Duration,
    pub deferred_capacity: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            background: HexColor::WHITE,
            eraser_width: ERASER_WIDTH,
            default_pen_width: DEFAULT_PEN_WIDTH,
            min_commit_points: MIN_COMMIT_POINTS,
            undo_debounce: UNDO_DEBOUNCE,
            deferred_capacity: DEFAULT_DEFERRED_CAPACITY,
        }
    }
}
