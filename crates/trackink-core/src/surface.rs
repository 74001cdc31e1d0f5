//! Rendering seam between the board and whatever draws it.

use crate::history::Path;
use kurbo::{Point, Size};

/// A drawable canvas.
///
/// The board only needs the current bounds to map remote coordinates and a
/// way to paint committed paths. Implementations that cannot erase draw
/// nothing in [`reset`](RenderSurface::reset) and rely on the board to
/// repaint the history after it.
pub trait RenderSurface {
    /// Current size of the canvas in pixels.
    fn bounds(&self) -> Size;

    /// Paint one committed path on top of what is already there.
    fn render_path(&mut self, path: &Path);

    /// Wipe the canvas back to the background.
    fn reset(&mut self) {}

    /// Show the remote pointer at `position`.
    fn move_cursor(&mut self, _position: Point) {}
}

/// Surface that remembers what was drawn on it.
///
/// Used by headless peers and tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    size: Size,
    rendered: Vec<Path>,
    resets: usize,
    cursor: Option<Point>,
}

impl RecordingSurface {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            ..Default::default()
        }
    }

    pub fn resize(&mut self, size: Size) {
        self.size = size;
    }

    /// Paths currently painted, in paint order since the last reset.
    pub fn rendered(&self) -> &[Path] {
        &self.rendered
    }

    pub fn resets(&self) -> usize {
        self.resets
    }

    pub fn cursor(&self) -> Option<Point> {
        self.cursor
    }
}

impl RenderSurface for RecordingSurface {
    fn bounds(&self) -> Size {
        self.size
    }

    fn render_path(&mut self, path: &Path) {
        self.rendered.push(path.clone());
    }

    fn reset(&mut self) {
        self.rendered.clear();
        self.resets += 1;
    }

    fn move_cursor(&mut self, position: Point) {
        self.cursor = Some(position);
    }
}
