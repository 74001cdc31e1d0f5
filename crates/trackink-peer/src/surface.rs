//! Headless canvas that logs what it would draw.

use kurbo::{Point, Shape, Size};
use trackink_core::{Path, RenderSurface};

/// Writes each committed path to the log as SVG path data.
#[derive(Debug, Clone)]
pub struct LogSurface {
    size: Size,
    painted: usize,
}

impl LogSurface {
    pub fn new(size: Size) -> Self {
        Self { size, painted: 0 }
    }

    /// Paths painted since the last reset.
    pub fn painted(&self) -> usize {
        self.painted
    }
}

impl RenderSurface for LogSurface {
    fn bounds(&self) -> Size {
        self.size
    }

    fn render_path(&mut self, path: &Path) {
        self.painted += 1;
        let bbox = path.to_bez_path().bounding_box();
        log::info!(
            "Path {} [{} {} {}px] bbox {:.0}x{:.0}: {}",
            path.id(),
            path.tool,
            path.color,
            path.stroke_width,
            bbox.width(),
            bbox.height(),
            path.to_svg()
        );
    }

    fn reset(&mut self) {
        log::info!("Canvas reset");
        self.painted = 0;
    }

    fn move_cursor(&mut self, position: Point) {
        log::trace!("Remote cursor at ({:.1}, {:.1})", position.x, position.y);
    }
}
