//! Paths and the committed drawing history.

use crate::protocol::{HexColor, Tool};
use crate::stroke::StrokeStyle;
use kurbo::{BezPath, Point};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Which side of the board produced a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Local,
    Remote,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Local => "local",
            Origin::Remote => "remote",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A polyline in canvas pixel space.
///
/// Always holds at least one point: it is created from the stroke's first
/// sample and only ever grows until it is committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Path {
    pub(crate) id: String,
    pub(crate) origin: Origin,
    pub(crate) points: Vec<Point>,
    pub color: HexColor,
    pub stroke_width: f64,
    pub tool: Tool,
}

impl Path {
    /// Start a new path at `point`. The id is tagged with the origin.
    pub(crate) fn start(origin: Origin, point: Point, style: StrokeStyle) -> Self {
        Self {
            id: format!("{}-{}", origin, Uuid::new_v4()),
            origin,
            points: vec![point],
            color: style.color,
            stroke_width: style.stroke_width,
            tool: style.tool,
        }
    }

    pub(crate) fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Number of points in the path.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Polyline through every point.
    pub fn to_bez_path(&self) -> BezPath {
        let mut path = BezPath::new();
        let mut points = self.points.iter();
        if let Some(first) = points.next() {
            path.move_to(*first);
            for point in points {
                path.line_to(*point);
            }
        }
        path
    }

    /// SVG path data (`M x y L x y ...`) for rendering collaborators.
    pub fn to_svg(&self) -> String {
        let coords: Vec<String> = self
            .points
            .iter()
            .map(|p| format!("{} {}", p.x, p.y))
            .collect();
        format!("M {}", coords.join(" L "))
    }
}

/// Ordered sequence of committed paths.
///
/// Local strokes, remote strokes and commands all mutate the history, and
/// only through these three operations: whole paths are appended, the last
/// one is removed, or everything is cleared. Committed paths are never edited
/// in place.
#[derive(Debug, Clone, Default)]
pub struct DrawingHistory {
    paths: Vec<Path>,
}

impl DrawingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a committed path.
    pub fn append(&mut self, path: Path) {
        log::debug!("Committing {} ({} points)", path.id, path.len());
        self.paths.push(path);
    }

    /// Remove and return the most recently committed path.
    pub fn remove_last(&mut self) -> Option<Path> {
        self.paths.pop()
    }

    /// Remove every path, returning how many were dropped.
    pub fn clear(&mut self) -> usize {
        let removed = self.paths.len();
        self.paths.clear();
        removed
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter()
    }

    pub fn last(&self) -> Option<&Path> {
        self.paths.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(origin: Origin, points: &[(f64, f64)]) -> Path {
        let style = StrokeStyle {
            tool: Tool::Pen,
            color: HexColor::BLACK,
            stroke_width: 2.0,
        };
        let mut iter = points.iter().map(|&(x, y)| Point::new(x, y));
        let mut path = Path::start(origin, iter.next().unwrap(), style);
        for point in iter {
            path.push(point);
        }
        path
    }

    #[test]
    fn test_path_id_is_origin_tagged() {
        let local = path(Origin::Local, &[(0.0, 0.0)]);
        let remote = path(Origin::Remote, &[(0.0, 0.0)]);
        assert!(local.id().starts_with("local-"));
        assert!(remote.id().starts_with("remote-"));
        assert_ne!(local.id(), path(Origin::Local, &[(0.0, 0.0)]).id());
    }

    #[test]
    fn test_svg_data() {
        let p = path(Origin::Local, &[(10.0, 10.0), (50.5, 50.0)]);
        assert_eq!(p.to_svg(), "M 10 10 L 50.5 50");
    }

    #[test]
    fn test_history_operations() {
        let mut history = DrawingHistory::new();
        assert!(history.remove_last().is_none());

        let first = path(Origin::Local, &[(0.0, 0.0), (1.0, 1.0)]);
        let second = path(Origin::Remote, &[(2.0, 2.0), (3.0, 3.0)]);
        let second_id = second.id().to_string();
        history.append(first);
        history.append(second);
        assert_eq!(history.len(), 2);
        assert_eq!(history.last().map(Path::id), Some(second_id.as_str()));

        let removed = history.remove_last().unwrap();
        assert_eq!(removed.id(), second_id);
        assert_eq!(history.len(), 1);

        assert_eq!(history.clear(), 1);
        assert!(history.is_empty());
    }
}
