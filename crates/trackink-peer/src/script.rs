//! Line commands for driving a controller from stdin.
//!
//! ```text
//! down 120 80
//! move 300 200
//! up
//! ctrl+z
//! ```

use kurbo::Point;
use std::str::FromStr;
use thiserror::Error;
use trackink_core::CommandAction;

#[derive(Debug, Error, PartialEq)]
pub enum ScriptError {
    #[error("Unknown command: {0}")]
    Unknown(String),
    #[error("Expected two coordinates after {0}")]
    MissingCoordinates(&'static str),
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),
}

/// One parsed line.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptCommand {
    Down(Point),
    Move(Point),
    /// Release; the position is optional since the stroke ends where it
    /// was last seen.
    Up(Option<Point>),
    Command(CommandAction),
    Shortcut { key: String, ctrl: bool },
    TestStroke,
    Quit,
}

/// Parse one line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<ScriptCommand>, ScriptError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();

    let command = match head.to_ascii_lowercase().as_str() {
        "down" => ScriptCommand::Down(point("down", &rest)?),
        "move" => ScriptCommand::Move(point("move", &rest)?),
        "up" if rest.is_empty() => ScriptCommand::Up(None),
        "up" => ScriptCommand::Up(Some(point("up", &rest)?)),
        "stroke" => ScriptCommand::TestStroke,
        "quit" | "exit" => ScriptCommand::Quit,
        other => {
            if let Some(key) = other.strip_prefix("ctrl+") {
                ScriptCommand::Shortcut {
                    key: key.to_string(),
                    ctrl: true,
                }
            } else {
                let action = CommandAction::from_str(other)
                    .map_err(|_| ScriptError::Unknown(head.to_string()))?;
                ScriptCommand::Command(action)
            }
        }
    };
    Ok(Some(command))
}

fn point(name: &'static str, args: &[&str]) -> Result<Point, ScriptError> {
    let [x, y] = args else {
        return Err(ScriptError::MissingCoordinates(name));
    };
    let coord = |s: &str| {
        s.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| ScriptError::InvalidCoordinate(s.to_string()))
    };
    Ok(Point::new(coord(*x)?, coord(*y)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_lines() {
        assert_eq!(
            parse_line("down 10 20").unwrap(),
            Some(ScriptCommand::Down(Point::new(10.0, 20.0)))
        );
        assert_eq!(
            parse_line("  MOVE 1.5 2 ").unwrap(),
            Some(ScriptCommand::Move(Point::new(1.5, 2.0)))
        );
        assert_eq!(parse_line("up").unwrap(), Some(ScriptCommand::Up(None)));
    }

    #[test]
    fn test_command_lines() {
        assert_eq!(
            parse_line("undo").unwrap(),
            Some(ScriptCommand::Command(CommandAction::Undo))
        );
        assert_eq!(
            parse_line("ctrl+k").unwrap(),
            Some(ScriptCommand::Shortcut {
                key: "k".to_string(),
                ctrl: true
            })
        );
        assert_eq!(parse_line("stroke").unwrap(), Some(ScriptCommand::TestStroke));
        assert_eq!(parse_line("# note").unwrap(), None);
        assert_eq!(parse_line("").unwrap(), None);
    }

    #[test]
    fn test_bad_lines() {
        assert_eq!(
            parse_line("down 1"),
            Err(ScriptError::MissingCoordinates("down"))
        );
        assert_eq!(
            parse_line("move a b"),
            Err(ScriptError::InvalidCoordinate("a".to_string()))
        );
        assert_eq!(parse_line("redo"), Err(ScriptError::Unknown("redo".to_string())));
    }
}
