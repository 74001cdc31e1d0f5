//! Debounce for relayed undo commands.

use std::time::{Duration, Instant};

/// Collapses bursts of undo commands.
///
/// An undo is admitted when no admitted undo happened within the window
/// before it. The window restarts on every admitted undo, whether or not
/// the history had anything to remove.
#[derive(Debug, Clone)]
pub struct UndoDebounce {
    window: Duration,
    last_applied: Option<Instant>,
}

impl UndoDebounce {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_applied: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Returns `true` and records `now` if the undo may run.
    pub fn admit(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_applied {
            if now.saturating_duration_since(last) < self.window {
                return false;
            }
        }
        self.last_applied = Some(now);
        true
    }

    pub fn reset(&mut self) {
        self.last_applied = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_undo_admitted() {
        let mut debounce = UndoDebounce::new(Duration::from_millis(100));
        assert!(debounce.admit(Instant::now()));
    }

    #[test]
    fn test_burst_collapses() {
        let mut debounce = UndoDebounce::new(Duration::from_millis(100));
        let t0 = Instant::now();
        assert!(debounce.admit(t0));
        assert!(!debounce.admit(t0 + Duration::from_millis(10)));
        assert!(!debounce.admit(t0 + Duration::from_millis(99)));
        assert!(debounce.admit(t0 + Duration::from_millis(100)));
        assert!(!debounce.admit(t0 + Duration::from_millis(150)));
        assert!(debounce.admit(t0 + Duration::from_millis(250)));
    }

    #[test]
    fn test_reset() {
        let mut debounce = UndoDebounce::new(Duration::from_millis(100));
        let t0 = Instant::now();
        debounce.admit(t0);
        debounce.reset();
        assert!(debounce.admit(t0 + Duration::from_millis(1)));
    }
}
