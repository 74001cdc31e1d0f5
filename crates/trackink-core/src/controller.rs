//! Controller peer: turns local input into relay traffic.

use crate::link::Link;
use crate::normalizer::{Orientation, PointerNormalizer, RawInput};
use crate::protocol::{CommandAction, PointerEvent, PointerKind, WireMessage};
use crate::shortcuts::ShortcutRegistry;
use crate::stroke::ToolSettings;
use kurbo::Rect;

/// Delay between the samples of the test stroke.
pub const TEST_STROKE_SPACING_MS: u64 = 100;

/// Input side of a remote whiteboard session.
#[derive(Debug, Clone, Default)]
pub struct Controller {
    normalizer: PointerNormalizer,
    settings: ToolSettings,
    link: Link,
}

impl Controller {
    pub fn new(settings: ToolSettings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut ToolSettings {
        &mut self.settings
    }

    pub fn link(&self) -> &Link {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut Link {
        &mut self.link
    }

    /// Normalize one raw sample and queue it for the relay.
    ///
    /// Returns the event that was produced, even if the link dropped it.
    pub fn handle_input(&mut self, raw: &RawInput, bounds: Rect) -> Option<PointerEvent> {
        let event = self.normalizer.process(raw, bounds, &self.settings)?;
        self.link.send(&WireMessage::PointerEvent(event.clone()));
        Some(event)
    }

    /// Queue a board command for the relay.
    pub fn send_command(&mut self, action: CommandAction) -> bool {
        log::info!("Sending {} command", action);
        self.link.send(&action.into())
    }

    /// Send the command bound to a key press, if any.
    pub fn handle_shortcut(&mut self, key: &str, ctrl: bool) -> Option<CommandAction> {
        let action = ShortcutRegistry::lookup(key, ctrl)?;
        self.send_command(action);
        Some(action)
    }

    /// Queue the three samples of the test stroke, all at once.
    ///
    /// Callers that want the samples spaced out should send the events from
    /// [`test_stroke`] themselves.
    pub fn send_test_stroke(&mut self, start_ms: u64) -> usize {
        test_stroke(&self.settings, start_ms)
            .into_iter()
            .filter(|event| self.link.send(&WireMessage::PointerEvent(event.clone())))
            .count()
    }

    pub fn orientation(&self, bounds: Rect) -> Orientation {
        Orientation::of(bounds)
    }
}

/// A short diagonal stroke for checking the link end to end:
/// down at (25, 25), move to (50, 50), up at (75, 75).
pub fn test_stroke(settings: &ToolSettings, start_ms: u64) -> [PointerEvent; 3] {
    let sample = |kind, at: f64, step: u64| {
        PointerEvent::new(kind, at, at, start_ms + step * TEST_STROKE_SPACING_MS)
            .with_tool(settings.tool)
            .with_color(settings.color)
            .with_stroke_width(settings.stroke_width())
    };
    [
        sample(PointerKind::Down, 25.0, 0),
        sample(PointerKind::Move, 50.0, 1),
        sample(PointerKind::Up, 75.0, 2),
    ]
}
