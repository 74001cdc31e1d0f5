//! Controller keyboard shortcuts.

use crate::protocol::CommandAction;

/// A keyboard shortcut bound to a board command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortcut {
    pub key: &'static str,
    pub ctrl: bool,
    pub description: &'static str,
    pub action: CommandAction,
}

impl Shortcut {
    pub const fn new(
        key: &'static str,
        ctrl: bool,
        description: &'static str,
        action: CommandAction,
    ) -> Self {
        Self {
            key,
            ctrl,
            description,
            action,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+Z").
    pub fn format(&self) -> String {
        if self.ctrl {
            format!("Ctrl+{}", self.key)
        } else {
            self.key.to_string()
        }
    }

    /// Key comparison ignores case so `z` and `Z` both match.
    pub fn matches(&self, key: &str, ctrl: bool) -> bool {
        self.ctrl == ctrl && self.key.eq_ignore_ascii_case(key)
    }
}

/// Registry of controller shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    pub fn all() -> Vec<Shortcut> {
        vec![
            Shortcut::new("Z", true, "Undo the last stroke", CommandAction::Undo),
            Shortcut::new("K", true, "Clear the board", CommandAction::Clear),
        ]
    }

    /// Find the command bound to a key press.
    pub fn lookup(key: &str, ctrl: bool) -> Option<CommandAction> {
        Self::all()
            .into_iter()
            .find(|shortcut| shortcut.matches(key, ctrl))
            .map(|shortcut| shortcut.action)
    }

    /// One line per shortcut, for help output.
    pub fn describe() -> Vec<String> {
        Self::all()
            .iter()
            .map(|shortcut| format!("{:10} {}", shortcut.format(), shortcut.description))
            .collect()
    }
}
