//! Keyboard shortcut registry and documentation.

use crate::commands::Command;

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub ctrl: bool,
    pub shift: bool,
    pub description: &'static str,
    pub command: Command,
}

impl Shortcut {
    pub fn new(
        key: &'static str,
        ctrl: bool,
        shift: bool,
        description: &'static str,
        command: Command,
    ) -> Self {
        Self {
            key,
            ctrl,
            shift,
            description,
            command,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+Z").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.shift {
            parts.push("Shift");
        }
        parts.push(self.key);
        parts.join("+")
    }

    fn matches(&self, combo: &KeyCombo) -> bool {
        self.ctrl == combo.ctrl && self.shift == combo.shift && self.key.eq_ignore_ascii_case(&combo.key)
    }
}

/// A parsed key combination such as `Ctrl+Shift+Z`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCombo {
    pub key: String,
    pub ctrl: bool,
    pub shift: bool,
}

impl KeyCombo {
    /// Parse `Modifier+...+Key`. `Cmd`/`Meta` count as Ctrl.
    pub fn parse(combo: &str) -> Option<Self> {
        let mut parsed = Self {
            key: String::new(),
            ctrl: false,
            shift: false,
        };
        for part in combo.split('+').map(str::trim) {
            match part.to_ascii_lowercase().as_str() {
                "ctrl" | "control" | "cmd" | "meta" => parsed.ctrl = true,
                "shift" => parsed.shift = true,
                "" => return None,
                _ if parsed.key.is_empty() => parsed.key = part.to_string(),
                _ => return None,
            }
        }
        (!parsed.key.is_empty()).then_some(parsed)
    }
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        vec![
            Shortcut::new("Z", true, false, "Undo", Command::Undo),
            Shortcut::new("Z", true, true, "Redo", Command::Redo),
            Shortcut::new("Y", true, false, "Redo", Command::Redo),
            Shortcut::new("Delete", true, false, "Delete selected object", Command::RemoveSelected),
            Shortcut::new("Backspace", true, false, "Delete selected object", Command::RemoveSelected),
            Shortcut::new("S", true, false, "Save", Command::Save(None)),
        ]
    }

    /// Command bound to a key combination, if any.
    pub fn lookup(combo: &str) -> Option<Command> {
        let combo = KeyCombo::parse(combo)?;
        Self::all()
            .into_iter()
            .find(|shortcut| shortcut.matches(&combo))
            .map(|shortcut| shortcut.command)
    }

    /// Shortcut table for `help`.
    pub fn describe() -> String {
        let mut out = String::from("=== Keyboard Shortcuts ===\n");
        for shortcut in Self::all() {
            out.push_str(&format!("  {:20} {}\n", shortcut.format(), shortcut.description));
        }
        out
    }
}
