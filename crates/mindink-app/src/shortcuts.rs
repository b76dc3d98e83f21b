//! Keyboard shortcut registry and documentation.

use mindink_core::{Command, Editor, Modifiers};

/// What a shortcut does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    Undo,
    Redo,
    Delete,
    Copy,
    Cut,
    Paste,
    /// Add a child under the first selected node.
    AddChild,
    /// Collapse or expand the first selected node.
    ToggleCollapse,
    TogglePreview,
    /// Abandon the drag in progress.
    CancelGesture,
}

impl ShortcutAction {
    /// The editor command for this action in the current state, if any.
    ///
    /// `CancelGesture` has no command; callers handle it directly.
    pub fn to_command(self, editor: &Editor) -> Option<Command> {
        let first = editor.selection().first();
        match self {
            ShortcutAction::Undo => Some(Command::Undo),
            ShortcutAction::Redo => Some(Command::Redo),
            ShortcutAction::Delete => Some(Command::DeleteSelection),
            ShortcutAction::Copy => Some(Command::Copy),
            ShortcutAction::Cut => Some(Command::Cut),
            ShortcutAction::Paste => Some(Command::Paste),
            ShortcutAction::AddChild => first.map(|parent| Command::AddChild { parent }),
            ShortcutAction::ToggleCollapse => first.map(|id| Command::ToggleCollapse { id }),
            ShortcutAction::TogglePreview => Some(Command::TogglePreview),
            ShortcutAction::CancelGesture => None,
        }
    }
}

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub ctrl: bool,
    pub shift: bool,
    pub action: ShortcutAction,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(
        key: &'static str,
        ctrl: bool,
        shift: bool,
        action: ShortcutAction,
        description: &'static str,
    ) -> Self {
        Self {
            key,
            ctrl,
            shift,
            action,
            description,
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

    /// Whether a key press triggers this shortcut. Key names are case-insensitive.
    pub fn matches(&self, key: &str, modifiers: Modifiers) -> bool {
        self.key.eq_ignore_ascii_case(key)
            && self.ctrl == modifiers.command()
            && self.shift == modifiers.shift
    }
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        use ShortcutAction::*;
        vec![
            Shortcut::new("Z", true, false, Undo, "Undo"),
            Shortcut::new("Z", true, true, Redo, "Redo"),
            Shortcut::new("Y", true, false, Redo, "Redo"),
            Shortcut::new("C", true, false, Copy, "Copy node"),
            Shortcut::new("X", true, false, Cut, "Cut node"),
            Shortcut::new("V", true, false, Paste, "Paste under selected node"),
            Shortcut::new("Delete", false, false, Delete, "Delete selected nodes"),
            Shortcut::new("Backspace", false, false, Delete, "Delete selected nodes"),
            Shortcut::new("Tab", false, false, AddChild, "Add child node"),
            Shortcut::new("Space", false, false, ToggleCollapse, "Collapse or expand node"),
            Shortcut::new("P", true, false, TogglePreview, "Toggle preview mode"),
            Shortcut::new("Escape", false, false, CancelGesture, "Cancel current drag"),
        ]
    }

    /// Find the action bound to a key press.
    pub fn lookup(key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        Self::all()
            .into_iter()
            .find(|shortcut| shortcut.matches(key, modifiers))
            .map(|shortcut| shortcut.action)
    }

    /// All shortcuts as an aligned table for the help screen.
    pub fn help_text() -> String {
        let mut text = String::from("Keyboard shortcuts (use with `key`):\n");
        for shortcut in Self::all() {
            text.push_str(&format!("  {:20} {}\n", shortcut.format(), shortcut.description));
        }
        text
    }
}

/// Parse a chord such as `ctrl+shift+z` into a key name and modifiers.
pub fn parse_chord(chord: &str) -> Option<(String, Modifiers)> {
    let mut modifiers = Modifiers::NONE;
    let mut key = None;
    for part in chord.split('+').map(str::trim) {
        match part.to_ascii_lowercase().as_str() {
            "ctrl" | "control" => modifiers.ctrl = true,
            "cmd" | "meta" => modifiers.meta = true,
            "shift" => modifiers.shift = true,
            "alt" => modifiers.alt = true,
            "" => return None,
            _ if key.is_none() => key = Some(part.to_string()),
            _ => return None,
        }
    }
    key.map(|key| (key, modifiers))
}
