//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to builder commands. Edit shortcuts never
//! fire while focus is inside a text input, so typing "c" with ⌘ held in a
//! text field copies text instead of the selected element.

#[cfg(test)]
#[path = "shortcuts_test.rs"]
mod shortcuts_test;

/// Commands a shortcut can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    Copy,
    Paste,
    Duplicate,
    Undo,
    Redo,
    Delete,
    Deselect,
}

/// Where keyboard focus was when the key was pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusTarget {
    #[default]
    Canvas,
    /// An `<input>`, `<textarea>` or content-editable element.
    TextInput,
}

/// A key press as reported by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyEvent {
    /// `KeyboardEvent.key` value (e.g. `"z"`, `"Delete"`).
    pub key: String,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub focus: FocusTarget,
}

impl KeyEvent {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into(), ..Self::default() }
    }

    /// Same key with the platform command modifier (⌘ or Ctrl) held.
    #[must_use]
    pub fn with_cmd(mut self) -> Self {
        self.ctrl = true;
        self
    }

    #[must_use]
    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    #[must_use]
    pub fn in_text_input(mut self) -> Self {
        self.focus = FocusTarget::TextInput;
        self
    }
}

/// Resolve a key event to a command. `None` if the combo has no binding or
/// focus is in a text input.
#[must_use]
pub fn resolve(event: &KeyEvent) -> Option<ShortcutAction> {
    if event.focus == FocusTarget::TextInput {
        return None;
    }
    let cmd = event.ctrl || event.meta;
    let key = event.key.as_str();

    if cmd && event.shift {
        return match key {
            "z" | "Z" => Some(ShortcutAction::Redo),
            _ => None,
        };
    }

    if cmd {
        return match key {
            "z" | "Z" => Some(ShortcutAction::Undo),
            "y" | "Y" => Some(ShortcutAction::Redo),
            "c" | "C" => Some(ShortcutAction::Copy),
            "v" | "V" => Some(ShortcutAction::Paste),
            "d" | "D" => Some(ShortcutAction::Duplicate),
            _ => None,
        };
    }

    match key {
        "Delete" | "Backspace" => Some(ShortcutAction::Delete),
        "Escape" => Some(ShortcutAction::Deselect),
        _ => None,
    }
}
