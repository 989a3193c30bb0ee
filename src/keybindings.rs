//! Customizable keybindings.
//!
//! Keys are mapped to [`KeyAction`]s; the session turns an action into the
//! matching [`Message`](crate::message::Message). Several keys may trigger the
//! same action.

use serde::{Deserialize, Serialize};

/// A keyboard key, independent of any windowing toolkit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Space,
    Enter,
    Delete,
    Backspace,
    Escape,
    Control,
    Shift,
    Alt,
    /// A character key; letters match case-insensitively
    Char(char),
}

impl Key {
    fn matches(self, other: Key) -> bool {
        match (self, other) {
            (Key::Char(a), Key::Char(b)) => a.eq_ignore_ascii_case(&b),
            (a, b) => a == b,
        }
    }
}

/// What a bound key does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Open the previous pair
    PrevPair,
    /// Open the next pair
    NextPair,
    /// Commit the two pending points
    ConfirmPending,
    /// Delete the selected tag
    DeleteSelected,
    /// Held: pan mode; released: tag mode
    PanMode,
}

/// Keybinding configuration for the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    /// Keys that open the previous pair
    pub prev_pair: Vec<Key>,
    /// Keys that open the next pair
    pub next_pair: Vec<Key>,
    /// Keys that commit the pending points
    pub confirm: Vec<Key>,
    /// Keys that delete the selected tag
    pub delete: Vec<Key>,
    /// Modifier keys that switch to pan mode while held
    pub pan_modifier: Vec<Key>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            prev_pair: vec![Key::Left, Key::Char('z')],
            next_pair: vec![Key::Right, Key::Char('x')],
            confirm: vec![Key::Space],
            delete: vec![Key::Delete],
            pan_modifier: vec![Key::Control],
        }
    }
}

impl KeyBindings {
    /// Create new keybindings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the action that corresponds to a key, if any.
    pub fn action_for_key(&self, key: Key) -> Option<KeyAction> {
        let bound = |keys: &[Key]| keys.iter().any(|k| k.matches(key));

        if bound(&self.pan_modifier) {
            Some(KeyAction::PanMode)
        } else if bound(&self.prev_pair) {
            Some(KeyAction::PrevPair)
        } else if bound(&self.next_pair) {
            Some(KeyAction::NextPair)
        } else if bound(&self.confirm) {
            Some(KeyAction::ConfirmPending)
        } else if bound(&self.delete) {
            Some(KeyAction::DeleteSelected)
        } else {
            None
        }
    }

    /// Get the keys bound to an action.
    pub fn keys_for_action(&self, action: KeyAction) -> &[Key] {
        match action {
            KeyAction::PrevPair => &self.prev_pair,
            KeyAction::NextPair => &self.next_pair,
            KeyAction::ConfirmPending => &self.confirm,
            KeyAction::DeleteSelected => &self.delete,
            KeyAction::PanMode => &self.pan_modifier,
        }
    }
}
