//! Key bindings for the selection screen.
//!
//! Vim-style and arrow keys work side by side:
//!
//! | Keys                 | Action                   |
//! |----------------------|--------------------------|
//! | Up, k                | move up                  |
//! | Down, j              | move down                |
//! | Space                | mark / unmark row        |
//! | a                    | mark all but the first   |
//! | n                    | clear marks              |
//! | Enter                | delete marked, next group|
//! | s                    | keep all, next group     |
//! | q, Esc, Ctrl+C       | abort remaining groups   |
//!
//! # Example
//!
//! ```
//! use credupe::tui::keybindings::KeyBindings;
//! use credupe::tui::Action;
//! use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
//!
//! let bindings = KeyBindings::default();
//! let key = KeyEvent::new(KeyCode::Char('j'), KeyModifiers::NONE);
//! assert_eq!(bindings.resolve(&key), Some(Action::NavigateDown));
//! ```

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::Action;

/// Action-to-key table, in display order.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    action_keys: Vec<(Action, Vec<KeyEvent>)>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let none = KeyModifiers::NONE;
        Self {
            action_keys: vec![
                (
                    Action::NavigateUp,
                    vec![key(KeyCode::Up, none), key(KeyCode::Char('k'), none)],
                ),
                (
                    Action::NavigateDown,
                    vec![key(KeyCode::Down, none), key(KeyCode::Char('j'), none)],
                ),
                (Action::ToggleMark, vec![key(KeyCode::Char(' '), none)]),
                (Action::MarkAllButFirst, vec![key(KeyCode::Char('a'), none)]),
                (Action::ClearMarks, vec![key(KeyCode::Char('n'), none)]),
                (Action::Confirm, vec![key(KeyCode::Enter, none)]),
                (Action::Skip, vec![key(KeyCode::Char('s'), none)]),
                (
                    Action::Abort,
                    vec![
                        key(KeyCode::Char('q'), none),
                        key(KeyCode::Esc, none),
                        key(KeyCode::Char('c'), KeyModifiers::CONTROL),
                    ],
                ),
            ],
        }
    }
}

impl KeyBindings {
    /// Resolve a key press to an action.
    ///
    /// Release and repeat events are ignored; some terminals send them.
    #[must_use]
    pub fn resolve(&self, event: &KeyEvent) -> Option<Action> {
        if event.kind != KeyEventKind::Press {
            return None;
        }
        self.action_keys
            .iter()
            .find(|(_, keys)| {
                keys.iter()
                    .any(|k| k.code == event.code && k.modifiers == event.modifiers)
            })
            .map(|(action, _)| *action)
    }

    /// Keys bound to an action.
    #[must_use]
    pub fn keys_for_action(&self, action: Action) -> &[KeyEvent] {
        self.action_keys
            .iter()
            .find(|(a, _)| *a == action)
            .map_or(&[], |(_, keys)| keys.as_slice())
    }

    /// Human-readable form of the first key bound to an action.
    #[must_use]
    pub fn key_hint(&self, action: Action) -> String {
        self.keys_for_action(action)
            .first()
            .map_or_else(String::new, format_key)
    }
}

/// Format a key event for the footer.
#[must_use]
pub fn format_key(event: &KeyEvent) -> String {
    let name = match event.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Up => "Up".to_string(),
        KeyCode::Down => "Down".to_string(),
        other => format!("{:?}", other),
    };
    if event.modifiers.contains(KeyModifiers::CONTROL) {
        format!("Ctrl+{}", name)
    } else {
        name
    }
}

fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
    KeyEvent::new(code, modifiers)
}
