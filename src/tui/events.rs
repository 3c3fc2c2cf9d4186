//! Terminal event polling.
//!
//! Reads crossterm events and translates key presses into [`Action`]s
//! through [`KeyBindings`]. Resize and mouse events are ignored; the next
//! draw picks up the new size.

use std::time::Duration;

use crossterm::event::{self, Event};
use thiserror::Error;

use super::keybindings::KeyBindings;
use super::Action;

/// Error reading terminal events.
#[derive(Debug, Error)]
pub enum EventError {
    /// The terminal could not be polled or read.
    #[error("failed to read terminal event: {0}")]
    Read(#[from] std::io::Error),
}

/// Polls the terminal for key presses.
#[derive(Debug, Clone, Default)]
pub struct EventHandler {
    bindings: KeyBindings,
}

impl EventHandler {
    /// Create a handler with the default bindings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bindings in use, for footer hints.
    #[must_use]
    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    /// Wait up to `timeout` for an event and translate it.
    ///
    /// Returns `Ok(None)` on timeout or for unbound keys.
    ///
    /// # Errors
    ///
    /// Returns `EventError::Read` if the terminal fails.
    pub fn poll(&self, timeout: Duration) -> Result<Option<Action>, EventError> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) => {
                let action = self.bindings.resolve(&key);
                log::trace!("Key {:?} -> {:?}", key.code, action);
                Ok(action)
            }
            _ => Ok(None),
        }
    }
}
