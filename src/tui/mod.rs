//! Terminal user interface for interactive selection.
//!
//! # Overview
//!
//! - [`app`]: per-group screen state (cursor, marks, outcome)
//! - [`keybindings`]: key to action table
//! - [`events`]: crossterm event polling
//! - [`ui`]: ratatui rendering
//! - [`run`]: [`TuiSelector`], the [`GroupSelector`](crate::selection::GroupSelector)
//!   that owns the terminal
//!
//! # Architecture
//!
//! Data flows one way:
//! 1. Events are captured from the terminal (crossterm)
//! 2. Events are translated to Actions
//! 3. Actions modify the SelectionApp state
//! 4. The UI renders based on the current state

pub mod app;
pub mod events;
pub mod keybindings;
pub mod run;
pub mod theme;
pub mod ui;

pub use app::{Action, Outcome, SelectionApp};
pub use events::{EventError, EventHandler};
pub use keybindings::KeyBindings;
pub use run::{TuiError, TuiSelector};
pub use theme::Theme;
pub use ui::{render, truncate_string};
