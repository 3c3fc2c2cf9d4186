//! Selection screen state.
//!
//! # Overview
//!
//! [`SelectionApp`] holds everything the screen shows for one duplicate
//! group: the cursor, the rows marked for deletion, and the outcome once
//! the user has answered. It performs no terminal I/O, so every key
//! sequence can be exercised in unit tests.
//!
//! # Example
//!
//! ```
//! use credupe::tui::app::{Action, Outcome, SelectionApp};
//! use credupe::selection::{GroupPosition, GroupRow, GroupView};
//! use credupe::duplicates::KeyPolicy;
//!
//! let view = GroupView {
//!     position: GroupPosition::new(1, 1),
//!     policy: KeyPolicy::Uri,
//!     key: vec!["https://a.com".into()],
//!     headers: vec!["login_uri".into()],
//!     password_column: None,
//!     rows: vec![
//!         GroupRow { original_index: 0, values: vec!["https://a.com".into()] },
//!         GroupRow { original_index: 5, values: vec!["https://a.com".into()] },
//!     ],
//! };
//! let mut app = SelectionApp::new(view);
//! app.handle_action(Action::NavigateDown);
//! app.handle_action(Action::ToggleMark);
//! app.handle_action(Action::Confirm);
//!
//! assert_eq!(app.outcome(), Some(&Outcome::Delete([5].into())));
//! ```

use std::collections::BTreeSet;

use super::theme::Theme;
use crate::selection::GroupView;

/// User action triggered by keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Move the cursor up
    NavigateUp,
    /// Move the cursor down
    NavigateDown,
    /// Mark or unmark the row under the cursor
    ToggleMark,
    /// Mark every row except the first
    MarkAllButFirst,
    /// Clear all marks
    ClearMarks,
    /// Delete the marked rows and move on
    Confirm,
    /// Keep every row and move on
    Skip,
    /// Stop and skip the remaining groups
    Abort,
}

/// How the user answered for the group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Delete these `original_index` values
    Delete(BTreeSet<usize>),
    /// Abort the remaining groups
    Abort,
}

/// State of the selection screen for one group.
#[derive(Debug, Clone)]
pub struct SelectionApp {
    view: GroupView,
    cursor: usize,
    marked: BTreeSet<usize>,
    outcome: Option<Outcome>,
    mask_passwords: bool,
    accessible: bool,
    theme: Theme,
}

impl SelectionApp {
    /// Create the screen state for `view`, passwords masked.
    #[must_use]
    pub fn new(view: GroupView) -> Self {
        Self {
            view,
            cursor: 0,
            marked: BTreeSet::new(),
            outcome: None,
            mask_passwords: true,
            accessible: false,
            theme: Theme::default(),
        }
    }

    /// Show or hide password values.
    #[must_use]
    pub fn with_mask_passwords(mut self, mask: bool) -> Self {
        self.mask_passwords = mask;
        self
    }

    /// Use ASCII borders and no color-only cues.
    #[must_use]
    pub fn with_accessible(mut self, accessible: bool) -> Self {
        self.accessible = accessible;
        self
    }

    /// Set the color palette.
    #[must_use]
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Group being shown.
    #[must_use]
    pub fn view(&self) -> &GroupView {
        &self.view
    }

    /// Row position under the cursor.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether the row at `row` is marked for deletion.
    #[must_use]
    pub fn is_marked(&self, row: usize) -> bool {
        self.marked.contains(&row)
    }

    /// Number of marked rows.
    #[must_use]
    pub fn marked_count(&self) -> usize {
        self.marked.len()
    }

    /// Whether passwords are masked.
    #[must_use]
    pub fn masks_passwords(&self) -> bool {
        self.mask_passwords
    }

    /// Whether accessible rendering is on.
    #[must_use]
    pub fn is_accessible(&self) -> bool {
        self.accessible
    }

    /// Color palette.
    #[must_use]
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// The answer, once one has been given.
    #[must_use]
    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    /// Whether the screen is done with this group.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.outcome.is_some()
    }

    /// Take the answer, leaving the screen undecided.
    pub fn take_outcome(&mut self) -> Option<Outcome> {
        self.outcome.take()
    }

    /// Apply an action. Returns false if it had no effect.
    pub fn handle_action(&mut self, action: Action) -> bool {
        if self.is_done() {
            return false;
        }
        let rows = self.view.rows.len();

        match action {
            Action::NavigateUp => {
                if self.cursor == 0 {
                    return false;
                }
                self.cursor -= 1;
            }
            Action::NavigateDown => {
                if self.cursor + 1 >= rows {
                    return false;
                }
                self.cursor += 1;
            }
            Action::ToggleMark => {
                if rows == 0 {
                    return false;
                }
                if !self.marked.remove(&self.cursor) {
                    self.marked.insert(self.cursor);
                }
            }
            Action::MarkAllButFirst => {
                self.marked = (1..rows).collect();
            }
            Action::ClearMarks => {
                if self.marked.is_empty() {
                    return false;
                }
                self.marked.clear();
            }
            Action::Confirm => {
                let indices = self
                    .marked
                    .iter()
                    .filter_map(|&row| self.view.rows.get(row))
                    .map(|row| row.original_index)
                    .collect();
                self.outcome = Some(Outcome::Delete(indices));
            }
            Action::Skip => {
                self.outcome = Some(Outcome::Delete(BTreeSet::new()));
            }
            Action::Abort => {
                self.outcome = Some(Outcome::Abort);
            }
        }
        true
    }
}
