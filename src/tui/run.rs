//! Terminal selector.
//!
//! [`TuiSelector`] implements [`GroupSelector`] with a full-screen view per
//! duplicate group.
//!
//! # Terminal Management
//!
//! The terminal is taken over lazily on the first group:
//! - raw mode (unbuffered input, no echo)
//! - the alternate screen buffer
//! - hidden cursor
//!
//! All of it is reverted when the selector is dropped, and by a panic hook
//! while the screen is active.
//!
//! # Example
//!
//! ```no_run
//! use credupe::cleanup::{Cleaner, CleanupOptions, Mode};
//! use credupe::tui::TuiSelector;
//! use std::path::Path;
//!
//! let mut selector = TuiSelector::new();
//! let report = Cleaner::new(CleanupOptions::default().with_mode(Mode::Interactive))
//!     .with_selector(&mut selector)
//!     .run(Path::new("export.csv"))?;
//! # Ok::<(), credupe::cleanup::CleanupError>(())
//! ```

use std::io::{self, Stdout};
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    cursor, execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use thiserror::Error;

use super::app::{Outcome, SelectionApp};
use super::events::{EventError, EventHandler};
use super::theme::Theme;
use super::ui::render;
use crate::selection::{GroupSelector, GroupView, SelectionError, SelectorResponse};

/// How long to wait for a key before checking the interrupt flag again.
const POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// Error type for TUI operations.
#[derive(Debug, Error)]
pub enum TuiError {
    /// I/O error from terminal operations.
    #[error("terminal I/O error: {0}")]
    Io(#[from] io::Error),

    /// Event handling error.
    #[error("event error: {0}")]
    Event(#[from] EventError),
}

impl From<TuiError> for SelectionError {
    fn from(err: TuiError) -> Self {
        match err {
            TuiError::Io(e) => SelectionError::Io(e),
            TuiError::Event(EventError::Read(e)) => SelectionError::Io(e),
        }
    }
}

type Terminal = ratatui::Terminal<CrosstermBackend<Stdout>>;

/// Full-screen group selector.
pub struct TuiSelector {
    terminal: Option<Terminal>,
    events: EventHandler,
    shutdown: Option<Arc<AtomicBool>>,
    mask_passwords: bool,
    accessible: bool,
    theme: Theme,
}

impl std::fmt::Debug for TuiSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TuiSelector")
            .field("active", &self.terminal.is_some())
            .field("mask_passwords", &self.mask_passwords)
            .field("accessible", &self.accessible)
            .finish_non_exhaustive()
    }
}

impl Default for TuiSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl TuiSelector {
    /// Create a selector; the terminal is untouched until the first group.
    #[must_use]
    pub fn new() -> Self {
        Self {
            terminal: None,
            events: EventHandler::new(),
            shutdown: None,
            mask_passwords: true,
            accessible: false,
            theme: Theme::auto(),
        }
    }

    /// Show or hide password values.
    #[must_use]
    pub fn with_mask_passwords(mut self, mask: bool) -> Self {
        self.mask_passwords = mask;
        self
    }

    /// Use ASCII borders.
    #[must_use]
    pub fn with_accessible(mut self, accessible: bool) -> Self {
        self.accessible = accessible;
        self
    }

    /// Abort when this flag is set (Ctrl+C delivered as a signal).
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown = Some(flag);
        self
    }

    fn terminal(&mut self) -> Result<&mut Terminal, TuiError> {
        if self.terminal.is_none() {
            install_panic_hook();
            self.terminal = Some(setup_terminal()?);
        }
        self.terminal.as_mut().ok_or_else(|| {
            TuiError::Io(io::Error::other("terminal not initialized"))
        })
    }

    fn interrupted(&self) -> bool {
        self.shutdown
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    fn run_group(&mut self, view: &GroupView) -> Result<Outcome, TuiError> {
        let mut app = SelectionApp::new(view.clone())
            .with_mask_passwords(self.mask_passwords)
            .with_accessible(self.accessible)
            .with_theme(self.theme);
        let events = self.events.clone();

        loop {
            if self.interrupted() {
                log::info!("Shutdown signal received, leaving selection");
                return Ok(Outcome::Abort);
            }

            self.terminal()?
                .draw(|frame| render(frame, &app, events.bindings()))?;

            if let Some(action) = events.poll(POLL_TIMEOUT)? {
                if !app.handle_action(action) {
                    log::trace!("Action had no effect: {:?}", action);
                }
            }
            if let Some(outcome) = app.take_outcome() {
                return Ok(outcome);
            }
        }
    }
}

impl GroupSelector for TuiSelector {
    fn request_selection(&mut self, view: &GroupView) -> Result<SelectorResponse, SelectionError> {
        let outcome = self.run_group(view)?;
        log::debug!(
            "Group {}/{}: {:?}",
            view.position.index,
            view.position.total,
            outcome
        );
        let response = match outcome {
            Outcome::Delete(indices) => SelectorResponse::Delete(indices),
            Outcome::Abort => SelectorResponse::Abort,
        };

        // Give the terminal back before the caller prints or prompts.
        if matches!(response, SelectorResponse::Abort) || view.position.index == view.position.total
        {
            self.terminal = None;
            restore_terminal();
        }
        Ok(response)
    }
}

impl Drop for TuiSelector {
    fn drop(&mut self) {
        if self.terminal.take().is_some() {
            restore_terminal();
        }
    }
}

fn install_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        restore_terminal();
        original_hook(panic_info);
    }));
}

fn setup_terminal() -> Result<Terminal, TuiError> {
    log::debug!("Setting up terminal for TUI");
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal() {
    log::debug!("Restoring terminal");
    let _ = terminal::disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, cursor::Show);
}
