//! Progress reporting utilities using indicatif.
//!
//! This module provides the [`Progress`] struct which implements [`ProgressCallback`]
//! to display stage progress in the terminal.
//!
//! # Accessible Mode
//!
//! When accessible mode is enabled, progress reporting uses simplified output:
//! - No spinners or animations
//! - ASCII bars only

use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::cleanup::{Stage, StageReport};

/// Progress callback for cleanup stages.
///
/// Implement this trait to receive structured progress facts from the
/// orchestrator.
pub trait ProgressCallback: Send + Sync {
    /// Called when a stage starts.
    ///
    /// # Arguments
    ///
    /// * `stage` - The stage starting
    /// * `total` - Number of items the stage will process (0 if unknown)
    fn on_stage_start(&self, stage: Stage, total: usize);

    /// Called as items within a stage are processed.
    ///
    /// # Arguments
    ///
    /// * `current` - Items processed so far (1-based)
    fn on_progress(&self, _current: usize) {}

    /// Called when a stage completes, with its row counts.
    fn on_stage_end(&self, report: &StageReport);
}

/// Progress reporter using indicatif.
///
/// Shows one bar at a time: a bar for group selection and a spinner for
/// every other stage.
pub struct Progress {
    active: Mutex<Option<ProgressBar>>,
    quiet: bool,
    accessible: bool,
    hide_selection: bool,
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress")
            .field("quiet", &self.quiet)
            .field("accessible", &self.accessible)
            .field("hide_selection", &self.hide_selection)
            .finish_non_exhaustive()
    }
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, nothing is drawn.
    ///
    /// # Examples
    ///
    /// ```
    /// use credupe::progress::Progress;
    ///
    /// let progress = Progress::new(false);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            active: Mutex::new(None),
            quiet,
            accessible: false,
            hide_selection: false,
        }
    }

    /// Use simplified output for screen readers.
    #[must_use]
    pub fn with_accessible(mut self, accessible: bool) -> Self {
        self.accessible = accessible;
        self
    }

    /// Draw nothing during the select stage, where a prompt owns the terminal.
    #[must_use]
    pub fn with_hidden_selection(mut self, hide: bool) -> Self {
        self.hide_selection = hide;
        self
    }

    /// Check if accessible mode is enabled.
    #[must_use]
    pub fn is_accessible(&self) -> bool {
        self.accessible
    }

    fn spinner_style(&self) -> ProgressStyle {
        if self.accessible {
            ProgressStyle::with_template("{msg} [{elapsed_precise}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
        } else {
            ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        }
    }

    fn bar_style(&self) -> ProgressStyle {
        if self.accessible {
            ProgressStyle::with_template("[{elapsed_precise}] [{bar:40}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-")
        } else {
            ProgressStyle::with_template(
                "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█>-")
        }
    }

    fn is_hidden(&self, stage: Stage) -> bool {
        self.quiet || (self.hide_selection && stage == Stage::Select)
    }

    fn replace(&self, bar: Option<ProgressBar>) {
        if let Ok(mut active) = self.active.lock() {
            if let Some(old) = active.take() {
                old.finish_and_clear();
            }
            *active = bar;
        }
    }
}

impl ProgressCallback for Progress {
    fn on_stage_start(&self, stage: Stage, total: usize) {
        if self.is_hidden(stage) {
            return;
        }

        let bar = if stage == Stage::Select && total > 0 {
            let pb = ProgressBar::new(total as u64);
            pb.set_style(self.bar_style());
            pb
        } else {
            let pb = ProgressBar::new_spinner();
            pb.set_style(self.spinner_style());
            let tick_rate = if self.accessible { 500 } else { 100 };
            pb.enable_steady_tick(Duration::from_millis(tick_rate));
            pb
        };
        bar.set_draw_target(ProgressDrawTarget::stderr());
        bar.set_message(stage_label(stage));
        self.replace(Some(bar));
    }

    fn on_progress(&self, current: usize) {
        if self.quiet {
            return;
        }
        if let Ok(active) = self.active.lock() {
            if let Some(pb) = active.as_ref() {
                pb.set_position(current as u64);
            }
        }
    }

    fn on_stage_end(&self, report: &StageReport) {
        if self.is_hidden(report.stage) {
            return;
        }
        if let Ok(mut active) = self.active.lock() {
            if let Some(pb) = active.take() {
                pb.finish_with_message(format!(
                    "{}: {} -> {} rows",
                    stage_label(report.stage),
                    report.rows_before,
                    report.rows_after
                ));
            }
        }
    }
}

fn stage_label(stage: Stage) -> &'static str {
    match stage {
        Stage::Load => "Loading",
        Stage::StripFullDuplicates => "Removing exact copies",
        Stage::Normalize => "Normalizing",
        Stage::Group => "Grouping",
        Stage::Select => "Selecting",
        Stage::ApplyDeletions => "Applying deletions",
        Stage::Persist => "Writing files",
    }
}
