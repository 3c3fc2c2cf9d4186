//! Cleanup orchestrator.
//!
//! # Overview
//!
//! A run moves strictly forward through these stages:
//!
//! ```text
//! LOAD -> STRIP_FULL_DUPLICATES -> NORMALIZE -> GROUP -> SELECT -> APPLY_DELETIONS -> PERSIST
//! ```
//!
//! - `analyze` stops after GROUP and writes nothing.
//! - `auto` selects with [`ShortestUriWins`] and needs a [`ConfirmDeletion`]
//!   answer before anything is applied.
//! - `interactive` asks a [`GroupSelector`] per group. Aborting keeps the
//!   decisions made so far.
//! - `dry_run` stops after SELECT and writes nothing.
//!
//! Every selection is computed against one snapshot of the records, keyed by
//! `original_index`, so earlier removals never shift later ones.
//!
//! Terminal I/O, progress output, and interrupt handling are injected; the
//! orchestrator runs unchanged against scripted fakes.

pub mod report;

pub use report::{
    AnalysisReport, ArtifactFailure, ArtifactPaths, CleanupReport, DeletionPlan, PlannedGroup,
    RunStatus, Stage, StageReport,
};

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backup::{self, ArtifactKind, BackupError};
use crate::duplicates::{
    find_domain_credential_duplicates, find_duplicates, find_full_duplicates,
    find_partial_uri_matches, find_uri_duplicates, find_uri_username_duplicates,
    full_duplicate_selection, GroupError, GroupingStats, KeyPolicy,
};
use crate::normalize::normalize_records;
use crate::progress::ProgressCallback;
use crate::records::{
    clean_name_column, load_records_with_limits, write_records, RecordSet, SamplingLimits,
    StoreError,
};
use crate::selection::{
    Decision, GroupPosition, GroupSelector, InteractivePolicy, SelectionError,
    SelectionStrategy, ShortestUriWins,
};

/// What a run does with the duplicates it finds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Report counts only
    #[default]
    Analyze,
    /// Keep the shortest URI per group, after confirmation
    Auto,
    /// Ask per group
    Interactive,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Analyze => "analyze",
            Self::Auto => "auto",
            Self::Interactive => "interactive",
        })
    }
}

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum CleanupError {
    /// The source could not be loaded.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The mode's grouping policy could not be applied.
    #[error(transparent)]
    Group(#[from] GroupError),

    /// Selection failed.
    #[error(transparent)]
    Selection(#[from] SelectionError),

    /// The pre-mutation backup could not be made.
    #[error("backup required before deleting: {0}")]
    BackupRequired(#[source] BackupError),

    /// The user interrupted the run.
    #[error("interrupted by user")]
    Interrupted,

    /// Interactive mode was started without a selector.
    #[error("interactive mode needs a selector")]
    SelectorRequired,

    /// Automatic deletion was started without a way to confirm it.
    #[error("automatic deletion needs confirmation")]
    ConfirmationRequired,

    /// A selection named a record that does not exist.
    #[error("selection refers to unknown record {0}")]
    UnknownIndex(usize),
}

/// Capability that approves an automatic deletion plan.
pub trait ConfirmDeletion {
    /// Show the plan and return whether to proceed.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::Io` if the input device fails.
    fn confirm(&mut self, plan: &DeletionPlan) -> Result<bool, SelectionError>;
}

/// Confirmer that approves every plan (`--yes`).
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

impl ConfirmDeletion for AutoConfirm {
    fn confirm(&mut self, plan: &DeletionPlan) -> Result<bool, SelectionError> {
        log::debug!("Auto-confirming deletion of {} rows", plan.would_delete);
        Ok(true)
    }
}

/// Options for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanupOptions {
    /// Mode to run
    pub mode: Mode,
    /// Compute everything but write nothing
    pub dry_run: bool,
    /// Cleaned output path; defaults to `<base>_cleaned.<ext>`
    pub output: Option<PathBuf>,
    /// Grouping policy for `auto`
    pub auto_policy: KeyPolicy,
    /// Grouping policy for `interactive`
    pub interactive_policy: KeyPolicy,
    /// Clean the `name` column before grouping
    pub clean_names: bool,
    /// Large-file warning threshold used while loading
    pub limits: SamplingLimits,
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self {
            mode: Mode::Analyze,
            dry_run: false,
            output: None,
            auto_policy: KeyPolicy::DomainCredential,
            interactive_policy: KeyPolicy::Uri,
            clean_names: false,
            limits: SamplingLimits::default(),
        }
    }
}

impl CleanupOptions {
    /// Set the mode.
    #[must_use]
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Enable or disable dry-run.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Set an explicit cleaned output path.
    #[must_use]
    pub fn with_output(mut self, output: Option<PathBuf>) -> Self {
        self.output = output;
        self
    }

    /// Set the grouping policy for `auto`.
    #[must_use]
    pub fn with_auto_policy(mut self, policy: KeyPolicy) -> Self {
        self.auto_policy = policy;
        self
    }

    /// Set the grouping policy for `interactive`.
    #[must_use]
    pub fn with_interactive_policy(mut self, policy: KeyPolicy) -> Self {
        self.interactive_policy = policy;
        self
    }

    /// Enable or disable name cleanup.
    #[must_use]
    pub fn with_clean_names(mut self, clean: bool) -> Self {
        self.clean_names = clean;
        self
    }

    /// Set the large-file thresholds applied when loading.
    #[must_use]
    pub fn with_sampling_limits(mut self, limits: SamplingLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Grouping policy used by the configured mode.
    #[must_use]
    pub fn policy(&self) -> KeyPolicy {
        match self.mode {
            Mode::Interactive => self.interactive_policy,
            Mode::Analyze | Mode::Auto => self.auto_policy,
        }
    }
}

/// Progress and interrupt hooks, detached from the cleaner's borrows.
#[derive(Clone, Default)]
struct Hooks {
    progress: Option<Arc<dyn ProgressCallback>>,
    shutdown: Option<Arc<AtomicBool>>,
}

impl Hooks {
    fn start(&self, stage: Stage, total: usize) {
        log::debug!("Stage {} started", stage);
        if let Some(p) = &self.progress {
            p.on_stage_start(stage, total);
        }
    }

    fn advance(&self, current: usize) {
        if let Some(p) = &self.progress {
            p.on_progress(current);
        }
    }

    fn end(&self, report: &StageReport) {
        log::info!(
            "Stage {}: {} -> {} rows ({} found, {} removed)",
            report.stage,
            report.rows_before,
            report.rows_after,
            report.found,
            report.removed
        );
        if let Some(p) = &self.progress {
            p.on_stage_end(report);
        }
    }

    fn interrupted(&self) -> bool {
        self.shutdown
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn clear_interrupt(&self) {
        if let Some(f) = &self.shutdown {
            f.store(false, Ordering::SeqCst);
        }
    }

    fn check(&self) -> Result<(), CleanupError> {
        if self.interrupted() {
            log::warn!("Interrupted; no output written");
            return Err(CleanupError::Interrupted);
        }
        Ok(())
    }
}

/// Runs the cleanup pipeline over one source file.
///
/// # Example
///
/// ```no_run
/// use credupe::cleanup::{AutoConfirm, Cleaner, CleanupOptions, Mode};
/// use std::path::Path;
///
/// let mut confirm = AutoConfirm;
/// let report = Cleaner::new(CleanupOptions::default().with_mode(Mode::Auto))
///     .with_confirmer(&mut confirm)
///     .run(Path::new("export.csv"))
///     .unwrap();
/// println!("removed {} rows", report.total_removed());
/// ```
pub struct Cleaner<'a> {
    options: CleanupOptions,
    selector: Option<&'a mut dyn GroupSelector>,
    confirmer: Option<&'a mut dyn ConfirmDeletion>,
    hooks: Hooks,
}

impl fmt::Debug for Cleaner<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cleaner")
            .field("options", &self.options)
            .field("selector", &self.selector.as_ref().map(|_| "<selector>"))
            .field("confirmer", &self.confirmer.as_ref().map(|_| "<confirmer>"))
            .field(
                "progress",
                &self.hooks.progress.as_ref().map(|_| "<callback>"),
            )
            .field("shutdown_flag", &self.hooks.shutdown)
            .finish()
    }
}

impl<'a> Cleaner<'a> {
    /// Create a cleaner with the given options and no capabilities.
    #[must_use]
    pub fn new(options: CleanupOptions) -> Self {
        Self {
            options,
            selector: None,
            confirmer: None,
            hooks: Hooks::default(),
        }
    }

    /// Set the selector used by interactive mode.
    #[must_use]
    pub fn with_selector(mut self, selector: &'a mut dyn GroupSelector) -> Self {
        self.selector = Some(selector);
        self
    }

    /// Set the confirmer used by auto mode.
    #[must_use]
    pub fn with_confirmer(mut self, confirmer: &'a mut dyn ConfirmDeletion) -> Self {
        self.confirmer = Some(confirmer);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.hooks.progress = Some(callback);
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.hooks.shutdown = Some(flag);
        self
    }

    /// Options this cleaner runs with.
    #[must_use]
    pub fn options(&self) -> &CleanupOptions {
        &self.options
    }

    /// Run the pipeline against `source`.
    ///
    /// # Errors
    ///
    /// - `Store` if the source cannot be loaded (nothing is written)
    /// - `Group` if the policy's key columns are missing
    /// - `Selection` if a selector misbehaves or fails
    /// - `BackupRequired` if the backup fails (nothing else is written)
    /// - `Interrupted` on user interrupt outside interactive selection
    /// - `SelectorRequired` / `ConfirmationRequired` for missing capabilities
    ///
    /// Failures writing the cleaned file or the deleted archive do not end
    /// the run; they are listed in [`CleanupReport::failures`].
    pub fn run(&mut self, source: &Path) -> Result<CleanupReport, CleanupError> {
        let mode = self.options.mode;
        let policy = self.options.policy();
        let dry_run = self.options.dry_run;
        let hooks = self.hooks.clone();
        let mut report = CleanupReport::new(mode, policy, dry_run);

        log::info!(
            "Starting {} run on {} (policy {}, dry-run {})",
            mode,
            source.display(),
            policy,
            dry_run
        );

        // LOAD
        hooks.start(Stage::Load, 0);
        let loaded = load_records_with_limits(source, &self.options.limits)?;
        let snapshot = loaded.records;
        report.warnings = loaded.warnings;
        report.rows_before = snapshot.len();
        let loaded_rows = snapshot.len();
        end_stage(
            &hooks,
            &mut report,
            StageReport::unchanged(Stage::Load, loaded_rows, loaded_rows),
        );
        hooks.check()?;

        // STRIP_FULL_DUPLICATES
        let mut working = snapshot.clone();
        hooks.start(Stage::StripFullDuplicates, working.len());
        let full_groups = find_full_duplicates(&working);
        let full_selection = full_duplicate_selection(&full_groups);
        working
            .remove_indices(&full_selection)
            .map_err(CleanupError::UnknownIndex)?;
        report.full_duplicates_removed = full_selection.len();
        end_stage(&hooks, &mut report, StageReport {
            stage: Stage::StripFullDuplicates,
            rows_before: snapshot.len(),
            rows_after: working.len(),
            found: full_groups.len(),
            removed: full_selection.len(),
        });
        hooks.check()?;

        // NORMALIZE
        hooks.start(Stage::Normalize, working.len());
        if self.options.clean_names && mode != Mode::Analyze {
            report.names_cleaned = clean_name_column(&mut working);
        }
        let stats = normalize_records(&mut working)?;
        end_stage(&hooks, &mut report, StageReport::unchanged(
            Stage::Normalize,
            working.len(),
            stats.uris_changed,
        ));
        hooks.check()?;

        // GROUP
        if mode == Mode::Analyze {
            hooks.start(Stage::Group, working.len());
            let analysis =
                analyze(&working, full_selection.len(), snapshot.len(), stats.domain_fallbacks)?;
            end_stage(&hooks, &mut report, StageReport::unchanged(
                Stage::Group,
                working.len(),
                analysis.uri_username.duplicate_groups,
            ));
            report.analysis = Some(analysis);
            report.rows_after = working.len();
            report.status = RunStatus::Analyzed;
            return Ok(report);
        }

        hooks.start(Stage::Group, working.len());
        let groups = find_duplicates(&working, policy)?;
        report.groups_total = groups.len();
        end_stage(&hooks, &mut report, StageReport::unchanged(
            Stage::Group,
            working.len(),
            groups.len(),
        ));
        hooks.check()?;

        // SELECT
        hooks.start(Stage::Select, groups.len());
        let mut selection = BTreeSet::new();
        let mut planned = Vec::new();
        let mut aborted = false;
        {
            let mut strategy: Box<dyn SelectionStrategy + '_> = match mode {
                Mode::Interactive => {
                    let selector = self
                        .selector
                        .as_deref_mut()
                        .ok_or(CleanupError::SelectorRequired)?;
                    Box::new(InteractivePolicy::new(selector))
                }
                Mode::Auto | Mode::Analyze => Box::new(ShortestUriWins),
            };

            for (i, group) in groups.iter().enumerate() {
                if hooks.interrupted() {
                    if mode == Mode::Interactive {
                        log::warn!("Interrupted; keeping {} decided groups", planned.len());
                        hooks.clear_interrupt();
                        aborted = true;
                        break;
                    }
                    return Err(CleanupError::Interrupted);
                }

                let position = GroupPosition::new(i + 1, groups.len());
                match strategy.select(group, &working, position)? {
                    Decision::Abort => {
                        log::info!("Selection aborted at group {}", position.index);
                        // A selector may stop because of the interrupt flag.
                        hooks.clear_interrupt();
                        aborted = true;
                        break;
                    }
                    Decision::Delete(indices) => {
                        planned.push(PlannedGroup {
                            key: group.key.clone(),
                            keep: group
                                .indices
                                .iter()
                                .copied()
                                .filter(|i| !indices.contains(i))
                                .collect(),
                            delete: indices.iter().copied().collect(),
                        });
                        selection.extend(indices);
                    }
                }
                hooks.advance(i + 1);
            }
        }

        let would_remain = working.len() - selection.len();
        report.selected_removed = selection.len();
        report.groups_decided = planned.len();
        report.rows_after = would_remain;
        end_stage(&hooks, &mut report, StageReport {
            stage: Stage::Select,
            rows_before: working.len(),
            rows_after: would_remain,
            found: groups.len(),
            removed: selection.len(),
        });

        let plan = DeletionPlan {
            policy,
            full_duplicates: full_selection.len(),
            groups: planned,
            would_delete: full_selection.len() + selection.len(),
            would_remain,
        };
        report.plan = Some(plan.clone());

        if dry_run {
            log::info!(
                "Dry run: {} rows would be deleted, {} would remain",
                plan.would_delete,
                plan.would_remain
            );
            report.status = RunStatus::DryRun;
            return Ok(report);
        }

        if plan.is_empty() && report.names_cleaned == 0 {
            report.status = if aborted {
                RunStatus::Aborted
            } else {
                RunStatus::NothingToDo
            };
            return Ok(report);
        }

        if mode == Mode::Auto {
            let confirmer = self
                .confirmer
                .as_deref_mut()
                .ok_or(CleanupError::ConfirmationRequired)?;
            if !confirmer.confirm(&plan)? {
                log::info!("Deletion declined; nothing written");
                report.status = RunStatus::Cancelled;
                return Ok(report);
            }
        }
        hooks.check()?;

        // APPLY_DELETIONS
        hooks.start(Stage::ApplyDeletions, selection.len());
        let backup_path = backup::backup(source).map_err(CleanupError::BackupRequired)?;
        report.artifacts.backup = Some(backup_path);

        let rows_before_apply = working.len();
        working
            .remove_indices(&selection)
            .map_err(CleanupError::UnknownIndex)?;
        let removed: BTreeSet<usize> = full_selection.union(&selection).copied().collect();
        let deleted = snapshot.extract(&removed);
        end_stage(&hooks, &mut report, StageReport {
            stage: Stage::ApplyDeletions,
            rows_before: rows_before_apply,
            rows_after: working.len(),
            found: selection.len(),
            removed: selection.len(),
        });

        // PERSIST
        hooks.start(Stage::Persist, 2);
        let rows_written = working.len();
        let cleaned_target = self
            .options
            .output
            .clone()
            .unwrap_or_else(|| backup::cleaned_path(source));
        persist(&working, &deleted, source, &cleaned_target, &mut report);
        let written = usize::from(report.artifacts.cleaned.is_some())
            + usize::from(report.artifacts.deleted.is_some());
        end_stage(
            &hooks,
            &mut report,
            StageReport::unchanged(Stage::Persist, rows_written, written),
        );

        report.rows_after = working.len();
        report.status = if aborted {
            RunStatus::Aborted
        } else {
            RunStatus::Completed
        };
        Ok(report)
    }
}

fn end_stage(hooks: &Hooks, report: &mut CleanupReport, stage: StageReport) {
    hooks.end(&stage);
    report.stages.push(stage);
}

/// Write the cleaned file and the deleted archive, recording failures.
fn persist(
    working: &RecordSet,
    deleted: &RecordSet,
    source: &Path,
    cleaned_target: &Path,
    report: &mut CleanupReport,
) {
    match write_records(working, cleaned_target) {
        Ok(()) => {
            log::info!(
                "Wrote {} rows to {}",
                working.len(),
                cleaned_target.display()
            );
            report.artifacts.cleaned = Some(cleaned_target.to_path_buf());
        }
        Err(e) => {
            log::error!("Failed to write {}: {}", cleaned_target.display(), e);
            report.failures.push(ArtifactFailure {
                kind: ArtifactKind::Cleaned,
                path: cleaned_target.to_path_buf(),
                message: e.to_string(),
            });
        }
    }

    match backup::archive_deleted(deleted, source) {
        Ok(path) => report.artifacts.deleted = path,
        Err(e) => {
            let path = match &e {
                BackupError::Store(store) => store.path().to_path_buf(),
                _ => source.to_path_buf(),
            };
            log::error!("Failed to archive deleted rows: {}", e);
            report.failures.push(ArtifactFailure {
                kind: ArtifactKind::DeletedEntries,
                path,
                message: e.to_string(),
            });
        }
    }
}

/// Cross-policy counts for analyze mode.
fn analyze(
    working: &RecordSet,
    full_duplicate_rows: usize,
    total_rows: usize,
    domain_fallbacks: usize,
) -> Result<AnalysisReport, CleanupError> {
    let rows = working.len();
    let uri = GroupingStats::from_groups(rows, &find_uri_duplicates(working)?);
    let uri_username = GroupingStats::from_groups(rows, &find_uri_username_duplicates(working)?);

    // Both need login_password, which exports may omit.
    let domain_credential = find_domain_credential_duplicates(working)
        .ok()
        .map(|groups| GroupingStats::from_groups(rows, &groups));
    let partial_matches = find_partial_uri_matches(working).ok();

    Ok(AnalysisReport {
        total_rows,
        full_duplicate_rows,
        uri,
        uri_username,
        domain_credential,
        partial_matches,
        domain_fallbacks,
    })
}
