//! Structured facts produced by a cleanup run.
//!
//! The orchestrator never formats user-facing text. Everything it learns is
//! recorded here and rendered by the caller.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use super::Mode;
use crate::backup::ArtifactKind;
use crate::duplicates::{GroupingStats, KeyPolicy, PartialUriMatch};
use crate::records::{ValidationWarning, LOGIN_PASSWORD};
use crate::selection::PASSWORD_MASK;

/// Pipeline stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Read and validate the source file
    Load,
    /// Remove rows identical in every column
    StripFullDuplicates,
    /// Attach derived URI and domain values
    Normalize,
    /// Group records under the mode's policy
    Group,
    /// Decide deletions per group
    Select,
    /// Remove selected records
    ApplyDeletions,
    /// Write output artifacts
    Persist,
}

impl Stage {
    /// Short name for logs and progress output.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::StripFullDuplicates => "strip-full-duplicates",
            Self::Normalize => "normalize",
            Self::Group => "group",
            Self::Select => "select",
            Self::ApplyDeletions => "apply-deletions",
            Self::Persist => "persist",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Row counts around one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
    /// Stage described
    pub stage: Stage,
    /// Rows in the working set before the stage
    pub rows_before: usize,
    /// Rows in the working set (or that would remain) after the stage
    pub rows_after: usize,
    /// Items found: duplicate rows, groups, or artifacts, by stage
    pub found: usize,
    /// Rows removed or selected for removal
    pub removed: usize,
}

impl StageReport {
    /// Report for a stage that did not change the row count.
    #[must_use]
    pub fn unchanged(stage: Stage, rows: usize, found: usize) -> Self {
        Self {
            stage,
            rows_before: rows,
            rows_after: rows,
            found,
            removed: 0,
        }
    }
}

/// Duplicate counts across every policy, produced by `analyze`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisReport {
    /// Rows in the source
    pub total_rows: usize,
    /// Rows removable as exact copies
    pub full_duplicate_rows: usize,
    /// Raw URI grouping
    pub uri: GroupingStats,
    /// Normalized URI plus username grouping
    pub uri_username: GroupingStats,
    /// Domain plus credentials grouping; absent without `login_password`
    pub domain_credential: Option<GroupingStats>,
    /// Credential groups with nested URIs; absent without `login_password`
    pub partial_matches: Option<Vec<PartialUriMatch>>,
    /// Rows whose domain used the textual fallback
    pub domain_fallbacks: usize,
}

/// Planned outcome for one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedGroup {
    /// Shared key values
    pub key: Vec<String>,
    /// Records kept
    pub keep: Vec<usize>,
    /// Records deleted
    pub delete: Vec<usize>,
}

/// Everything a run intends to delete, before it is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionPlan {
    /// Policy the groups were formed under
    pub policy: KeyPolicy,
    /// Exact copies removed before grouping
    pub full_duplicates: usize,
    /// Per-group decisions
    pub groups: Vec<PlannedGroup>,
    /// Total rows that would be deleted
    pub would_delete: usize,
    /// Rows that would remain
    pub would_remain: usize,
}

impl DeletionPlan {
    /// Check if the plan deletes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.would_delete == 0
    }

    /// Copy of the plan with password key values masked.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut plan = self.clone();
        let position = self
            .policy
            .key_columns()
            .and_then(|columns| columns.iter().position(|c| *c == LOGIN_PASSWORD));
        if let Some(position) = position {
            for group in &mut plan.groups {
                if let Some(value) = group.key.get_mut(position) {
                    *value = PASSWORD_MASK.to_string();
                }
            }
        }
        plan
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Deletions applied and artifacts written
    Completed,
    /// Analysis only; nothing written
    Analyzed,
    /// Selection computed; nothing written
    DryRun,
    /// No duplicates found; nothing written
    NothingToDo,
    /// Confirmation declined; nothing written
    Cancelled,
    /// Interactive run stopped early; earlier decisions applied
    Aborted,
}

/// An artifact write that failed without stopping the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactFailure {
    /// Which artifact failed
    pub kind: ArtifactKind,
    /// Attempted path
    pub path: PathBuf,
    /// Error description
    pub message: String,
}

/// Paths of artifacts written by a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArtifactPaths {
    /// Pre-mutation copy of the source
    pub backup: Option<PathBuf>,
    /// Surviving records
    pub cleaned: Option<PathBuf>,
    /// Removed records
    pub deleted: Option<PathBuf>,
}

/// Complete record of one cleanup run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanupReport {
    /// Mode that ran
    pub mode: Mode,
    /// Grouping policy used by the mode
    pub policy: KeyPolicy,
    /// Whether persistence was skipped
    pub dry_run: bool,
    /// Final status
    pub status: RunStatus,
    /// Load-time warnings
    pub warnings: Vec<ValidationWarning>,
    /// Per-stage counts in execution order
    pub stages: Vec<StageReport>,
    /// Cross-policy counts (analyze mode)
    pub analysis: Option<AnalysisReport>,
    /// Decisions (auto and interactive modes)
    pub plan: Option<DeletionPlan>,
    /// Rows in the source
    pub rows_before: usize,
    /// Rows remaining, or that would remain
    pub rows_after: usize,
    /// Exact copies removed
    pub full_duplicates_removed: usize,
    /// Rows removed by group selection
    pub selected_removed: usize,
    /// Names changed by name cleanup
    pub names_cleaned: usize,
    /// Groups found under the policy
    pub groups_total: usize,
    /// Groups a decision was made for
    pub groups_decided: usize,
    /// Artifacts written
    pub artifacts: ArtifactPaths,
    /// Artifact writes that failed
    pub failures: Vec<ArtifactFailure>,
}

impl CleanupReport {
    pub(crate) fn new(mode: Mode, policy: KeyPolicy, dry_run: bool) -> Self {
        Self {
            mode,
            policy,
            dry_run,
            status: RunStatus::NothingToDo,
            warnings: Vec::new(),
            stages: Vec::new(),
            analysis: None,
            plan: None,
            rows_before: 0,
            rows_after: 0,
            full_duplicates_removed: 0,
            selected_removed: 0,
            names_cleaned: 0,
            groups_total: 0,
            groups_decided: 0,
            artifacts: ArtifactPaths::default(),
            failures: Vec::new(),
        }
    }

    /// Rows removed, or that would be removed, in total.
    #[must_use]
    pub fn total_removed(&self) -> usize {
        self.full_duplicates_removed + self.selected_removed
    }

    /// Whether some artifact failed to write.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Copy of the report safe to print: password key values are masked.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut report = self.clone();
        report.plan = self.plan.as_ref().map(DeletionPlan::redacted);
        report
    }

    /// Report for a given stage, if it ran.
    #[must_use]
    pub fn stage(&self, stage: Stage) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.stage == stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacted_plan_masks_password_keys() {
        let plan = DeletionPlan {
            policy: KeyPolicy::DomainCredential,
            full_duplicates: 0,
            groups: vec![PlannedGroup {
                key: vec!["a.com".into(), "alice".into(), "hunter2".into()],
                keep: vec![0],
                delete: vec![1],
            }],
            would_delete: 1,
            would_remain: 1,
        };
        let redacted = plan.redacted();
        assert_eq!(redacted.groups[0].key[2], PASSWORD_MASK);
        assert_eq!(redacted.groups[0].key[1], "alice");
        assert_eq!(plan.groups[0].key[2], "hunter2");
    }

    #[test]
    fn test_total_removed_and_partial() {
        let mut report = CleanupReport::new(Mode::Auto, KeyPolicy::Uri, false);
        report.full_duplicates_removed = 2;
        report.selected_removed = 3;
        assert_eq!(report.total_removed(), 5);
        assert!(!report.is_partial());
        assert!(report.stage(Stage::Load).is_none());
    }
}
