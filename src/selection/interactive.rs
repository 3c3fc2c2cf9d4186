//! Interactive selection through an injected selector.

use std::collections::{BTreeSet, VecDeque};

use super::{Decision, GroupPosition, SelectionError, SelectionStrategy};
use crate::duplicates::{DuplicateGroup, KeyPolicy};
use crate::records::{RecordSet, LOGIN_PASSWORD};

/// Placeholder shown instead of a password.
pub const PASSWORD_MASK: &str = "********";

/// Render a group key as `column=value` pairs.
///
/// Full-row keys are summarized by width since they repeat every column.
#[must_use]
pub fn describe_key(policy: KeyPolicy, key: &[String], mask_passwords: bool) -> String {
    match policy.key_columns() {
        Some(columns) => columns
            .iter()
            .zip(key)
            .map(|(column, value)| {
                let shown = if mask_passwords && *column == LOGIN_PASSWORD {
                    PASSWORD_MASK
                } else {
                    value.as_str()
                };
                format!("{}={}", column, shown)
            })
            .collect::<Vec<_>>()
            .join(", "),
        None => format!("{} identical columns", key.len()),
    }
}

/// One member of a group as presented to a selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRow {
    /// Identity of the record
    pub original_index: usize,
    /// Output column values, aligned with [`GroupView::headers`]
    pub values: Vec<String>,
}

/// Everything a selector needs to present one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupView {
    /// Position of the group in the run
    pub position: GroupPosition,
    /// Policy the group was formed under
    pub policy: KeyPolicy,
    /// Shared key values
    pub key: Vec<String>,
    /// Output column names
    pub headers: Vec<String>,
    /// Position of `login_password` within `headers`, for masking
    pub password_column: Option<usize>,
    /// Group members in record set order
    pub rows: Vec<GroupRow>,
}

impl GroupView {
    /// Build a view of `group` over `records`.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::UnknownRecord` if a member is missing.
    pub fn build(
        group: &DuplicateGroup,
        records: &RecordSet,
        position: GroupPosition,
    ) -> Result<Self, SelectionError> {
        let columns = records.output_columns();
        let headers: Vec<String> = columns
            .iter()
            .map(|&i| records.headers()[i].clone())
            .collect();
        let password_column = headers.iter().position(|h| h == LOGIN_PASSWORD);

        let rows = group
            .indices
            .iter()
            .map(|&index| {
                let record = records
                    .get(index)
                    .ok_or(SelectionError::UnknownRecord(index))?;
                Ok(GroupRow {
                    original_index: index,
                    values: columns
                        .iter()
                        .map(|&i| record.field(i).to_string())
                        .collect(),
                })
            })
            .collect::<Result<Vec<_>, SelectionError>>()?;

        Ok(Self {
            position,
            policy: group.policy,
            key: group.key.clone(),
            headers,
            password_column,
            rows,
        })
    }

    /// Value of the column at `column` for display, masking the password.
    #[must_use]
    pub fn display_value<'a>(
        &self,
        row: &'a GroupRow,
        column: usize,
        mask_passwords: bool,
    ) -> &'a str {
        if mask_passwords && self.password_column == Some(column) {
            return PASSWORD_MASK;
        }
        row.values.get(column).map_or("", String::as_str)
    }

    /// Key rendered for display.
    #[must_use]
    pub fn key_label(&self, mask_passwords: bool) -> String {
        describe_key(self.policy, &self.key, mask_passwords)
    }

    /// Value of a named column for a row, if the column is shown.
    #[must_use]
    pub fn value<'a>(&self, row: &'a GroupRow, column: &str) -> Option<&'a str> {
        self.headers
            .iter()
            .position(|h| h == column)
            .and_then(|i| row.values.get(i))
            .map(String::as_str)
    }
}

/// A selector's answer for one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorResponse {
    /// Delete these `original_index` values (possibly none)
    Delete(BTreeSet<usize>),
    /// Stop and skip all remaining groups
    Abort,
}

/// Capability that asks a user which members of a group to delete.
pub trait GroupSelector {
    /// Present one group and wait for an answer.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::Io` if the input device fails.
    fn request_selection(&mut self, view: &GroupView) -> Result<SelectorResponse, SelectionError>;
}

/// Strategy that defers to a [`GroupSelector`].
///
/// The policy only validates: every returned index must belong to the
/// group being shown.
pub struct InteractivePolicy<'a> {
    selector: &'a mut dyn GroupSelector,
}

impl std::fmt::Debug for InteractivePolicy<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractivePolicy")
            .field("selector", &"<selector>")
            .finish()
    }
}

impl<'a> InteractivePolicy<'a> {
    /// Wrap a selector.
    pub fn new(selector: &'a mut dyn GroupSelector) -> Self {
        Self { selector }
    }
}

impl SelectionStrategy for InteractivePolicy<'_> {
    fn select(
        &mut self,
        group: &DuplicateGroup,
        records: &RecordSet,
        position: GroupPosition,
    ) -> Result<Decision, SelectionError> {
        let view = GroupView::build(group, records, position)?;
        match self.selector.request_selection(&view)? {
            SelectorResponse::Abort => Ok(Decision::Abort),
            SelectorResponse::Delete(indices) => {
                if let Some(&index) = indices.iter().find(|i| !group.contains(**i)) {
                    return Err(SelectionError::OutsideGroup { index });
                }
                Ok(Decision::Delete(indices))
            }
        }
    }
}

/// Selector that replays a fixed script of responses.
///
/// Once the script runs out, every further group gets an empty deletion.
/// The views it was shown are kept for inspection.
#[derive(Debug, Default)]
pub struct ScriptedSelector {
    responses: VecDeque<SelectorResponse>,
    shown: Vec<GroupView>,
}

impl ScriptedSelector {
    /// Create a selector from responses in group order.
    #[must_use]
    pub fn new(responses: impl IntoIterator<Item = SelectorResponse>) -> Self {
        Self {
            responses: responses.into_iter().collect(),
            shown: Vec::new(),
        }
    }

    /// Views presented so far, in order.
    #[must_use]
    pub fn shown(&self) -> &[GroupView] {
        &self.shown
    }
}

impl GroupSelector for ScriptedSelector {
    fn request_selection(&mut self, view: &GroupView) -> Result<SelectorResponse, SelectionError> {
        self.shown.push(view.clone());
        Ok(self
            .responses
            .pop_front()
            .unwrap_or_else(|| SelectorResponse::Delete(BTreeSet::new())))
    }
}
