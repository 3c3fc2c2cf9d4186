//! Selection policies: which members of a duplicate group to delete.
//!
//! Two strategies implement [`SelectionStrategy`]:
//! - [`ShortestUriWins`] keeps the member with the shortest normalized URI
//! - [`InteractivePolicy`] asks a [`GroupSelector`] and validates the answer
//!
//! Neither strategy performs I/O itself. Interactive input comes from a
//! selector supplied by the caller: the terminal UI, a line prompt, or a
//! [`ScriptedSelector`] in tests.

pub mod interactive;
pub mod strategy;

pub use interactive::{
    describe_key, GroupRow, GroupSelector, GroupView, InteractivePolicy, ScriptedSelector,
    SelectorResponse, PASSWORD_MASK,
};
pub use strategy::{SelectionStrategy, ShortestUriWins};

use std::collections::BTreeSet;
use std::io;

use thiserror::Error;

/// Errors raised while selecting records.
#[derive(Debug, Error)]
pub enum SelectionError {
    /// A selector returned an index outside the group it was shown.
    #[error("index {index} is not a member of the group")]
    OutsideGroup {
        /// The offending index
        index: usize,
    },

    /// A group refers to a record that is not in the record set.
    #[error("record {0} not found")]
    UnknownRecord(usize),

    /// The record set has not been normalized.
    #[error("records must be normalized before shortest-URI selection")]
    NotNormalized,

    /// The selector failed to interact with its input device.
    #[error("selector I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Outcome of selecting within one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Delete these `original_index` values (possibly none)
    Delete(BTreeSet<usize>),
    /// Stop processing the remaining groups
    Abort,
}

/// Where a group sits in the sequence being processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupPosition {
    /// 1-based position of the group
    pub index: usize,
    /// Total number of groups
    pub total: usize,
}

impl GroupPosition {
    /// Create a position marker.
    #[must_use]
    pub fn new(index: usize, total: usize) -> Self {
        Self { index, total }
    }
}
