//! Duplicate grouping over a record set.
//!
//! All functions here are pure: they read a [`RecordSet`] and return groups
//! of `original_index` values. Groups appear in order of their first member,
//! and members keep record set order.
//!
//! # Example
//!
//! ```
//! use credupe::duplicates::{find_full_duplicates, full_duplicate_selection};
//! use credupe::records::RecordSet;
//!
//! let row = || vec!["https://a.com".to_string(), "alice".to_string()];
//! let set = RecordSet::from_rows(
//!     vec!["login_uri".into(), "login_username".into()],
//!     vec![row(), row(), vec!["https://b.com".into(), "bob".into()]],
//! );
//!
//! let groups = find_full_duplicates(&set);
//! assert_eq!(groups.len(), 1);
//! assert_eq!(groups[0].indices, vec![0, 1]);
//! assert_eq!(full_duplicate_selection(&groups).into_iter().collect::<Vec<_>>(), vec![1]);
//! ```

use std::collections::{BTreeSet, HashMap};

use thiserror::Error;

use super::groups::{DuplicateGroup, KeyPolicy};
use crate::records::{ColumnRef, RecordSet};

/// Errors from grouping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GroupError {
    /// The policy's key columns are not all available.
    #[error("policy '{policy}' needs missing columns: {}", missing.join(", "))]
    MissingColumns {
        /// Policy that was requested
        policy: KeyPolicy,
        /// Columns that could not be resolved
        missing: Vec<String>,
    },
}

/// Group records whose key under `policy` is equal.
///
/// Only groups with two or more members are returned. Policies keyed on
/// derived columns require a normalized record set; on an unnormalized set
/// those columns are reported missing.
///
/// # Errors
///
/// Returns `GroupError::MissingColumns` when a key column cannot be resolved.
pub fn find_duplicates(
    records: &RecordSet,
    policy: KeyPolicy,
) -> Result<Vec<DuplicateGroup>, GroupError> {
    let columns: Vec<ColumnRef> = match policy.key_columns() {
        Some(names) => records
            .resolve_all(names)
            .map_err(|missing| GroupError::MissingColumns { policy, missing })?,
        None => records
            .output_columns()
            .into_iter()
            .map(ColumnRef::Field)
            .collect(),
    };

    let mut slots: HashMap<Vec<&str>, usize> = HashMap::new();
    let mut buckets: Vec<(Vec<&str>, Vec<usize>)> = Vec::new();

    for record in records {
        let key: Vec<&str> = columns.iter().map(|&c| records.value(record, c)).collect();
        match slots.get(&key) {
            Some(&slot) => buckets[slot].1.push(record.original_index()),
            None => {
                slots.insert(key.clone(), buckets.len());
                buckets.push((key, vec![record.original_index()]));
            }
        }
    }

    let groups: Vec<DuplicateGroup> = buckets
        .into_iter()
        .filter(|(_, indices)| indices.len() > 1)
        .map(|(key, indices)| DuplicateGroup {
            policy,
            key: key.into_iter().map(str::to_string).collect(),
            indices,
        })
        .collect();

    log::debug!(
        "Policy '{}': {} groups over {} records",
        policy,
        groups.len(),
        records.len()
    );
    Ok(groups)
}

/// Groups of rows identical in every source column.
#[must_use]
pub fn find_full_duplicates(records: &RecordSet) -> Vec<DuplicateGroup> {
    // FullRow keys on the header itself and cannot miss a column.
    find_duplicates(records, KeyPolicy::FullRow).unwrap_or_default()
}

/// Groups sharing the raw `login_uri`.
///
/// # Errors
///
/// Returns `GroupError::MissingColumns` if `login_uri` is absent.
pub fn find_uri_duplicates(records: &RecordSet) -> Result<Vec<DuplicateGroup>, GroupError> {
    find_duplicates(records, KeyPolicy::Uri)
}

/// Groups sharing normalized URI and username.
///
/// # Errors
///
/// Returns `GroupError::MissingColumns` if the set is not normalized or
/// `login_username` is absent.
pub fn find_uri_username_duplicates(
    records: &RecordSet,
) -> Result<Vec<DuplicateGroup>, GroupError> {
    find_duplicates(records, KeyPolicy::UriUsername)
}

/// Groups sharing domain, username, and password.
///
/// # Errors
///
/// Returns `GroupError::MissingColumns` if the set is not normalized or
/// `login_password` is absent.
pub fn find_domain_credential_duplicates(
    records: &RecordSet,
) -> Result<Vec<DuplicateGroup>, GroupError> {
    find_duplicates(records, KeyPolicy::DomainCredential)
}

/// Every member of full-duplicate groups except the first occurrence.
#[must_use]
pub fn full_duplicate_selection(groups: &[DuplicateGroup]) -> BTreeSet<usize> {
    groups
        .iter()
        .flat_map(|g| g.indices.iter().skip(1).copied())
        .collect()
}
