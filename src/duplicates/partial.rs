//! Partial URI matches between entries sharing credentials.
//!
//! Two entries with the same username and password whose URIs nest (one is a
//! substring of the other) are likely the same account saved from different
//! pages. These are reported for review only.

use std::collections::HashMap;

use serde::Serialize;

use super::finder::GroupError;
use super::groups::KeyPolicy;
use crate::records::{RecordSet, LOGIN_PASSWORD, LOGIN_USERNAME, URI_NORMALIZED};

/// Entries sharing credentials whose URIs contain one another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartialUriMatch {
    /// Shared username
    pub username: String,
    /// `original_index` of every entry with these credentials
    pub indices: Vec<usize>,
    /// Distinct normalized URIs in first-seen order
    pub uris: Vec<String>,
    /// `(contained, containing)` URI pairs
    pub pairs: Vec<(String, String)>,
}

/// Find credential groups with nested URIs.
///
/// The record set must be normalized and carry a `login_password` column.
/// Passwords are used for grouping but never copied into the result.
///
/// # Errors
///
/// Returns `GroupError::MissingColumns` when a required column is absent.
pub fn find_partial_uri_matches(records: &RecordSet) -> Result<Vec<PartialUriMatch>, GroupError> {
    let columns = records
        .resolve_all(&[URI_NORMALIZED, LOGIN_USERNAME, LOGIN_PASSWORD])
        .map_err(|missing| GroupError::MissingColumns {
            policy: KeyPolicy::DomainCredential,
            missing,
        })?;
    let (uri_col, user_col, pass_col) = (columns[0], columns[1], columns[2]);

    let mut slots: HashMap<(&str, &str), usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<usize>, Vec<&str>)> = Vec::new();

    for record in records {
        let user = records.value(record, user_col);
        let pass = records.value(record, pass_col);
        let uri = records.value(record, uri_col);

        let slot = *slots.entry((user, pass)).or_insert_with(|| {
            groups.push((user, Vec::new(), Vec::new()));
            groups.len() - 1
        });
        let (_, indices, uris) = &mut groups[slot];
        indices.push(record.original_index());
        if !uris.contains(&uri) {
            uris.push(uri);
        }
    }

    let matches: Vec<PartialUriMatch> = groups
        .into_iter()
        .filter(|(_, indices, uris)| indices.len() > 1 && uris.len() > 1)
        .filter_map(|(user, indices, uris)| {
            let pairs = nested_pairs(&uris);
            (!pairs.is_empty()).then(|| PartialUriMatch {
                username: user.to_string(),
                indices,
                uris: uris.iter().map(|u| (*u).to_string()).collect(),
                pairs,
            })
        })
        .collect();

    log::debug!("Found {} partial URI match groups", matches.len());
    Ok(matches)
}

fn nested_pairs(uris: &[&str]) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (i, inner) in uris.iter().enumerate() {
        if inner.is_empty() {
            continue;
        }
        for (j, outer) in uris.iter().enumerate() {
            if i != j && outer.contains(inner) {
                pairs.push(((*inner).to_string(), (*outer).to_string()));
            }
        }
    }
    pairs
}
