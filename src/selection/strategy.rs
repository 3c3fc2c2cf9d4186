//! Selection strategy trait and the automatic shortest-URI policy.

use std::collections::BTreeSet;

use super::{Decision, GroupPosition, SelectionError};
use crate::duplicates::DuplicateGroup;
use crate::records::{ColumnRef, RecordSet};

/// Decides which members of a group to delete.
pub trait SelectionStrategy {
    /// Select within one group.
    ///
    /// # Errors
    ///
    /// Returns a `SelectionError` if the group cannot be evaluated.
    fn select(
        &mut self,
        group: &DuplicateGroup,
        records: &RecordSet,
        position: GroupPosition,
    ) -> Result<Decision, SelectionError>;
}

/// Keep the member with the shortest normalized URI; delete the rest.
///
/// Length is measured in characters. Ties go to the earliest member in
/// record set order, so the outcome is fully determined by the input.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortestUriWins;

impl ShortestUriWins {
    /// The `original_index` of the member this policy keeps.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::NotNormalized` for an unnormalized set and
    /// `SelectionError::UnknownRecord` if a member is missing.
    pub fn keeper(group: &DuplicateGroup, records: &RecordSet) -> Result<usize, SelectionError> {
        if !records.is_normalized() {
            return Err(SelectionError::NotNormalized);
        }

        let mut best: Option<(usize, usize)> = None;
        for &index in &group.indices {
            let record = records
                .get(index)
                .ok_or(SelectionError::UnknownRecord(index))?;
            let length = records
                .value(record, ColumnRef::UriNormalized)
                .chars()
                .count();
            // Strict comparison keeps the first of equal lengths.
            if best.map_or(true, |(_, shortest)| length < shortest) {
                best = Some((index, length));
            }
        }
        best.map(|(index, _)| index)
            .ok_or(SelectionError::UnknownRecord(0))
    }
}

impl SelectionStrategy for ShortestUriWins {
    fn select(
        &mut self,
        group: &DuplicateGroup,
        records: &RecordSet,
        _position: GroupPosition,
    ) -> Result<Decision, SelectionError> {
        if group.is_empty() {
            return Ok(Decision::Delete(BTreeSet::new()));
        }
        let keep = Self::keeper(group, records)?;
        Ok(Decision::Delete(
            group.indices.iter().copied().filter(|&i| i != keep).collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duplicates::KeyPolicy;
    use crate::normalize::normalize_records;

    fn records(uris: &[&str]) -> RecordSet {
        let mut set = RecordSet::from_rows(
            vec!["login_uri".into(), "login_username".into()],
            uris.iter().map(|u| vec![(*u).to_string(), "u".into()]).collect(),
        );
        normalize_records(&mut set).unwrap();
        set
    }

    fn group(indices: Vec<usize>) -> DuplicateGroup {
        DuplicateGroup {
            policy: KeyPolicy::UriUsername,
            key: vec![],
            indices,
        }
    }

    #[test]
    fn test_keeps_shortest_uri() {
        let set = records(&["https://x.com/a", "https://x.com"]);
        let decision = ShortestUriWins
            .select(&group(vec![0, 1]), &set, GroupPosition::new(1, 1))
            .unwrap();
        assert_eq!(decision, Decision::Delete(BTreeSet::from([0])));
    }

    #[test]
    fn test_tie_keeps_first_occurrence() {
        let set = records(&["https://b.com", "https://a.com", "https://c.com/"]);
        assert_eq!(ShortestUriWins::keeper(&group(vec![0, 1, 2]), &set).unwrap(), 0);
    }

    #[test]
    fn test_trailing_slash_does_not_count() {
        let set = records(&["https://abc.com", "https://ab.com///"]);
        assert_eq!(ShortestUriWins::keeper(&group(vec![0, 1]), &set).unwrap(), 1);
    }

    #[test]
    fn test_requires_normalized_records() {
        let set = RecordSet::from_rows(
            vec!["login_uri".into()],
            vec![vec!["a".into()], vec!["b".into()]],
        );
        assert!(matches!(
            ShortestUriWins::keeper(&group(vec![0, 1]), &set),
            Err(SelectionError::NotNormalized)
        ));
    }
}
