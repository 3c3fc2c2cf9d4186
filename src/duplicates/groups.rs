//! Grouping policies and duplicate groups.
//!
//! # Overview
//!
//! A [`KeyPolicy`] names the columns whose values must be equal for two
//! records to count as duplicates. Grouping under a policy yields
//! [`DuplicateGroup`]s: maximal sets of records sharing one key, with at
//! least two members each.
//!
//! | Policy              | Key                                              |
//! |---------------------|--------------------------------------------------|
//! | `FullRow`           | every source column                              |
//! | `Uri`               | raw `login_uri`                                  |
//! | `UriUsername`       | `login_uri_normalized`, `login_username`         |
//! | `DomainCredential`  | `domain`, `login_username`, `login_password`     |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::records::{DOMAIN, LOGIN_PASSWORD, LOGIN_URI, LOGIN_USERNAME, URI_NORMALIZED};

const URI_KEY: &[&str] = &[LOGIN_URI];
const URI_USERNAME_KEY: &[&str] = &[URI_NORMALIZED, LOGIN_USERNAME];
const DOMAIN_CREDENTIAL_KEY: &[&str] = &[DOMAIN, LOGIN_USERNAME, LOGIN_PASSWORD];

/// Which columns define "the same entry".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum KeyPolicy {
    /// Equality across all source columns
    FullRow,
    /// Equality of the raw `login_uri`
    Uri,
    /// Equality of normalized URI and username
    UriUsername,
    /// Equality of domain, username, and password
    DomainCredential,
}

impl KeyPolicy {
    /// Columns that form the key, or `None` for [`KeyPolicy::FullRow`].
    #[must_use]
    pub fn key_columns(self) -> Option<&'static [&'static str]> {
        match self {
            Self::FullRow => None,
            Self::Uri => Some(URI_KEY),
            Self::UriUsername => Some(URI_USERNAME_KEY),
            Self::DomainCredential => Some(DOMAIN_CREDENTIAL_KEY),
        }
    }

    /// Whether the key uses derived columns and so needs normalization first.
    #[must_use]
    pub fn needs_normalization(self) -> bool {
        matches!(self, Self::UriUsername | Self::DomainCredential)
    }

    /// Stable name used in reports and configuration.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::FullRow => "full-row",
            Self::Uri => "uri",
            Self::UriUsername => "uri-username",
            Self::DomainCredential => "domain-credential",
        }
    }
}

impl fmt::Display for KeyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KeyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full-row" => Ok(Self::FullRow),
            "uri" => Ok(Self::Uri),
            "uri-username" => Ok(Self::UriUsername),
            "domain-credential" => Ok(Self::DomainCredential),
            other => Err(format!("unknown grouping policy '{}'", other)),
        }
    }
}

/// Records sharing one key under a policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    /// Policy the group was formed under
    pub policy: KeyPolicy,
    /// The shared key values, in key column order
    pub key: Vec<String>,
    /// `original_index` of each member, in record set order
    pub indices: Vec<usize>,
}

impl DuplicateGroup {
    /// Number of records in the group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Check if the group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Number of records beyond the first.
    #[must_use]
    pub fn redundant(&self) -> usize {
        self.indices.len().saturating_sub(1)
    }

    /// Check whether a record belongs to this group.
    #[must_use]
    pub fn contains(&self, original_index: usize) -> bool {
        self.indices.contains(&original_index)
    }
}

/// Summary of one grouping pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupingStats {
    /// Records examined
    pub total_records: usize,
    /// Groups with two or more members
    pub duplicate_groups: usize,
    /// Records belonging to some group
    pub duplicate_records: usize,
    /// Records that would go if every group kept one
    pub redundant_records: usize,
}

impl GroupingStats {
    /// Compute statistics for a set of groups.
    #[must_use]
    pub fn from_groups(total_records: usize, groups: &[DuplicateGroup]) -> Self {
        Self {
            total_records,
            duplicate_groups: groups.len(),
            duplicate_records: groups.iter().map(DuplicateGroup::len).sum(),
            redundant_records: groups.iter().map(DuplicateGroup::redundant).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_round_trips_through_name() {
        for policy in [
            KeyPolicy::FullRow,
            KeyPolicy::Uri,
            KeyPolicy::UriUsername,
            KeyPolicy::DomainCredential,
        ] {
            assert_eq!(policy.name().parse::<KeyPolicy>(), Ok(policy));
        }
        assert!("nope".parse::<KeyPolicy>().is_err());
    }

    #[test]
    fn test_key_columns() {
        assert_eq!(KeyPolicy::FullRow.key_columns(), None);
        assert_eq!(
            KeyPolicy::DomainCredential.key_columns(),
            Some(&["domain", "login_username", "login_password"][..])
        );
        assert!(KeyPolicy::UriUsername.needs_normalization());
        assert!(!KeyPolicy::Uri.needs_normalization());
    }

    #[test]
    fn test_grouping_stats() {
        let groups = vec![
            DuplicateGroup {
                policy: KeyPolicy::Uri,
                key: vec!["a".into()],
                indices: vec![0, 2, 5],
            },
            DuplicateGroup {
                policy: KeyPolicy::Uri,
                key: vec!["b".into()],
                indices: vec![1, 3],
            },
        ];
        let stats = GroupingStats::from_groups(10, &groups);
        assert_eq!(stats.duplicate_groups, 2);
        assert_eq!(stats.duplicate_records, 5);
        assert_eq!(stats.redundant_records, 3);
    }
}
