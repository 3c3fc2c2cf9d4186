//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Grouping policies ([`KeyPolicy`]) and duplicate groups
//! - Grouping a record set under a policy
//! - Full-row duplicate selection (keep the first occurrence)
//! - Partial URI match reporting for entries sharing credentials

pub mod finder;
pub mod groups;
pub mod partial;

pub use finder::{
    find_domain_credential_duplicates, find_duplicates, find_full_duplicates,
    find_uri_duplicates, find_uri_username_duplicates, full_duplicate_selection, GroupError,
};
pub use groups::{DuplicateGroup, GroupingStats, KeyPolicy};
pub use partial::{find_partial_uri_matches, PartialUriMatch};
