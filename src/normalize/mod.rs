//! Derived comparison keys.
//!
//! The normalizer attaches two transient values to every record:
//! - `login_uri_normalized`: the URI with trailing slashes stripped
//! - `domain`: the host extracted from the normalized URI
//!
//! Stored fields are never modified. The derived values are held beside the
//! record and cannot reach a written file.

pub mod domain;
pub mod uri;

pub use domain::{analyze_domain, extract_domain, Domain, DomainKind};
pub use uri::normalize_uri;

use crate::records::{DerivedFields, RecordSet, StoreError, LOGIN_URI};

/// Counters collected while normalizing a record set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    /// Records processed
    pub records: usize,
    /// Records whose URI changed under normalization
    pub uris_changed: usize,
    /// Records with an empty URI
    pub empty_uris: usize,
    /// Records whose domain came from the textual fallback
    pub domain_fallbacks: usize,
}

/// Attach derived fields to every record in the set.
///
/// Running this twice yields the same derived values.
///
/// # Errors
///
/// Returns `StoreError::MissingColumns` if `login_uri` is absent.
pub fn normalize_records(records: &mut RecordSet) -> Result<NormalizeStats, StoreError> {
    let Some(uri_idx) = records.column_index(LOGIN_URI) else {
        return Err(StoreError::MissingColumns {
            path: Default::default(),
            missing: vec![LOGIN_URI.to_string()],
        });
    };

    let mut stats = NormalizeStats::default();
    for record in records.records_mut() {
        let raw = record.field(uri_idx);
        let uri_normalized = normalize_uri(raw);
        if uri_normalized != raw {
            stats.uris_changed += 1;
        }
        if uri_normalized.is_empty() {
            stats.empty_uris += 1;
        }

        let domain = analyze_domain(&uri_normalized);
        if domain.kind == DomainKind::Fallback {
            stats.domain_fallbacks += 1;
        }

        record.set_derived(DerivedFields {
            uri_normalized,
            domain: domain.value,
        });
        stats.records += 1;
    }
    records.set_normalized(true);

    log::debug!(
        "Normalized {} records ({} URIs changed, {} domain fallbacks)",
        stats.records,
        stats.uris_changed,
        stats.domain_fallbacks
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{DOMAIN, URI_NORMALIZED};

    fn sample() -> RecordSet {
        RecordSet::from_rows(
            vec!["login_uri".into(), "login_username".into()],
            vec![
                vec!["https://www.Site.com/".into(), "alice".into()],
                vec!["".into(), "bob".into()],
                vec!["https://bad host.com".into(), "carol".into()],
            ],
        )
    }

    #[test]
    fn test_normalize_attaches_derived_fields() {
        let mut set = sample();
        let stats = normalize_records(&mut set).unwrap();

        assert!(set.is_normalized());
        assert_eq!(stats.records, 3);
        assert_eq!(stats.uris_changed, 1);
        assert_eq!(stats.empty_uris, 1);
        assert_eq!(stats.domain_fallbacks, 1);

        let first = &set.records()[0];
        assert_eq!(set.value_by_name(first, URI_NORMALIZED), Some("https://www.Site.com"));
        assert_eq!(set.value_by_name(first, DOMAIN), Some("site.com"));
        assert_eq!(first.field(0), "https://www.Site.com/");
    }

    #[test]
    fn test_normalize_is_repeatable() {
        let mut set = sample();
        normalize_records(&mut set).unwrap();
        let once = set.clone();
        normalize_records(&mut set).unwrap();
        assert_eq!(set, once);
    }

    #[test]
    fn test_normalize_requires_login_uri() {
        let mut set = RecordSet::new(vec!["name".into()]);
        assert!(matches!(
            normalize_records(&mut set),
            Err(StoreError::MissingColumns { .. })
        ));
    }
}
