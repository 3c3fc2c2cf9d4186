//! Non-fatal load-time checks.

use std::fmt;

use serde::Serialize;

use super::{is_transient_column, RecordSet, KNOWN_COLUMNS, REQUIRED_COLUMNS};

/// A finding that is reported but never blocks processing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationWarning {
    /// Columns outside the known export column set
    UnexpectedColumns { columns: Vec<String> },
    /// A required column has empty values
    EmptyRequiredFields { column: String, count: usize },
    /// The input already contains a derived column name
    TransientColumnInInput { column: String },
    /// The file is larger than the warning threshold
    LargeFile { size_mb: f64 },
    /// Rows whose field count differs from the header
    RaggedRows { count: usize },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedColumns { columns } => {
                write!(f, "unexpected columns: {}", columns.join(", "))
            }
            Self::EmptyRequiredFields { column, count } => {
                write!(f, "{} rows have an empty '{}'", count, column)
            }
            Self::TransientColumnInInput { column } => write!(
                f,
                "input contains column '{}', which is recomputed and dropped on output",
                column
            ),
            Self::LargeFile { size_mb } => {
                write!(f, "large file ({:.1}MB); processing may be slow", size_mb)
            }
            Self::RaggedRows { count } => {
                write!(f, "{} rows do not match the header width", count)
            }
        }
    }
}

/// Inspect a loaded record set for non-fatal problems.
///
/// Required columns are assumed present; the loader rejects files without them.
#[must_use]
pub fn inspect_records(records: &RecordSet) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let unexpected: Vec<String> = records
        .headers()
        .iter()
        .filter(|h| !KNOWN_COLUMNS.contains(&h.as_str()) && !is_transient_column(h))
        .cloned()
        .collect();
    if !unexpected.is_empty() {
        warnings.push(ValidationWarning::UnexpectedColumns {
            columns: unexpected,
        });
    }

    for header in records.headers() {
        if is_transient_column(header) {
            warnings.push(ValidationWarning::TransientColumnInInput {
                column: header.clone(),
            });
        }
    }

    for column in REQUIRED_COLUMNS {
        if let Some(idx) = records.column_index(column) {
            let count = records
                .iter()
                .filter(|r| r.field(idx).trim().is_empty())
                .count();
            if count > 0 {
                warnings.push(ValidationWarning::EmptyRequiredFields {
                    column: column.to_string(),
                    count,
                });
            }
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_columns_produce_no_warnings() {
        let set = RecordSet::from_rows(
            KNOWN_COLUMNS.iter().map(|c| (*c).to_string()).collect(),
            vec![vec!["x".to_string(); KNOWN_COLUMNS.len()]],
        );
        assert!(inspect_records(&set).is_empty());
    }

    #[test]
    fn test_unexpected_and_transient_columns() {
        let set = RecordSet::new(vec![
            "login_uri".into(),
            "login_username".into(),
            "domain".into(),
            "extra".into(),
        ]);
        let warnings = inspect_records(&set);
        assert!(warnings.contains(&ValidationWarning::UnexpectedColumns {
            columns: vec!["extra".into()]
        }));
        assert!(warnings.contains(&ValidationWarning::TransientColumnInInput {
            column: "domain".into()
        }));
    }

    #[test]
    fn test_empty_required_fields_counted() {
        let set = RecordSet::from_rows(
            vec!["login_uri".into(), "login_username".into()],
            vec![
                vec!["".into(), "alice".into()],
                vec!["https://a.com".into(), " ".into()],
                vec!["".into(), "bob".into()],
            ],
        );
        let warnings = inspect_records(&set);
        assert_eq!(
            warnings,
            vec![
                ValidationWarning::EmptyRequiredFields {
                    column: "login_uri".into(),
                    count: 2
                },
                ValidationWarning::EmptyRequiredFields {
                    column: "login_username".into(),
                    count: 1
                },
            ]
        );
    }
}
