//! Display-name cleanup.

use std::sync::LazyLock;

use regex::Regex;

use super::{RecordSet, NAME};

static PARENTHESIZED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\([^)]*\)\s*").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Clean a single display name.
///
/// Parenthesized fragments such as `"(2)"` or `"(work)"` are removed together
/// with the whitespace around them, runs of whitespace are collapsed, and the
/// result is trimmed. Words on either side of a fragment are joined.
///
/// # Example
///
/// ```
/// use credupe::records::names::clean_name;
///
/// assert_eq!(clean_name("GitHub  (personal)"), "GitHub");
/// assert_eq!(clean_name("Bank  of   Mars"), "Bank of Mars");
/// ```
#[must_use]
pub fn clean_name(name: &str) -> String {
    let without_parens = PARENTHESIZED.replace_all(name, "");
    WHITESPACE
        .replace_all(&without_parens, " ")
        .trim()
        .to_string()
}

/// Clean the `name` column in place.
///
/// Returns the number of records whose name changed. A set without a `name`
/// column is left untouched.
pub fn clean_name_column(records: &mut RecordSet) -> usize {
    let Some(idx) = records.column_index(NAME) else {
        log::debug!("No '{}' column; skipping name cleanup", NAME);
        return 0;
    };

    let mut changed = 0;
    for record in records.records_mut() {
        let cleaned = clean_name(record.field(idx));
        if cleaned != record.field(idx) {
            record.set_field(idx, cleaned);
            changed += 1;
        }
    }

    if changed > 0 {
        log::info!("Cleaned {} names", changed);
    }
    changed
}
