//! Record store for password-manager exports.
//!
//! This module provides:
//! - [`Record`] / [`RecordSet`]: ordered, in-memory rows with a stable
//!   `original_index` identity
//! - CSV loading with fatal-input validation and CSV writing through a single
//!   output projection that strips transient columns
//! - Column enumeration with a sampling fast path for very large exports
//! - Load-time validation warnings and optional `name` column cleanup
//!
//! # Example
//!
//! ```no_run
//! use credupe::records::{load_records, write_records};
//! use std::path::Path;
//!
//! let loaded = load_records(Path::new("export.csv")).unwrap();
//! for warning in &loaded.warnings {
//!     eprintln!("warning: {}", warning);
//! }
//! write_records(&loaded.records, Path::new("copy.csv")).unwrap();
//! ```

pub mod io;
pub mod names;
pub mod record;
pub mod validate;

pub use io::{
    list_columns, load_records, load_records_with_limits, validate_input, write_records, ColumnListing, LoadedRecords,
    SamplingLimits, StoreError,
};
pub use names::clean_name_column;
pub use record::{ColumnRef, DerivedFields, Record, RecordSet};
pub use validate::{inspect_records, ValidationWarning};

/// Site URL column.
pub const LOGIN_URI: &str = "login_uri";
/// Username column.
pub const LOGIN_USERNAME: &str = "login_username";
/// Password column.
pub const LOGIN_PASSWORD: &str = "login_password";
/// Display name column.
pub const NAME: &str = "name";

/// Derived column: `login_uri` with trailing slashes removed.
pub const URI_NORMALIZED: &str = "login_uri_normalized";
/// Derived column: host extracted from the normalized URI.
pub const DOMAIN: &str = "domain";

/// Columns that must be present for a file to be processed at all.
pub const REQUIRED_COLUMNS: [&str; 2] = [LOGIN_URI, LOGIN_USERNAME];

/// Columns computed per pass that must never be written back to disk.
pub const TRANSIENT_COLUMNS: [&str; 2] = [URI_NORMALIZED, DOMAIN];

/// Column set of a Bitwarden-style CSV export.
pub const KNOWN_COLUMNS: [&str; 11] = [
    "folder",
    "favorite",
    "type",
    NAME,
    "notes",
    "fields",
    "reprompt",
    LOGIN_URI,
    LOGIN_USERNAME,
    LOGIN_PASSWORD,
    "login_totp",
];

/// Check whether a column name is one of the transient derived columns.
#[must_use]
pub fn is_transient_column(name: &str) -> bool {
    TRANSIENT_COLUMNS.contains(&name)
}
