//! Artifact naming.
//!
//! Every artifact is a sibling of its source file, named by suffixing the
//! source stem before the extension:
//!
//! | Kind             | Name                                        |
//! |------------------|---------------------------------------------|
//! | backup           | `<base>_backup_<YYYYmmdd_HHMMSS>.<ext>`     |
//! | deleted entries  | `<base>_deleted_entries_<timestamp>.<ext>`  |
//! | restored         | `<base>_restored_<timestamp>.<ext>`         |
//! | cleaned          | `<base>_cleaned.<ext>`                      |
//!
//! When two artifacts of one kind land in the same second, a `_<n>` counter
//! is appended to the timestamp.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::SystemTime;

use chrono::{DateTime, Local, NaiveDateTime, Timelike};
use regex::Regex;
use serde::Serialize;

/// Timestamp format embedded in artifact names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Extension used when the source has none.
pub const DEFAULT_EXTENSION: &str = "csv";

static TIMESTAMPED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<stem>.+)_(?P<kind>backup|deleted_entries|restored)_(?P<ts>\d{8}_\d{6})(?:_(?P<seq>\d+))?$",
    )
    .expect("valid regex")
});

/// What an artifact contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Untouched copy of the source taken before mutation
    Backup,
    /// Records removed by a run
    DeletedEntries,
    /// Records surviving a run
    Cleaned,
    /// Cleaned records followed by restored deleted records
    Restored,
}

impl ArtifactKind {
    /// Marker used in file names.
    #[must_use]
    pub fn marker(self) -> &'static str {
        match self {
            Self::Backup => "backup",
            Self::DeletedEntries => "deleted_entries",
            Self::Cleaned => "cleaned",
            Self::Restored => "restored",
        }
    }

    fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "backup" => Some(Self::Backup),
            "deleted_entries" => Some(Self::DeletedEntries),
            "cleaned" => Some(Self::Cleaned),
            "restored" => Some(Self::Restored),
            _ => None,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

/// A discovered artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    /// Kind of artifact
    pub kind: ArtifactKind,
    /// Location of the artifact
    pub path: PathBuf,
    /// Source file the artifact belongs to
    pub source: PathBuf,
    /// Creation time: from the name, or the modification time for cleaned files
    pub created: NaiveDateTime,
    /// Collision counter within one second
    pub sequence: u32,
}

impl Artifact {
    /// Recognize an artifact from its path.
    ///
    /// Returns `None` for paths that do not follow the naming convention.
    /// Cleaned files carry no timestamp; their modification time is read,
    /// falling back to the Unix epoch when unavailable.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let stem = path.file_stem()?.to_str()?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or(DEFAULT_EXTENSION);
        let dir = path.parent().unwrap_or_else(|| Path::new(""));

        if let Some(caps) = TIMESTAMPED.captures(stem) {
            let kind = ArtifactKind::from_marker(&caps["kind"])?;
            let created = NaiveDateTime::parse_from_str(&caps["ts"], TIMESTAMP_FORMAT).ok()?;
            let sequence = caps
                .name("seq")
                .map_or(Ok(0), |m| m.as_str().parse())
                .ok()?;
            return Some(Self {
                kind,
                path: path.to_path_buf(),
                source: dir.join(format!("{}.{}", &caps["stem"], ext)),
                created,
                sequence,
            });
        }

        let base = stem.strip_suffix("_cleaned").filter(|b| !b.is_empty())?;
        let created = path
            .metadata()
            .and_then(|m| m.modified())
            .map_or_else(|_| NaiveDateTime::default(), local_time);
        Some(Self {
            kind: ArtifactKind::Cleaned,
            path: path.to_path_buf(),
            source: dir.join(format!("{}.{}", base, ext)),
            created,
            sequence: 0,
        })
    }

    /// Whether this artifact belongs to `source`.
    #[must_use]
    pub fn belongs_to(&self, source: &Path) -> bool {
        self.source.file_name() == source.file_name()
    }
}

/// Split a source path into directory, stem, and extension.
fn split(source: &Path) -> (PathBuf, String, String) {
    let dir = source
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = source
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
    (dir, stem, ext)
}

/// Path of the cleaned output for `source`.
///
/// # Example
///
/// ```
/// use credupe::backup::cleaned_path;
/// use std::path::Path;
///
/// assert_eq!(cleaned_path(Path::new("/tmp/vault.csv")), Path::new("/tmp/vault_cleaned.csv"));
/// ```
#[must_use]
pub fn cleaned_path(source: &Path) -> PathBuf {
    let (dir, stem, ext) = split(source);
    dir.join(format!("{}_cleaned.{}", stem, ext))
}

/// Path of a timestamped artifact, without collision handling.
#[must_use]
pub fn artifact_path(source: &Path, kind: ArtifactKind, at: &NaiveDateTime) -> PathBuf {
    let (dir, stem, ext) = split(source);
    dir.join(format!(
        "{}_{}_{}.{}",
        stem,
        kind.marker(),
        at.format(TIMESTAMP_FORMAT),
        ext
    ))
}

/// A timestamped artifact path that does not exist yet.
#[must_use]
pub fn unique_artifact_path(source: &Path, kind: ArtifactKind, at: &NaiveDateTime) -> PathBuf {
    let first = artifact_path(source, kind, at);
    if !first.exists() {
        return first;
    }

    let (dir, stem, ext) = split(source);
    let stamp = at.format(TIMESTAMP_FORMAT).to_string();
    (1u32..)
        .map(|n| dir.join(format!("{}_{}_{}_{}.{}", stem, kind.marker(), stamp, n, ext)))
        .find(|p| !p.exists())
        .unwrap_or(first)
}

/// Current local time, truncated to the artifact timestamp resolution.
#[must_use]
pub fn now() -> NaiveDateTime {
    local_time(SystemTime::now())
}

fn local_time(time: SystemTime) -> NaiveDateTime {
    let local: DateTime<Local> = time.into();
    let naive = local.naive_local();
    naive.with_nanosecond(0).unwrap_or(naive)
}
