//! Backups, deleted-entry archives, and undo.
//!
//! # Overview
//!
//! Destructive runs leave a trail of sibling artifacts next to the source
//! file (see [`artifact`] for the naming scheme):
//! - a verified backup copy taken before anything is written
//! - the cleaned output
//! - an archive of exactly the deleted records
//!
//! [`restore`] reverses a run from either the backup or the archive.

pub mod artifact;

pub use artifact::{
    artifact_path, cleaned_path, unique_artifact_path, Artifact, ArtifactKind, TIMESTAMP_FORMAT,
};

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::records::{load_records, write_records, RecordSet, StoreError};

/// Errors from backup and restore operations.
#[derive(Debug, Error)]
pub enum BackupError {
    /// The backup copy could not be created.
    #[error("failed to back up {source_path} to {path}: {source}")]
    BackupFailed {
        /// File being backed up
        source_path: PathBuf,
        /// Attempted backup path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The backup copy does not match the source byte for byte.
    #[error("backup {0} does not match its source")]
    VerifyFailed(PathBuf),

    /// Reading or writing records failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Restoring an archive needs the cleaned file it was split from.
    #[error("cleaned file not found: {0}")]
    CleanedFileMissing(PathBuf),

    /// Overwriting the source requires confirmation.
    #[error("restore over {0} was not confirmed")]
    NotConfirmed(PathBuf),

    /// The artifact kind cannot be restored.
    #[error("cannot restore from {kind} artifact {path}")]
    Unsupported {
        /// Kind of the artifact
        kind: ArtifactKind,
        /// Path of the artifact
        path: PathBuf,
    },

    /// The path does not follow the artifact naming convention.
    #[error("not a recognized artifact: {0}")]
    UnknownArtifact(PathBuf),

    /// A directory could not be read while listing artifacts.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// Result of a restore.
#[derive(Debug, Clone)]
pub struct RestoreOutcome {
    /// File written by the restore
    pub path: PathBuf,
    /// Records now in that file
    pub records: RecordSet,
    /// Cleaned file the archive was paired with (archive restores only)
    pub cleaned_path: Option<PathBuf>,
    /// Rows taken from the cleaned file (archive restores only)
    pub cleaned_rows: usize,
    /// Rows taken from the archive or backup
    pub restored_rows: usize,
}

/// Copy the untouched source to a timestamped sibling and verify the copy.
///
/// # Errors
///
/// Returns `BackupError::BackupFailed` if the copy fails and
/// `BackupError::VerifyFailed` if the copy differs from the source; a
/// mismatched copy is removed.
pub fn backup(source: &Path) -> Result<PathBuf, BackupError> {
    let path = unique_artifact_path(source, ArtifactKind::Backup, &artifact::now());
    let failed = |source_err: io::Error| BackupError::BackupFailed {
        source_path: source.to_path_buf(),
        path: path.clone(),
        source: source_err,
    };

    fs::copy(source, &path).map_err(failed)?;

    let expected = file_digest(source).map_err(failed)?;
    let actual = file_digest(&path).map_err(failed)?;
    if expected != actual {
        if let Err(e) = fs::remove_file(&path) {
            log::warn!("Failed to remove bad backup {}: {}", path.display(), e);
        }
        return Err(BackupError::VerifyFailed(path));
    }

    log::info!("Backed up {} to {}", source.display(), path.display());
    Ok(path)
}

/// Write deleted records to a timestamped archive.
///
/// Returns `Ok(None)` and writes nothing when `deleted` is empty.
///
/// # Errors
///
/// Returns `BackupError::Store` if the archive cannot be written.
pub fn archive_deleted(deleted: &RecordSet, source: &Path) -> Result<Option<PathBuf>, BackupError> {
    if deleted.is_empty() {
        return Ok(None);
    }
    let path = unique_artifact_path(source, ArtifactKind::DeletedEntries, &artifact::now());
    write_records(deleted, &path)?;
    log::info!("Archived {} deleted rows to {}", deleted.len(), path.display());
    Ok(Some(path))
}

/// List artifacts belonging to `source`, newest first.
///
/// # Errors
///
/// Returns `BackupError::Io` if the source directory cannot be read.
pub fn list_backups(source: &Path) -> Result<Vec<Artifact>, BackupError> {
    let dir = match source.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let entries = fs::read_dir(&dir).map_err(|e| BackupError::Io {
        path: dir.clone(),
        source: e,
    })?;

    let mut artifacts: Vec<Artifact> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
        .filter_map(|entry| Artifact::from_path(&entry.path()))
        .filter(|artifact| artifact.belongs_to(source))
        .collect();

    artifacts.sort_by(|a, b| {
        (b.created, b.sequence, &b.path).cmp(&(a.created, a.sequence, &a.path))
    });
    log::debug!("Found {} artifacts for {}", artifacts.len(), source.display());
    Ok(artifacts)
}

/// Reconstruct a prior state from an artifact.
///
/// - A backup overwrites its source, and requires `confirmed`.
/// - A deleted-entries archive is appended to the default cleaned file
///   (`<base>_cleaned.<ext>`) and written to a new timestamped `restored`
///   file; the source is untouched. Rows are not reinserted at their original
///   positions.
///
/// The default cleaned file is only the right pair when the run that wrote
/// the archive used the default output path and no later run replaced it.
/// Use [`restore_with_cleaned`] to pair an archive with a cleaned file
/// written elsewhere.
///
/// # Errors
///
/// Returns `BackupError::NotConfirmed`, `CleanedFileMissing`, `Unsupported`,
/// or a wrapped I/O or store error.
pub fn restore(artifact: &Artifact, confirmed: bool) -> Result<RestoreOutcome, BackupError> {
    restore_with_cleaned(artifact, confirmed, None)
}

/// Like [`restore`], pairing an archive with an explicit cleaned file.
///
/// `cleaned` is ignored for backups. When it is `None`, archives pair with
/// [`cleaned_path`] of their source.
///
/// # Errors
///
/// See [`restore`].
pub fn restore_with_cleaned(
    artifact: &Artifact,
    confirmed: bool,
    cleaned: Option<&Path>,
) -> Result<RestoreOutcome, BackupError> {
    match artifact.kind {
        ArtifactKind::Backup => {
            if !confirmed {
                return Err(BackupError::NotConfirmed(artifact.source.clone()));
            }
            // Parse first so an unreadable backup never replaces the source.
            let loaded = load_records(&artifact.path)?;
            fs::copy(&artifact.path, &artifact.source).map_err(|e| BackupError::Io {
                path: artifact.source.clone(),
                source: e,
            })?;
            log::info!(
                "Restored {} from {}",
                artifact.source.display(),
                artifact.path.display()
            );
            Ok(RestoreOutcome {
                path: artifact.source.clone(),
                cleaned_path: None,
                cleaned_rows: 0,
                restored_rows: loaded.records.len(),
                records: loaded.records,
            })
        }
        ArtifactKind::DeletedEntries => {
            let cleaned = cleaned.map_or_else(|| cleaned_path(&artifact.source), Path::to_path_buf);
            if !cleaned.is_file() {
                return Err(BackupError::CleanedFileMissing(cleaned));
            }
            let kept = load_records(&cleaned)?.records;
            let deleted = load_records(&artifact.path)?.records;
            let combined = RecordSet::concat(&kept, &deleted);

            let path =
                unique_artifact_path(&artifact.source, ArtifactKind::Restored, &artifact::now());
            write_records(&combined, &path)?;
            log::info!(
                "Restored {} archived rows onto {} rows of {} into {}",
                deleted.len(),
                kept.len(),
                cleaned.display(),
                path.display()
            );
            Ok(RestoreOutcome {
                path,
                cleaned_path: Some(cleaned),
                cleaned_rows: kept.len(),
                restored_rows: deleted.len(),
                records: combined,
            })
        }
        kind => Err(BackupError::Unsupported {
            kind,
            path: artifact.path.clone(),
        }),
    }
}

/// Recognize an artifact path, or fail.
///
/// # Errors
///
/// Returns `BackupError::UnknownArtifact` for names outside the convention.
pub fn parse_artifact(path: &Path) -> Result<Artifact, BackupError> {
    Artifact::from_path(path).ok_or_else(|| BackupError::UnknownArtifact(path.to_path_buf()))
}

fn file_digest(path: &Path) -> io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_vec())
}
