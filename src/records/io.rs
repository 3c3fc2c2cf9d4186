//! CSV loading, writing, and column enumeration.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::validate::{inspect_records, ValidationWarning};
use super::{RecordSet, REQUIRED_COLUMNS};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Fatal input and storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The input file does not exist.
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// The input path is not a regular file.
    #[error("not a file: {0}")]
    NotAFile(PathBuf),

    /// The input file has zero bytes.
    #[error("file is empty: {0}")]
    Empty(PathBuf),

    /// The file has no header row.
    #[error("no columns found in {0}")]
    NoColumns(PathBuf),

    /// One or more required columns are absent.
    #[error("missing required columns in {path}: {}", missing.join(", "))]
    MissingColumns {
        /// File that was loaded
        path: PathBuf,
        /// Names of the absent columns
        missing: Vec<String>,
    },

    /// The file could not be parsed as CSV.
    #[error("failed to parse {path}: {source}")]
    Csv {
        /// File that was being read or written
        path: PathBuf,
        /// Underlying CSV error
        #[source]
        source: csv::Error,
    },

    /// An I/O error occurred for a specific path.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    /// Path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p) | Self::NotAFile(p) | Self::Empty(p) | Self::NoColumns(p) => p,
            Self::MissingColumns { path, .. } | Self::Csv { path, .. } | Self::Io { path, .. } => {
                path
            }
        }
    }
}

/// Thresholds controlling large-file handling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingLimits {
    /// Files above this size produce a [`ValidationWarning::LargeFile`].
    pub large_file_warn_mb: f64,
    /// Files above this size are only sampled when enumerating columns.
    pub sample_threshold_mb: f64,
    /// Number of data rows read when sampling.
    pub sample_rows: usize,
}

impl Default for SamplingLimits {
    fn default() -> Self {
        Self {
            large_file_warn_mb: 100.0,
            sample_threshold_mb: 500.0,
            sample_rows: 100,
        }
    }
}

/// A loaded file plus the non-fatal findings from loading it.
#[derive(Debug, Clone)]
pub struct LoadedRecords {
    /// Records in file order
    pub records: RecordSet,
    /// Validation warnings; never block processing
    pub warnings: Vec<ValidationWarning>,
    /// Size of the source file in megabytes
    pub size_mb: f64,
}

/// Result of column enumeration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnListing {
    /// Column names in file order
    pub columns: Vec<String>,
    /// Total data rows, or `None` when only a sample was read
    pub row_count: Option<usize>,
    /// Size of the file in megabytes
    pub size_mb: f64,
    /// Whether only a prefix of the file was read
    pub sampled: bool,
    /// Validation warnings (large file)
    pub warnings: Vec<ValidationWarning>,
}

/// Check that a path names a readable, non-empty regular file.
///
/// # Returns
///
/// The file size in bytes.
///
/// # Errors
///
/// Returns `StoreError::NotFound`, `NotAFile`, `Empty`, or `Io`.
pub fn validate_input(path: &Path) -> Result<u64, StoreError> {
    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(StoreError::NotFound(path.to_path_buf()))
        }
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    if !metadata.is_file() {
        return Err(StoreError::NotAFile(path.to_path_buf()));
    }
    if metadata.len() == 0 {
        return Err(StoreError::Empty(path.to_path_buf()));
    }
    Ok(metadata.len())
}

/// Load a CSV export into memory with the default [`SamplingLimits`].
///
/// # Errors
///
/// See [`load_records_with_limits`].
pub fn load_records(path: &Path) -> Result<LoadedRecords, StoreError> {
    load_records_with_limits(path, &SamplingLimits::default())
}

/// Load a CSV export into memory.
///
/// The whole file is read; required columns must be present. Non-fatal
/// findings are returned as warnings. Files larger than
/// `limits.large_file_warn_mb` produce a [`ValidationWarning::LargeFile`].
///
/// # Errors
///
/// Any `StoreError` is fatal: nothing is returned and no state is kept.
pub fn load_records_with_limits(
    path: &Path,
    limits: &SamplingLimits,
) -> Result<LoadedRecords, StoreError> {
    let size = validate_input(path)?;
    let size_mb = size as f64 / BYTES_PER_MB;

    let mut reader = open_reader(path)?;
    let headers: Vec<String> = reader
        .headers()
        .map_err(|source| csv_error(path, source))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(String::is_empty) {
        return Err(StoreError::NoColumns(path.to_path_buf()));
    }

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !headers.iter().any(|h| h == *c))
        .map(|c| (*c).to_string())
        .collect();
    if !missing.is_empty() {
        return Err(StoreError::MissingColumns {
            path: path.to_path_buf(),
            missing,
        });
    }

    let width = headers.len();
    let mut records = RecordSet::new(headers);
    let mut ragged = 0usize;

    for row in reader.records() {
        let row = row.map_err(|source| csv_error(path, source))?;
        if row.len() != width {
            ragged += 1;
        }
        records.push(row.iter().map(str::to_string).collect());
    }

    log::info!(
        "Loaded {} rows with {} columns from {}",
        records.len(),
        records.headers().len(),
        path.display()
    );

    let mut warnings = inspect_records(&records);
    if ragged > 0 {
        warnings.push(ValidationWarning::RaggedRows { count: ragged });
    }
    if size_mb > limits.large_file_warn_mb {
        warnings.push(ValidationWarning::LargeFile { size_mb });
    }
    for warning in &warnings {
        log::warn!("{}", warning);
    }

    Ok(LoadedRecords {
        records,
        warnings,
        size_mb,
    })
}

/// Write records to a CSV file through the output projection.
///
/// Transient derived columns are never written; all other columns keep the
/// source order.
///
/// # Errors
///
/// Returns `StoreError::Csv` or `StoreError::Io` with the attempted path.
pub fn write_records(records: &RecordSet, path: &Path) -> Result<(), StoreError> {
    let file = File::create(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = csv::Writer::from_writer(file);

    let columns = records.output_columns();
    writer
        .write_record(columns.iter().map(|&i| records.headers()[i].as_str()))
        .map_err(|source| csv_error(path, source))?;

    for record in records {
        writer
            .write_record(columns.iter().map(|&i| record.field(i)))
            .map_err(|source| csv_error(path, source))?;
    }

    writer.flush().map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    log::debug!("Wrote {} rows to {}", records.len(), path.display());
    Ok(())
}

/// Enumerate the columns of a CSV file.
///
/// Files above `limits.sample_threshold_mb` are only sampled: the header and
/// the first `limits.sample_rows` rows are read, and no total row count is
/// reported. This path never mutates anything.
///
/// # Errors
///
/// Returns a `StoreError` if the file is missing, empty, or unparseable.
pub fn list_columns(path: &Path, limits: &SamplingLimits) -> Result<ColumnListing, StoreError> {
    let size = validate_input(path)?;
    let size_mb = size as f64 / BYTES_PER_MB;

    let mut warnings = Vec::new();
    if size_mb > limits.large_file_warn_mb {
        let warning = ValidationWarning::LargeFile { size_mb };
        log::warn!("{}", warning);
        warnings.push(warning);
    }

    let mut reader = open_reader(path)?;
    let columns: Vec<String> = reader
        .headers()
        .map_err(|source| csv_error(path, source))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if columns.iter().all(String::is_empty) {
        return Err(StoreError::NoColumns(path.to_path_buf()));
    }

    let sampled = size_mb > limits.sample_threshold_mb;
    let row_count = if sampled {
        log::debug!(
            "Sampling {} rows of {} ({:.1}MB)",
            limits.sample_rows,
            path.display(),
            size_mb
        );
        for row in reader.records().take(limits.sample_rows) {
            row.map_err(|source| csv_error(path, source))?;
        }
        None
    } else {
        let mut count = 0usize;
        for row in reader.records() {
            row.map_err(|source| csv_error(path, source))?;
            count += 1;
        }
        Some(count)
    };

    Ok(ColumnListing {
        columns,
        row_count,
        size_mb,
        sampled,
        warnings,
    })
}

fn open_reader(path: &Path) -> Result<csv::Reader<File>, StoreError> {
    let file = File::open(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(csv::ReaderBuilder::new().flexible(true).from_reader(file))
}

fn csv_error(path: &Path, source: csv::Error) -> StoreError {
    StoreError::Csv {
        path: path.to_path_buf(),
        source,
    }
}
