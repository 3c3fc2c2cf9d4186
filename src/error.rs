//! Exit codes and structured error output.

use serde::Serialize;

use crate::backup::BackupError;
use crate::cleanup::CleanupError;

/// Process exit codes.
///
/// - 0: Success
/// - 1: General error
/// - 2: Nothing to do (no duplicates, confirmation declined, or no artifacts)
/// - 3: Partial success (some artifact could not be written)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Completed normally
    Success = 0,
    /// Unexpected failure or fatal input
    GeneralError = 1,
    /// Completed with nothing to change
    NothingToDo = 2,
    /// Completed, but an artifact write failed
    PartialSuccess = 3,
    /// Interrupted by the user
    Interrupted = 130,
}

impl ExitCode {
    /// Numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "CD000",
            Self::GeneralError => "CD001",
            Self::NothingToDo => "CD002",
            Self::PartialSuccess => "CD003",
            Self::Interrupted => "CD130",
        }
    }

    /// Classify an error returned from the application.
    #[must_use]
    pub fn from_error(err: &anyhow::Error) -> Self {
        let interrupted = err.chain().any(|cause| {
            matches!(
                cause.downcast_ref::<CleanupError>(),
                Some(CleanupError::Interrupted)
            )
        });
        if interrupted {
            Self::Interrupted
        } else {
            Self::GeneralError
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "CD001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including causes
    pub message: String,
    /// Whether the run was interrupted
    pub interrupted: bool,
    /// Suggested next step, when one is known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl StructuredError {
    /// Create a structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{:#}", err),
            interrupted: exit_code == ExitCode::Interrupted,
            hint: hint_for(err),
        }
    }
}

/// A remediation hint for well-known failures.
#[must_use]
pub fn hint_for(err: &anyhow::Error) -> Option<String> {
    for cause in err.chain() {
        if let Some(CleanupError::Group(group)) = cause.downcast_ref::<CleanupError>() {
            return Some(format!(
                "{}; try --policy uri-username for exports without passwords",
                group
            ));
        }
        if let Some(CleanupError::ConfirmationRequired) = cause.downcast_ref::<CleanupError>() {
            return Some("run from a terminal or pass --yes".to_string());
        }
        if let Some(BackupError::CleanedFileMissing(path)) = cause.downcast_ref::<BackupError>() {
            return Some(format!(
                "restore needs {} next to the archive",
                path.display()
            ));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::NothingToDo.as_i32(), 2);
        assert_eq!(ExitCode::Interrupted.as_i32(), 130);
        assert_eq!(ExitCode::PartialSuccess.code_prefix(), "CD003");
    }

    #[test]
    fn test_interrupted_is_detected_through_context() {
        let err = anyhow::Error::new(CleanupError::Interrupted).context("cleaning vault.csv");
        assert_eq!(ExitCode::from_error(&err), ExitCode::Interrupted);
    }

    #[test]
    fn test_structured_error_fields() {
        let err = anyhow::anyhow!("boom");
        let structured = StructuredError::new(&err, ExitCode::GeneralError);
        assert_eq!(structured.code, "CD001");
        assert_eq!(structured.message, "boom");
        assert!(!structured.interrupted);
        assert!(structured.hint.is_none());
    }

    #[test]
    fn test_hint_for_missing_confirmation() {
        let err = anyhow::Error::new(CleanupError::ConfirmationRequired);
        assert!(hint_for(&err).unwrap().contains("--yes"));
    }
}
