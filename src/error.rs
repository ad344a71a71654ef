//! Structured error handling and exit codes.

use serde::Serialize;

use crate::compare::ScanSummary;

/// Exit codes for treecmp.
///
/// - 0: Success (every compared file is a duplicate)
/// - 1: General error (bad arguments, unreadable root, write failure)
/// - 2: Mismatch (at least one file is different or missing)
/// - 3: Partial success (completed, but some directories could not be listed)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Trees match.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// Scan completed and found differences or missing files.
    Mismatch = 2,
    /// Partial success: Scan completed but some directories were unreadable.
    PartialSuccess = 3,
    /// Interrupted: Scan was interrupted by user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "TC000",
            Self::GeneralError => "TC001",
            Self::Mismatch => "TC002",
            Self::PartialSuccess => "TC003",
            Self::Interrupted => "TC130",
        }
    }

    /// Exit code for a completed (or stopped) scan.
    ///
    /// Interruption wins over unreadable directories, which win over mismatches.
    #[must_use]
    pub fn from_summary(summary: &ScanSummary) -> Self {
        if summary.interrupted {
            Self::Interrupted
        } else if summary.unreadable_dirs > 0 {
            Self::PartialSuccess
        } else if !summary.trees_match() {
            Self::Mismatch
        } else {
            Self::Success
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "TC001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
