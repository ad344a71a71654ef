//! JSON summary formatter.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "roots": ["/data", "/backup/data"],
//!   "duplicates": 120,
//!   "differences": 2,
//!   "missing": 5,
//!   "skipped": 0,
//!   "files": 127,
//!   "depths_visited": 4,
//!   "unreadable_dirs": 0,
//!   "interrupted": false,
//!   "started_at": "2026-10-16T09:30:00Z",
//!   "duration_ms": 842,
//!   "exit_code": 2,
//!   "exit_code_name": "TC002"
//! }
//! ```

use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::compare::ScanSummary;
use crate::error::ExitCode;

/// Scan summary in JSON form.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Compared roots, reference first
    pub roots: Vec<String>,
    /// Files identical under the compared roots
    pub duplicates: u64,
    /// Files present under the compared roots with different content
    pub differences: u64,
    /// Files absent under at least one root
    pub missing: u64,
    /// File names rejected by the path filter
    pub skipped: u64,
    /// Sum of the four counts above
    pub files: u64,
    /// Number of depths processed
    pub depths_visited: usize,
    /// Directories that could not be listed
    pub unreadable_dirs: u64,
    /// Whether the scan was interrupted
    pub interrupted: bool,
    /// Scan start (UTC)
    pub started_at: DateTime<Utc>,
    /// Wall time in milliseconds
    pub duration_ms: u64,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "TC000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Build from a scan summary and the exit code it maps to.
    #[must_use]
    pub fn new(summary: &ScanSummary, roots: &[PathBuf], exit_code: ExitCode) -> Self {
        Self {
            roots: roots
                .iter()
                .map(|r| r.to_string_lossy().into_owned())
                .collect(),
            duplicates: summary.duplicates,
            differences: summary.differences,
            missing: summary.missing,
            skipped: summary.skipped,
            files: summary.total_files(),
            depths_visited: summary.depths_visited,
            unreadable_dirs: summary.unreadable_dirs,
            interrupted: summary.interrupted,
            started_at: summary.started_at,
            duration_ms: u64::try_from(summary.duration.as_millis()).unwrap_or(u64::MAX),
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }

    /// Compact JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write pretty JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), JsonOutputError> {
        let json = self.to_json_pretty()?;
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization failed.
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Writing the output failed.
    #[error("I/O error during JSON output: {0}")]
    Io(#[from] std::io::Error),
}
