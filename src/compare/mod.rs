//! Multi-root tree comparison.
//!
//! This module provides the level-synchronized scanner that walks every root
//! one depth at a time:
//! - Listing the current frontier directories under each root
//! - Reconciling file and directory names into shared relative paths
//! - Classifying each file by size, then by BLAKE3 hash
//!
//! Relative paths are kept in [`BTreeSet`]s so every depth is compared in a
//! stable, lexicographic order regardless of how many worker threads hash.

pub mod level;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use level::{CompareError, LevelScanner, ScanConfig, ScanSummary};

/// Relative directory paths to inspect at one depth.
pub type Frontier = BTreeSet<PathBuf>;

/// Filtered relative file paths discovered at one depth.
pub type CandidateSet = BTreeSet<PathBuf>;

/// The frontier the scan starts from: the roots themselves.
#[must_use]
pub fn root_frontier() -> Frontier {
    let mut frontier = Frontier::new();
    frontier.insert(PathBuf::new());
    frontier
}

/// Join a relative key onto a root. The empty key resolves to the root itself.
#[must_use]
pub fn resolve(root: &Path, rel: &Path) -> PathBuf {
    if rel.as_os_str().is_empty() {
        root.to_path_buf()
    } else {
        root.join(rel)
    }
}

/// How candidate files are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareMode {
    /// Equal sizes are confirmed with a content hash
    #[default]
    Content,
    /// File size is the only signal; nothing is hashed
    Name,
}

/// Classification of two present files whose sizes differ (content mode).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeMismatch {
    /// Report as missing, like a true absence
    #[default]
    Missing,
    /// Report as different
    Different,
}
