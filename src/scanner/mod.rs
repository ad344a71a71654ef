//! Scanner module for directory listing and file hashing.
//!
//! This module provides the two filesystem primitives the level scanner
//! is built on:
//! - Single-level directory listing backed by walkdir
//! - Content hashing with BLAKE3
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`lister`]: Immediate-entry enumeration of one directory
//! - [`hasher`]: BLAKE3 file hashing (streaming, mmap for large files)
//!
//! Both are exposed through traits ([`DirectoryLister`], [`ContentHasher`])
//! so the level scanner can be driven by other implementations in tests.
//!
//! # Example
//!
//! ```no_run
//! use treecmp::scanner::{DirectoryLister, FsLister};
//! use std::path::Path;
//!
//! let lister = FsLister::new();
//! match lister.list(Path::new(".")) {
//!     Ok(entries) => {
//!         for entry in entries {
//!             println!("{:?} {:?}", entry.name, entry.kind);
//!         }
//!     }
//!     Err(e) => eprintln!("Warning: {}", e),
//! }
//! ```

pub mod hasher;
pub mod lister;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

// Re-export main types
pub use hasher::{Hash, Hasher, MMAP_THRESHOLD};
pub use lister::FsLister;

/// What a listed entry is, after resolving symbolic links to files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A regular file, or a link to one
    File,
    /// A directory (links to directories are never descended into)
    Dir,
    /// Anything else: links to directories, dangling links, sockets, FIFOs, devices
    Other,
}

/// One immediate entry of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedEntry {
    /// File name of the entry (last path component)
    pub name: OsString,
    /// Resolved kind of the entry
    pub kind: EntryKind,
}

impl ListedEntry {
    /// Create a new ListedEntry.
    #[must_use]
    pub fn new(name: impl Into<OsString>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Whether the entry is a directory to descend into.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }

    /// Materialize the full path of this entry under `dir`.
    #[must_use]
    pub fn full_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.name)
    }
}

/// Enumerates the immediate entries of one directory.
pub trait DirectoryLister: Send + Sync {
    /// List the entries directly under `dir`.
    ///
    /// # Errors
    ///
    /// Returns a [`ScanError`] when the directory cannot be enumerated.
    fn list(&self, dir: &Path) -> Result<Vec<ListedEntry>, ScanError>;

    /// Size of the regular file at `path`, or `None` when it is absent,
    /// unreadable, or not a regular file.
    fn file_len(&self, path: &Path) -> Option<u64> {
        std::fs::metadata(path)
            .ok()
            .filter(std::fs::Metadata::is_file)
            .map(|m| m.len())
    }
}

/// Computes a fixed-width digest over a file's full contents.
pub trait ContentHasher: Send + Sync {
    /// Hash the contents of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`HashError`] when the file cannot be read.
    fn digest(&self, path: &Path) -> Result<Hash, HashError>;
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Build a ScanError from an I/O error, keeping the common kinds distinct.
    #[must_use]
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// Whether the path is simply not a directory under this root, as
    /// opposed to a directory that exists but could not be read.
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::NotADirectory(_))
    }
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Hashing was abandoned because shutdown was requested.
    #[error("Hashing interrupted: {0}")]
    Interrupted(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Build a HashError from an I/O error.
    #[must_use]
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}
