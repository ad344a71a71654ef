//! Single-level directory listing using walkdir.
//!
//! # Overview
//!
//! The level scanner never recurses on its own; it asks for the immediate
//! entries of one directory per root at each depth. [`FsLister`] answers that
//! with a walkdir iterator bounded to depth 1, sorted by file name so that
//! listings are deterministic.
//!
//! Symbolic links are never descended into. A link to a regular file is
//! listed as a file, so it is sized and hashed through its target; every
//! other link is [`EntryKind::Other`].

use std::path::Path;

use walkdir::WalkDir;

use super::{DirectoryLister, EntryKind, ListedEntry, ScanError};

/// Directory lister backed by the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLister;

impl FsLister {
    /// Create a new filesystem lister.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Resolve the kind of one entry without following directory links.
    fn entry_kind(entry: &walkdir::DirEntry) -> EntryKind {
        if entry.path_is_symlink() {
            return match std::fs::metadata(entry.path()) {
                Ok(target) if target.is_file() => EntryKind::File,
                _ => EntryKind::Other,
            };
        }

        let file_type = entry.file_type();
        if file_type.is_dir() {
            EntryKind::Dir
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        }
    }

    /// Handle walkdir errors for a single entry or the directory itself.
    fn convert_error(dir: &Path, error: walkdir::Error) -> ScanError {
        let path = error
            .path()
            .map_or_else(|| dir.to_path_buf(), std::borrow::ToOwned::to_owned);
        match error.into_io_error() {
            Some(io) => ScanError::from_io(&path, io),
            None => ScanError::Io {
                path,
                source: std::io::Error::other("filesystem loop detected"),
            },
        }
    }
}

impl DirectoryLister for FsLister {
    fn list(&self, dir: &Path) -> Result<Vec<ListedEntry>, ScanError> {
        let metadata = std::fs::metadata(dir).map_err(|e| ScanError::from_io(dir, e))?;
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory(dir.to_path_buf()));
        }

        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name();

        let mut entries = Vec::new();
        for entry in walker {
            match entry {
                Ok(entry) => {
                    let kind = Self::entry_kind(&entry);
                    log::trace!("Listed {} ({:?})", entry.path().display(), kind);
                    entries.push(ListedEntry::new(entry.file_name(), kind));
                }
                // The directory itself could not be read
                Err(e) if e.depth() == 0 => return Err(Self::convert_error(dir, e)),
                Err(e) => {
                    log::warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                }
            }
        }

        Ok(entries)
    }
}
