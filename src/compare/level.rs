//! Level-synchronized scanner.
//!
//! # Overview
//!
//! [`LevelScanner`] advances every root one directory depth at a time:
//! 1. **List**: read each frontier directory under each root, collecting
//!    filtered file names and subdirectory names as shared relative paths
//! 2. **Compare**: classify each candidate file by size, then by hash when
//!    all sizes agree
//! 3. **Advance**: the collected subdirectories become the next frontier
//!
//! The walk stops when a depth yields no subdirectories. Every root after
//! the first is compared against the first (the reference root).
//!
//! # Example
//!
//! ```no_run
//! use treecmp::compare::{LevelScanner, ScanConfig};
//! use treecmp::filter::PatternFilter;
//! use treecmp::report::{OutputConfig, Reporter};
//! use std::path::PathBuf;
//!
//! let scanner = LevelScanner::new(PatternFilter::accept_all(), ScanConfig::default()).unwrap();
//! let mut reporter = Reporter::new(std::io::stdout(), OutputConfig::default());
//! let roots = vec![PathBuf::from("/data"), PathBuf::from("/backup/data")];
//!
//! let summary = scanner.run_scan(&roots, &mut reporter).unwrap();
//! println!("{} duplicates, {} missing", summary.duplicates, summary.missing);
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;

use super::{resolve, root_frontier, CandidateSet, CompareMode, Frontier, SizeMismatch};
use crate::filter::{FilterError, PathFilter, PatternFilter};
use crate::progress::ProgressCallback;
use crate::report::{Counters, Outcome, Reporter};
use crate::scanner::{ContentHasher, DirectoryLister, EntryKind, FsLister, Hash, Hasher};

/// Configuration for the level scanner.
#[derive(Clone)]
pub struct ScanConfig {
    /// Size-only or size-then-hash comparison.
    pub mode: CompareMode,
    /// How present files with different sizes are classified.
    pub size_mismatch: SizeMismatch,
    /// Worker threads for per-level classification (1 = inline).
    pub io_threads: usize,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for ScanConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanConfig")
            .field("mode", &self.mode)
            .field("size_mismatch", &self.size_mismatch)
            .field("io_threads", &self.io_threads)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            mode: CompareMode::Content,
            size_mismatch: SizeMismatch::Missing,
            io_threads: 4,
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl ScanConfig {
    /// Set the comparison mode.
    #[must_use]
    pub fn with_mode(mut self, mode: CompareMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set how size mismatches between present files are classified.
    #[must_use]
    pub fn with_size_mismatch(mut self, size_mismatch: SizeMismatch) -> Self {
        self.size_mismatch = size_mismatch;
        self
    }

    /// Set the number of classification threads.
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Summary of one scan invocation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanSummary {
    /// Files identical under the compared roots
    pub duplicates: u64,
    /// Files present under the compared roots with different content
    pub differences: u64,
    /// Files absent under at least one root (or differing in size)
    pub missing: u64,
    /// File names rejected by the path filter
    pub skipped: u64,
    /// Number of depths processed
    pub depths_visited: usize,
    /// Directories that could not be listed
    pub unreadable_dirs: u64,
    /// Whether the scan stopped early on a shutdown request
    pub interrupted: bool,
    /// When the scan started
    pub started_at: DateTime<Utc>,
    /// Wall time of the scan
    pub duration: Duration,
}

impl ScanSummary {
    /// Total files classified or skipped.
    #[must_use]
    pub fn total_files(&self) -> u64 {
        self.duplicates + self.differences + self.missing + self.skipped
    }

    /// True when every compared file was a duplicate.
    #[must_use]
    pub fn trees_match(&self) -> bool {
        self.differences == 0 && self.missing == 0
    }

    fn from_counters(before: &Counters, after: &Counters) -> Self {
        Self {
            duplicates: after.duplicates - before.duplicates,
            differences: after.differences - before.differences,
            missing: after.missing - before.missing,
            skipped: after.skipped - before.skipped,
            unreadable_dirs: after.unreadable_dirs - before.unreadable_dirs,
            ..Self::default()
        }
    }
}

/// Errors that stop a scan before or during traversal.
#[derive(thiserror::Error, Debug)]
pub enum CompareError {
    /// Fewer than two roots were given.
    #[error("At least two directories are required, got {0}")]
    TooFewRoots(usize),

    /// A root does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// A root is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A filter pattern is invalid.
    #[error(transparent)]
    Filter(#[from] FilterError),

    /// The classification thread pool could not be created.
    #[error("Failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Writing a record to the report sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Files and subdirectories found at one depth.
#[derive(Debug, Default)]
struct LevelListing {
    files: CandidateSet,
    subdirs: Frontier,
}

/// Breadth-first comparison of several roots, one depth at a time.
pub struct LevelScanner<L = FsLister, H = Hasher, F = PatternFilter> {
    lister: L,
    hasher: H,
    filter: F,
    config: ScanConfig,
    pool: Option<rayon::ThreadPool>,
}

impl LevelScanner {
    /// Create a scanner over the real filesystem with the BLAKE3 hasher.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::ThreadPool`] if the worker pool cannot be built.
    pub fn new(filter: PatternFilter, config: ScanConfig) -> Result<Self, CompareError> {
        let mut hasher = Hasher::new();
        if let Some(ref flag) = config.shutdown_flag {
            hasher = hasher.with_shutdown_flag(Arc::clone(flag));
        }
        Self::with_components(FsLister::new(), hasher, filter, config)
    }
}

impl<L, H, F> LevelScanner<L, H, F>
where
    L: DirectoryLister,
    H: ContentHasher,
    F: PathFilter,
{
    /// Create a scanner from explicit lister, hasher and filter.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::ThreadPool`] if the worker pool cannot be built.
    pub fn with_components(
        lister: L,
        hasher: H,
        filter: F,
        config: ScanConfig,
    ) -> Result<Self, CompareError> {
        let pool = if config.io_threads > 1 {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(config.io_threads)
                    .thread_name(|i| format!("treecmp-io-{i}"))
                    .build()?,
            )
        } else {
            None
        };

        Ok(Self {
            lister,
            hasher,
            filter,
            config,
            pool,
        })
    }

    /// The configuration in effect.
    #[must_use]
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Compare all roots level by level until no subdirectories remain.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError`] if the roots are invalid or the report sink
    /// fails. Unreadable directories and unhashable files are not errors.
    pub fn run_scan<W: Write>(
        &self,
        roots: &[PathBuf],
        reporter: &mut Reporter<W>,
    ) -> Result<ScanSummary, CompareError> {
        validate_roots(roots)?;

        let start = Instant::now();
        let started_at = Utc::now();
        let before = *reporter.counters();

        log::info!(
            "Comparing {} roots: {}",
            roots.len(),
            roots
                .iter()
                .map(|r| r.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let mut frontier = root_frontier();
        let mut depth = 0;
        let mut depths_visited = 0;
        loop {
            depths_visited += 1;
            if !self.advance_level(depth, roots, &mut frontier, reporter)? {
                break;
            }
            depth += 1;
        }
        reporter.flush()?;

        let mut summary = ScanSummary::from_counters(&before, reporter.counters());
        summary.depths_visited = depths_visited;
        summary.interrupted = self.config.is_shutdown_requested();
        summary.started_at = started_at;
        summary.duration = start.elapsed();

        if summary.interrupted {
            log::info!("Scan interrupted after {} levels", depths_visited);
        } else {
            log::info!(
                "Scan complete: {} levels, {} duplicates, {} different, {} missing, {} skipped",
                summary.depths_visited,
                summary.duplicates,
                summary.differences,
                summary.missing,
                summary.skipped
            );
        }

        Ok(summary)
    }

    /// Compare the files of one depth and replace `frontier` with the next one.
    ///
    /// Returns whether the new frontier is non-empty. A shutdown request
    /// ends the walk: the frontier is cleared and `false` is returned.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::Io`] if the report sink fails.
    pub fn advance_level<W: Write>(
        &self,
        depth: usize,
        roots: &[PathBuf],
        frontier: &mut Frontier,
        reporter: &mut Reporter<W>,
    ) -> Result<bool, CompareError> {
        log::debug!("Level {}: {} directories in frontier", depth, frontier.len());

        // One listing pass serves both the candidate files and the next frontier
        let listing = self.list_level(roots, frontier, reporter.counters_mut());
        log::debug!(
            "Level {}: {} candidate files, {} subdirectories",
            depth,
            listing.files.len(),
            listing.subdirs.len()
        );

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_level_start(depth, listing.files.len());
        }
        self.compare_and_report(roots, &listing.files, reporter)?;
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_level_end(depth);
        }

        if self.config.is_shutdown_requested() {
            log::debug!("Level {}: shutdown requested, stopping walk", depth);
            frontier.clear();
            return Ok(false);
        }

        *frontier = listing.subdirs;
        Ok(!frontier.is_empty())
    }

    /// Collect the filtered relative file paths under `frontier` across all roots.
    ///
    /// Rejected names, and entries that are neither regular files nor
    /// directories, are counted in `counters.skipped`. Directories that
    /// exist but cannot be listed are counted in `counters.unreadable_dirs`.
    ///
    /// [`advance_level`](Self::advance_level) gets this set and the one from
    /// [`collect_subdirectories`](Self::collect_subdirectories) from a
    /// single listing pass, so each directory is read once per level.
    pub fn collect_files(
        &self,
        roots: &[PathBuf],
        frontier: &Frontier,
        counters: &mut Counters,
    ) -> CandidateSet {
        self.list_level(roots, frontier, counters).files
    }

    /// Collect the relative subdirectory paths under `frontier` across all roots.
    ///
    /// Directory names are not filtered. Skips and unreadable directories are
    /// attributed by [`collect_files`](Self::collect_files) only, so calling
    /// both for one level never counts them twice.
    pub fn collect_subdirectories(&self, roots: &[PathBuf], frontier: &Frontier) -> Frontier {
        self.list_level(roots, frontier, &mut Counters::default())
            .subdirs
    }

    fn list_level(
        &self,
        roots: &[PathBuf],
        frontier: &Frontier,
        counters: &mut Counters,
    ) -> LevelListing {
        let mut listing = LevelListing::default();

        for rel_dir in frontier {
            for root in roots {
                if self.config.is_shutdown_requested() {
                    return listing;
                }

                let dir = resolve(root, rel_dir);
                let entries = match self.lister.list(&dir) {
                    Ok(entries) => entries,
                    Err(e) if e.is_absent() => {
                        // Present under another root only
                        log::debug!("No directory at {}: {}", dir.display(), e);
                        continue;
                    }
                    Err(e) => {
                        log::warn!("Cannot list {}, treating as empty: {}", dir.display(), e);
                        counters.unreadable_dirs += 1;
                        continue;
                    }
                };

                for entry in entries {
                    let rel = rel_dir.join(&entry.name);
                    match entry.kind {
                        EntryKind::Dir => {
                            listing.subdirs.insert(rel);
                        }
                        EntryKind::File if self.filter.accepts(&entry.name.to_string_lossy()) => {
                            listing.files.insert(rel);
                        }
                        EntryKind::File => {
                            log::trace!(
                                "Skipping filtered file: {}",
                                entry.full_path(&dir).display()
                            );
                            counters.skipped += 1;
                        }
                        EntryKind::Other => {
                            log::debug!(
                                "Skipping special entry: {}",
                                entry.full_path(&dir).display()
                            );
                            counters.skipped += 1;
                        }
                    }
                }
            }
        }

        listing
    }

    /// Classify every candidate and report the outcomes in candidate order.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::Io`] if the report sink fails.
    pub fn compare_and_report<W: Write>(
        &self,
        roots: &[PathBuf],
        candidates: &CandidateSet,
        reporter: &mut Reporter<W>,
    ) -> Result<(), CompareError> {
        let items: Vec<&PathBuf> = candidates.iter().collect();
        let classify = |(idx, rel): (usize, &&PathBuf)| {
            if let Some(ref callback) = self.config.progress_callback {
                callback.on_progress(idx + 1, &rel.to_string_lossy());
            }
            self.classify(roots, rel)
        };

        // Ordered collection keeps the report deterministic under parallel hashing
        let outcomes: Vec<Option<Outcome>> = match self.pool {
            Some(ref pool) => pool.install(|| items.par_iter().enumerate().map(classify).collect()),
            None => items.iter().enumerate().map(classify).collect(),
        };

        for outcome in outcomes.into_iter().flatten() {
            reporter.report(&outcome)?;
        }
        Ok(())
    }

    /// Classify one relative path across all roots.
    ///
    /// Returns `None` only when shutdown was requested before a decision
    /// was reached.
    pub fn classify(&self, roots: &[PathBuf], rel: &Path) -> Option<Outcome> {
        if self.config.is_shutdown_requested() {
            return None;
        }

        let paths: Vec<PathBuf> = roots.iter().map(|root| resolve(root, rel)).collect();
        let sizes: Vec<Option<u64>> = paths.iter().map(|p| self.lister.file_len(p)).collect();

        match self.config.mode {
            CompareMode::Name => Some(classify_by_size(&paths, &sizes)),
            CompareMode::Content => self.classify_by_content(&paths, &sizes),
        }
    }

    fn classify_by_content(&self, paths: &[PathBuf], sizes: &[Option<u64>]) -> Option<Outcome> {
        let reference = sizes[0];

        if let Some(i) = first_mismatch(sizes) {
            let outcome = match (reference, sizes[i], self.config.size_mismatch) {
                (Some(_), Some(_), SizeMismatch::Different) => different(paths, i),
                _ => missing(paths, 0, reference.is_some(), i, sizes[i].is_some()),
            };
            return Some(outcome);
        }
        if reference.is_none() {
            return Some(vanished(paths));
        }

        log::trace!("Sizes match, hashing {}", paths[0].display());
        let Some(first_hash) = self.hash(&paths[0]) else {
            return self.unless_cancelled(missing(paths, 0, false, 1, true));
        };
        for i in 1..paths.len() {
            match self.hash(&paths[i]) {
                None => return self.unless_cancelled(missing(paths, 0, true, i, false)),
                Some(hash) if hash != first_hash => return Some(different(paths, i)),
                Some(_) => {}
            }
        }

        Some(duplicate(paths))
    }

    fn hash(&self, path: &Path) -> Option<Hash> {
        match self.hasher.digest(path) {
            Ok(hash) => Some(hash),
            Err(e) => {
                if !self.config.is_shutdown_requested() {
                    log::warn!("Failed to hash {}, treating as absent: {}", path.display(), e);
                }
                None
            }
        }
    }

    fn unless_cancelled(&self, outcome: Outcome) -> Option<Outcome> {
        if self.config.is_shutdown_requested() {
            None
        } else {
            Some(outcome)
        }
    }
}

fn validate_roots(roots: &[PathBuf]) -> Result<(), CompareError> {
    if roots.len() < 2 {
        return Err(CompareError::TooFewRoots(roots.len()));
    }
    for root in roots {
        if !root.exists() {
            return Err(CompareError::PathNotFound(root.clone()));
        }
        if !root.is_dir() {
            return Err(CompareError::NotADirectory(root.clone()));
        }
    }
    Ok(())
}

/// Index of the first root whose size disagrees with the reference root.
fn first_mismatch(sizes: &[Option<u64>]) -> Option<usize> {
    (1..sizes.len()).find(|&i| sizes[i] != sizes[0])
}

fn classify_by_size(paths: &[PathBuf], sizes: &[Option<u64>]) -> Outcome {
    match first_mismatch(sizes) {
        Some(i) if sizes[0].is_some() && sizes[i].is_some() => different(paths, i),
        Some(i) => missing(paths, 0, sizes[0].is_some(), i, sizes[i].is_some()),
        None if sizes[0].is_none() => vanished(paths),
        None => duplicate(paths),
    }
}

fn duplicate(paths: &[PathBuf]) -> Outcome {
    Outcome::Duplicate {
        first: paths[0].clone(),
        other: paths[1].clone(),
    }
}

fn different(paths: &[PathBuf], other: usize) -> Outcome {
    Outcome::Different {
        first: paths[0].clone(),
        other: paths[other].clone(),
    }
}

fn missing(
    paths: &[PathBuf],
    first: usize,
    first_present: bool,
    other: usize,
    other_present: bool,
) -> Outcome {
    Outcome::Missing {
        first: paths[first].clone(),
        first_present,
        other: paths[other].clone(),
        other_present,
    }
}

/// Listed at this depth but gone under every root by the time it was compared.
fn vanished(paths: &[PathBuf]) -> Outcome {
    log::debug!("File disappeared during scan: {}", paths[0].display());
    missing(paths, 0, false, 1, false)
}
