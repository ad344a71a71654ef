//! Classification reporting.
//!
//! The [`Reporter`] receives one [`Outcome`] per compared file, bumps the
//! matching counter, and writes a formatted record to its sink when the
//! corresponding `show_*` flag is enabled. Records are shaped purely by the
//! strings in [`OutputConfig`]; nothing downstream parses them.
//!
//! Record layout:
//!
//! ```text
//! duplicate: pre_divider pre_dup  [path1 separator] [path2] post_divider
//! different: pre_divider pre_diff [path1 separator] [path2] post_divider
//! missing:   pre_divider pre_missing shown_path post_divider
//! ```
//!
//! The bracketed parts depend on [`Side`]. For missing records the shown
//! path is the side that exists, or the side that is absent when `invert`
//! is set.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Which paths of a duplicate/different pair are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Print both paths
    #[default]
    Both,
    /// Print only the path under the first root
    First,
    /// Print only the path under the other root
    Second,
}

impl Side {
    fn shows_first(self) -> bool {
        matches!(self, Side::Both | Side::First)
    }

    fn shows_second(self) -> bool {
        matches!(self, Side::Both | Side::Second)
    }
}

/// Output shaping for classification records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Emit duplicate records
    pub show_same: bool,
    /// Emit different records
    pub show_diff: bool,
    /// Emit missing records
    pub show_miss: bool,
    /// Prefix of duplicate records
    pub pre_dup: String,
    /// Prefix of different records
    pub pre_diff: String,
    /// Prefix of missing records
    pub pre_missing: String,
    /// Written before every record
    pub pre_divider: String,
    /// Written after every record
    pub post_divider: String,
    /// Written after the first path of a pair
    pub separator: String,
    /// Which side of a pair is printed
    pub side: Side,
    /// Print the absent side of missing records instead of the present one
    pub invert: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            show_same: true,
            show_diff: false,
            show_miss: false,
            pre_dup: "==".to_string(),
            pre_diff: "!= ".to_string(),
            pre_missing: "-- ".to_string(),
            pre_divider: String::new(),
            post_divider: "\n__\n".to_string(),
            separator: "\n".to_string(),
            side: Side::Both,
            invert: false,
        }
    }
}

impl OutputConfig {
    /// Bare paths only: no duplicate/different prefixes, one record per line.
    #[must_use]
    pub fn simple(mut self) -> Self {
        self.pre_dup.clear();
        self.pre_diff.clear();
        self.post_divider = "\n".to_string();
        self
    }
}

/// Running classification counts for one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    /// Files identical under the compared roots
    pub duplicates: u64,
    /// Files present under the compared roots with different content
    pub differences: u64,
    /// Files absent under at least one root (or differing in size)
    pub missing: u64,
    /// File names rejected by the path filter
    pub skipped: u64,
    /// Directories that could not be listed
    pub unreadable_dirs: u64,
}

impl Counters {
    /// Number of files classified or skipped.
    #[must_use]
    pub fn files(&self) -> u64 {
        self.duplicates + self.differences + self.missing + self.skipped
    }
}

/// The classification of one relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Same content under both paths
    Duplicate {
        /// Path under the reference root
        first: PathBuf,
        /// Path under the compared root
        other: PathBuf,
    },
    /// Both present, content differs
    Different {
        /// Path under the reference root
        first: PathBuf,
        /// Path under the compared root
        other: PathBuf,
    },
    /// Absent (or a size mismatch) on at least one side
    Missing {
        /// Path under the reference root
        first: PathBuf,
        /// Whether the file exists under the reference root
        first_present: bool,
        /// Path under the compared root
        other: PathBuf,
        /// Whether the file exists under the compared root
        other_present: bool,
    },
}

/// Counts outcomes and writes formatted records.
#[derive(Debug)]
pub struct Reporter<W: Write> {
    out: W,
    config: OutputConfig,
    counters: Counters,
}

impl<W: Write> Reporter<W> {
    /// Create a reporter writing to `out`.
    pub fn new(out: W, config: OutputConfig) -> Self {
        Self {
            out,
            config,
            counters: Counters::default(),
        }
    }

    /// Current counts.
    #[must_use]
    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    /// Mutable access for stages that count outside classification (skips,
    /// unreadable directories).
    pub fn counters_mut(&mut self) -> &mut Counters {
        &mut self.counters
    }

    /// The output configuration in effect.
    #[must_use]
    pub fn config(&self) -> &OutputConfig {
        &self.config
    }

    /// Consume the reporter, returning the sink.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Flush the underlying sink.
    ///
    /// # Errors
    ///
    /// Propagates write errors from the sink.
    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    /// Report one outcome.
    ///
    /// # Errors
    ///
    /// Propagates write errors from the sink.
    pub fn report(&mut self, outcome: &Outcome) -> io::Result<()> {
        match outcome {
            Outcome::Duplicate { first, other } => self.report_duplicate(first, other),
            Outcome::Different { first, other } => self.report_different(first, other),
            Outcome::Missing {
                first,
                first_present,
                other,
                other_present,
            } => self.report_missing(*first_present, first, *other_present, other),
        }
    }

    /// Count a duplicate and print it when `show_same` is set.
    ///
    /// # Errors
    ///
    /// Propagates write errors from the sink.
    pub fn report_duplicate(&mut self, path1: &Path, path2: &Path) -> io::Result<()> {
        self.counters.duplicates += 1;
        if !self.config.show_same {
            return Ok(());
        }
        let prefix = self.config.pre_dup.clone();
        self.write_pair(&prefix, path1, path2)
    }

    /// Count a difference and print it when `show_diff` is set.
    ///
    /// # Errors
    ///
    /// Propagates write errors from the sink.
    pub fn report_different(&mut self, path1: &Path, path2: &Path) -> io::Result<()> {
        self.counters.differences += 1;
        if !self.config.show_diff {
            return Ok(());
        }
        let prefix = self.config.pre_diff.clone();
        self.write_pair(&prefix, path1, path2)
    }

    /// Count a missing file and print it when `show_miss` is set.
    ///
    /// # Errors
    ///
    /// Propagates write errors from the sink.
    pub fn report_missing(
        &mut self,
        present1: bool,
        path1: &Path,
        _present2: bool,
        path2: &Path,
    ) -> io::Result<()> {
        self.counters.missing += 1;
        if !self.config.show_miss {
            return Ok(());
        }
        let shown = if present1 != self.config.invert {
            path1
        } else {
            path2
        };
        let cfg = &self.config;
        write!(
            self.out,
            "{}{}{}{}",
            cfg.pre_divider,
            cfg.pre_missing,
            shown.display(),
            cfg.post_divider
        )
    }

    fn write_pair(&mut self, prefix: &str, path1: &Path, path2: &Path) -> io::Result<()> {
        let cfg = &self.config;
        write!(self.out, "{}{}", cfg.pre_divider, prefix)?;
        if cfg.side.shows_first() {
            write!(self.out, "{}{}", path1.display(), cfg.separator)?;
        }
        if cfg.side.shows_second() {
            write!(self.out, "{}", path2.display())?;
        }
        write!(self.out, "{}", cfg.post_divider)
    }
}
