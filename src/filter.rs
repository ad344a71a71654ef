//! Include/exclude filename filtering.
//!
//! Patterns are regular expressions with two shell-style conveniences:
//! `*` is rewritten to `.*` and `?` to `.` before compiling. A pattern must
//! match the whole file name (it is anchored on both ends), so `*.txt`
//! accepts `notes.txt` but not `notes.txt.bak`.
//!
//! A name is accepted when it matches at least one include pattern (or no
//! include patterns are configured) and matches no exclude pattern.
//! Only file names are filtered; directories are always descended into.
//!
//! # Example
//!
//! ```
//! use treecmp::filter::{PathFilter, PatternFilter};
//!
//! let filter = PatternFilter::new(&["*.txt".to_string()], &["secret*".to_string()]).unwrap();
//! assert!(filter.accepts("notes.txt"));
//! assert!(!filter.accepts("secret.txt"));
//! assert!(!filter.accepts("image.png"));
//! ```

use regex::Regex;

/// Decides whether a candidate file name takes part in the comparison.
pub trait PathFilter: Send + Sync {
    /// Returns `true` when `name` should be compared.
    fn accepts(&self, name: &str) -> bool;
}

/// Errors raised while building a filter.
#[derive(thiserror::Error, Debug)]
pub enum FilterError {
    /// A configured pattern failed to compile.
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The pattern as given by the user
        pattern: String,
        /// The underlying regex error
        #[source]
        source: regex::Error,
    },
}

/// Filter backed by include and exclude pattern lists.
#[derive(Debug, Clone, Default)]
pub struct PatternFilter {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl PatternFilter {
    /// Compile the include and exclude pattern lists.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidPattern`] for the first pattern that
    /// does not compile. No partially built filter is returned.
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self, FilterError> {
        Ok(Self {
            include: compile_all(include)?,
            exclude: compile_all(exclude)?,
        })
    }

    /// A filter that accepts every name.
    #[must_use]
    pub fn accept_all() -> Self {
        Self::default()
    }

    /// Whether any pattern is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }
}

impl PathFilter for PatternFilter {
    fn accepts(&self, name: &str) -> bool {
        if !self.include.is_empty() && !self.include.iter().any(|re| re.is_match(name)) {
            return false;
        }
        !self.exclude.iter().any(|re| re.is_match(name))
    }
}

fn compile_all(patterns: &[String]) -> Result<Vec<Regex>, FilterError> {
    patterns.iter().map(|p| compile_pattern(p)).collect()
}

/// Compile one user pattern into an anchored regex.
///
/// # Errors
///
/// Returns [`FilterError::InvalidPattern`] if the rewritten pattern is not a
/// valid regular expression.
pub fn compile_pattern(pattern: &str) -> Result<Regex, FilterError> {
    let rewritten = pattern.replace('*', ".*").replace('?', ".");
    Regex::new(&format!("^(?:{rewritten})$")).map_err(|source| FilterError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}
