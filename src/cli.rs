//! Command-line interface definitions for treecmp.
//!
//! This module defines all CLI arguments, subcommands, and options using the clap derive API.
//! Global options (verbosity, color, error format, config file) apply to every subcommand.
//!
//! # Example
//!
//! ```bash
//! # Compare a tree against its backup, printing duplicates (default)
//! treecmp scan ~/photos /mnt/backup/photos
//!
//! # Only list what is missing from the backup, one path per line
//! treecmp scan ~/photos /mnt/backup/photos --hide-same --show-miss --simple
//!
//! # Compare three mirrors, ignoring editor swap files
//! treecmp scan /srv/a /srv/b /srv/c -e '*.swp'
//!
//! # Show the merged configuration
//! treecmp config
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::report::Side;

/// Level-synchronized directory tree comparison.
///
/// treecmp walks two or more directory trees depth by depth and reports each
/// file as duplicate, different or missing relative to the first tree.
#[derive(Debug, Parser)]
#[command(name = "treecmp")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors and classification records
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Report fatal errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for treecmp.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compare two or more directory trees
    Scan(ScanArgs),
    /// Print the effective configuration
    Config(ConfigArgs),
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directories to compare; every one after the first is compared to the first
    #[arg(value_name = "ROOT", num_args = 2.., required = true)]
    pub roots: Vec<PathBuf>,

    /// Only compare file names matching PATTERN (repeatable)
    ///
    /// `*` matches any run of characters and `?` a single one; the rest is
    /// regular expression syntax. Patterns must match the whole name.
    #[arg(short, long, value_name = "PATTERN")]
    pub include: Vec<String>,

    /// Skip file names matching PATTERN (repeatable)
    #[arg(short, long, value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Compare by file size only, without hashing contents
    #[arg(long)]
    pub just_name: bool,

    /// Report present files whose sizes differ as different instead of missing
    #[arg(long)]
    pub split_size_mismatch: bool,

    /// Print files whose contents differ
    #[arg(long)]
    pub show_diff: bool,

    /// Print files missing under one of the roots
    #[arg(long)]
    pub show_miss: bool,

    /// Do not print duplicate files
    #[arg(long)]
    pub hide_same: bool,

    /// For missing files, print the side that is absent instead of the one present
    #[arg(long)]
    pub invert: bool,

    /// Prefix of duplicate records (escape sequences allowed)
    #[arg(long, value_name = "TEXT", value_parser = parse_escapes)]
    pub pre_dup: Option<String>,

    /// Prefix of different records (escape sequences allowed)
    #[arg(long, value_name = "TEXT", value_parser = parse_escapes)]
    pub pre_diff: Option<String>,

    /// Prefix of missing records (escape sequences allowed)
    #[arg(long, value_name = "TEXT", value_parser = parse_escapes)]
    pub pre_miss: Option<String>,

    /// Text written before every record (escape sequences allowed)
    #[arg(long, value_name = "TEXT", value_parser = parse_escapes)]
    pub pre_divider: Option<String>,

    /// Text written after every record (escape sequences allowed)
    #[arg(long, value_name = "TEXT", value_parser = parse_escapes)]
    pub post_divider: Option<String>,

    /// Text between the two paths of a record (escape sequences allowed)
    #[arg(long, value_name = "TEXT", value_parser = parse_escapes)]
    pub separator: Option<String>,

    /// Bare paths: no duplicate/different prefixes, one record per line
    #[arg(long)]
    pub simple: bool,

    /// Print only one side of duplicate/different pairs (1 = first root, 2 = other root)
    #[arg(long = "log", value_name = "SIDE", value_parser = parse_side)]
    pub side: Option<Side>,

    /// Number of threads comparing files within a level (1 = no pool)
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,

    /// Format of the summary written to stderr
    #[arg(long, value_enum, default_value = "text")]
    pub summary: SummaryFormat,
}

/// Arguments for the config subcommand.
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Print the default configuration file path instead of its contents
    #[arg(long)]
    pub path: bool,
}

/// Summary format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SummaryFormat {
    /// Human-readable counts and timings
    #[default]
    Text,
    /// ScanSummary as JSON
    Json,
}

impl std::fmt::Display for SummaryFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummaryFormat::Text => write!(f, "text"),
            SummaryFormat::Json => write!(f, "json"),
        }
    }
}

/// Parse the `--log` side selector.
///
/// # Errors
///
/// Returns an error for anything but `1` or `2`.
pub fn parse_side(s: &str) -> Result<Side, String> {
    match s.trim() {
        "1" => Ok(Side::First),
        "2" => Ok(Side::Second),
        other => Err(format!("Invalid side '{other}': expected 1 or 2")),
    }
}

/// Decode C-style escape sequences in a record template.
///
/// Supports `\n \t \v \b \r \f \a \\ \' \" \?`, octal `\NNN` (one to three
/// digits) and hex `\xHH` (one or two digits).
///
/// # Examples
///
/// ```
/// use treecmp::cli::parse_escapes;
///
/// assert_eq!(parse_escapes("a\\tb").unwrap(), "a\tb");
/// assert_eq!(parse_escapes("\\x41\\101").unwrap(), "AA");
/// assert!(parse_escapes("\\q").is_err());
/// ```
///
/// # Errors
///
/// Returns an error on an unknown escape, a trailing backslash, `\x`
/// without hex digits, or a numeric escape outside ASCII. Templates are
/// written as UTF-8 text, so a single raw byte above `0x7F` cannot be
/// produced.
pub fn parse_escapes(s: &str) -> Result<String, String> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        let Some(esc) = chars.next() else {
            return Err("Trailing backslash".to_string());
        };
        let decoded = match esc {
            'n' => '\n',
            't' => '\t',
            'v' => '\x0B',
            'b' => '\x08',
            'r' => '\r',
            'f' => '\x0C',
            'a' => '\x07',
            '\\' => '\\',
            '\'' => '\'',
            '"' => '"',
            '?' => '?',
            '0'..='7' => {
                let mut value = esc.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            value = value * 8 + d;
                            chars.next();
                        }
                        None => break,
                    }
                }
                byte_char(value)?
            }
            'x' => {
                let mut value = 0;
                let mut digits = 0;
                while digits < 2 {
                    match chars.peek().and_then(|d| d.to_digit(16)) {
                        Some(d) => {
                            value = value * 16 + d;
                            digits += 1;
                            chars.next();
                        }
                        None => break,
                    }
                }
                if digits == 0 {
                    return Err("\\x used with no following hex digits".to_string());
                }
                byte_char(value)?
            }
            other => return Err(format!("Unknown escape sequence: \\{other}")),
        };
        out.push(decoded);
    }

    Ok(out)
}

/// Octal escapes reach 0o777; keep only the low byte, which must be ASCII.
fn byte_char(value: u32) -> Result<char, String> {
    let byte = (value & 0xFF) as u8;
    if byte.is_ascii() {
        Ok(char::from(byte))
    } else {
        Err(format!("Escape value {byte:#04x} is not ASCII"))
    }
}
