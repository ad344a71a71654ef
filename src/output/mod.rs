//! Scan summary formatters.
//!
//! Classification records go to stdout through [`Reporter`](crate::report::Reporter);
//! the end-of-scan summary goes to stderr in one of two formats:
//! - Text for people, optionally colored
//! - JSON for automation and scripting
//!
//! # Example
//!
//! ```no_run
//! use treecmp::compare::ScanSummary;
//! use treecmp::error::ExitCode;
//! use treecmp::output::{JsonSummary, TextSummary};
//!
//! let summary = ScanSummary::default();
//! eprint!("{}", TextSummary::new(&summary).render());
//!
//! let json = JsonSummary::new(&summary, &[], ExitCode::Success);
//! eprintln!("{}", json.to_json_pretty().unwrap());
//! ```

pub mod json;
pub mod text;

// Re-export main types
pub use json::{JsonOutputError, JsonSummary};
pub use text::TextSummary;
