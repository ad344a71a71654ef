//! treecmp - Level-synchronized directory tree comparison
//!
//! treecmp walks two or more directory trees in lockstep, one depth at a
//! time, and classifies every file it finds as a duplicate, a difference or
//! missing relative to the first tree. Sizes are compared first and BLAKE3
//! content hashes only when sizes agree.
//!
//! The library is organized as:
//! - [`scanner`]: single-directory listing and file hashing
//! - [`filter`]: include/exclude file name patterns
//! - [`compare`]: the level scanner and classification protocol
//! - [`report`]: record formatting and classification counters
//! - [`output`]: end-of-scan summaries (text and JSON)

pub mod cli;
pub mod compare;
pub mod config;
pub mod error;
pub mod filter;
pub mod logging;
pub mod output;
pub mod progress;
pub mod report;
pub mod scanner;
pub mod signal;

use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use cli::{Cli, Commands, ConfigArgs, ScanArgs, SummaryFormat};
use compare::LevelScanner;
use config::Config;
use error::ExitCode;
use output::{JsonSummary, TextSummary};
use progress::Progress;
use report::Reporter;

/// Run the parsed command line and return the process exit code.
///
/// # Errors
///
/// Returns an error for invalid configuration, invalid roots, or a failure
/// writing records to stdout.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        yansi::disable();
    }

    match &cli.command {
        Commands::Scan(args) => run_scan(&cli, args),
        Commands::Config(args) => run_config(cli.config.as_deref(), args),
    }
}

fn run_scan(cli: &Cli, args: &ScanArgs) -> Result<ExitCode> {
    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_scan_args(args);
    log::debug!("Effective configuration: {:?}", config);

    let filter = config.build_filter().context("Invalid filter pattern")?;
    let handler = signal::install_handler()?;

    let scan_config = config
        .scan_config()
        .with_shutdown_flag(handler.get_flag())
        .with_progress_callback(Arc::new(Progress::new(cli.quiet)));
    let scanner = LevelScanner::new(filter, scan_config)?;

    let stdout = io::stdout();
    let mut reporter = Reporter::new(BufWriter::new(stdout.lock()), config.output.clone());
    let summary = scanner
        .run_scan(&args.roots, &mut reporter)
        .context("Scan failed")?;
    drop(reporter);

    let exit_code = ExitCode::from_summary(&summary);
    let mut stderr = io::stderr().lock();
    match args.summary {
        SummaryFormat::Json => {
            JsonSummary::new(&summary, &args.roots, exit_code).write_to(&mut stderr)?;
        }
        SummaryFormat::Text if !cli.quiet => {
            let text = TextSummary::new(&summary)
                .with_color(!cli.no_color)
                .render();
            stderr.write_all(text.as_bytes())?;
        }
        SummaryFormat::Text => {}
    }

    Ok(exit_code)
}

fn run_config(explicit: Option<&Path>, args: &ConfigArgs) -> Result<ExitCode> {
    if args.path {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(Config::config_path)
            .context("Failed to determine project directories")?;
        println!("{}", path.display());
        return Ok(ExitCode::Success);
    }

    let config = Config::load(explicit)?;
    print!("{}", config.to_toml()?);
    Ok(ExitCode::Success)
}
