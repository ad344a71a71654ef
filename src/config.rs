//! Application configuration management.
//!
//! Settings are layered with figment, later layers overriding earlier ones:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config FILE`, else `config.toml` in the platform config directory)
//! 3. Environment variables prefixed `TREECMP_` (nested keys joined with `__`,
//!    e.g. `TREECMP_OUTPUT__SHOW_MISS=true`)
//! 4. Command-line flags, applied by [`Config::apply_scan_args`]
//!
//! # Example file
//!
//! ```toml
//! exclude = ["*.swp", "Thumbs.db"]
//! io_threads = 2
//!
//! [output]
//! show_same = false
//! show_miss = true
//! post_divider = "\n"
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::ScanArgs;
use crate::compare::{CompareMode, ScanConfig, SizeMismatch};
use crate::filter::{FilterError, PatternFilter};
use crate::report::OutputConfig;

/// Prefix of environment variables read into the configuration.
pub const ENV_PREFIX: &str = "TREECMP_";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// File name patterns to compare (empty = all)
    pub include: Vec<String>,
    /// File name patterns to skip
    pub exclude: Vec<String>,
    /// Compare by size only
    pub just_name: bool,
    /// Classification of present files with different sizes
    pub size_mismatch: SizeMismatch,
    /// Threads comparing files within a level
    pub io_threads: usize,
    /// Record formatting
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            exclude: Vec::new(),
            just_name: false,
            size_mismatch: SizeMismatch::Missing,
            io_threads: 4,
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Load defaults, the config file and the environment.
    ///
    /// An explicit `path` must exist; the default location is optional.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit file is missing or any layer fails to
    /// parse into [`Config`].
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => {
                if !p.is_file() {
                    anyhow::bail!("Config file not found: {}", p.display());
                }
                Some(p.to_path_buf())
            }
            None => Self::config_path(),
        };

        let config: Config = Self::figment(file.as_deref())
            .extract()
            .context("Failed to load configuration")?;
        log::debug!(
            "Configuration loaded (file: {})",
            file.as_deref()
                .map_or_else(|| "none".to_string(), |p| p.display().to_string())
        );
        Ok(config)
    }

    /// The figment stack for `file`, before command-line overrides.
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(file) = file {
            figment = figment.merge(Toml::file(file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Default platform-specific configuration path.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "treecmp", "treecmp")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Apply command-line flags on top of the loaded layers.
    ///
    /// `--simple` is applied before the individual template flags so an
    /// explicit `--post-divider` still wins.
    pub fn apply_scan_args(&mut self, args: &ScanArgs) {
        self.include.extend(args.include.iter().cloned());
        self.exclude.extend(args.exclude.iter().cloned());
        if args.just_name {
            self.just_name = true;
        }
        if args.split_size_mismatch {
            self.size_mismatch = SizeMismatch::Different;
        }
        if let Some(threads) = args.io_threads {
            self.io_threads = threads;
        }

        let out = &mut self.output;
        if args.simple {
            *out = std::mem::take(out).simple();
        }
        if args.show_diff {
            out.show_diff = true;
        }
        if args.show_miss {
            out.show_miss = true;
        }
        if args.hide_same {
            out.show_same = false;
        }
        if args.invert {
            out.invert = true;
        }
        if let Some(side) = args.side {
            out.side = side;
        }

        let templates = [
            (&args.pre_dup, &mut out.pre_dup),
            (&args.pre_diff, &mut out.pre_diff),
            (&args.pre_miss, &mut out.pre_missing),
            (&args.pre_divider, &mut out.pre_divider),
            (&args.post_divider, &mut out.post_divider),
            (&args.separator, &mut out.separator),
        ];
        for (flag, field) in templates {
            if let Some(value) = flag {
                field.clone_from(value);
            }
        }
    }

    /// The comparison mode selected by `just_name`.
    #[must_use]
    pub fn compare_mode(&self) -> CompareMode {
        if self.just_name {
            CompareMode::Name
        } else {
            CompareMode::Content
        }
    }

    /// Scanner settings from this configuration.
    #[must_use]
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig::default()
            .with_mode(self.compare_mode())
            .with_size_mismatch(self.size_mismatch)
            .with_io_threads(self.io_threads)
    }

    /// Compile the include and exclude patterns.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidPattern`] for the first bad pattern.
    pub fn build_filter(&self) -> Result<PatternFilter, FilterError> {
        PatternFilter::new(&self.include, &self.exclude)
    }

    /// Render as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}
