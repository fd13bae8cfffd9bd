//! Benchmark configuration.
//!
//! Options start from built-in defaults, may be overridden by the `[bench]`
//! table of a TOML config file, and finally by command-line flags.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{BenchError, Result};
use crate::model::{DEFAULT_HALLS, DEFAULT_MOVIES};
use crate::sizes::build_size_sequence;
use crate::store::SchemaBacking;

/// Largest supported exponent; `10^9` rows is already far beyond a laptop run.
pub const MAX_EXPONENT_LIMIT: u32 = 9;

/// Widest accepted lookup half width: the length of the screening calendar.
pub const MAX_WINDOW_HOURS: i64 = 24 * 364;

/// Knobs for a benchmark run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BenchOptions {
    /// SQLite connection string: a file path or `:memory:`.
    pub database: String,
    /// Sizes run from `10^1` to `10^max_exponent` rows.
    pub max_exponent: u32,
    /// Timed lookups per phase.
    pub samples: usize,
    /// Shows inserted per transaction.
    pub batch_size: usize,
    /// Base RNG seed; each size derives its own stream from it.
    pub seed: u64,
    /// Movies in the roster.
    pub movies: usize,
    /// Halls in the roster.
    pub halls: usize,
    /// Half width, in hours, of each lookup's time range.
    pub window_hours: i64,
    /// Pre-index lookups replayed after indexing to confirm identical results.
    pub verify_probes: usize,
    /// Storage for attached experiment schemas.
    pub schema_backing: SchemaBacking,
}

impl Default for BenchOptions {
    fn default() -> Self {
        Self {
            database: ":memory:".to_string(),
            max_exponent: 6,
            samples: 50,
            batch_size: 10_000,
            seed: 42,
            movies: DEFAULT_MOVIES,
            halls: DEFAULT_HALLS,
            window_hours: 2,
            verify_probes: 5,
            schema_backing: SchemaBacking::Memory,
        }
    }
}

impl BenchOptions {
    /// Rejects option combinations that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<()> {
        if self.max_exponent == 0 || self.max_exponent > MAX_EXPONENT_LIMIT {
            return Err(invalid(format!(
                "max_exponent must be between 1 and {MAX_EXPONENT_LIMIT}, got {}",
                self.max_exponent
            )));
        }
        if self.samples == 0 {
            return Err(invalid("samples must be greater than zero".into()));
        }
        if self.batch_size == 0 {
            return Err(invalid("batch_size must be greater than zero".into()));
        }
        if self.movies == 0 || self.halls == 0 {
            return Err(invalid("roster needs at least one movie and one hall".into()));
        }
        if self.window_hours <= 0 || self.window_hours > MAX_WINDOW_HOURS {
            return Err(invalid(format!(
                "window_hours must be between 1 and {MAX_WINDOW_HOURS}, got {}",
                self.window_hours
            )));
        }
        if self.database.trim().is_empty() {
            return Err(invalid("database must not be empty".into()));
        }
        Ok(())
    }

    /// Half width of every lookup window.
    pub fn window_half_width(&self) -> time::Duration {
        time::Duration::hours(self.window_hours)
    }

    /// The ordered row counts this run will measure.
    pub fn sizes(&self) -> Vec<usize> {
        build_size_sequence(self.max_exponent)
    }
}

fn invalid(message: String) -> BenchError {
    BenchError::InvalidArgument(message)
}

/// Errors raised while reading a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// Config file location.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The file is not valid TOML or has unknown keys.
    #[error("failed to parse config {path}: {source}")]
    Parse {
        /// Config file location.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    bench: BenchOptions,
}

/// Loads options from `explicit`, or from the default config path if a file
/// exists there, or falls back to the defaults.
///
/// An explicitly named file must exist.
pub fn load_options(explicit: Option<&Path>) -> std::result::Result<BenchOptions, ConfigError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(BenchOptions::default()),
        },
    };
    let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    parse_options(&contents).map_err(|source| ConfigError::Parse { path, source })
}

/// Parses the `[bench]` table of a config document.
pub fn parse_options(contents: &str) -> std::result::Result<BenchOptions, toml::de::Error> {
    let raw: RawConfig = toml::from_str(contents)?;
    Ok(raw.bench)
}

/// `<config dir>/indexlab/config.toml`, when the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("indexlab").join("config.toml"))
}
