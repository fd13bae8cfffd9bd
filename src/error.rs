//! Error type shared by every stage of a benchmark run.

use std::io;
use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BenchError>;

/// Errors raised while provisioning, populating or querying an experiment.
#[derive(Debug, Error)]
pub enum BenchError {
    /// SQLite reported a failure.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// I/O error while exporting results.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// CSV export failed.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    /// JSON export failed.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    /// The config file could not be loaded.
    #[error(transparent)]
    Config(#[from] crate::options::ConfigError),
    /// The movie or hall roster has no entries to reference.
    #[error("roster has no {0}")]
    EmptyRoster(&'static str),
    /// Options failed validation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// A phase finished without timing a single lookup.
    #[error("no lookups were sampled")]
    NoSamples,
    /// The populated table does not hold the requested number of rows.
    #[error("{schema} holds {actual} shows, expected {expected}")]
    RowCountMismatch {
        /// Schema that was populated.
        schema: String,
        /// Requested row count.
        expected: u64,
        /// Rows actually present.
        actual: u64,
    },
    /// A lookup returned different rows once the index existed.
    #[error("lookup {probe} in {schema} changed after indexing: {before} rows before, {after} after")]
    IndexChangedResults {
        /// Schema under test.
        schema: String,
        /// Human-readable probe description.
        probe: String,
        /// Row count before the index was created.
        before: usize,
        /// Row count after the index was created.
        after: usize,
    },
}
