//! Measures how a composite `(hall_id, start_time)` index changes range-lookup
//! latency on a cinema show schedule as the table grows.
//!
//! Each table size runs in its own attached SQLite schema, is populated with
//! synthetic shows, timed without and with the index, and then dropped.

#![warn(missing_docs)]

pub mod chart;
pub mod data_generator;
pub mod error;
pub mod model;
pub mod options;
pub mod report;
pub mod runner;
pub mod sizes;
pub mod store;
pub mod timing;

pub use chart::render_chart;
pub use error::{BenchError, Result};
pub use options::BenchOptions;
pub use runner::{BenchmarkRunner, ExperimentResult};
pub use sizes::build_size_sequence;
