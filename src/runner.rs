//! Drives one experiment per table size against a shared connection.

use std::time::Instant;

use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info};

use crate::data_generator::{LookupProbe, ShowGenerator, TimeWindow};
use crate::error::{BenchError, Result};
use crate::model::{Roster, Show};
use crate::options::BenchOptions;
use crate::store::{open_connection, ExperimentSchema};
use crate::timing::{format_secs, time_lookup, LatencySamples, LatencySummary};

/// Outcome of measuring one table size.
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentResult {
    /// Requested number of shows.
    pub size: usize,
    /// Schema the experiment ran in.
    pub schema: String,
    /// Shows counted before the schema was dropped.
    pub rows: u64,
    /// Lookup latency on the bare table.
    pub without_index: LatencySummary,
    /// Lookup latency once the composite index exists.
    pub with_index: LatencySummary,
    /// Whether the planner chose the composite index for the indexed phase.
    pub index_used: bool,
    /// Pre-index lookups replayed after indexing with identical results.
    pub verified_probes: usize,
    /// Seconds spent generating, inserting and analyzing shows.
    pub populate_secs: f64,
    /// Seconds spent building the index.
    pub index_build_secs: f64,
}

impl ExperimentResult {
    /// Ratio of mean latency without the index to mean latency with it.
    pub fn speedup(&self) -> f64 {
        self.without_index.mean_secs / self.with_index.mean_secs
    }
}

/// Runs experiments for every configured size over one SQLite connection.
pub struct BenchmarkRunner {
    conn: Connection,
    options: BenchOptions,
    roster: Roster,
    window: TimeWindow,
}

impl BenchmarkRunner {
    /// Validates `options` and opens the configured database.
    pub fn open(options: BenchOptions) -> Result<Self> {
        options.validate()?;
        let conn = open_connection(&options.database)?;
        let roster = Roster::new(options.movies, options.halls);
        Ok(Self {
            conn,
            options,
            roster,
            window: TimeWindow::default(),
        })
    }

    /// The shared connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Options the runner was opened with.
    pub fn options(&self) -> &BenchOptions {
        &self.options
    }

    fn seed_for(&self, size: usize) -> u64 {
        self.options.seed ^ (size as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
    }

    /// Measures every size of the configured sequence in ascending order.
    ///
    /// `on_result` is called after each size completes. The first failing
    /// size aborts the run.
    pub fn run_all<F>(&self, mut on_result: F) -> Result<Vec<ExperimentResult>>
    where
        F: FnMut(&ExperimentResult),
    {
        let sizes = self.options.sizes();
        let mut results = Vec::with_capacity(sizes.len());
        for size in sizes {
            let result = self.run_experiment(size)?;
            on_result(&result);
            results.push(result);
        }
        Ok(results)
    }

    /// Provisions `experiment_<size>`, populates it, times lookups without
    /// and with the composite index, then drops the schema.
    pub fn run_experiment(&self, size: usize) -> Result<ExperimentResult> {
        let opts = &self.options;
        ExperimentSchema::scoped(&self.conn, size, opts.schema_backing, |schema| {
            schema.create_tables()?;
            schema.insert_roster(&self.roster)?;
            let mut generator =
                ShowGenerator::new(&self.roster, self.window, self.seed_for(size))?;

            let populate_start = Instant::now();
            let mut inserted = 0usize;
            for batch in generator.batches(size, opts.batch_size) {
                inserted += schema.insert_shows(&batch)?;
                debug!(schema = schema.name(), inserted, size, "inserted batch");
            }
            let rows = schema.row_count()?;
            if rows != size as u64 {
                return Err(BenchError::RowCountMismatch {
                    schema: schema.name().to_string(),
                    expected: size as u64,
                    actual: rows,
                });
            }
            schema.analyze()?;
            let populate_secs = populate_start.elapsed().as_secs_f64();

            let half_width = opts.window_half_width();
            let baseline_probes: Vec<LookupProbe> =
                (0..opts.samples).map(|_| generator.probe(half_width)).collect();
            let (without_index, baseline) =
                measure(schema, &baseline_probes, opts.verify_probes)?;
            debug!(
                schema = schema.name(),
                mean = %format_secs(without_index.mean_secs),
                "measured without index"
            );

            let index_start = Instant::now();
            schema.create_hall_time_index()?;
            let index_build_secs = index_start.elapsed().as_secs_f64();

            let indexed_probes: Vec<LookupProbe> =
                (0..opts.samples).map(|_| generator.probe(half_width)).collect();
            let (with_index, _) = measure(schema, &indexed_probes, 0)?;
            let index_used = match indexed_probes.first() {
                Some(probe) => schema.uses_hall_time_index(probe)?,
                None => false,
            };
            let verified_probes = verify_unchanged(schema, &baseline_probes, &baseline)?;

            let result = ExperimentResult {
                size,
                schema: schema.name().to_string(),
                rows,
                without_index,
                with_index,
                index_used,
                verified_probes,
                populate_secs,
                index_build_secs,
            };
            info!(
                size,
                without = %format_secs(result.without_index.mean_secs),
                with = %format_secs(result.with_index.mean_secs),
                speedup = result.speedup(),
                index_used,
                "experiment complete"
            );
            Ok(result)
        })
    }
}

/// Times every probe, keeping the sorted result sets of the first `keep`.
fn measure(
    schema: &ExperimentSchema<'_>,
    probes: &[LookupProbe],
    keep: usize,
) -> Result<(LatencySummary, Vec<Vec<Show>>)> {
    let mut samples = LatencySamples::with_capacity(probes.len());
    let mut kept = Vec::with_capacity(keep.min(probes.len()));
    for (i, probe) in probes.iter().enumerate() {
        let (rows, elapsed) = time_lookup(|| schema.lookup(probe))?;
        samples.push(elapsed);
        if i < keep {
            kept.push(sorted_by_id(rows));
        }
    }
    let summary = samples.summary().ok_or(BenchError::NoSamples)?;
    Ok((summary, kept))
}

fn verify_unchanged(
    schema: &ExperimentSchema<'_>,
    probes: &[LookupProbe],
    baseline: &[Vec<Show>],
) -> Result<usize> {
    for (probe, before) in probes.iter().zip(baseline) {
        let after = sorted_by_id(schema.lookup(probe)?);
        if after != *before {
            return Err(BenchError::IndexChangedResults {
                schema: schema.name().to_string(),
                probe: probe.to_string(),
                before: before.len(),
                after: after.len(),
            });
        }
    }
    Ok(baseline.len())
}

fn sorted_by_id(mut rows: Vec<Show>) -> Vec<Show> {
    rows.sort_by(|a, b| a.id.cmp(&b.id));
    rows
}
