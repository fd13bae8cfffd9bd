//! Human-readable and machine-readable summaries of a run.

use std::fs;
use std::path::{Path, PathBuf};

use csv::Writer;
use serde::Serialize;

use crate::error::Result;
use crate::runner::ExperimentResult;
use crate::timing::format_secs;

/// Formats one row per size: rows, mean latency without and with the index,
/// p95 of each phase and the speedup.
pub fn format_table(results: &[ExperimentResult]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:>10} {:>12} {:>12} {:>12} {:>12} {:>9} {:>6}\n",
        "ROWS", "NO INDEX", "NO IDX P95", "INDEX", "INDEX P95", "SPEEDUP", "PLAN"
    ));
    out.push_str(&"-".repeat(79));
    out.push('\n');
    for r in results {
        out.push_str(&format!(
            "{:>10} {:>12} {:>12} {:>12} {:>12} {:>8.1}x {:>6}\n",
            r.rows,
            format_secs(r.without_index.mean_secs),
            format_secs(r.without_index.p95_secs),
            format_secs(r.with_index.mean_secs),
            format_secs(r.with_index.p95_secs),
            r.speedup(),
            if r.index_used { "index" } else { "scan" },
        ));
    }
    out
}

#[derive(Debug, Serialize)]
struct ResultRecord {
    size: usize,
    rows: u64,
    without_index_mean_secs: f64,
    without_index_p95_secs: f64,
    with_index_mean_secs: f64,
    with_index_p95_secs: f64,
    speedup: f64,
    index_used: bool,
    verified_probes: usize,
    populate_secs: f64,
    index_build_secs: f64,
}

impl From<&ExperimentResult> for ResultRecord {
    fn from(r: &ExperimentResult) -> Self {
        Self {
            size: r.size,
            rows: r.rows,
            without_index_mean_secs: r.without_index.mean_secs,
            without_index_p95_secs: r.without_index.p95_secs,
            with_index_mean_secs: r.with_index.mean_secs,
            with_index_p95_secs: r.with_index.p95_secs,
            speedup: r.speedup(),
            index_used: r.index_used,
            verified_probes: r.verified_probes,
            populate_secs: r.populate_secs,
            index_build_secs: r.index_build_secs,
        }
    }
}

/// Files written by [`export`].
#[derive(Debug, Clone)]
pub struct ExportPaths {
    /// Flat per-size table.
    pub csv: PathBuf,
    /// Full results including latency summaries.
    pub json: PathBuf,
}

/// Writes `results.csv` and `results.json` into `out_dir`, creating it if needed.
pub fn export(out_dir: &Path, results: &[ExperimentResult]) -> Result<ExportPaths> {
    fs::create_dir_all(out_dir)?;

    let csv_path = out_dir.join("results.csv");
    let mut writer = Writer::from_path(&csv_path)?;
    for result in results {
        writer.serialize(ResultRecord::from(result))?;
    }
    writer.flush()?;

    let json_path = out_dir.join("results.json");
    fs::write(&json_path, serde_json::to_vec_pretty(results)?)?;

    Ok(ExportPaths {
        csv: csv_path,
        json: json_path,
    })
}
