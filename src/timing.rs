//! Latency measurement for individual lookups.

use std::time::{Duration, Instant};

use serde::Serialize;

/// Smallest latency ever recorded. `Instant` is monotonic, but a coarse clock
/// can still report zero for a very fast lookup, which a log scale cannot show.
pub const MIN_OBSERVABLE: Duration = Duration::from_nanos(1);

/// Runs `f` and returns its value along with the elapsed wall-clock time,
/// floored at [`MIN_OBSERVABLE`].
pub fn time_lookup<T, E, F>(f: F) -> Result<(T, Duration), E>
where
    F: FnOnce() -> Result<T, E>,
{
    let start = Instant::now();
    let value = f()?;
    Ok((value, start.elapsed().max(MIN_OBSERVABLE)))
}

/// Collected per-lookup latencies for one phase of an experiment.
#[derive(Debug, Clone, Default)]
pub struct LatencySamples {
    samples: Vec<Duration>,
}

impl LatencySamples {
    /// Empty collection sized for `capacity` samples.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
        }
    }

    /// Records one sample, applying the [`MIN_OBSERVABLE`] floor.
    pub fn push(&mut self, sample: Duration) {
        self.samples.push(sample.max(MIN_OBSERVABLE));
    }

    /// Number of recorded samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Summary statistics, or `None` when no samples were recorded.
    pub fn summary(&self) -> Option<LatencySummary> {
        if self.samples.is_empty() {
            return None;
        }
        let mut sorted = self.samples.clone();
        sorted.sort_unstable();
        let total: Duration = sorted.iter().sum();
        let mean = total.as_secs_f64() / sorted.len() as f64;
        Some(LatencySummary {
            samples: sorted.len(),
            mean_secs: mean,
            min_secs: sorted[0].as_secs_f64(),
            max_secs: sorted[sorted.len() - 1].as_secs_f64(),
            p50_secs: percentile(&sorted, 50.0).as_secs_f64(),
            p95_secs: percentile(&sorted, 95.0).as_secs_f64(),
        })
    }
}

fn percentile(sorted: &[Duration], pct: f64) -> Duration {
    let idx = ((pct / 100.0) * (sorted.len() - 1) as f64).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Latency statistics for one phase, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatencySummary {
    /// Number of lookups measured.
    pub samples: usize,
    /// Arithmetic mean.
    pub mean_secs: f64,
    /// Fastest lookup.
    pub min_secs: f64,
    /// Slowest lookup.
    pub max_secs: f64,
    /// Median.
    pub p50_secs: f64,
    /// 95th percentile.
    pub p95_secs: f64,
}

/// Formats a latency given in seconds with a readable unit.
pub fn format_secs(secs: f64) -> String {
    let nanos = secs * 1e9;
    if nanos < 1_000.0 {
        format!("{nanos:.0} ns")
    } else if nanos < 1_000_000.0 {
        format!("{:.1} µs", nanos / 1_000.0)
    } else if nanos < 1_000_000_000.0 {
        format!("{:.2} ms", nanos / 1_000_000.0)
    } else {
        format!("{secs:.2} s")
    }
}
