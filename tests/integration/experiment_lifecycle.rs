#![allow(missing_docs)]

use indexlab::{
    options::BenchOptions,
    store::{schema_exists, ExperimentSchema, SchemaBacking},
    timing::MIN_OBSERVABLE,
    BenchmarkRunner,
};
use tempfile::TempDir;

fn small_options() -> BenchOptions {
    BenchOptions {
        max_exponent: 2,
        samples: 4,
        batch_size: 7,
        verify_probes: 2,
        ..BenchOptions::default()
    }
}

#[test]
fn full_sweep_measures_every_size_in_order() {
    let runner = BenchmarkRunner::open(small_options()).expect("open runner");
    let mut seen = Vec::new();
    let results = runner
        .run_all(|result| seen.push(result.size))
        .expect("sweep");

    let expected: Vec<usize> = (1..=10).map(|k| k * 10).collect();
    assert_eq!(seen, expected);
    assert_eq!(results.len(), expected.len());

    let floor = MIN_OBSERVABLE.as_secs_f64();
    for result in &results {
        assert_eq!(result.rows, result.size as u64);
        assert_eq!(result.schema, ExperimentSchema::name_for(result.size));
        assert!(result.without_index.min_secs >= floor);
        assert!(result.with_index.min_secs >= floor);
        assert!(result.without_index.mean_secs >= result.without_index.min_secs);
        assert_eq!(result.verified_probes, 2);
        assert!(!schema_exists(runner.connection(), &result.schema).unwrap());
    }
}

#[test]
fn file_database_with_temp_file_schemas() {
    let dir = TempDir::new().expect("tempdir");
    let db_path = dir.path().join("bench.sqlite");
    let opts = BenchOptions {
        database: db_path.display().to_string(),
        schema_backing: SchemaBacking::TempFile,
        max_exponent: 1,
        ..small_options()
    };
    let runner = BenchmarkRunner::open(opts).expect("open runner");
    let result = runner.run_experiment(250).expect("experiment");
    assert_eq!(result.rows, 250);
    assert!(result.index_used);
    assert!(!schema_exists(runner.connection(), "experiment_250").unwrap());
    assert!(db_path.exists());
}

#[test]
fn sizes_larger_than_a_batch_are_fully_loaded() {
    let opts = BenchOptions {
        batch_size: 1_000,
        ..small_options()
    };
    let runner = BenchmarkRunner::open(opts).expect("open runner");
    let result = runner.run_experiment(2_500).expect("experiment");
    assert_eq!(result.rows, 2_500);
}

#[test]
fn repeated_runs_are_reproducible_in_shape() {
    let runner = BenchmarkRunner::open(small_options()).expect("open runner");
    let first = runner.run_experiment(40).expect("first run");
    let second = runner.run_experiment(40).expect("second run");
    assert_eq!(first.rows, second.rows);
    assert_eq!(first.without_index.samples, second.without_index.samples);
    assert_eq!(first.index_used, second.index_used);
}
