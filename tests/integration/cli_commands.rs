#![allow(missing_docs)]

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use csv::ReaderBuilder;
use serde_json::Value;
use tempfile::TempDir;

fn stdout_of(args: &[&str]) -> String {
    let output = cargo_bin_cmd!("indexlab")
        .env_remove("INDEXLAB_CONFIG")
        .args(args)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    String::from_utf8(output).expect("utf-8 stdout")
}

#[test]
fn sizes_lists_two_decades() {
    let stdout = stdout_of(&["sizes", "--max-exponent", "2"]);
    assert_eq!(stdout.trim(), "10 20 30 40 50 60 70 80 90 100");
}

#[test]
fn run_writes_csv_and_json() {
    let dir = TempDir::new().expect("tempdir");
    let out_dir = dir.path().join("out");
    let stdout = stdout_of(&[
        "run",
        "--max-exponent",
        "1",
        "--samples",
        "3",
        "--plain",
        "--out-dir",
        out_dir.to_str().expect("utf-8 path"),
    ]);
    assert!(stdout.contains("ROWS"));
    assert!(stdout.contains("with index"));

    let mut reader = ReaderBuilder::new()
        .from_path(out_dir.join("results.csv"))
        .expect("results.csv");
    let headers = reader.headers().expect("csv header").clone();
    assert_eq!(&headers[0], "size");
    let rows: Vec<_> = reader.records().collect::<Result<_, _>>().expect("csv rows");
    assert_eq!(rows.len(), 1);
    assert_eq!(&rows[0][0], "10");

    let json: Value =
        serde_json::from_slice(&fs::read(out_dir.join("results.json")).expect("results.json"))
            .expect("valid json");
    assert_eq!(json[0]["size"], 10);
    assert_eq!(json[0]["rows"], 10);
    assert_eq!(json[0]["schema"], "experiment_10");
}

#[test]
fn run_without_chart_prints_only_the_table() {
    let stdout = stdout_of(&[
        "run",
        "--max-exponent",
        "1",
        "--samples",
        "2",
        "--plain",
        "--no-chart",
    ]);
    assert!(stdout.contains("ROWS"));
    assert!(!stdout.contains("with index"));
}

#[test]
fn zero_samples_is_rejected() {
    let output = cargo_bin_cmd!("indexlab")
        .env_remove("INDEXLAB_CONFIG")
        .args(["run", "--max-exponent", "1", "--samples", "0", "--plain"])
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8_lossy(&output);
    assert!(stderr.contains("indexlab failed"));
    assert!(stderr.contains("samples"));
}

#[test]
fn sizes_rejects_exponents_past_the_limit() {
    let output = cargo_bin_cmd!("indexlab")
        .env_remove("INDEXLAB_CONFIG")
        .args(["sizes", "--max-exponent", "20"])
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8_lossy(&output);
    assert!(stderr.contains("indexlab failed"));
    assert!(stderr.contains("max_exponent"));
    assert!(!stderr.contains("panicked"));
}

#[test]
fn oversized_lookup_window_is_rejected() {
    let output = cargo_bin_cmd!("indexlab")
        .env_remove("INDEXLAB_CONFIG")
        .args([
            "run",
            "--max-exponent",
            "1",
            "--window-hours",
            "100000000",
            "--plain",
        ])
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8_lossy(&output);
    assert!(stderr.contains("window_hours"));
    assert!(!stderr.contains("panicked"));
}

#[test]
fn config_file_sets_defaults() {
    let dir = TempDir::new().expect("tempdir");
    let config = dir.path().join("indexlab.toml");
    fs::write(&config, "[bench]\nmax_exponent = 3\n").expect("write config");

    let stdout = cargo_bin_cmd!("indexlab")
        .arg("--config")
        .arg(&config)
        .arg("sizes")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let sizes: Vec<u64> = String::from_utf8(stdout)
        .expect("utf-8 stdout")
        .split_whitespace()
        .map(|s| s.parse().expect("number"))
        .collect();
    assert_eq!(sizes.len(), 19);
    assert_eq!(sizes.last(), Some(&1_000));
}

#[test]
fn unknown_config_keys_fail() {
    let dir = TempDir::new().expect("tempdir");
    let config = dir.path().join("indexlab.toml");
    fs::write(&config, "[bench]\nsample_count = 3\n").expect("write config");

    cargo_bin_cmd!("indexlab")
        .env("INDEXLAB_CONFIG", &config)
        .arg("sizes")
        .assert()
        .failure();
}

#[test]
fn completions_are_generated() {
    let stdout = stdout_of(&["completions", "bash"]);
    assert!(stdout.contains("indexlab"));
}
