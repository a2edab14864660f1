//! Command-line behaviour of the `layout` and `evaluate` subcommands.

use assert_cmd::Command;
use predicates::prelude::*;

fn cli() -> Command {
    Command::cargo_bin("microarray-layout").unwrap()
}

#[test]
fn test_layout_text_report() {
    cli()
        .args(["layout", "--rows", "6", "--cols", "6", "--probe-length", "10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Layout Results"))
        .stdout(predicate::str::contains("Embedding: LeftMostEmbedding"))
        .stdout(predicate::str::contains("Placement: QapPlacer"))
        .stdout(predicate::str::contains("Placed spots: 36"));
}

#[test]
fn test_layout_json_report() {
    let output = cli()
        .args([
            "layout",
            "--rows",
            "6",
            "--cols",
            "6",
            "--probe-length",
            "10",
            "--layout",
            "paired",
            "--embedding",
            "centered",
            "--optimize",
            "--window",
            "4",
            "--passes",
            "2",
            "--format",
            "json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["embedding"], "CenteredEmbedding");
    assert_eq!(report["unplaced"], 0);
    assert_eq!(report["quality"]["placed_spots"], 36);
    assert!(report["optimization"]["passes"].as_u64().unwrap() >= 1);
}

#[test]
fn test_layout_tsv_report() {
    cli()
        .args([
            "layout",
            "--rows",
            "4",
            "--cols",
            "4",
            "--probe-length",
            "8",
            "--placement",
            "sequential",
            "--ordering",
            "none",
            "-f",
            "tsv",
        ])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("embedding\tordering\tplacement"))
        .stdout(predicate::str::contains("LeftMostEmbedding\tnone\tSequentialFiller\t0\t"));
}

#[test]
fn test_layout_solver_choices() {
    for solver in ["swapped-grasp", "identity"] {
        cli()
            .args(["layout", "--rows", "4", "--cols", "4", "--probe-length", "8", "--solver", solver])
            .args(["--optimize", "--window", "3"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Placed spots: 16"));
    }

    cli()
        .args(["layout", "--solver", "exact"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--solver"));
}

#[test]
fn test_layout_output_then_evaluate() {
    let dir = tempfile::tempdir().unwrap();
    let chip = dir.path().join("chip.json");

    cli()
        .args(["layout", "--rows", "6", "--cols", "6", "--probe-length", "10", "--output"])
        .arg(&chip)
        .assert()
        .success();
    assert!(chip.exists());

    cli()
        .arg("evaluate")
        .arg(&chip)
        .assert()
        .success()
        .stdout(predicate::str::contains("Border length:"))
        .stdout(predicate::str::contains("Placed spots: 36"));

    let output = cli()
        .args(["evaluate", "--format", "json", "--definition", "simplified"])
        .arg(&chip)
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["definition"], "simplified");
    assert_eq!(report["quality"]["rows"], 6);
}

#[test]
fn test_layout_reads_saved_chip_and_config() {
    let dir = tempfile::tempdir().unwrap();
    let chip = dir.path().join("chip.json");
    let config = dir.path().join("pipeline.json");
    std::fs::write(&config, r#"{"embedding": "right_most", "placement": "random"}"#).unwrap();

    cli()
        .args(["layout", "--rows", "4", "--cols", "4", "--probe-length", "8", "--output"])
        .arg(&chip)
        .assert()
        .success();

    cli()
        .args(["layout", "--input"])
        .arg(&chip)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Embedding: RightMostEmbedding"))
        .stdout(predicate::str::contains("Placement: RandomFiller"));
}

#[test]
fn test_layout_rejects_bad_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("pipeline.json");
    std::fs::write(&config, r#"{"grasp": {"alpha": 3.0}}"#).unwrap();

    cli()
        .args(["layout", "--rows", "4", "--cols", "4", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("alpha"));
}

#[test]
fn test_window_options_require_optimize() {
    cli()
        .args(["layout", "--window", "4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--optimize"));
}

#[test]
fn test_evaluate_missing_file() {
    cli()
        .args(["evaluate", "does-not-exist.json"])
        .assert()
        .failure();
}

#[test]
fn test_paired_generator_needs_even_rows() {
    cli()
        .args(["layout", "--rows", "5", "--cols", "4", "--layout", "paired"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("even number of rows"));
}
