//! Integration tests for the biotwin binary.
//!
//! These tests verify end-to-end behavior including:
//! - Clearance curves and crash times
//! - Stack simulation with skipped entries and risks
//! - Prognosis forecasts and CSV export
//! - Config overrides

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a test directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Helper to get the CLI with an isolated config directory
fn cli(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("biotwin"));
    cmd.env("XDG_CONFIG_HOME", dir).env_remove("RUST_LOG");
    cmd
}

fn json_output(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("Failed to run biotwin");
    assert!(output.status.success(), "biotwin failed: {:?}", output);
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

fn write_file(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("Failed to write test file");
    path
}

#[test]
fn test_cli_help() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pharmacokinetic digital twin simulator"));
}

#[test]
fn test_clearance_slow_metabolizer() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .args(["clearance", "--dose", "65", "--weight", "70", "--genotype", "CC", "--time", "08:00"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Slow Metabolizer"))
        .stdout(predicate::str::contains("Crash time: 6:00 AM"))
        .stdout(predicate::str::contains("4:00 PM"))
        .stdout(predicate::str::contains("32.50 mg"));
}

#[test]
fn test_clearance_json_curve() {
    let temp_dir = setup_test_dir();
    let report = json_output(cli(temp_dir.path()).args([
        "clearance", "--dose", "65", "--weight", "70", "--genotype", "CC", "--json",
    ]));

    let curve = report["curve"].as_array().unwrap();
    assert_eq!(curve.len(), 25);
    assert_eq!(curve[0]["remainingMg"], 65.0);
    assert_eq!(curve[0]["status"], "Active");
    assert_eq!(report["halfLifeHours"], 8.0);
    assert_eq!(report["crashTime"]["kind"], "at");
}

#[test]
fn test_clearance_unknown_genotype_fails() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .args(["clearance", "--dose", "65", "--weight", "70", "--genotype", "XY"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("InvalidGenotype"));
}

#[test]
fn test_clearance_rejects_bad_weight() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .args(["clearance", "--dose", "65", "--weight", "0", "--genotype", "AA"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("InvalidBodyWeight"));
}

#[test]
fn test_clearance_writes_csv() {
    let temp_dir = setup_test_dir();
    let csv_path = temp_dir.path().join("out").join("curve.csv");

    cli(temp_dir.path())
        .args(["clearance", "--dose", "100", "--weight", "80", "--genotype", "AA", "--csv"])
        .arg(&csv_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Curve written to"));

    let contents = fs::read_to_string(&csv_path).unwrap();
    assert!(contents.starts_with("hour_offset,label,concentration_mg_per_l,remaining_mg,status"));
    assert!(contents.contains("Cleared"));
}

#[test]
fn test_stack_skips_unknown_substance() {
    let temp_dir = setup_test_dir();
    let stack = write_file(
        temp_dir.path(),
        "stack.json",
        r#"[
            {"substance": "Coffee", "doseMg": 100, "time": "08:00"},
            {"substance": "Unobtainium", "doseMg": 50, "time": "09:00"},
            {"substance": "Alcohol", "doseMg": "14000", "time": "19:00"}
        ]"#,
    );

    let report = json_output(cli(temp_dir.path()).arg("stack").arg("--file").arg(&stack).arg("--json"));

    assert_eq!(report["inputCount"], 3);
    assert_eq!(report["processedCount"], 2);
    assert_eq!(report["skipped"][0]["substance"], "Unobtainium");
    assert_eq!(report["timeline"].as_array().unwrap().len(), 49);

    for slot in report["timeline"].as_array().unwrap() {
        assert!(slot["perSubstanceMg"].get("Unobtainium").is_none());
    }
    assert!(report["summary"]["neuroStatus"].is_string());
}

#[test]
fn test_stack_flags_sleep_disruption() {
    let temp_dir = setup_test_dir();
    let stack = write_file(
        temp_dir.path(),
        "stack.json",
        r#"[{"substance": "Espresso", "doseMg": 100, "time": "08:00"}]"#,
    );

    cli(temp_dir.path())
        .arg("stack")
        .arg("--file")
        .arg(&stack)
        .args(["--genetics", "rs762551=CC"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sleep Disruption"))
        .stdout(predicate::str::contains("Over-Stimulated"));
}

#[test]
fn test_stack_rejects_malformed_marker() {
    let temp_dir = setup_test_dir();
    let stack = write_file(temp_dir.path(), "stack.json", "[]");

    cli(temp_dir.path())
        .arg("stack")
        .arg("--file")
        .arg(&stack)
        .args(["--genetics", "rs762551"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("rsID=GENOTYPE"));
}

#[test]
fn test_stack_writes_timeline_csv() {
    let temp_dir = setup_test_dir();
    let stack = write_file(
        temp_dir.path(),
        "stack.json",
        r#"[{"substance": "Caffeine", "doseMg": 200, "time": "07:30"}]"#,
    );
    let csv_path = temp_dir.path().join("timeline.csv");

    cli(temp_dir.path())
        .arg("stack")
        .arg("--file")
        .arg(&stack)
        .arg("--csv")
        .arg(&csv_path)
        .assert()
        .success();

    let contents = fs::read_to_string(&csv_path).unwrap();
    // Header plus 49 slots
    assert_eq!(contents.lines().count(), 50);
    assert!(contents.lines().next().unwrap().contains("substances"));
}

#[test]
fn test_prognosis_zero_habits() {
    let temp_dir = setup_test_dir();
    let report = json_output(cli(temp_dir.path()).args(["prognosis", "--years", "1", "--json"]));

    assert_eq!(report["checkpoints"].as_array().unwrap().len(), 12);
    assert!(report["risks"].as_array().unwrap().is_empty());
    assert_eq!(report["finalHealthState"]["liverHealth"], 100.0);
}

#[test]
fn test_prognosis_heavy_caffeine_burnout() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .args(["prognosis", "--caffeine", "800", "--sleep", "5", "--years", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("BURNOUT"))
        .stdout(predicate::str::contains("HYPERTENSION"));
}

#[test]
fn test_prognosis_writes_checkpoints_csv() {
    let temp_dir = setup_test_dir();
    let csv_path = temp_dir.path().join("forecast.csv");

    cli(temp_dir.path())
        .args(["prognosis", "--years", "1", "--csv"])
        .arg(&csv_path)
        .assert()
        .success();

    let contents = fs::read_to_string(&csv_path).unwrap();
    assert_eq!(contents.lines().count(), 13);
}

#[test]
fn test_habits_from_log_file() {
    let temp_dir = setup_test_dir();
    let logs = write_file(
        temp_dir.path(),
        "logs.json",
        r#"[
            {"date": "2025-03-01", "substance": "Coffee", "doseMg": 200},
            {"date": "2025-03-02", "substance": "Ethanol", "doseMg": 16000}
        ]"#,
    );

    let habits = json_output(
        cli(temp_dir.path())
            .arg("habits")
            .arg("--file")
            .arg(&logs)
            .args(["--sleep", "7"]),
    );
    assert_eq!(habits["caffeineMg"], 100.0);
    assert_eq!(habits["alcoholUnits"], 1.0);
    assert_eq!(habits["avgSleepHours"], 7.0);
}

#[test]
fn test_substances_listing() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .arg("substances")
        .assert()
        .success()
        .stdout(predicate::str::contains("Caffeine"))
        .stdout(predicate::str::contains("CYP1A2"))
        .stdout(predicate::str::contains("Espresso → Caffeine"));
}

#[test]
fn test_config_override_raises_sleep_threshold() {
    let temp_dir = setup_test_dir();
    let config = write_file(
        temp_dir.path(),
        "config.toml",
        "[risk]\nsleep_neuro_threshold = 100.0\n",
    );
    let stack = write_file(
        temp_dir.path(),
        "stack.json",
        r#"[{"substance": "Caffeine", "doseMg": 100, "time": "08:00"}]"#,
    );

    cli(temp_dir.path())
        .arg("--config")
        .arg(&config)
        .arg("stack")
        .arg("--file")
        .arg(&stack)
        .assert()
        .success()
        .stdout(predicate::str::contains("No significant risks detected."));
}

#[test]
fn test_invalid_config_rejected() {
    let temp_dir = setup_test_dir();
    let config = write_file(
        temp_dir.path(),
        "config.toml",
        "[clearance]\ndistribution_coefficient_per_kg = -1.0\n",
    );

    cli(temp_dir.path())
        .arg("--config")
        .arg(&config)
        .arg("substances")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config"));
}

#[test]
fn test_config_loaded_from_xdg_dir() {
    let temp_dir = setup_test_dir();
    let config_dir = temp_dir.path().join("biotwin");
    fs::create_dir_all(&config_dir).unwrap();
    write_file(&config_dir, "config.toml", "[prognosis]\ndefault_years = 2\n");

    let report = json_output(cli(temp_dir.path()).args(["prognosis", "--json"]));
    assert_eq!(report["checkpoints"].as_array().unwrap().len(), 24);
}

#[test]
fn test_clearance_rejects_signed_time() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .args(["clearance", "--dose", "65", "--weight", "70", "--genotype", "CC", "--time", "+8:00"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("InvalidClockTime"));
}

#[test]
fn test_prognosis_huge_horizon_is_capped() {
    let temp_dir = setup_test_dir();
    let report = json_output(cli(temp_dir.path()).args(["prognosis", "--years", "4000000000", "--json"]));

    // 100 years of 365 days, sampled every 30
    assert_eq!(report["checkpoints"].as_array().unwrap().len(), 1216);
}
