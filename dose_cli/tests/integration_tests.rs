//! Integration tests for the doses binary.
//!
//! These tests verify end-to-end behavior including:
//! - Adding and removing doses
//! - Filtered, windowed views
//! - Statistics tables
//! - Persistence of both renderings

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Helper to get the CLI binary, isolated from the user's config and tokens
fn cli(data_dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("doses"));
    cmd.env("XDG_CONFIG_HOME", data_dir.join("config"))
        .env_remove("FOH_TOKEN")
        .env_remove("FOH_SERVER_AUTH")
        .env_remove("TOKEN")
        .arg("--data-dir")
        .arg(data_dir);
    cmd
}

/// Add a dose at a fixed UTC time
fn add(data_dir: &Path, drug: &str, dosage: &str, date: &str, time: &str) {
    cli(data_dir)
        .args(["add", "-d", drug, "-a", dosage])
        .args(["--date", date, "--time", time, "--timezone", "UTC"])
        .assert()
        .success();
}

fn seed(data_dir: &Path) {
    add(data_dir, "caffeine", "100mg", "2024/01/01", "08:00");
    add(data_dir, "Nicotine", "2mg", "2024/01/01", "09:00");
    add(data_dir, "Caffeine", "100mg", "2024/01/02", "08:00");
}

#[test]
fn test_cli_help() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dose log"));
}

#[test]
fn test_empty_log_shows_nothing() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path()).assert().success().stdout("");
}

#[test]
fn test_add_echoes_and_persists() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir)
        .args(["add", "-d", "caffeine", "-a", "100mg", "--note", "with milk"])
        .args(["--date", "2024/01/02", "--time", "08:00", "--timezone", "UTC"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "2024/01/02 08:00 100mg Caffeine, Oral, Note: with milk",
        ));

    assert!(data_dir.join("doses.json").exists());
    let text = fs::read_to_string(data_dir.join("doses.txt")).unwrap();
    assert_eq!(text, "2024-01-02 08·00+00 100mg Caffeine, Oral, Note: with milk\n");

    cli(data_dir)
        .arg("get")
        .assert()
        .success()
        .stdout(predicate::str::contains("100mg Caffeine"));
}

#[test]
fn test_add_without_timezone_on_empty_log_fails() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .args(["add", "-d", "Caffeine", "-a", "100mg"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("timezone"));

    assert!(!temp_dir.path().join("doses.json").exists());
}

#[test]
fn test_add_reuses_latest_timezone() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    add(data_dir, "Caffeine", "100mg", "2024/01/01", "08:00");

    cli(data_dir)
        .args(["add", "-d", "Tea", "--date", "2024/01/01", "--time", "10:00", "-j"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"timezone\": \"UTC\""));
}

#[test]
fn test_window_and_filter() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    seed(data_dir);

    cli(data_dir)
        .args(["-n", "1"])
        .assert()
        .success()
        .stdout("2024/01/02 08:00 100mg Caffeine, Oral\n");

    cli(data_dir)
        .args(["-g", "NICOTINE"])
        .assert()
        .success()
        .stdout("2024/01/01 09:00 2mg Nicotine, Oral\n");

    cli(data_dir)
        .args(["-g", "nicotine", "-v", "-r"])
        .assert()
        .success()
        .stdout(
            "2024/01/02 08:00 100mg Caffeine, Oral\n2024/01/01 08:00 100mg Caffeine, Oral\n",
        );
}

#[test]
fn test_invert_without_filter_fails() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .arg("-v")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invert"));
}

#[test]
fn test_bad_filter_fails() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .args(["-g", "(unclosed"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid filter pattern"));
}

#[test]
fn test_json_output_keeps_position() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    seed(data_dir);

    let output = cli(data_dir).args(["-j", "-n", "-1"]).output().unwrap();
    assert!(output.status.success());

    let doses: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let doses = doses.as_array().unwrap();
    assert_eq!(doses.len(), 3);
    assert_eq!(doses[0]["position"], 0);
    assert_eq!(doses[0]["roa"], "Oral");
    assert_eq!(doses[2]["position"], 2);
}

#[test]
fn test_rm_removes_last_added() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    seed(data_dir);
    // Added last but dated earliest
    add(data_dir, "Kratom", "2g", "2023/12/31", "20:00");

    cli(data_dir)
        .arg("rm")
        .assert()
        .success()
        .stdout(predicate::str::contains("Kratom").not());

    cli(data_dir)
        .args(["-n", "-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Kratom").not());
}

#[test]
fn test_rm_on_empty_log_fails() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .arg("rm")
        .assert()
        .failure()
        .stderr(predicate::str::contains("There are no doses"));
}

#[test]
fn test_rmp() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    seed(data_dir);

    cli(data_dir)
        .args(["rmp", "42"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("position 42"));

    cli(data_dir)
        .args(["rmp", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nicotine").not());
}

#[test]
fn test_stat_top() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    seed(data_dir);

    cli(data_dir)
        .arg("stat-top")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 200mg    Caffeine\n"))
        .stdout(predicate::str::contains("1 2mg      Nicotine\n"))
        .stdout(predicate::str::ends_with("Total\n"));
}

#[test]
fn test_stat_avg_respects_filter() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    seed(data_dir);

    cli(data_dir)
        .args(["stat-avg", "-g", "caffeine"])
        .assert()
        .success()
        .stdout(predicate::str::contains("100mg").and(predicate::str::contains("Average")))
        .stdout(predicate::str::contains("Nicotine").not());
}

#[test]
fn test_convert_tz_keeps_instant() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    add(data_dir, "Caffeine", "100mg", "2024/01/02", "12:00");

    cli(data_dir)
        .args(["convert-tz", "America/Toronto"])
        .assert()
        .success()
        .stdout("2024/01/02 07:00 100mg Caffeine, Oral\n");
}

#[test]
fn test_convert_tz_echo_shows_edited_dose_despite_filter() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    add(data_dir, "Caffeine", "100mg", "2024/06/01", "09:30");

    cli(data_dir)
        .args(["convert-tz", "Asia/Tokyo", "-g", "2024/06/01 09", "-n", "1"])
        .assert()
        .success()
        .stdout("2024/06/01 18:30 100mg Caffeine, Oral\n");
}

#[test]
fn test_change_tz_keeps_wall_clock() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    add(data_dir, "Caffeine", "100mg", "2024/01/02", "12:00");

    cli(data_dir)
        .args(["change-tz", "America/Toronto", "-u"])
        .assert()
        .success()
        .stdout("1704214800 2024/01/02 12:00 100mg Caffeine, Oral\n");
}

#[test]
fn test_unknown_timezone_fails() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    add(data_dir, "Caffeine", "100mg", "2024/01/02", "12:00");

    cli(data_dir)
        .args(["convert-tz", "Mars/Olympus"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown timezone"));
}

#[test]
fn test_save_rewrites_both_files() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    seed(data_dir);
    fs::remove_file(data_dir.join("doses.txt")).unwrap();

    cli(data_dir)
        .args(["save", "-g", "nicotine"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved").count(2));

    let text = fs::read_to_string(data_dir.join("doses.txt")).unwrap();
    assert_eq!(text.lines().count(), 3);
    assert!(text.starts_with("2024-01-02 08·00+00 100mg Caffeine"));
}
