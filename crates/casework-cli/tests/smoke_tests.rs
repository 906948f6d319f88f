//! Smoke tests for the casework CLI
//!
//! Each test runs the real binary against the built-in `sample` library in
//! a scratch working directory.

#![allow(deprecated)] // Allow deprecated Command::cargo_bin until assert_cmd is updated
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a command for the casework binary, run inside `dir`
fn casework(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("casework").expect("casework binary should exist");
    cmd.current_dir(dir.path()).env_remove("CASEWORK_LOG");
    cmd
}

fn scratch() -> TempDir {
    TempDir::new().unwrap()
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    let dir = scratch();
    casework(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.4.0"));
}

#[test]
fn test_help_flag() {
    let dir = scratch();
    casework(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--answerfile"))
        .stdout(predicate::str::contains("--extag"));
}

#[test]
fn test_missing_lib_is_fatal() {
    let dir = scratch();
    casework(&dir).arg("-list").assert().code(255);
}

#[test]
fn test_unknown_lib_is_fatal() {
    let dir = scratch();
    casework(&dir)
        .args(["-lib", "storage.dll"])
        .assert()
        .code(255)
        .stderr(predicate::str::contains("storage.dll"));
}

#[test]
fn test_answerfile_with_tag_is_fatal() {
    let dir = scratch();
    fs::write(dir.path().join("rerun.txt"), "Sample.Pass\n").unwrap();
    casework(&dir)
        .args(["-lib", "sample", "-answerfile", "rerun.txt", "-tag", "smoke"])
        .assert()
        .code(255)
        .stdout(predicate::str::contains("===Result Summary===").not());
}

#[test]
fn test_answerfile_with_blank_tag_is_fatal() {
    let dir = scratch();
    fs::write(dir.path().join("rerun.txt"), "Sample.Pass\n").unwrap();
    casework(&dir)
        .args(["/lib:sample", "/answerfile:rerun.txt", "/tag:,"])
        .assert()
        .code(255)
        .stderr(predicate::str::contains("cannot be combined"));
}

#[test]
fn test_answerfile_ignores_window() {
    let dir = scratch();
    fs::write(
        dir.path().join("rerun.txt"),
        "Sample.Pass\nContext.EchoLang\nContext.ConfigReadable\n",
    )
    .unwrap();
    casework(&dir)
        .args(["-lib", "sample", "-answerfile", "rerun.txt", "-offset", "1", "-length", "1", "-q"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total Run: 3"));
}

// ============================================================================
// Dry Run
// ============================================================================

#[test]
fn test_list_prints_tree() {
    let dir = scratch();
    casework(&dir)
        .args(["/lib:sample", "/extag:slow", "/list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[x] Pass"))
        .stdout(predicate::str::contains("[ ] Hang [slow] (excluded)"))
        .stdout(predicate::str::contains("Total: 4 enabled of 5 cases in 2 classes"));
    assert!(!dir.path().join("casework.answer").exists());
}

// ============================================================================
// Runs
// ============================================================================

#[test]
fn test_timeout_and_failure_exit_code() {
    let dir = scratch();
    casework(&dir)
        .args(["-lib", "sample", "-group", "Sample", "-timeout", "1", "-quiet"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Total Run: 3"))
        .stdout(predicate::str::contains("Pass: 1"))
        .stdout(predicate::str::contains("Fail: 2"))
        .stdout(predicate::str::contains("===Failed Cases==="));

    let answer = fs::read_to_string(dir.path().join("casework.answer")).unwrap();
    assert_eq!(answer, "Sample.Fail\nSample.Hang\n");
}

#[test]
fn test_extag_moves_case_to_excluded() {
    let dir = scratch();
    casework(&dir)
        .args(["-lib", "sample", "-case", "Pass,Fail", "-extag", "flaky", "-quiet"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total Run: 1"))
        .stdout(predicate::str::contains("Exclude: 1"))
        .stdout(predicate::str::contains("===Excluded Cases===\nSample.Fail"));
    assert!(!dir.path().join("casework.answer").exists());
}

#[test]
fn test_answer_file_rerun() {
    let dir = scratch();
    fs::write(dir.path().join("rerun.txt"), "Sample.Fail\nContext.EchoLang\n").unwrap();
    casework(&dir)
        .args(["--LIB=sample", "--answerfile=rerun.txt", "--rerun", "1", "-q"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Total Run: 4"))
        .stdout(predicate::str::contains("Pass: 2"));

    let answer = fs::read_to_string(dir.path().join("casework.answer")).unwrap();
    assert_eq!(answer, "Sample.Fail\n");
}

#[test]
fn test_lang_and_config_forwarded() {
    let dir = scratch();
    fs::write(dir.path().join("run.xml"), "<run/>").unwrap();
    casework(&dir)
        .args([
            "/lib:sample",
            "/group:Context",
            "/lang:de-DE",
            "/config:run.xml",
            "/quiet",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total Run: 2"))
        .stdout(predicate::str::contains("Fail: 0"));
}

#[test]
fn test_window_selects_slice() {
    let dir = scratch();
    casework(&dir)
        .args(["-lib", "sample", "-offset", "3", "-length", "2", "-q"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total Run: 2"));
}

#[test]
fn test_offset_out_of_range_is_fatal() {
    let dir = scratch();
    casework(&dir)
        .args(["-lib", "sample", "-offset", "9"])
        .assert()
        .code(255);
}
