//! Integration tests for `scratchroot install` failure gates
//!
//! The happy path needs a disk to destroy, so these tests only exercise the
//! precondition failures: every gate must exit 1 before anything destructive
//! can happen.

mod common;

use assert_fs::prelude::*;
use std::process::Command;

/// Helper to run scratchroot install
fn run_install(args: &[&str]) -> std::process::Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_scratchroot"));
    cmd.arg("install");
    for arg in args {
        cmd.arg(arg);
    }
    cmd.output().expect("Failed to execute scratchroot install")
}

#[test]
fn test_install_with_missing_answer_file_fails() {
    let temp = assert_fs::TempDir::new().unwrap();
    let missing = temp.path().join("absent.toml");

    let output = run_install(&["--answers", missing.to_str().unwrap()]);

    // Depending on the host this fails at the root gate, the tool preflight,
    // or the answer file; all of them are fatal and exit 1.
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("✗"),
        "fatal errors print through the error formatter: {stderr}"
    );
}

#[test]
fn test_install_with_invalid_answers_fails() {
    let temp = assert_fs::TempDir::new().unwrap();
    let answers = temp.child("answers.toml");
    answers.write_str(common::INVALID_ANSWERS).unwrap();

    let output = run_install(&["--answers", answers.path().to_str().unwrap()]);
    assert!(!output.status.success());
}

#[test]
fn test_install_never_prompts_without_a_terminal() {
    let temp = assert_fs::TempDir::new().unwrap();
    let answers = temp.child("answers.toml");
    answers.write_str(common::SAMPLE_ANSWERS).unwrap();

    // stdin is a pipe here; if the run reaches a prompt it must fail rather
    // than hang. Every earlier gate also exits 1, so this terminates either
    // way. /dev/vda from the sample answers will not exist on a test host.
    let output = run_install(&["--answers", answers.path().to_str().unwrap()]);
    assert!(!output.status.success());
}
