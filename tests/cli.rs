use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("outreach").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("outreach 0.1.0"));
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("outreach").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Quota-gated agency and contact directory service",
        ));
}

#[test]
fn test_cli_check_config_prints_defaults() {
    let mut cmd = Command::cargo_bin("outreach").unwrap();
    cmd.args(["--config", "/nonexistent/outreach.toml", "check-config"])
        .env_remove("OUTREACH_DAILY_LIMIT")
        .assert()
        .success()
        .stdout(predicate::str::contains("daily_limit = 50"));
}

#[test]
fn test_cli_decode_token_garbage() {
    let mut cmd = Command::cargo_bin("outreach").unwrap();
    cmd.args(["--config", "/nonexistent/outreach.toml", "decode-token", "!!!"])
        .assert()
        .success()
        .stdout(predicate::str::contains("treated as a fresh quota"));
}

#[test]
fn test_cli_decode_token_missing_argument() {
    let mut cmd = Command::cargo_bin("outreach").unwrap();
    cmd.arg("decode-token")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "required arguments were not provided",
        ));
}
