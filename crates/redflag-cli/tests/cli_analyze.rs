use assert_cmd::Command;
use predicates::prelude::*;

fn redflag() -> Command {
    let mut cmd = Command::cargo_bin("redflag").unwrap();
    cmd.env_remove("REDFLAG_ENGINE_URL")
        .env_remove("REDFLAG_TIMEOUT")
        .env_remove("RUST_LOG")
        .args(["--engine-url", "http://127.0.0.1:9", "--color", "never"]);
    cmd
}

#[test]
fn help_lists_commands() {
    redflag()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("analyze"))
        .stdout(predicate::str::contains("health"))
        .stdout(predicate::str::contains("session"));
}

#[test]
fn analyze_missing_file_fails_with_message() {
    redflag()
        .args(["analyze", "/no/such/dir/contract.pdf", "--no-gpt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read contract.pdf"));
}

#[test]
fn rejects_bad_engine_url() {
    Command::cargo_bin("redflag")
        .unwrap()
        .env_remove("REDFLAG_ENGINE_URL")
        .args(["--engine-url", "not a url", "health"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid engine url"));
}

#[test]
fn rejects_bad_timeout_flag() {
    redflag()
        .args(["--timeout", "later", "health"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid timeout"));
}

#[test]
#[ignore = "requires loopback networking"]
fn health_fails_when_engine_is_down() {
    redflag()
        .args(["--timeout", "2s", "health"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Checking engine at http://127.0.0.1:9/"))
        .stderr(predicate::str::contains("is not reachable"));
}
