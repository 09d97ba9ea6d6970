//! Binary smoke tests.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("invex")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("process"))
        .stdout(predicate::str::contains("batch"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn unknown_backend_is_rejected_before_any_work() {
    // The file does not exist; the strategy error must win anyway.
    Command::cargo_bin("invex")
        .unwrap()
        .args(["process", "no-such-invoice.png", "--backend", "both"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown extraction strategy"));
}

#[test]
fn config_path_prints_a_location() {
    Command::cargo_bin("invex")
        .unwrap()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.json"));
}
