use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn lend_cli() -> Command {
    Command::cargo_bin("lend_cli").unwrap()
}

#[test]
fn test_resource_command_shows_deferred_grant() {
    let assert = lend_cli()
        .args(["resource", "--hold-ms", "10"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();

    assert_eq!(lines[0], "START");
    assert_eq!(lines[1], "RES 1 | Resource borrowed is: resource-2");
    assert_eq!(lines[2], "RES 2 | Resource borrowed is: resource-1");

    // Borrower 3 only gets a resource after borrower 1 has released it
    let released = lines
        .iter()
        .position(|l| *l == "RES 1 | Released: resource-2")
        .expect("borrower 1 release");
    let granted = lines
        .iter()
        .position(|l| *l == "RES 3 | Resource borrowed is: resource-2")
        .expect("borrower 3 grant");
    assert!(released < granted);
    assert!(stdout.contains("RES 3 | Released: resource-2"));
}

#[test]
fn test_resource_command_rejects_negative_size() {
    lend_cli()
        .args(["resource", "--size", "-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid pool configuration"))
        .stdout(predicate::str::contains("START").not());
}

#[test]
fn test_resource_command_rejects_empty_pool_with_borrowers() {
    lend_cli()
        .args(["resource", "--size", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("would wait forever"));
}

#[test]
fn test_resource_command_prints_stats() {
    lend_cli()
        .args([
            "resource",
            "--size",
            "1",
            "--borrowers",
            "3",
            "--hold-ms",
            "5",
            "--stats",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"immediate_grants\": 1"))
        .stdout(predicate::str::contains("\"deferred_grants\": 2"))
        .stdout(predicate::str::contains("\"releases\": 3"));
}

#[test]
fn test_resource_command_reads_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "size = 3").unwrap();
    writeln!(file, "id_prefix = \"conn-\"").unwrap();

    lend_cli()
        .args(["resource", "--borrowers", "1", "--hold-ms", "1", "--config"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("RES 1 | Resource borrowed is: conn-3"));
}

#[test]
fn test_flags_override_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "size = -5").unwrap();

    lend_cli()
        .args(["resource", "--size", "1", "--borrowers", "1", "--hold-ms", "1"])
        .args(["--prefix", "slot-", "--config"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("RES 1 | Resource borrowed is: slot-1"));
}

#[test]
fn test_rejects_unknown_log_level() {
    lend_cli()
        .args(["--log-level", "loud", "resource", "--hold-ms", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown log level"));
}
