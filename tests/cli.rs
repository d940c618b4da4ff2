//! Command line smoke tests

use assert_cmd::Command;
use predicates::prelude::*;

fn kernel_lens() -> Command {
    let mut cmd = Command::cargo_bin("kernel-lens").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    kernel_lens()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("locate"))
        .stdout(predicate::str::contains("cluster"))
        .stdout(predicate::str::contains("history"));
}

#[test]
fn test_init_then_reinit() {
    let dir = tempfile::tempdir().unwrap();

    kernel_lens()
        .args(["init", "--default-revision", "6.13", "-r"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized KernelLens"));

    let config = std::fs::read_to_string(dir.path().join(".kernel-lens/config.toml")).unwrap();
    assert!(config.contains("default_revision = \"v6.13\""));

    kernel_lens()
        .args(["init", "-r"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already initialized"));
}

#[test]
fn test_doctor_fails_on_missing_tree() {
    let dir = tempfile::tempdir().unwrap();

    kernel_lens()
        .args(["doctor", "-o", "json", "-r"])
        .arg(dir.path().join("missing"))
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"sourceRootExists\": false"));
}

#[test]
fn test_cluster_without_hits_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let hits = dir.path().join("hits.json");
    std::fs::write(&hits, "{}").unwrap();

    kernel_lens()
        .args(["cluster", "sched", "-o", "json", "--hits"])
        .arg(&hits)
        .arg("-r")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"totalClusters\": 0"))
        .stdout(predicate::str::contains("no related code found"));
}

#[test]
fn test_locate_requires_line_or_name() {
    kernel_lens()
        .args(["locate", "kernel/sched/fair.c"])
        .assert()
        .failure();
}
