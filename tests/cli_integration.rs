//! End-to-end tests for the `ags` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn ags(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ags").expect("binary built");
    cmd.arg("--state")
        .arg(dir.path().join("state.json"))
        .env_remove("AGS_CONFIG")
        .env_remove("AGS_STATE_PATH")
        .env("XDG_CONFIG_HOME", dir.path())
        .env("HOME", dir.path());
    cmd
}

#[test]
fn status_on_fresh_state() {
    let dir = TempDir::new().unwrap();
    ags(&dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("revision:    0"))
        .stdout(predicate::str::contains("panic mode:  off"));
    assert!(dir.path().join("state.json").exists());
}

#[test]
fn acquire_conflict_and_release() {
    let dir = TempDir::new().unwrap();

    ags(&dir)
        .args(["acquire", "R1", "R2", "--owner", "alice", "--ttl-ms", "60000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("R1  owner=alice"));

    ags(&dir)
        .args(["acquire", "R2", "--owner", "bob"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("locked by 'alice'"));

    ags(&dir)
        .args(["release", "R2", "--owner", "alice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Released: R2"));

    ags(&dir)
        .args(["acquire", "R2", "--owner", "bob"])
        .assert()
        .success();
}

#[test]
fn panic_mode_blocks_cli_acquire() {
    let dir = TempDir::new().unwrap();

    ags(&dir)
        .args(["panic", "on"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Panic mode ON"));

    ags(&dir)
        .args(["acquire", "R1", "--owner", "alice"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("panic mode"));

    ags(&dir).args(["panic", "off"]).assert().success();
    ags(&dir)
        .args(["acquire", "R1", "--owner", "alice"])
        .assert()
        .success();
}

#[test]
fn json_locks_listing() {
    let dir = TempDir::new().unwrap();
    ags(&dir)
        .args(["acquire", "R1", "--owner", "alice"])
        .assert()
        .success();

    let output = ags(&dir).args(["--json", "locks"]).output().unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value[0]["resourceId"], "R1");
    assert_eq!(value[0]["owner"], "alice");
}

#[test]
fn wait_times_out_without_writers() {
    let dir = TempDir::new().unwrap();
    ags(&dir)
        .args(["--json", "wait", "--timeout-ms", "50"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"changed\":false"));
}

#[test]
fn wait_returns_when_already_past() {
    let dir = TempDir::new().unwrap();
    ags(&dir).args(["panic", "on"]).assert().success();
    ags(&dir)
        .args(["wait", "--since", "0", "--timeout-ms", "5000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("revision 1"))
        .stdout(predicate::str::contains("timed out").not());
}

#[test]
fn watch_emits_requested_heartbeats() {
    let dir = TempDir::new().unwrap();
    ags(&dir)
        .args(["watch", "--heartbeat-ms", "20", "--count", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("heartbeat").count(2));
}

#[test]
fn get_missing_collection_fails() {
    let dir = TempDir::new().unwrap();
    ags(&dir)
        .args(["get", "tasks"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No collection named 'tasks'"));
}

#[test]
fn invalid_config_is_reported() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("bad.toml");
    std::fs::write(&config, "poll_interval_ms = 0").unwrap();

    ags(&dir)
        .arg("--config")
        .arg(&config)
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}
