use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;

fn write_temp(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("taskwire-cli-{}-{name}", std::process::id()));
    fs::write(&path, contents).expect("write temp file");
    path
}

#[test]
fn validate_succeeds_on_a_valid_template() {
    let plan = write_temp(
        "valid.json",
        r#"{"nodes": [{"type": "service", "name": "fetch"}]}"#,
    );
    Command::cargo_bin("taskwire-runner")
        .expect("binary")
        .args(["validate", "--template"])
        .arg(&plan)
        .assert()
        .success()
        .stdout(predicate::str::contains("template is valid"));
    fs::remove_file(plan).ok();
}

#[test]
fn validate_exits_nonzero_on_duplicate_aliases() {
    let plan = write_temp(
        "invalid.json",
        r#"{"nodes": [{"type": "service", "name": "a"}, {"type": "service", "name": "a"}]}"#,
    );
    Command::cargo_bin("taskwire-runner")
        .expect("binary")
        .args(["validate", "--template"])
        .arg(&plan)
        .assert()
        .failure()
        .stderr(predicate::str::contains("template.alias.duplicate"));
    fs::remove_file(plan).ok();
}

#[test]
fn run_streams_events_and_prints_the_outcome() {
    let plan = write_temp(
        "run.json",
        r#"{"nodes": [{"type": "service", "name": "fetch"}]}"#,
    );
    let bindings = write_temp("run-bindings.json", r#"{"fetch": {"result": 41}}"#);
    Command::cargo_bin("taskwire-runner")
        .expect("binary")
        .args(["run", "--events-jsonl", "-", "--template"])
        .arg(&plan)
        .arg("--bindings")
        .arg(&bindings)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"event\":\"completed\""))
        .stdout(predicate::str::contains("task completed: 41"));
    fs::remove_file(plan).ok();
    fs::remove_file(bindings).ok();
}
