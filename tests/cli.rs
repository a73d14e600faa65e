use assert_cmd::Command;
use predicates::prelude::*;

const MISSING_PACKAGE: &str = "changelogger-no-such-package-zz9-plural-z-alpha";

#[test]
fn requires_a_package() {
    let mut cmd = Command::cargo_bin("changelogger").unwrap();
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("PACKAGE"));
}

#[test]
fn outputs_tool_name() {
    let mut cmd = Command::cargo_bin("changelogger").unwrap();
    cmd.arg("-V");
    cmd.assert().success().stdout("changelogger 0.1.0\n");
}

#[test]
fn help_mentions_options() {
    let mut cmd = Command::cargo_bin("changelogger").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("--verbose"))
        .stdout(predicates::str::contains("--branch"))
        .stdout(predicates::str::contains("--no-code-search"));
}

#[test]
fn unsupported_output_fails() {
    let mut cmd = Command::cargo_bin("changelogger").unwrap();
    cmd.args(["lodash", "--output", "xml"]);
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("Unsupported output format"));
}

#[test]
fn non_numeric_timeout_fails() {
    let mut cmd = Command::cargo_bin("changelogger").unwrap();
    cmd.args(["lodash", "--timeout", "soon"]);
    cmd.assert().failure();
}

// Resolution tests point `--npm` at a missing binary and disable code search,
// so only the unpkg probe leaves the process and it misses either way.

fn offline_cmd() -> Command {
    let mut cmd = Command::cargo_bin("changelogger").unwrap();
    cmd.env_remove("GITHUB_TOKEN")
        .env_remove("CHANGELOGGER_LOG")
        .args([
            "--npm",
            "changelogger-missing-npm",
            "--no-code-search",
            "--timeout",
            "5",
        ]);
    cmd
}

#[test]
fn missing_package_reports_not_found() {
    let mut cmd = offline_cmd();
    cmd.arg(MISSING_PACKAGE);
    cmd.assert()
        .success()
        .stdout("")
        .stderr(predicates::str::contains(format!(
            "{MISSING_PACKAGE}: CHANGELOG.md not found"
        )));
}

#[test]
fn each_package_is_reported_in_order() {
    let second = format!("{MISSING_PACKAGE}-two");
    let mut cmd = offline_cmd();
    cmd.args([MISSING_PACKAGE, second.as_str()]);
    let output = cmd.assert().success().get_output().stderr.clone();
    let stderr = String::from_utf8(output).expect("utf-8 stderr");

    let first_at = stderr
        .find(&format!("{MISSING_PACKAGE}: CHANGELOG.md not found"))
        .expect("first package reported");
    let second_at = stderr
        .find(&format!("{second}: CHANGELOG.md not found"))
        .expect("second package reported");
    assert!(first_at < second_at);
}

#[test]
fn json_output_lists_every_package() {
    let mut cmd = offline_cmd();
    cmd.args(["--output", "json", MISSING_PACKAGE]);
    let output = cmd.assert().success().get_output().stdout.clone();

    let results: serde_json::Value = serde_json::from_slice(&output).expect("json output");
    let items = results.as_array().expect("array");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["package"], MISSING_PACKAGE);
    assert_eq!(items[0]["method"], "not_found");
    assert_eq!(items[0]["url"], "");
}

#[test]
fn verbose_logs_strategies_to_stderr() {
    let mut cmd = offline_cmd();
    cmd.args(["--verbose", MISSING_PACKAGE]);
    cmd.assert()
        .success()
        .stderr(predicates::str::contains("trying strategy"));
}

#[test]
fn invalid_package_name_is_resolved_quietly() {
    let mut cmd = offline_cmd();
    cmd.arg("Bad Name");
    cmd.assert()
        .success()
        .stdout("")
        .stderr(predicates::str::contains("Bad Name: CHANGELOG.md not found"))
        .stderr(predicates::str::contains("suspicious").not());
}
