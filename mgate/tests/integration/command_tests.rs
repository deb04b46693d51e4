use std::process::Command;

use serde_json::Value;

use crate::common::{GitRepo, assert_contains, init_test_logging};

#[test]
fn test_mgate_help_includes_description() {
    init_test_logging();
    crate::test_log!("TEST START: test_mgate_help_includes_description");

    let output = Command::new(env!("CARGO_BIN_EXE_mgate"))
        .arg("--help")
        .output()
        .expect("Failed to run mgate --help");

    assert!(output.status.success(), "mgate --help failed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_contains(&stdout, "Milestone workflow gates");

    crate::test_log!("TEST PASS: test_mgate_help_includes_description");
}

#[test]
fn test_check_reports_block_with_failure_status() {
    init_test_logging();
    let repo = GitRepo::new("main");
    let output = repo.run_mgate(&["check", "--command", "git merge milestone/001-x"], "");
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_contains(&stdout, "block (merge)");
}

#[test]
fn test_check_allows_on_milestone_branch() {
    init_test_logging();
    let repo = GitRepo::new("milestone/001-x");
    let output = repo.run_mgate(&["check", "--file", "src/app.ts"], "");
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "allow");
}

#[test]
fn test_install_then_reinstall() {
    init_test_logging();
    let repo = GitRepo::new("main");

    let first = repo.run_mgate(&["install"], "");
    assert!(first.status.success(), "{}", String::from_utf8_lossy(&first.stderr));
    assert_contains(&String::from_utf8_lossy(&first.stdout), "installed");

    let second = repo.run_mgate(&["install"], "");
    assert_contains(&String::from_utf8_lossy(&second.stdout), "already installed");

    let settings_path = repo.path().join(".claude/settings.json");
    let settings: Value =
        serde_json::from_str(&std::fs::read_to_string(settings_path).unwrap()).unwrap();
    let pre = settings["hooks"]["PreToolUse"].as_array().unwrap();
    assert_eq!(pre.len(), 1);
    let command = pre[0]["hooks"][0]["command"].as_str().unwrap();
    assert!(command.ends_with(" hook"), "{command}");
}

#[test]
fn test_install_dry_run_prints_settings() {
    init_test_logging();
    let repo = GitRepo::new("main");
    let output = repo.run_mgate(&["install", "--dry-run"], "");
    assert!(output.status.success());
    let printed: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(printed["hooks"]["PostToolUse"].is_array());
    assert!(!repo.path().join(".claude/settings.json").exists());
}
