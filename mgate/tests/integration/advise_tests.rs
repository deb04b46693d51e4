use serde_json::{Value, json};

use crate::common::{GitRepo, assert_contains, assert_silent, init_test_logging};

fn advisory_context(output: &std::process::Output) -> String {
    assert!(output.status.success(), "advise exited with failure");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let value: Value = serde_json::from_str(stdout.trim())
        .unwrap_or_else(|e| panic!("Expected advisory JSON ({e}), got: {stdout}"));
    assert_eq!(value["hookSpecificOutput"]["hookEventName"], "PostToolUse");
    value["hookSpecificOutput"]["additionalContext"]
        .as_str()
        .expect("advisory without context")
        .to_string()
}

#[test]
fn test_refactor_warning_for_large_file() {
    init_test_logging();
    let repo = GitRepo::new("milestone/001-x");
    repo.write("src/big.rs", &"let x = 1;\n".repeat(650));
    let payload = json!({"tool_name": "Write", "tool_input": {"file_path": "src/big.rs"}});

    let context = advisory_context(&repo.run_mgate(&["advise"], &payload.to_string()));
    assert_contains(&context, "'big.rs' is 650 lines (threshold: 500)");
}

#[test]
fn test_no_warning_for_small_file() {
    init_test_logging();
    let repo = GitRepo::new("milestone/001-x");
    repo.write("src/small.rs", "fn main() {}\n");
    let payload = json!({"tool_name": "Edit", "tool_input": {"file_path": "src/small.rs"}});
    assert_silent(&repo.run_mgate(&["advise"], &payload.to_string()));
}

#[test]
fn test_merge_reminder_after_successful_merge() {
    init_test_logging();
    let repo = GitRepo::new("main");
    let payload = json!({
        "tool_name": "Bash",
        "tool_input": {"command": "git merge --no-ff milestone/001-x"},
        "tool_response": {"stdout": "Merge made by the 'ort' strategy.", "stderr": ""},
    });
    let context = advisory_context(&repo.run_mgate(&["advise"], &payload.to_string()));
    assert_contains(&context, "Remember to update PROJECT_PLAN.md");
}

#[test]
fn test_no_reminder_when_push_rejected() {
    init_test_logging();
    let repo = GitRepo::new("milestone/001-x");
    let payload = json!({
        "tool_name": "Bash",
        "tool_input": {"command": "git push origin main"},
        "tool_response": {"stdout": "", "stderr": " ! [rejected]        main -> main (fetch first)"},
    });
    assert_silent(&repo.run_mgate(&["advise"], &payload.to_string()));
}
