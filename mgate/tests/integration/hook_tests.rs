use serde_json::json;

use crate::common::fixtures::{bash_payload, write_payload};
use crate::common::{GitRepo, assert_blocked, assert_contains, assert_silent, init_test_logging};

#[test]
fn test_milestone_gate_blocks_bash_redirect_on_main() {
    init_test_logging();
    crate::test_log!("TEST START: test_milestone_gate_blocks_bash_redirect_on_main");

    let repo = GitRepo::new("main");
    let output = repo.hook(&bash_payload("echo hi > notes.txt"));
    let reason = assert_blocked(&output);
    assert_contains(&reason, "Current branch: main");
    assert_contains(&reason, "git checkout -b milestone/001-feature-name");

    crate::test_log!("TEST PASS: test_milestone_gate_blocks_bash_redirect_on_main");
}

#[test]
fn test_milestone_gate_allows_non_write_commands() {
    init_test_logging();
    let repo = GitRepo::new("main");
    for command in ["git status", "ls -la", "cargo test 2>&1 | tail", "cat README.md > /dev/null"] {
        crate::test_log!("command: {}", command);
        assert_silent(&repo.hook(&bash_payload(command)));
    }
}

#[test]
fn test_milestone_gate_allows_milestone_branch() {
    init_test_logging();
    let repo = GitRepo::new("milestone/001-x");
    assert_silent(&repo.hook(&bash_payload("echo hi > notes.txt")));
    assert_silent(&repo.hook(&write_payload("Write", "src/app.ts")));
}

#[test]
fn test_milestone_gate_blocks_direct_write_on_main() {
    init_test_logging();
    let repo = GitRepo::new("main");
    let absolute = repo.path().join("src/app.ts");
    let output = repo.hook(&write_payload("Edit", &absolute.to_string_lossy()));
    assert_blocked(&output);
}

#[test]
fn test_bookkeeping_paths_writable_on_main() {
    init_test_logging();
    let repo = GitRepo::new("main");
    for path in ["milestones/001-x/scope.md", "PROJECT_PLAN.md", ".claude/settings.json"] {
        assert_silent(&repo.hook(&write_payload("Write", path)));
    }
}

#[test]
fn test_tdd_lock_blocks_bash_test_write() {
    init_test_logging();
    crate::test_log!("TEST START: test_tdd_lock_blocks_bash_test_write");

    let repo = GitRepo::new("main");
    repo.commit("src/app.ts", "export const value = 1;\n", "feat: add impl");
    repo.commit(
        "tests/app.test.ts",
        "it('works', () => expect(true).toBe(true));\n",
        "test: add app test",
    );
    repo.stage("src/app.ts", "export const value = 2;\n");

    let payload = bash_payload("echo update > tests/app.test.ts").to_string();
    let output = repo.run_mgate(&["hook", "--gate", "tdd-lock"], &payload);
    let reason = assert_blocked(&output);
    assert_contains(&reason, "Test file 'app.test.ts' is locked");

    crate::test_log!("TEST PASS: test_tdd_lock_blocks_bash_test_write");
}

#[test]
fn test_tdd_lock_allows_test_fix_commit() {
    init_test_logging();
    let repo = GitRepo::new("milestone/001-x");
    repo.commit("tests/app.test.ts", "it('works');\n", "test: add app test");
    repo.stage("tests/other.test.ts", "it('also works');\n");

    assert_silent(&repo.hook(&write_payload("Edit", "tests/app.test.ts")));
}

#[test]
fn test_tdd_lock_allows_new_test_on_milestone() {
    init_test_logging();
    let repo = GitRepo::new("milestone/001-x");
    repo.stage("src/app.ts", "export const value = 2;\n");
    assert_silent(&repo.hook(&write_payload("Write", "tests/new_test.py")));
}

#[test]
fn test_merge_gate_blocks_merge_on_main() {
    init_test_logging();
    let repo = GitRepo::new("main");
    let reason = assert_blocked(&repo.hook(&bash_payload("git merge milestone/001-foo")));
    assert_contains(&reason, "non-milestone branch");
}

#[test]
fn test_merge_gate_blocks_gh_pr_merge() {
    init_test_logging();
    let repo = GitRepo::new("main");
    repo.git(&["checkout", "-q", "-b", "milestone/001-gh-merge"]);
    let reason = assert_blocked(&repo.hook(&bash_payload("gh pr merge")));
    assert_contains(&reason, "milestones/001-gh-merge/scope.md is missing");
}

#[test]
fn test_merge_gate_allows_non_merge() {
    init_test_logging();
    let repo = GitRepo::new("main");
    assert_silent(&repo.hook(&bash_payload("git status")));
    assert_silent(&repo.hook(&bash_payload("git push origin main-feature")));
}

#[test]
fn test_merge_gate_rejects_empty_docs() {
    init_test_logging();
    let repo = GitRepo::new("main");
    repo.git(&["checkout", "-q", "-b", "milestone/001-validation"]);

    let long_md = format!("# Notes\n\n{}", "content ".repeat(20));
    repo.write("milestones/001-validation/scope.md", &long_md);
    repo.write("milestones/001-validation/code_review.md", &long_md);
    repo.write("milestones/001-validation/verification.md", " \n");

    let reason = assert_blocked(&repo.hook(&bash_payload("git push origin main")));
    assert_contains(&reason, "too short");
    assert_contains(&reason, "missing required section '## Lint Results'");
}

#[test]
fn test_merge_gate_allows_complete_milestone() {
    init_test_logging();
    let repo = GitRepo::new("milestone/002-done");
    repo.write_milestone_docs("002-done");
    assert_silent(&repo.hook(&bash_payload("git push origin main")));
}

#[test]
fn test_envelope_cwd_is_used() {
    init_test_logging();
    let repo = GitRepo::new("main");
    let elsewhere = GitRepo::new("milestone/001-x");
    let payload = json!({
        "tool_name": "Write",
        "tool_input": {"file_path": "src/app.ts"},
        "cwd": repo.path(),
    });
    let output = elsewhere.run_mgate(&["hook"], &payload.to_string());
    assert_blocked(&output);
}

#[test]
fn test_malformed_input_is_silent_allow() {
    init_test_logging();
    let repo = GitRepo::new("main");
    for payload in ["", "not json", "{\"tool_input\":{}}", "[1,2,3]"] {
        assert_silent(&repo.run_mgate(&["hook"], payload));
    }
}

#[test]
fn test_default_subcommand_is_hook() {
    init_test_logging();
    let repo = GitRepo::new("main");
    let output = repo.run_mgate(&[], &bash_payload("touch src/new.rs").to_string());
    assert_blocked(&output);
}

#[test]
fn test_outside_a_repository_allows() {
    init_test_logging();
    let dir = tempfile::TempDir::new().unwrap();
    let repo = GitRepo::new("milestone/001-x");
    for payload in [
        json!({"tool_name": "Write", "tool_input": {"file_path": "src/app.ts"}, "cwd": dir.path()}),
        json!({"tool_name": "Bash", "tool_input": {"command": "git push origin main"}, "cwd": dir.path()}),
    ] {
        assert_silent(&repo.run_mgate(&["hook"], &payload.to_string()));
    }
}

#[test]
fn test_detached_head_blocks_write() {
    init_test_logging();
    let repo = GitRepo::new("main");
    repo.git(&["checkout", "-q", "--detach"]);
    let reason = assert_blocked(&repo.hook(&write_payload("Write", "src/app.ts")));
    assert_contains(&reason, "Current branch: (detached HEAD)");
}
