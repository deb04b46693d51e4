use mgate_common::{GateConfig, load_config};

use crate::common::fixtures::bash_payload;
use crate::common::{GitRepo, assert_blocked, assert_silent, init_test_logging};

#[test]
fn test_default_config_protects_main_and_master() {
    init_test_logging();
    crate::test_log!("TEST START: test_default_config_protects_main_and_master");

    let config = GateConfig::default();
    assert_eq!(config.protected_branches, vec!["main", "master"]);
    assert_eq!(config.milestone_prefix, "milestone/");

    crate::test_log!("TEST PASS: test_default_config_protects_main_and_master");
}

#[test]
fn test_project_config_changes_protected_branch() {
    init_test_logging();
    let repo = GitRepo::new("milestone/001-x");
    repo.write(
        ".claude/milestone-gate.toml",
        "protected_branches = [\"trunk\"]\n",
    );
    assert_eq!(load_config(repo.path()).protected_branches, vec!["trunk"]);

    assert_blocked(&repo.hook(&bash_payload("git push origin trunk")));
    assert_silent(&repo.hook(&bash_payload("git push origin main")));
}

#[test]
fn test_project_config_lowers_doc_threshold() {
    init_test_logging();
    let repo = GitRepo::new("milestone/001-small");
    repo.write(".claude/milestone-gate.toml", "min_doc_bytes = 5\n");
    repo.write("milestones/001-small/scope.md", "scope");
    repo.write("milestones/001-small/code_review.md", "lgtm!");
    repo.write(
        "milestones/001-small/verification.md",
        "## Test Results\n## Lint Results\n## Build Results\n",
    );
    assert_silent(&repo.hook(&bash_payload("git push origin main")));
}

#[test]
fn test_broken_config_does_not_block() {
    init_test_logging();
    let repo = GitRepo::new("milestone/001-x");
    repo.write(".claude/milestone-gate.toml", "this is = = not toml");
    assert_silent(&repo.hook(&bash_payload("echo hi > notes.txt")));
}
