//! Merges into the protected branch require complete milestone documents.

use super::GateContext;
use crate::decision::{Decision, GateKind};
use crate::docs::{required_docs, validate_milestone_docs};
use crate::repo_state::RepoInspector;
use crate::request::InterceptRequest;
use tracing::debug;

pub async fn evaluate<R: RepoInspector>(
    ctx: &GateContext<'_, R>,
    request: &InterceptRequest,
) -> Decision {
    let Some(command) = request.command() else {
        return Decision::Allow;
    };
    if !ctx.matcher.mentions_operation(command) {
        return Decision::Allow;
    }

    let Some(branch) = ctx.repo.current_branch().await else {
        debug!("Branch unknown, allowing '{}'", command);
        return Decision::Allow;
    };
    let Some(rule) = ctx.matcher.matching_rule(command, &branch) else {
        return Decision::Allow;
    };
    debug!("Protected-branch operation ({}) from '{}'", rule, branch);

    let config = ctx.config;
    let milestone = config.milestone_name(&branch);
    if milestone.is_empty() {
        return Decision::block(
            GateKind::Merge,
            format!(
                "Cannot merge to main from a non-milestone branch.\n\n\
                 Create a milestone branch first:\n  \
                 git checkout -b {}001-feature-name",
                config.milestone_prefix
            ),
        );
    }

    let failures = validate_milestone_docs(
        ctx.workdir,
        &config.milestones_dir,
        milestone,
        &required_docs(config),
    );
    if failures.is_empty() {
        return Decision::Allow;
    }

    let lines: Vec<String> = failures.iter().map(|f| format!("  - {f}")).collect();
    Decision::block(
        GateKind::Merge,
        format!(
            "Cannot merge milestone '{milestone}' - required documents are incomplete:\n\n\
             {}\n\n\
             Complete these files before merging:\n\
             1. scope.md - Copy from {dir}/.templates/scope.md\n\
             2. code_review.md - Document the code review findings\n\
             3. verification.md - Paste actual test/lint/build output under {sections}",
            lines.join("\n"),
            dir = config.milestones_dir,
            sections = config.verification_sections.join(", "),
        ),
    )
}
