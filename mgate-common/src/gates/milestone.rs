//! Code changes happen only on milestone branches.

use super::GateContext;
use crate::decision::{Decision, GateKind};
use crate::repo_state::RepoInspector;
use crate::request::InterceptRequest;
use tracing::debug;

pub async fn evaluate<R: RepoInspector>(
    ctx: &GateContext<'_, R>,
    request: &InterceptRequest,
) -> Decision {
    let Some(target) = ctx.write_target(request) else {
        return Decision::Allow;
    };

    if ctx.classifier.is_protected_path(&target) {
        debug!("{} is a bookkeeping path, writable from any branch", target);
        return Decision::Allow;
    }

    let Some(branch) = ctx.repo.current_branch().await else {
        debug!("Branch unknown, allowing write to {}", target);
        return Decision::Allow;
    };
    if branch.starts_with(&ctx.config.milestone_prefix) {
        return Decision::Allow;
    }

    let shown = if branch.is_empty() { "(detached HEAD)" } else { &branch };
    Decision::block(
        GateKind::Milestone,
        format!(
            "Cannot write code outside a milestone branch.\n\n\
             Current branch: {shown}\n\n\
             To start a new milestone:\n  \
             git checkout -b {prefix}001-feature-name\n\n\
             Then create your scope document:\n  \
             {dir}/001-feature-name/scope.md",
            prefix = ctx.config.milestone_prefix,
            dir = ctx.config.milestones_dir,
        ),
    )
}
