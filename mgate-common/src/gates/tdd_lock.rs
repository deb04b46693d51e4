//! Committed test files are locked against edits that ride along with
//! implementation changes.
//!
//! | has history | non-test file staged | decision |
//! |-------------|----------------------|----------|
//! | no          | -                    | allow (red phase) |
//! | yes         | no                   | allow (test-fix commit) |
//! | yes         | yes                  | block |

use super::GateContext;
use crate::decision::{Decision, GateKind};
use crate::path::is_test_path;
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
    if !ctx.classifier.is_test_path(&target) {
        return Decision::Allow;
    }

    if !ctx.repo.has_history(target.as_str()).await {
        debug!("{} has no history, editable", target);
        return Decision::Allow;
    }

    let staged = ctx.repo.staged_paths().await;
    let Some(implementation) = staged.iter().find(|p| !is_test_path(p)) else {
        debug!("{} is locked but only tests are staged", target);
        return Decision::Allow;
    };
    debug!("{} is locked; {} is staged", target, implementation);

    Decision::block(
        GateKind::TddLock,
        format!(
            "Test file '{}' is locked (already committed).\n\n\
             TDD rule: Test files cannot be modified alongside implementation code.\n\n\
             To fix a test bug:\n  \
             1. Commit your current implementation changes first\n  \
             2. Then modify the test in a separate commit\n  \
             3. Use commit message: fix(test): <description>",
            target.file_name()
        ),
    )
}
