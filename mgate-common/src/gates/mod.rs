//! The three policy gates.
//!
//! Each gate is a pure function of the request, the live repository state
//! and the file system. Gates never mutate anything; the only output is a
//! [`Decision`].

pub mod merge;
pub mod milestone;
pub mod tdd_lock;

use crate::config::GateConfig;
use crate::decision::{Decision, GateKind};
use crate::operation::OperationMatcher;
use crate::path::{NormalizedPath, PathClassifier};
use crate::repo_state::RepoInspector;
use crate::request::InterceptRequest;
use std::path::Path;

/// Everything a gate may consult.
pub struct GateContext<'a, R> {
    pub config: &'a GateConfig,
    pub repo: &'a R,
    pub classifier: &'a PathClassifier,
    pub matcher: &'a OperationMatcher,
    /// Root for resolving milestone documents.
    pub workdir: &'a Path,
}

impl<R> GateContext<'_, R> {
    /// The request's write target, relative to `workdir` when it lies
    /// inside it, so directories above the checkout never classify it.
    pub fn write_target(&self, request: &InterceptRequest) -> Option<NormalizedPath> {
        request
            .write_target()
            .map(|target| target.relative_to(self.workdir))
    }
}

/// Run one gate against a request.
pub async fn evaluate<R: RepoInspector>(
    gate: GateKind,
    ctx: &GateContext<'_, R>,
    request: &InterceptRequest,
) -> Decision {
    match gate {
        GateKind::Milestone => milestone::evaluate(ctx, request).await,
        GateKind::TddLock => tdd_lock::evaluate(ctx, request).await,
        GateKind::Merge => merge::evaluate(ctx, request).await,
    }
}
