//! Runs the enabled gates over one request.

use crate::config::GateConfig;
use crate::decision::{Decision, GateKind};
use crate::gates::{self, GateContext};
use crate::operation::OperationMatcher;
use crate::path::PathClassifier;
use crate::repo_state::{GitInspector, RepoInspector};
use crate::request::InterceptRequest;
use crate::util::mask_sensitive_command;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

/// Owns configuration, the repository inspector and the compiled matchers.
///
/// Gates run in [`GateKind::ALL`] order and evaluation stops at the first
/// block. Gates have no side effects, so stopping early is observationally
/// the same as running all of them.
pub struct GateEngine<R> {
    config: GateConfig,
    repo: R,
    classifier: PathClassifier,
    matcher: OperationMatcher,
    workdir: PathBuf,
    enabled: Vec<GateKind>,
}

impl GateEngine<GitInspector> {
    /// Engine backed by `git` in `workdir`.
    pub fn for_workdir(config: GateConfig, workdir: impl Into<PathBuf>) -> Self {
        let workdir = workdir.into();
        let repo = GitInspector::new(&workdir).with_timeout(config.git_timeout());
        Self::new(config, repo, workdir)
    }
}

impl<R: RepoInspector> GateEngine<R> {
    pub fn new(config: GateConfig, repo: R, workdir: impl Into<PathBuf>) -> Self {
        let classifier = PathClassifier::from_config(&config);
        let matcher = OperationMatcher::from_config(&config);
        Self {
            config,
            repo,
            classifier,
            matcher,
            workdir: workdir.into(),
            enabled: GateKind::ALL.to_vec(),
        }
    }

    /// Restrict evaluation to `gates`. An empty list keeps every gate.
    pub fn with_gates(mut self, gates: &[GateKind]) -> Self {
        if !gates.is_empty() {
            self.enabled = GateKind::ALL
                .into_iter()
                .filter(|g| gates.contains(g))
                .collect();
        }
        self
    }

    pub fn enabled_gates(&self) -> &[GateKind] {
        &self.enabled
    }

    /// Decide one request.
    pub async fn evaluate(&self, request: &InterceptRequest) -> Decision {
        let start = Instant::now();
        let ctx = GateContext {
            config: &self.config,
            repo: &self.repo,
            classifier: &self.classifier,
            matcher: &self.matcher,
            workdir: &self.workdir,
        };

        let subject = match request {
            InterceptRequest::FileWrite { path } => path.to_string(),
            InterceptRequest::ShellExec { command } => mask_sensitive_command(command),
        };
        debug!("Evaluating {} '{}'", request.kind(), subject);

        let mut decision = Decision::Allow;
        for &gate in &self.enabled {
            decision = gates::evaluate(gate, &ctx, request).await;
            if !decision.is_allow() {
                break;
            }
        }

        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        match decision.gate() {
            Some(gate) => info!(
                gate = %gate,
                kind = request.kind(),
                elapsed_ms,
                "Blocked '{}'",
                subject
            ),
            None => info!(kind = request.kind(), elapsed_ms, "Allowed '{}'", subject),
        }
        decision
    }
}
