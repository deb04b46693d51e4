//! Live repository state.
//!
//! Every query shells out to `git` with a bounded timeout and degrades to a
//! safe default on any failure:
//!
//! | Query | Command | Default |
//! |-------|---------|---------|
//! | [`RepoInspector::current_branch`] | `git branch --show-current` | `None` |
//! | [`RepoInspector::staged_paths`] | `git diff --cached --name-only` | `[]` |
//! | [`RepoInspector::has_history`] | `git log --oneline -1 -- <path>` | `false` |
//!
//! An unknown branch is `None`, distinct from the `Some("")` of a detached
//! HEAD, so callers can allow on failure and still block when detached.
//! Nothing is cached: branch and index change between consecutive tool calls.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Default bound on a single git invocation.
pub const DEFAULT_GIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Failure of a single git invocation.
#[derive(Debug, Error)]
pub enum GitError {
    #[error("failed to spawn git: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("git timed out after {0:?}")]
    Timeout(Duration),

    #[error("git exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
}

/// Read-only view of the repository that the gates consult.
#[allow(async_fn_in_trait)]
pub trait RepoInspector {
    /// Checked-out branch name. `Some("")` when HEAD is detached, `None`
    /// when git could not answer.
    async fn current_branch(&self) -> Option<String>;

    /// Paths staged for the next commit.
    async fn staged_paths(&self) -> Vec<String>;

    /// Whether at least one commit touches `path`.
    async fn has_history(&self, path: &str) -> bool;
}

/// [`RepoInspector`] backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct GitInspector {
    workdir: PathBuf,
    timeout: Duration,
}

impl GitInspector {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            timeout: DEFAULT_GIT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run `git <args>` in the working directory and return trimmed stdout.
    pub async fn run_git(&self, args: &[&str]) -> Result<String, GitError> {
        let mut cmd = Command::new("git");
        cmd.arg("-C")
            .arg(&self.workdir)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match timeout(self.timeout, cmd.output()).await {
            Ok(result) => result?,
            Err(_) => return Err(GitError::Timeout(self.timeout)),
        };

        if !output.status.success() {
            return Err(GitError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl GitInspector {
    /// [`Self::run_git`] with every failure logged and turned into `None`.
    async fn query(&self, args: &[&str]) -> Option<String> {
        match self.run_git(args).await {
            Ok(out) => Some(out),
            Err(e) => {
                warn!("git {} failed: {}", args.join(" "), e);
                None
            }
        }
    }
}

impl RepoInspector for GitInspector {
    async fn current_branch(&self) -> Option<String> {
        self.query(&["branch", "--show-current"]).await
    }

    async fn staged_paths(&self) -> Vec<String> {
        self.query(&["diff", "--cached", "--name-only"])
            .await
            .map(|out| {
                out.lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    async fn has_history(&self, path: &str) -> bool {
        let committed = self
            .query(&["log", "--oneline", "-1", "--", path])
            .await
            .is_some_and(|out| !out.is_empty());
        debug!("History for {}: {}", path, committed);
        committed
    }
}
