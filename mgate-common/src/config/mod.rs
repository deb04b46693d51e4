//! Gate configuration.
//!
//! Values are layered, lowest precedence first:
//! - built-in defaults ([`GateConfig::default`])
//! - `<workdir>/.claude/milestone-gate.toml`
//! - `MGATE_*` environment variables
//!
//! Configuration problems never block a tool call: every error is logged
//! and the offending value keeps its previous layer's value.

pub mod env;

pub use env::{EnvError, EnvParser};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Location of the project config file, relative to the working directory.
pub const CONFIG_FILE: &str = ".claude/milestone-gate.toml";

pub const MIN_DOC_BYTES_RANGE: (u64, u64) = (1, 1_000_000);
pub const GIT_TIMEOUT_MS_RANGE: (u64, u64) = (100, 60_000);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{key} = {value} is out of range ({min}..={max}), using default")]
    OutOfRange {
        key: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },

    #[error("{key} is empty, using default")]
    EmptyList { key: &'static str },

    #[error(transparent)]
    Env(#[from] EnvError),
}

/// Everything the gates and the advisor can be tuned with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub protected_branches: Vec<String>,
    pub milestone_prefix: String,
    pub milestones_dir: String,
    pub project_plan: String,
    pub control_dir: String,
    pub min_doc_bytes: u64,
    pub verification_sections: Vec<String>,
    pub git_timeout_ms: u64,
    pub refactor_line_threshold: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            protected_branches: vec!["main".to_string(), "master".to_string()],
            milestone_prefix: "milestone/".to_string(),
            milestones_dir: "milestones".to_string(),
            project_plan: "PROJECT_PLAN.md".to_string(),
            control_dir: ".claude".to_string(),
            min_doc_bytes: 100,
            verification_sections: vec![
                "## Test Results".to_string(),
                "## Lint Results".to_string(),
                "## Build Results".to_string(),
            ],
            git_timeout_ms: 5_000,
            refactor_line_threshold: 500,
        }
    }
}

impl GateConfig {
    pub fn git_timeout(&self) -> Duration {
        Duration::from_millis(self.git_timeout_ms)
    }

    /// Milestone name for a branch, or `""` when it is not a milestone branch.
    pub fn milestone_name<'a>(&self, branch: &'a str) -> &'a str {
        branch.strip_prefix(&self.milestone_prefix).unwrap_or("")
    }

    /// Read a config file. `Ok(None)` when the file does not exist.
    pub fn from_file(path: &Path) -> Result<Option<Self>, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        toml::from_str(&contents)
            .map(Some)
            .map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Apply `MGATE_*` overrides. Returns every variable that was rejected.
    pub fn apply_env(&mut self, parser: &mut EnvParser) -> Vec<ConfigError> {
        if let Some(v) = parser.get_string_list("PROTECTED_BRANCHES") {
            self.protected_branches = v;
        }
        if let Some(v) = parser.get_string("MILESTONE_PREFIX") {
            self.milestone_prefix = v;
        }
        if let Some(v) = parser.get_string("MILESTONES_DIR") {
            self.milestones_dir = v;
        }
        let (min, max) = MIN_DOC_BYTES_RANGE;
        if let Some(v) = parser.get_u64_range("MIN_DOC_BYTES", min, max) {
            self.min_doc_bytes = v;
        }
        if let Some(v) = parser.get_string_list("VERIFICATION_SECTIONS") {
            self.verification_sections = v;
        }
        let (min, max) = GIT_TIMEOUT_MS_RANGE;
        if let Some(v) = parser.get_u64_range("GIT_TIMEOUT_MS", min, max) {
            self.git_timeout_ms = v;
        }
        if let Some(v) = parser.get_u64_range("REFACTOR_LINE_THRESHOLD", 1, u64::MAX) {
            self.refactor_line_threshold = v;
        }
        parser.take_errors().into_iter().map(ConfigError::from).collect()
    }

    /// Reset out-of-range values to their defaults.
    pub fn validate(&mut self) -> Vec<ConfigError> {
        let defaults = Self::default();
        let mut errors = Vec::new();

        let checks: [(&'static str, &mut u64, u64, (u64, u64)); 2] = [
            (
                "min_doc_bytes",
                &mut self.min_doc_bytes,
                defaults.min_doc_bytes,
                MIN_DOC_BYTES_RANGE,
            ),
            (
                "git_timeout_ms",
                &mut self.git_timeout_ms,
                defaults.git_timeout_ms,
                GIT_TIMEOUT_MS_RANGE,
            ),
        ];
        for (key, value, default, (min, max)) in checks {
            if *value < min || *value > max {
                errors.push(ConfigError::OutOfRange {
                    key,
                    value: *value,
                    min,
                    max,
                });
                *value = default;
            }
        }

        let lists: [(&'static str, &mut Vec<String>, Vec<String>); 2] = [
            (
                "protected_branches",
                &mut self.protected_branches,
                defaults.protected_branches,
            ),
            (
                "verification_sections",
                &mut self.verification_sections,
                defaults.verification_sections,
            ),
        ];
        for (key, list, default) in lists {
            list.retain(|item| !item.trim().is_empty());
            if list.is_empty() {
                errors.push(ConfigError::EmptyList { key });
                *list = default;
            }
        }

        if self.milestone_prefix.is_empty() {
            self.milestone_prefix = defaults.milestone_prefix;
        }
        if self.milestones_dir.is_empty() {
            self.milestones_dir = defaults.milestones_dir;
        }
        errors
    }
}

/// Load the layered configuration for a working directory.
pub fn load_config(workdir: &Path) -> GateConfig {
    let path = workdir.join(CONFIG_FILE);
    let mut config = match GateConfig::from_file(&path) {
        Ok(Some(config)) => {
            debug!("Loaded config from {}", path.display());
            config
        }
        Ok(None) => GateConfig::default(),
        Err(e) => {
            warn!("Ignoring config file: {}", e);
            GateConfig::default()
        }
    };

    let mut errors = config.validate();
    errors.extend(config.apply_env(&mut EnvParser::new()));
    for e in &errors {
        warn!("Config: {}", e);
    }
    config
}
