//! Path normalization and lexical classification.
//!
//! Classification never touches the file system: a path is a test artifact
//! because of how it is spelled, not because of what it contains.

use crate::config::GateConfig;
use regex::{Regex, RegexBuilder};
use std::path::Path;
use std::sync::OnceLock;
use tracing::warn;

/// A path with shell quoting stripped, leading `./` removed and separators
/// canonicalized to `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedPath(String);

impl NormalizedPath {
    pub fn new(raw: &str) -> Self {
        let trimmed = raw
            .trim()
            .trim_matches(|c: char| c == '\'' || c == '"')
            .replace('\\', "/");
        let mut rest = trimmed.as_str();
        while let Some(stripped) = rest.strip_prefix("./") {
            rest = stripped;
        }
        Self(rest.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The path with a leading `root` removed. Lexical only: a path outside
    /// `root` comes back unchanged.
    pub fn relative_to(&self, root: &Path) -> NormalizedPath {
        let root = NormalizedPath::new(&root.to_string_lossy());
        let root = root.as_str().trim_end_matches('/');
        if root.is_empty() || root == "." {
            return self.clone();
        }
        match self.0.strip_prefix(root).and_then(|rest| rest.strip_prefix('/')) {
            Some(rest) if !rest.is_empty() => Self(rest.to_string()),
            _ => self.clone(),
        }
    }

    /// Final path component.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Directory components, excluding the file name.
    fn parent_components(&self) -> impl Iterator<Item = &str> {
        let mut parts: Vec<&str> = self.0.split('/').collect();
        parts.pop();
        parts.into_iter().filter(|p| !p.is_empty())
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Which part of the path a rule looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleScope {
    WholePath,
    FileName,
}

/// One named lexical rule for recognizing test artifacts.
struct TestPathRule {
    name: &'static str,
    scope: RuleScope,
    regex: Regex,
}

/// Rule table: (name, scope, pattern). Matching is case-insensitive.
const TEST_PATH_RULES: &[(&str, RuleScope, &str)] = &[
    // tests/, test/, __tests__/, spec/ at the root or any depth
    (
        "test-directory",
        RuleScope::WholePath,
        r"(?:^|/)(?:tests?|__tests__|spec)/",
    ),
    // app.test.ts, app.spec.js
    ("dot-infix", RuleScope::FileName, r"\.(?:test|spec)\."),
    // handler_test.go, user_spec.rb
    ("underscore-infix", RuleScope::FileName, r"_(?:test|spec)\."),
    // test_parser.py, spec_helper.rb
    ("prefix", RuleScope::FileName, r"^(?:test|spec)_"),
];

fn test_path_rules() -> &'static [TestPathRule] {
    static RULES: OnceLock<Vec<TestPathRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        TEST_PATH_RULES
            .iter()
            .filter_map(|&(name, scope, pattern)| {
                match RegexBuilder::new(pattern).case_insensitive(true).build() {
                    Ok(regex) => Some(TestPathRule {
                        name,
                        scope,
                        regex,
                    }),
                    Err(e) => {
                        warn!("Dropping test path rule {}: {}", name, e);
                        None
                    }
                }
            })
            .collect()
    })
}

/// Name of the first test rule the path matches, if any.
pub fn matching_test_rule(path: &str) -> Option<&'static str> {
    let path = NormalizedPath::new(path);
    if path.is_empty() {
        return None;
    }
    test_path_rules()
        .iter()
        .find(|rule| {
            let haystack = match rule.scope {
                RuleScope::WholePath => path.as_str(),
                RuleScope::FileName => path.file_name(),
            };
            rule.regex.is_match(haystack)
        })
        .map(|rule| rule.name)
}

/// Whether a path names a test artifact.
pub fn is_test_path(path: &str) -> bool {
    matching_test_rule(path).is_some()
}

/// Classifies paths against the workflow's bookkeeping locations.
#[derive(Debug, Clone)]
pub struct PathClassifier {
    milestones_dir: String,
    project_plan: String,
    control_dir: String,
}

impl Default for PathClassifier {
    fn default() -> Self {
        Self {
            milestones_dir: "milestones".to_string(),
            project_plan: "PROJECT_PLAN.md".to_string(),
            control_dir: ".claude".to_string(),
        }
    }
}

impl PathClassifier {
    pub fn from_config(config: &GateConfig) -> Self {
        Self {
            milestones_dir: config.milestones_dir.clone(),
            project_plan: config.project_plan.clone(),
            control_dir: config.control_dir.clone(),
        }
    }

    pub fn is_test_path(&self, path: &NormalizedPath) -> bool {
        is_test_path(path.as_str())
    }

    /// Whether a path is one of the workflow's own bookkeeping artifacts
    /// (milestone docs, the project plan, the control directory). These are
    /// writable from any branch.
    pub fn is_protected_path(&self, path: &NormalizedPath) -> bool {
        if path.is_empty() {
            return false;
        }
        if path.file_name() == self.project_plan {
            return true;
        }
        path.parent_components()
            .any(|dir| dir == self.milestones_dir || dir == self.control_dir)
    }
}
