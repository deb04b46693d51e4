//! Recognizing operations that land work on the protected branch.
//!
//! Implements a closed vocabulary of named rules, each a case-insensitive
//! regex template in which `{git}` expands to a `git` invocation with
//! optional global options, `{branch}` to a delimited protected-branch
//! token and `{names}` to the bare branch alternation. Classification runs
//! in two tiers:
//! - Tier 1: SIMD keyword filter (`merge`, `push`, `rebase`, `pull`)
//! - Tier 2: named rule match
//!
//! Branch tokens are delimited so `main-feature`, `mainline` or
//! `feature/main` never count as the protected branch.

use crate::config::GateConfig;
use memchr::memmem;
use regex::{Regex, RegexBuilder};
use std::borrow::Cow;
use tracing::{debug, warn};

/// Keywords at least one of which every rule requires.
static OPERATION_KEYWORDS: &[&str] = &["merge", "push", "rebase", "pull"];

/// `git` plus any global options (`-C dir`, `-c k=v`, `--no-pager`, ...).
const GIT_PREFIX: &str = r"\bgit(?:\s+(?:-[Cc]\s+\S+|--?[\w-]+(?:=\S+)?))*\s+";

/// Rule table: (name, template).
const RULE_TEMPLATES: &[(&str, &str)] = &[
    ("merge-protected", r"{git}merge\b[^;&|\n]*{branch}"),
    ("push-protected", r"{git}push\b[^;&|\n]*{branch}"),
    ("rebase-protected", r"{git}rebase\b[^;&|\n]*{branch}"),
    (
        "checkout-then-merge",
        r"{git}(?:checkout|switch)\s+(?:{names})\s*(?:&&|;)[^\n]*\bmerge\b",
    ),
    ("gh-pr-merge", r"\bgh\s+pr\s+merge\b"),
    ("pull-protected", r"{git}pull\b[^;&|\n]*{branch}"),
];

/// Any merge invocation, regardless of which branch it names.
const MERGE_INVOCATION: &str = r"{git}merge\b|\bgh\s+pr\s+merge\b";

/// Merge subcommands that only unwind an in-progress merge, anchored to the
/// start of one invocation.
const MERGE_UNWIND: &str = r"^{git}merge\s+--(?:abort|quit)\b";

/// Quoted `-m` values and any `--message` value. A message may mention a
/// branch without naming one. Bare `-m` words stay: `git rebase -m` is
/// `--merge`.
const MESSAGE_ARG: &str = r#"\s(?:-m\s*(?:'[^']*'|"(?:[^"\\]|\\.)*")|--message(?:=|\s+)(?:'[^']*'|"(?:[^"\\]|\\.)*"|\S+))"#;

/// A named, compiled rule.
#[derive(Debug)]
pub struct OperationRule {
    pub name: &'static str,
    regex: Regex,
}

impl OperationRule {
    pub fn is_match(&self, command: &str) -> bool {
        self.regex.is_match(command)
    }
}

/// Decides whether a command merges, pushes or rebases into the protected
/// branch.
#[derive(Debug)]
pub struct OperationMatcher {
    protected_branches: Vec<String>,
    rules: Vec<OperationRule>,
    merge_invocation: Option<Regex>,
    merge_unwind: Option<Regex>,
    message_arg: Option<Regex>,
}

impl Default for OperationMatcher {
    fn default() -> Self {
        Self::new(&GateConfig::default().protected_branches)
    }
}

impl OperationMatcher {
    pub fn new(protected_branches: &[String]) -> Self {
        let alternation = protected_branches
            .iter()
            .filter(|b| !b.is_empty())
            .map(|b| regex::escape(b))
            .collect::<Vec<_>>()
            .join("|");

        // With no protected branch configured only branch-agnostic rules apply.
        let rules = RULE_TEMPLATES
            .iter()
            .filter(|(_, template)| !alternation.is_empty() || !names_branch(template))
            .filter_map(|&(name, template)| {
                compile(name, template, &alternation).map(|regex| OperationRule { name, regex })
            })
            .collect();

        Self {
            protected_branches: protected_branches.to_vec(),
            rules,
            merge_invocation: compile("merge-invocation", MERGE_INVOCATION, &alternation),
            merge_unwind: compile("merge-unwind", MERGE_UNWIND, &alternation),
            message_arg: compile("message-arg", MESSAGE_ARG, &alternation),
        }
    }

    pub fn from_config(config: &GateConfig) -> Self {
        Self::new(&config.protected_branches)
    }

    pub fn rules(&self) -> &[OperationRule] {
        &self.rules
    }

    /// Whether `branch` is one of the protected branch names.
    pub fn is_protected_branch(&self, branch: &str) -> bool {
        !branch.is_empty() && self.protected_branches.iter().any(|b| b == branch)
    }

    /// Tier 1: cheap keyword prefilter. False means no rule can match.
    pub fn mentions_operation(&self, command: &str) -> bool {
        let lowered = command.to_ascii_lowercase();
        OPERATION_KEYWORDS
            .iter()
            .any(|kw| memmem::find(lowered.as_bytes(), kw.as_bytes()).is_some())
    }

    /// Whether the command invokes a merge (other than unwinding one).
    pub fn invokes_merge(&self, command: &str) -> bool {
        self.merges(&self.without_messages(command))
    }

    /// Name of the rule that makes this command a protected-branch
    /// operation, if any.
    pub fn matching_rule(&self, command: &str, current_branch: &str) -> Option<&'static str> {
        if !self.mentions_operation(command) {
            return None;
        }
        let command = self.without_messages(command);
        if self.is_protected_branch(current_branch) && self.merges(&command) {
            return Some("merge-on-protected");
        }
        let matched = self
            .rules
            .iter()
            .find(|rule| rule.is_match(&command))
            .map(|rule| rule.name);
        if let Some(name) = matched {
            debug!("Command matched protected-branch rule {}", name);
        }
        matched
    }

    /// Whether the command merges/pushes/rebases into the protected branch.
    pub fn targets_protected_branch(&self, command: &str, current_branch: &str) -> bool {
        self.matching_rule(command, current_branch).is_some()
    }
}

impl OperationMatcher {
    /// Any merge invocation that is not itself `--abort`/`--quit`.
    fn merges(&self, command: &str) -> bool {
        let Some(invocation) = &self.merge_invocation else {
            return false;
        };
        invocation.find_iter(command).any(|m| {
            !self
                .merge_unwind
                .as_ref()
                .is_some_and(|re| re.is_match(&command[m.start()..]))
        })
    }

    fn without_messages<'c>(&self, command: &'c str) -> Cow<'c, str> {
        match &self.message_arg {
            Some(re) => re.replace_all(command, " -m _"),
            None => Cow::Borrowed(command),
        }
    }
}

fn names_branch(template: &str) -> bool {
    template.contains("{branch}") || template.contains("{names}")
}

/// Expand a template and compile it case-insensitively.
fn compile(name: &str, template: &str, alternation: &str) -> Option<Regex> {
    let branch = format!(
        "(?:^|[\\s:+'\"])(?:refs/heads/|(?:origin|upstream)/)?(?:{alternation})(?:$|[\\s;&|:'\")])"
    );
    let pattern = template
        .replace("{git}", GIT_PREFIX)
        .replace("{names}", alternation)
        .replace("{branch}", &branch);

    match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(regex) => Some(regex),
        Err(e) => {
            warn!("Dropping operation rule {}: {}", name, e);
            None
        }
    }
}
