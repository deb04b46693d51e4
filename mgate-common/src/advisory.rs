//! PostToolUse advisories. These add context after a tool ran and never
//! block anything.

use crate::config::GateConfig;
use crate::operation::OperationMatcher;
use crate::protocol::{HookInput, HookOutput};
use memchr::memchr_iter;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Tool names whose written file is size-checked.
const SIZE_CHECKED_TOOLS: &[&str] = &["Write", "Edit", "MultiEdit"];

/// Words in a git/gh stderr that mean the operation did not land.
const FAILURE_MARKERS: &[&str] = &["error", "fatal", "rejected"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advisory {
    /// A written file grew past the line threshold.
    RefactorWarning {
        file_name: String,
        lines: u64,
        threshold: u64,
    },
    /// A merge into the protected branch went through.
    MergeReminder { project_plan: String },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RefactorWarning {
                file_name,
                lines,
                threshold,
            } => write!(
                f,
                "Warning: '{file_name}' is {lines} lines (threshold: {threshold}).\n\
                 Consider refactoring into smaller modules to improve maintainability."
            ),
            Self::MergeReminder { project_plan } => write!(
                f,
                "Milestone merged! Remember to update {project_plan}:\n  \
                 1. Mark the completed milestone checkbox as [x]\n  \
                 2. Move it to the 'Completed' section\n  \
                 3. Note any follow-up items discovered during implementation"
            ),
        }
    }
}

impl From<&Advisory> for HookOutput {
    fn from(advisory: &Advisory) -> Self {
        HookOutput::advise(advisory.to_string())
    }
}

/// Decide which advisory, if any, follows a completed tool call.
pub fn advise(input: &HookInput, config: &GateConfig, workdir: &Path) -> Option<Advisory> {
    match input.tool_name.as_str() {
        "Bash" => merge_reminder(input, config),
        tool if SIZE_CHECKED_TOOLS.contains(&tool) => refactor_warning(input, config, workdir),
        _ => None,
    }
}

fn refactor_warning(input: &HookInput, config: &GateConfig, workdir: &Path) -> Option<Advisory> {
    let raw = input.tool_input.file_path.as_deref()?;
    let path = workdir.join(raw);
    // Unreadable or missing files have nothing to warn about.
    let contents = std::fs::read(&path).ok()?;
    let lines = count_lines(&contents);
    if lines <= config.refactor_line_threshold {
        return None;
    }
    debug!("{} has {} lines", path.display(), lines);

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| raw.to_string());
    Some(Advisory::RefactorWarning {
        file_name,
        lines,
        threshold: config.refactor_line_threshold,
    })
}

fn merge_reminder(input: &HookInput, config: &GateConfig) -> Option<Advisory> {
    let command = input.tool_input.command.as_deref()?;
    let matcher = OperationMatcher::from_config(config);
    let landed_on_protected = matcher.invokes_merge(command)
        || matcher.matching_rule(command, "") == Some("push-protected");
    if !landed_on_protected {
        return None;
    }

    let stderr = input.tool_stderr().to_lowercase();
    if FAILURE_MARKERS.iter().any(|m| stderr.contains(m)) {
        debug!("Merge did not land, skipping reminder");
        return None;
    }

    Some(Advisory::MergeReminder {
        project_plan: config.project_plan.clone(),
    })
}

/// Line count the way an editor shows it: a trailing newline does not open
/// a new line.
fn count_lines(contents: &[u8]) -> u64 {
    let newlines = memchr_iter(b'\n', contents).count() as u64;
    match contents.last() {
        None => 0,
        Some(b'\n') => newlines,
        Some(_) => newlines + 1,
    }
}
