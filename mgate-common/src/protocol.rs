//! Claude Code hook protocol definitions.
//!
//! Defines the JSON structures for PreToolUse/PostToolUse hook input and
//! the decision payloads written back on stdout.

use crate::decision::Decision;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Input received from a Claude Code PreToolUse or PostToolUse hook.
#[derive(Debug, Clone, Deserialize)]
pub struct HookInput {
    /// The tool being invoked (e.g., "Bash", "Write", "Edit").
    pub tool_name: String,
    /// Tool-specific input.
    #[serde(default)]
    pub tool_input: ToolInput,
    /// Tool result, only present for PostToolUse.
    #[serde(default)]
    pub tool_response: Option<Value>,
    /// Working directory of the session.
    #[serde(default)]
    pub cwd: Option<String>,
}

/// Tool-specific input. Only the fields the gates care about are modelled;
/// everything else in the payload is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolInput {
    /// Shell command (Bash).
    #[serde(default)]
    pub command: Option<String>,
    /// Target file (Write, Edit, MultiEdit).
    #[serde(default)]
    pub file_path: Option<String>,
    /// Target notebook (NotebookEdit).
    #[serde(default)]
    pub notebook_path: Option<String>,
}

impl HookInput {
    /// `tool_response.stderr`, empty for any other response shape.
    pub fn tool_stderr(&self) -> &str {
        self.tool_response
            .as_ref()
            .and_then(|response| response.get("stderr"))
            .and_then(Value::as_str)
            .unwrap_or("")
    }
}

/// Output sent back to Claude Code.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum HookOutput {
    /// Allow the operation (no output is written).
    Allow(AllowOutput),
    /// Block the operation with a reason shown to the agent.
    Block(BlockOutput),
    /// Non-blocking context injected after a tool ran.
    Advise(AdvisoryOutput),
}

/// Empty output to allow execution.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AllowOutput {}

/// Output to block execution.
#[derive(Debug, Clone, Serialize)]
pub struct BlockOutput {
    pub decision: String,
    pub reason: String,
}

/// Output carrying advisory context.
#[derive(Debug, Clone, Serialize)]
pub struct AdvisoryOutput {
    #[serde(rename = "hookSpecificOutput")]
    pub hook_specific_output: AdvisoryHookSpecificOutput,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdvisoryHookSpecificOutput {
    #[serde(rename = "hookEventName")]
    pub hook_event_name: String,
    #[serde(rename = "additionalContext")]
    pub additional_context: String,
}

impl HookOutput {
    /// Create an allow output (operation proceeds normally).
    pub fn allow() -> Self {
        Self::Allow(AllowOutput {})
    }

    /// Create a block output with a reason.
    pub fn block(reason: impl Into<String>) -> Self {
        Self::Block(BlockOutput {
            decision: "block".to_string(),
            reason: reason.into(),
        })
    }

    /// Create a PostToolUse advisory.
    pub fn advise(context: impl Into<String>) -> Self {
        Self::Advise(AdvisoryOutput {
            hook_specific_output: AdvisoryHookSpecificOutput {
                hook_event_name: "PostToolUse".to_string(),
                additional_context: context.into(),
            },
        })
    }

    /// Whether anything should be written to stdout.
    ///
    /// An allow is communicated by silence.
    pub fn should_emit(&self) -> bool {
        !matches!(self, Self::Allow(_))
    }
}

impl From<&Decision> for HookOutput {
    fn from(decision: &Decision) -> Self {
        match decision {
            Decision::Allow => HookOutput::allow(),
            Decision::Block { reason, .. } => HookOutput::block(reason.clone()),
        }
    }
}
