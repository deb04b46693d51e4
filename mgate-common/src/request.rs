//! The operation a hook call proposes.

use crate::command_target::extract_write_target;
use crate::path::NormalizedPath;
use crate::protocol::HookInput;

/// Tools that write a single file named in `tool_input`.
const FILE_WRITE_TOOLS: &[&str] = &["Write", "Edit", "MultiEdit", "NotebookEdit"];

/// Shell tools whose `command` is inspected.
const SHELL_TOOLS: &[&str] = &["Bash"];

/// A proposed write-capable operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterceptRequest {
    /// A tool writing a literal file path.
    FileWrite { path: NormalizedPath },
    /// A shell command, arbitrary and possibly chained.
    ShellExec { command: String },
}

impl InterceptRequest {
    /// Derive the request from a hook envelope. `None` for tools the gates
    /// do not govern and for payloads missing the relevant field.
    pub fn from_hook_input(input: &HookInput) -> Option<Self> {
        let tool = input.tool_name.as_str();
        if FILE_WRITE_TOOLS.contains(&tool) {
            let raw = input
                .tool_input
                .file_path
                .as_deref()
                .or(input.tool_input.notebook_path.as_deref())?;
            let path = NormalizedPath::new(raw);
            return (!path.is_empty()).then_some(Self::FileWrite { path });
        }
        if SHELL_TOOLS.contains(&tool) {
            let command = input.tool_input.command.as_deref()?.trim();
            return (!command.is_empty()).then(|| Self::ShellExec {
                command: command.to_string(),
            });
        }
        None
    }

    /// The file this operation writes, if it can be determined.
    pub fn write_target(&self) -> Option<NormalizedPath> {
        match self {
            Self::FileWrite { path } => Some(path.clone()),
            Self::ShellExec { command } => extract_write_target(command),
        }
    }

    pub fn command(&self) -> Option<&str> {
        match self {
            Self::FileWrite { .. } => None,
            Self::ShellExec { command } => Some(command),
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FileWrite { .. } => "file-write",
            Self::ShellExec { .. } => "shell-exec",
        }
    }
}
