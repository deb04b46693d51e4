//! Registers the gate hooks in a Claude Code settings file.
//!
//! Two entries are managed:
//! - `PreToolUse` on write-capable tools runs `mgate hook`
//! - `PostToolUse` on write and shell tools runs `mgate advise`
//!
//! Unrelated keys and hooks are preserved. Re-running is a no-op.

use anyhow::{Context, Result};
use serde_json::{Value, json};
use std::borrow::Cow;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// (event, matcher, subcommand) for every managed hook.
const MANAGED_HOOKS: &[(&str, &str, &str)] = &[
    ("PreToolUse", "Write|Edit|MultiEdit|NotebookEdit|Bash", "hook"),
    ("PostToolUse", "Write|Edit|MultiEdit|Bash", "advise"),
];

/// Outcome of an install run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallResult {
    /// Every managed hook was already present.
    AlreadyInstalled,
    /// Settings were written; the previous file was backed up if it existed.
    Installed { backup: Option<PathBuf> },
    /// Dry run: the settings that would have been written.
    DryRun(String),
}

impl fmt::Display for InstallResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallResult::AlreadyInstalled => write!(f, "already installed"),
            InstallResult::Installed { backup: Some(b) } => {
                write!(f, "installed (backup: {})", b.display())
            }
            InstallResult::Installed { backup: None } => write!(f, "installed"),
            InstallResult::DryRun(content) => write!(f, "{content}"),
        }
    }
}

/// Where to install.
#[derive(Debug, Clone)]
pub struct InstallOptions {
    pub settings_path: PathBuf,
    /// Program the hook entries invoke.
    pub program: String,
    pub dry_run: bool,
}

impl InstallOptions {
    /// Project settings under `workdir`, or the user-level file when `global`.
    pub fn resolve(settings: Option<PathBuf>, global: bool, workdir: &Path) -> Result<PathBuf> {
        if let Some(path) = settings {
            return Ok(path);
        }
        if global {
            let home = dirs::home_dir().context("Could not determine home directory")?;
            return Ok(home.join(".claude").join("settings.json"));
        }
        Ok(workdir.join(".claude").join("settings.json"))
    }
}

/// Path of the running binary, shell-quoted for a hook command line.
pub fn current_program() -> String {
    match std::env::current_exe() {
        Ok(path) => shell_escape::escape(Cow::Owned(path.to_string_lossy().into_owned())).into_owned(),
        Err(e) => {
            warn!("Could not resolve current executable ({}), using 'mgate'", e);
            "mgate".to_string()
        }
    }
}

/// Whether a hook command runs mgate with `subcommand`.
fn is_managed_command(command: &str, subcommand: &str) -> bool {
    let command = command.trim_start();
    let (program, rest) = match command.chars().next() {
        Some(q @ ('\'' | '"')) => match command[1..].find(q) {
            Some(end) => (&command[1..=end], &command[end + 2..]),
            None => (command, ""),
        },
        _ => command
            .split_once(char::is_whitespace)
            .unwrap_or((command, "")),
    };
    let is_mgate = Path::new(program)
        .file_name()
        .is_some_and(|n| n == "mgate");
    is_mgate && rest.split_whitespace().next() == Some(subcommand)
}

/// Whether `event` already has a hook running `subcommand`.
fn has_managed_hook(settings: &Value, event: &str, subcommand: &str) -> bool {
    let Some(entries) = settings
        .get("hooks")
        .and_then(|h| h.get(event))
        .and_then(Value::as_array)
    else {
        return false;
    };
    entries.iter().any(|entry| {
        entry
            .get("hooks")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|inner| inner.get("command").and_then(Value::as_str))
            .any(|cmd| is_managed_command(cmd, subcommand))
    })
}

/// Add every missing managed hook. Returns whether anything changed.
fn add_managed_hooks(settings: &mut Value, program: &str) -> Result<bool> {
    let mut changed = false;
    for &(event, matcher, subcommand) in MANAGED_HOOKS {
        if has_managed_hook(settings, event, subcommand) {
            debug!("{} hook already present", event);
            continue;
        }

        let hooks = settings
            .as_object_mut()
            .ok_or_else(|| anyhow::anyhow!("Settings is not an object"))?
            .entry("hooks")
            .or_insert_with(|| json!({}));
        let hooks_obj = hooks
            .as_object_mut()
            .ok_or_else(|| anyhow::anyhow!("Hooks is not an object"))?;
        let entries = hooks_obj.entry(event).or_insert_with(|| json!([]));
        if !entries.is_array() {
            warn!("{} is not an array, replacing it", event);
            *entries = json!([]);
        }
        entries
            .as_array_mut()
            .ok_or_else(|| anyhow::anyhow!("{event} should be an array after initialization"))?
            .push(json!({
                "matcher": matcher,
                "hooks": [
                    {
                        "type": "command",
                        "command": format!("{program} {subcommand}"),
                    }
                ]
            }));
        changed = true;
    }
    Ok(changed)
}

/// Writes content to a file atomically through a uniquely named temp file.
fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let parent = path.parent().context("Path has no parent directory")?;
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create {}", parent.display()))?;
    let temp_path = parent.join(format!(".{}.tmp", Uuid::new_v4()));

    let mut file = fs::File::create(&temp_path)
        .with_context(|| format!("Failed to create temp file {}", temp_path.display()))?;
    file.write_all(content)
        .with_context(|| format!("Failed to write temp file {}", temp_path.display()))?;
    file.sync_all().context("Failed to sync temp file")?;

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e).with_context(|| format!("Failed to replace {}", path.display()));
    }
    Ok(())
}

/// Copy `path` to `<name>.bak.<timestamp>` next to it.
fn create_backup(path: &Path) -> Result<PathBuf> {
    let backup_name = format!(
        "{}.bak.{}",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("settings.json"),
        chrono::Utc::now().format("%Y%m%d_%H%M%S")
    );
    let backup_path = path
        .parent()
        .map(|p| p.join(&backup_name))
        .unwrap_or_else(|| PathBuf::from(&backup_name));

    fs::copy(path, &backup_path)
        .with_context(|| format!("Failed to create backup at {}", backup_path.display()))?;
    debug!("Created backup: {}", backup_path.display());
    Ok(backup_path)
}

/// Install the managed hooks into `options.settings_path`.
pub fn install(options: &InstallOptions) -> Result<InstallResult> {
    let path = &options.settings_path;
    let existing = match fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", path.display()));
        }
    };

    // A malformed file is never overwritten: the user has to fix it first.
    let mut settings: Value = match &existing {
        Some(content) if !content.trim().is_empty() => serde_json::from_str(content)
            .with_context(|| format!("{} is not valid JSON", path.display()))?,
        _ => json!({}),
    };

    if !add_managed_hooks(&mut settings, &options.program)? {
        return Ok(InstallResult::AlreadyInstalled);
    }

    let mut content = serde_json::to_string_pretty(&settings)?;
    content.push('\n');
    if options.dry_run {
        return Ok(InstallResult::DryRun(content));
    }

    let backup = match existing {
        Some(_) => Some(create_backup(path)?),
        None => None,
    };
    atomic_write(path, content.as_bytes())?;
    info!("Installed milestone gate hooks in {}", path.display());
    Ok(InstallResult::Installed { backup })
}
