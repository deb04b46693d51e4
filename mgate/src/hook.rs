//! Hook plumbing: read the envelope from stdin, decide, write the payload.
//!
//! Every failure path ends in a silent allow. The process exit status never
//! carries the decision.

use anyhow::Context;
use mgate_common::{
    GateEngine, GateKind, HookInput, HookOutput, InterceptRequest, advise, load_config,
};
use std::io::{self, Write};
use std::path::PathBuf;
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

/// Upper bound on the envelope read from stdin.
const MAX_INPUT_BYTES: u64 = 10 * 1024 * 1024;

/// PreToolUse: decide and print a block payload when needed.
pub async fn run_hook(gates: &[GateKind]) -> anyhow::Result<()> {
    let Some(input) = read_hook_input().await? else {
        return Ok(());
    };
    let output = process_hook(&input, gates).await;
    emit(&output)
}

/// PostToolUse: print an advisory when one applies.
pub async fn run_advise() -> anyhow::Result<()> {
    let Some(input) = read_hook_input().await? else {
        return Ok(());
    };
    let workdir = resolve_workdir(&input);
    let config = load_config(&workdir);
    match advise(&input, &config, &workdir) {
        Some(advisory) => emit(&HookOutput::from(&advisory)),
        None => Ok(()),
    }
}

/// Evaluate one envelope against the enabled gates.
pub async fn process_hook(input: &HookInput, gates: &[GateKind]) -> HookOutput {
    let Some(request) = InterceptRequest::from_hook_input(input) else {
        debug!("Tool {} is not gated, allowing", input.tool_name);
        return HookOutput::allow();
    };

    let workdir = resolve_workdir(input);
    let config = load_config(&workdir);
    let engine = GateEngine::for_workdir(config, workdir).with_gates(gates);
    let decision = engine.evaluate(&request).await;
    HookOutput::from(&decision)
}

/// Read and parse stdin. `None` means "nothing to decide": empty or
/// malformed input.
async fn read_hook_input() -> anyhow::Result<Option<HookInput>> {
    let mut raw = String::new();
    tokio::io::stdin()
        .take(MAX_INPUT_BYTES)
        .read_to_string(&mut raw)
        .await
        .context("Failed to read hook input")?;

    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    match serde_json::from_str(raw) {
        Ok(input) => Ok(Some(input)),
        Err(e) => {
            warn!("Failed to parse hook input: {}", e);
            Ok(None)
        }
    }
}

/// The envelope's `cwd`, or the process working directory.
fn resolve_workdir(input: &HookInput) -> PathBuf {
    input
        .cwd
        .as_deref()
        .filter(|cwd| !cwd.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Allow is silence; anything else is one JSON line.
fn emit(output: &HookOutput) -> anyhow::Result<()> {
    if !output.should_emit() {
        return Ok(());
    }
    let json = serde_json::to_string(output)?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{json}")?;
    stdout.flush()?;
    Ok(())
}
