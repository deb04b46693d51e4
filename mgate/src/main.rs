//! Milestone Gate CLI.
//!
//! `mgate hook` is the PreToolUse entry point (also the default when no
//! subcommand is given); `mgate advise` is the PostToolUse one. Both always
//! exit 0 and speak only through stdout.

mod hook;
mod install;

use anyhow::Context;
use clap::{Parser, Subcommand};
use mgate_common::{
    Decision, GateEngine, GateKind, InterceptRequest, LogConfig, NormalizedPath, init_logging,
    load_config,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::warn;

#[derive(Parser)]
#[command(name = "mgate", version, about = "Milestone workflow gates for Claude Code hooks")]
struct Cli {
    /// Debug logging on stderr (MGATE_LOG still wins).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// PreToolUse hook: read the tool call on stdin, print a block if needed.
    Hook {
        /// Only run these gates (repeatable). Default: all.
        #[arg(long = "gate", value_name = "GATE", value_parser = parse_gate)]
        gates: Vec<GateKind>,
    },

    /// PostToolUse hook: print refactor and merge reminders.
    Advise,

    /// Evaluate a command or file write from the command line.
    Check {
        /// Shell command to evaluate.
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        command: Option<String>,

        /// File path to evaluate as a direct write.
        #[arg(long)]
        file: Option<String>,

        /// Repository to evaluate against.
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        #[arg(long = "gate", value_name = "GATE", value_parser = parse_gate)]
        gates: Vec<GateKind>,
    },

    /// Register the hooks in .claude/settings.json.
    Install {
        /// Settings file to edit (default: ./.claude/settings.json).
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Edit ~/.claude/settings.json instead of the project file.
        #[arg(long, conflicts_with = "settings")]
        global: bool,

        /// Print the resulting settings without writing them.
        #[arg(long)]
        dry_run: bool,
    },
}

fn parse_gate(value: &str) -> Result<GateKind, String> {
    GateKind::ALL
        .into_iter()
        .find(|g| g.as_str() == value)
        .ok_or_else(|| {
            let names: Vec<_> = GateKind::ALL.iter().map(|g| g.as_str()).collect();
            format!("unknown gate '{value}' (expected one of: {})", names.join(", "))
        })
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guards = init_logging(&LogConfig::from_env(cli.verbose));

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            warn!("Failed to start runtime: {}", e);
            return ExitCode::SUCCESS;
        }
    };

    match cli.command.unwrap_or(Commands::Hook { gates: Vec::new() }) {
        Commands::Hook { gates } => {
            if let Err(e) = runtime.block_on(hook::run_hook(&gates)) {
                warn!("Hook failed, allowing: {:#}", e);
            }
            ExitCode::SUCCESS
        }
        Commands::Advise => {
            if let Err(e) = runtime.block_on(hook::run_advise()) {
                warn!("Advisor failed: {:#}", e);
            }
            ExitCode::SUCCESS
        }
        Commands::Check {
            command,
            file,
            dir,
            gates,
        } => {
            let request = match (command, file) {
                (Some(command), _) => InterceptRequest::ShellExec { command },
                (None, Some(file)) => InterceptRequest::FileWrite {
                    path: NormalizedPath::new(&file),
                },
                (None, None) => return ExitCode::from(2),
            };
            let config = load_config(&dir);
            let engine = GateEngine::for_workdir(config, dir).with_gates(&gates);
            match runtime.block_on(engine.evaluate(&request)) {
                Decision::Allow => {
                    println!("allow");
                    ExitCode::SUCCESS
                }
                Decision::Block { gate, reason } => {
                    println!("block ({gate})\n\n{reason}");
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Install {
            settings,
            global,
            dry_run,
        } => match run_install(settings, global, dry_run) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("mgate install: {e:#}");
                ExitCode::FAILURE
            }
        },
    }
}

fn run_install(settings: Option<PathBuf>, global: bool, dry_run: bool) -> anyhow::Result<()> {
    let workdir = std::env::current_dir().context("Failed to read working directory")?;
    let options = install::InstallOptions {
        settings_path: install::InstallOptions::resolve(settings, global, &workdir)?,
        program: install::current_program(),
        dry_run,
    };
    let result = install::install(&options)?;
    match result {
        install::InstallResult::DryRun(content) => print!("{content}"),
        other => println!("{}: {}", options.settings_path.display(), other),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_gate() {
        assert_eq!(parse_gate("tdd-lock"), Ok(GateKind::TddLock));
        assert!(parse_gate("tdd").unwrap_err().contains("milestone, tdd-lock, merge"));
    }

    #[test]
    fn test_no_subcommand_defaults_to_hook() {
        let cli = Cli::try_parse_from(["mgate"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_hook_gate_filter() {
        let cli = Cli::try_parse_from(["mgate", "hook", "--gate", "merge", "--gate", "milestone"])
            .unwrap();
        let Some(Commands::Hook { gates }) = cli.command else {
            panic!("expected hook");
        };
        assert_eq!(gates, vec![GateKind::Merge, GateKind::Milestone]);
    }

    #[test]
    fn test_check_requires_a_subject() {
        assert!(Cli::try_parse_from(["mgate", "check"]).is_err());
        assert!(Cli::try_parse_from(["mgate", "check", "--command", "x", "--file", "y"]).is_err());
        assert!(Cli::try_parse_from(["mgate", "check", "--file", "src/a.rs"]).is_ok());
    }
}
