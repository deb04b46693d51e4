//! Logging setup.
//!
//! stdout carries the hook decision, so human-readable logs go to stderr.
//! `MGATE_LOG` sets the filter (default `warn`); `MGATE_LOG_FILE` adds a
//! JSON layer written through a non-blocking appender.

use crate::config::EnvParser;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_LEVEL: &str = "warn";

/// How the process should log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL.to_string(),
            file: None,
        }
    }
}

impl LogConfig {
    /// Read `MGATE_LOG` / `MGATE_LOG_FILE`. `verbose` raises the default
    /// level to `debug`; an explicit `MGATE_LOG` still wins.
    pub fn from_env(verbose: bool) -> Self {
        let mut parser = EnvParser::new();
        let default = if verbose { "debug" } else { DEFAULT_LEVEL };
        let level = parser
            .get_log_level("LOG")
            .unwrap_or_else(|| default.to_string());
        let file = parser.get_string("LOG_FILE").map(PathBuf::from);
        // Logging is not up yet; invalid levels silently use the default.
        Self { level, file }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_new(format!("mgate={0},mgate_common={0}", self.level))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
    }
}

/// Keeps the non-blocking file writer flushing until dropped.
#[must_use = "dropping the guards stops file logging"]
pub struct LoggingGuards {
    _file: Option<WorkerGuard>,
}

/// Install the global subscriber. Calling it twice is harmless: the second
/// install is ignored.
pub fn init_logging(config: &LogConfig) -> LoggingGuards {
    let (file_layer, guard) = match config.file.as_deref().and_then(file_writer) {
        Some((writer, guard)) => {
            let layer = fmt::layer()
                .json()
                .with_writer(writer)
                .with_current_span(false)
                .with_target(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let subscriber = tracing_subscriber::registry()
        .with(config.filter())
        .with(file_layer)
        .with(stderr_layer);
    let _ = tracing::subscriber::set_global_default(subscriber);

    LoggingGuards { _file: guard }
}

fn file_writer(
    path: &Path,
) -> Option<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let name = path.file_name()?;
    std::fs::create_dir_all(dir).ok()?;
    let appender = tracing_appender::rolling::never(dir, name);
    Some(tracing_appender::non_blocking(appender))
}
