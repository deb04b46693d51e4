//! Milestone Gate - shared decision engine.
//!
//! The hook binary hands every intercepted tool call to [`GateEngine`],
//! which combines command parsing, lexical path classification and live
//! git state into a single allow/block [`Decision`].

pub mod advisory;
pub mod command_target;
pub mod config;
pub mod decision;
pub mod docs;
pub mod engine;
pub mod gates;
pub mod logging;
pub mod operation;
pub mod path;
pub mod protocol;
pub mod repo_state;
pub mod request;
pub mod util;

pub use advisory::{Advisory, advise};
pub use command_target::{TokenizeError, extract_write_target, tokenize_segment};
pub use config::{ConfigError, GateConfig, load_config};
pub use decision::{Decision, GateKind};
pub use docs::{DocFailure, RequiredDoc, required_docs, validate_milestone_docs};
pub use engine::GateEngine;
pub use logging::{LogConfig, LoggingGuards, init_logging};
pub use operation::OperationMatcher;
pub use path::{NormalizedPath, PathClassifier, is_test_path};
pub use protocol::{HookInput, HookOutput, ToolInput};
pub use repo_state::{GitError, GitInspector, RepoInspector};
pub use request::InterceptRequest;
pub use util::mask_sensitive_command;
