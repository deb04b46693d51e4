//! Environment variable parsing with type safety.
//!
//! Every getter returns `None` when the variable is unset, so callers only
//! override what the user actually set. Invalid values are collected so all
//! issues can be reported at once.

use std::env;
use thiserror::Error;

/// Errors that can occur during environment variable parsing.
#[derive(Debug, Error)]
pub enum EnvError {
    /// Invalid value for a variable.
    #[error("Invalid value for {var}: expected {expected}, got '{value}'")]
    InvalidValue {
        var: String,
        expected: String,
        value: String,
    },

    /// Value out of valid range.
    #[error("Value out of range for {var}: {value} (valid: {min}..={max})")]
    OutOfRange {
        var: String,
        value: String,
        min: String,
        max: String,
    },

    /// Invalid log level.
    #[error("Invalid log level for {var}: {value}")]
    InvalidLogLevel { var: String, value: String },
}

/// Type-safe environment variable parser.
pub struct EnvParser {
    prefix: &'static str,
    errors: Vec<EnvError>,
}

impl EnvParser {
    /// Create a new parser with the MGATE_ prefix.
    pub fn new() -> Self {
        Self {
            prefix: "MGATE_",
            errors: Vec::new(),
        }
    }

    /// Take ownership of errors.
    pub fn take_errors(&mut self) -> Vec<EnvError> {
        std::mem::take(&mut self.errors)
    }

    fn var_name(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    /// A non-empty string value.
    pub fn get_string(&mut self, name: &str) -> Option<String> {
        env::var(self.var_name(name))
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// A u64 value within `min..=max`.
    pub fn get_u64_range(&mut self, name: &str, min: u64, max: u64) -> Option<u64> {
        let var_name = self.var_name(name);
        let value = env::var(&var_name).ok()?;
        match value.trim().parse::<u64>() {
            Ok(n) if (min..=max).contains(&n) => Some(n),
            Ok(n) => {
                self.errors.push(EnvError::OutOfRange {
                    var: var_name,
                    value: n.to_string(),
                    min: min.to_string(),
                    max: max.to_string(),
                });
                None
            }
            Err(_) => {
                self.errors.push(EnvError::InvalidValue {
                    var: var_name,
                    expected: "unsigned integer".to_string(),
                    value,
                });
                None
            }
        }
    }

    /// A log level (`trace`..`error`, `off`), lowercased.
    pub fn get_log_level(&mut self, name: &str) -> Option<String> {
        let var_name = self.var_name(name);
        let value = env::var(&var_name).ok()?;
        let lower = value.trim().to_lowercase();
        match lower.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" | "off" => Some(lower),
            _ => {
                self.errors.push(EnvError::InvalidLogLevel {
                    var: var_name,
                    value,
                });
                None
            }
        }
    }

    /// A comma-separated list. A set-but-empty list is rejected: it would
    /// disable the gate it configures.
    pub fn get_string_list(&mut self, name: &str) -> Option<Vec<String>> {
        let var_name = self.var_name(name);
        let value = env::var(&var_name).ok()?;
        let items: Vec<String> = value
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if items.is_empty() {
            self.errors.push(EnvError::InvalidValue {
                var: var_name,
                expected: "comma-separated list".to_string(),
                value,
            });
            return None;
        }
        Some(items)
    }
}

impl Default for EnvParser {
    fn default() -> Self {
        Self::new()
    }
}
