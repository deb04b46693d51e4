//! Required milestone documents and their textual validation.
//!
//! Validation is purely textual: existence, trimmed byte length and literal
//! section-header substrings. The same file contents always produce the
//! same failures.

use crate::config::GateConfig;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// A document every milestone must carry before it can be merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredDoc {
    pub filename: &'static str,
    pub min_bytes: u64,
    pub required_sections: Vec<String>,
}

/// The three required documents: scope, code review, verification.
pub fn required_docs(config: &GateConfig) -> Vec<RequiredDoc> {
    let doc = |filename, required_sections| RequiredDoc {
        filename,
        min_bytes: config.min_doc_bytes,
        required_sections,
    };
    vec![
        doc("scope.md", Vec::new()),
        doc("code_review.md", Vec::new()),
        doc("verification.md", config.verification_sections.clone()),
    ]
}

/// One reason a milestone's documents are not ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocFailure {
    Missing {
        path: String,
    },
    Unreadable {
        path: String,
        error: String,
    },
    TooShort {
        path: String,
        bytes: u64,
        min_bytes: u64,
    },
    MissingSection {
        path: String,
        section: String,
    },
}

impl fmt::Display for DocFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { path } => write!(f, "{path} is missing"),
            Self::Unreadable { path, error } => write!(f, "{path} could not be read ({error})"),
            Self::TooShort {
                path,
                bytes,
                min_bytes,
            } => write!(
                f,
                "{path} is too short ({bytes} bytes, minimum {min_bytes})"
            ),
            Self::MissingSection { path, section } => {
                write!(f, "{path} is missing required section '{section}'")
            }
        }
    }
}

/// Validate every required document of `milestone` under
/// `<root>/<milestones_dir>/<milestone>/`. All failures are collected.
pub fn validate_milestone_docs(
    root: &Path,
    milestones_dir: &str,
    milestone: &str,
    docs: &[RequiredDoc],
) -> Vec<DocFailure> {
    let mut failures = Vec::new();

    for doc in docs {
        let display = format!("{milestones_dir}/{milestone}/{}", doc.filename);
        let file = root.join(milestones_dir).join(milestone).join(doc.filename);

        let contents = match std::fs::read(&file) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                failures.push(DocFailure::Missing { path: display });
                continue;
            }
            Err(e) if file.is_dir() => {
                debug!("{} is a directory: {}", file.display(), e);
                failures.push(DocFailure::Missing { path: display });
                continue;
            }
            Err(e) => {
                failures.push(DocFailure::Unreadable {
                    path: display,
                    error: e.to_string(),
                });
                continue;
            }
        };

        let bytes = contents.trim().len() as u64;
        if bytes < doc.min_bytes {
            failures.push(DocFailure::TooShort {
                path: display.clone(),
                bytes,
                min_bytes: doc.min_bytes,
            });
        }

        for section in &doc.required_sections {
            if !contents.contains(section.as_str()) {
                failures.push(DocFailure::MissingSection {
                    path: display.clone(),
                    section: section.clone(),
                });
            }
        }
    }

    failures
}
