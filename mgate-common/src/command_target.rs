//! Write-target extraction for shell commands.
//!
//! Given the raw text of a `Bash` tool call, find the single file the
//! command most likely writes to. Extraction is best-effort: anything the
//! parser cannot make sense of yields no target, and every caller treats
//! "no target" as allow.
//!
//! Order of precedence:
//! 1. Output redirection anywhere in the command (`>`, `>>`, `>|`, `&>`).
//! 2. Write-shaped verbs (`cp`, `mv`, `touch`, `tee`, `sed -i`) in each
//!    chained segment, first match wins.

use crate::path::NormalizedPath;
use thiserror::Error;
use tracing::debug;

/// Errors from the quote-aware segment tokenizer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizeError {
    #[error("unterminated {0} quote")]
    UnterminatedQuote(char),
    #[error("trailing escape character")]
    TrailingEscape,
}

/// Words that run the next word as the real command.
const COMMAND_WRAPPERS: &[&str] = &[
    "sudo", "env", "command", "builtin", "nohup", "time", "nice", "exec",
];

/// Redirection sinks that never touch the working tree.
const DEVICE_SINKS: &[&str] = &["/dev/null", "/dev/stdout", "/dev/stderr", "/dev/tty"];

/// Characters that end an unquoted redirection word.
const WORD_TERMINATORS: &[char] = &[';', '&', '|', '<', '>', '(', ')'];

/// Extract the most likely file-write target of a shell command.
pub fn extract_write_target(command: &str) -> Option<NormalizedPath> {
    if let Some(target) = find_redirect_target(command) {
        debug!("Write target from redirection: {}", target);
        return Some(target);
    }

    for segment in split_segments(command) {
        let tokens = match tokenize_segment(segment) {
            Ok(tokens) => tokens,
            Err(e) => {
                debug!("Skipping untokenizable segment: {}", e);
                continue;
            }
        };
        if let Some(target) = target_from_tokens(&tokens) {
            debug!("Write target from command verb: {}", target);
            return Some(target);
        }
    }

    None
}

/// Split a command on `&&`, `||`, `;`, `|` and newlines outside quotes.
///
/// Once a quote is left open, the rest of the command is split lexically
/// so the malformed quote only spoils the segment it appears in.
fn split_segments(command: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let bytes = command.as_bytes();
    let len = bytes.len();
    let mut start = 0;
    let mut i = 0;
    let mut quote: Option<u8> = None;

    while i < len {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == q {
                quote = None;
            } else if b == b'\\' && q == b'"' {
                i += 1;
            }
            i += 1;
            continue;
        }
        match b {
            b'\'' | b'"' => {
                quote = Some(b);
                i += 1;
            }
            b'\\' => i += 2,
            _ => match separator_width(bytes, i) {
                0 => i += 1,
                width => {
                    segments.push(&command[start..i]);
                    i += width;
                    start = i;
                }
            },
        }
    }

    if quote.is_some() {
        segments.extend(split_lexically(&command[start..]));
    } else {
        segments.push(&command[start..]);
    }

    segments
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Split on every separator, quotes or not.
fn split_lexically(command: &str) -> Vec<&str> {
    let bytes = command.as_bytes();
    let mut segments = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match separator_width(bytes, i) {
            0 => i += 1,
            width => {
                segments.push(&command[start..i]);
                i += width;
                start = i;
            }
        }
    }
    segments.push(&command[start..]);
    segments
}

/// Byte length of the chain separator at `i`, or 0.
fn separator_width(bytes: &[u8], i: usize) -> usize {
    match (bytes[i], bytes.get(i + 1)) {
        (b'&', Some(b'&')) | (b'|', Some(b'|')) => 2,
        (b';' | b'|' | b'\n', _) => 1,
        _ => 0,
    }
}

/// Split one command segment into words, honoring single quotes, double
/// quotes and backslash escapes the way a POSIX shell would.
pub fn tokenize_segment(segment: &str) -> Result<Vec<String>, TokenizeError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut chars = segment.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                in_token = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(ch) => current.push(ch),
                        None => return Err(TokenizeError::UnterminatedQuote('\'')),
                    }
                }
            }
            '"' => {
                in_token = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(ch @ ('"' | '\\' | '$' | '`')) => current.push(ch),
                            Some('\n') => {}
                            Some(ch) => {
                                current.push('\\');
                                current.push(ch);
                            }
                            None => return Err(TokenizeError::UnterminatedQuote('"')),
                        },
                        Some(ch) => current.push(ch),
                        None => return Err(TokenizeError::UnterminatedQuote('"')),
                    }
                }
            }
            '\\' => match chars.next() {
                Some('\n') => {}
                Some(ch) => {
                    in_token = true;
                    current.push(ch);
                }
                None => return Err(TokenizeError::TrailingEscape),
            },
            c if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                in_token = true;
                current.push(c);
            }
        }
    }

    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Find the first redirection whose target is a real file.
fn find_redirect_target(command: &str) -> Option<NormalizedPath> {
    let chars: Vec<char> = command.chars().collect();
    let mut in_single = false;
    let mut in_double = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '\\' && !in_single {
            i += 2;
            continue;
        }
        if c == '\'' && !in_double {
            in_single = !in_single;
        } else if c == '"' && !in_single {
            in_double = !in_double;
        } else if c == '>' && !in_single && !in_double {
            let mut j = i + 1;
            if chars.get(j) == Some(&'>') || chars.get(j) == Some(&'|') {
                j += 1;
            }
            // Process substitution `>(cmd)` is not a file write.
            if chars.get(j) == Some(&'(') {
                i = j + 1;
                continue;
            }
            let fd_dup = chars.get(j) == Some(&'&');
            if fd_dup {
                j += 1;
            }
            while chars.get(j).is_some_and(|ch| ch.is_whitespace()) {
                j += 1;
            }
            let (word, next) = read_word(&chars, j);
            i = next.max(i + 1);

            if word.is_empty() || is_device_sink(&word) {
                continue;
            }
            if fd_dup && word.chars().all(|ch| ch.is_ascii_digit() || ch == '-') {
                continue;
            }
            let target = NormalizedPath::new(&word);
            if !target.is_empty() {
                return Some(target);
            }
            continue;
        }
        i += 1;
    }

    None
}

/// Read one shell word starting at `start`, stripping quotes.
fn read_word(chars: &[char], start: usize) -> (String, usize) {
    let mut word = String::new();
    let mut quote: Option<char> = None;
    let mut i = start;

    while i < chars.len() {
        let c = chars[i];
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => word.push(c),
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == '\\' => {
                if let Some(&next) = chars.get(i + 1) {
                    word.push(next);
                }
                i += 1;
            }
            None if c.is_whitespace() || WORD_TERMINATORS.contains(&c) => break,
            None => word.push(c),
        }
        i += 1;
    }

    (word, i)
}

fn is_device_sink(word: &str) -> bool {
    DEVICE_SINKS.contains(&word) || word.starts_with("/dev/fd/")
}

fn basename(token: &str) -> &str {
    token.rsplit('/').next().unwrap_or(token)
}

fn is_env_assignment(token: &str) -> bool {
    match token.find('=') {
        Some(eq) if eq > 0 => token[..eq]
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_'),
        _ => false,
    }
}

/// Arguments that are not flags. Everything after `--` counts.
fn positional_args(args: &[String]) -> Vec<&str> {
    let mut positional = Vec::new();
    let mut end_of_options = false;
    for arg in args {
        if end_of_options {
            positional.push(arg.as_str());
        } else if arg == "--" {
            end_of_options = true;
        } else if !arg.starts_with('-') {
            positional.push(arg.as_str());
        }
    }
    positional
}

/// Recognize the fixed set of write-shaped verbs in one tokenized segment.
fn target_from_tokens(tokens: &[String]) -> Option<NormalizedPath> {
    let mut idx = 0;
    while idx < tokens.len() {
        let token = tokens[idx].as_str();
        if is_env_assignment(token) {
            idx += 1;
        } else if COMMAND_WRAPPERS.contains(&basename(token)) {
            idx += 1;
            while idx < tokens.len() && tokens[idx].starts_with('-') {
                idx += 1;
            }
        } else {
            break;
        }
    }

    let verb = basename(tokens.get(idx)?);
    let args = &tokens[idx + 1..];

    let raw = match verb {
        "cp" | "mv" => {
            let positional = positional_args(args);
            if positional.len() >= 2 {
                positional.last().copied()
            } else {
                None
            }
        }
        "touch" | "tee" => positional_args(args).first().copied(),
        "sed" if args.iter().any(|a| is_sed_in_place_flag(a)) => sed_target(args),
        _ => None,
    }?;

    let target = NormalizedPath::new(raw);
    (!target.is_empty()).then_some(target)
}

fn is_sed_in_place_flag(arg: &str) -> bool {
    arg.starts_with("-i") || arg.starts_with("--in-place")
}

/// Last file operand of `sed -i`, skipping the values of `-e`/`-f`.
fn sed_target(args: &[String]) -> Option<&str> {
    let mut operands = Vec::new();
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        match arg.as_str() {
            "-e" | "-f" | "--expression" | "--file" => skip_next = true,
            a if a.starts_with('-') => {}
            a => operands.push(a),
        }
    }
    operands.last().copied()
}
