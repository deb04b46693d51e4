use serde_json::Value;
use std::process::Output;

pub fn assert_contains(haystack: &str, needle: &str) {
    assert!(
        haystack.contains(needle),
        "Expected to find '{needle}' in output, got: {haystack}"
    );
}

/// The hook exited 0 and printed nothing.
pub fn assert_silent(output: &Output) {
    assert!(output.status.success(), "Hook exited with failure");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.trim().is_empty(), "Expected empty output, got: {stdout}");
}

/// The hook exited 0 and printed a block payload. Returns the reason.
pub fn assert_blocked(output: &Output) -> String {
    assert!(output.status.success(), "Hook exited with failure");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let value: Value = serde_json::from_str(stdout.trim())
        .unwrap_or_else(|e| panic!("Expected JSON block payload ({e}), got: {stdout}"));
    assert_eq!(value["decision"], "block", "payload: {value}");
    value["reason"]
        .as_str()
        .expect("block payload without reason")
        .to_string()
}
