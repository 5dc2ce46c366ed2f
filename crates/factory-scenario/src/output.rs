//! Captured-output helpers
//!
//! Truncation counts Unicode scalar values, not bytes, so a tail never starts
//! in the middle of a multi-byte character.

/// Fallback summary when a failing scenario printed nothing
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Last `max_chars` characters of `text`
#[must_use]
pub fn tail_chars(text: &str, max_chars: usize) -> &str {
    if max_chars == 0 {
        return "";
    }
    match text.char_indices().rev().nth(max_chars - 1) {
        Some((start, _)) => &text[start..],
        None => text,
    }
}

/// First `max_chars` characters of `text`
#[must_use]
pub fn head_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Pick the most diagnostic line from a failing scenario's output
///
/// Scans stdout then stderr for lines mentioning an error, an assertion, a
/// failure or a traceback and returns the last one. Falls back to the last
/// non-empty line, then to [`UNKNOWN_ERROR`].
#[must_use]
pub fn summarize_error(stdout: &str, stderr: &str) -> String {
    let mut combined = String::with_capacity(stdout.len() + stderr.len() + 1);
    combined.push_str(stdout);
    if !stdout.is_empty() && !stdout.ends_with('\n') {
        combined.push('\n');
    }
    combined.push_str(stderr);

    let lines: Vec<&str> = combined.trim().lines().collect();
    if let Some(line) = lines.iter().rev().find(|line| is_error_line(line)) {
        return (*line).to_string();
    }
    lines
        .iter()
        .rev()
        .find(|line| !line.trim().is_empty())
        .map_or_else(|| UNKNOWN_ERROR.to_string(), |line| (*line).to_string())
}

fn is_error_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.contains("error") || lower.contains("assert") || line.contains("FAIL") || line.contains("Traceback")
}
