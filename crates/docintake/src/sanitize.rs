//! Helpers for shaping data before it enters log lines and span attributes.
//!
//! Extracted text can be large and paths can reveal directory layouts; these
//! keep both short.

use std::path::Path;

/// Returns only the filename component of a path (no directory).
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "<unknown>".to_string())
}

/// First `max_chars` characters of `text` on a single line, with `...`
/// appended when something was cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let mut out: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        out.push_str("...");
    }
    out.replace(['\n', '\r'], " ")
}
