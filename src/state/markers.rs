//! Invisible HTML-comment markers embedded in the bot's own comments.
//!
//! Nothing is persisted between runs. The bot marker identifies comments the
//! bot authored and the base-commit marker records which commit a summary
//! or progress note covered.

use regex::Regex;

use crate::constants::{BASE_MARKER_PREFIX, BASE_MARKER_SUFFIX, BOT_MARKER};

/// Append the bot marker on its own line, unless already present.
pub fn append_bot_marker(body: &str) -> String {
    if body.contains(BOT_MARKER) {
        return body.to_string();
    }
    let body = body.trim_end();
    if body.is_empty() {
        BOT_MARKER.to_string()
    } else {
        format!("{body}\n\n{BOT_MARKER}")
    }
}

/// The marker recording that `commit` was reviewed.
pub fn base_commit_marker(commit: &str) -> String {
    format!("{BASE_MARKER_PREFIX}{commit}{BASE_MARKER_SUFFIX}")
}

/// Every commit recorded in `body` between `prefix` and `suffix`, in order.
///
/// Empty or whitespace-only captures are skipped.
pub fn extract_base_commits(body: &str, prefix: &str, suffix: &str) -> Vec<String> {
    if prefix.is_empty() {
        return Vec::new();
    }
    let pattern = format!("{}(.*?){}", regex::escape(prefix), regex::escape(suffix));
    let Ok(re) = Regex::new(&pattern) else {
        return Vec::new();
    };
    re.captures_iter(body)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|commit| !commit.is_empty())
        .map(str::to_string)
        .collect()
}
