//! Review state derived from the comments already on a pull request.
//!
//! The state is recomputed from scratch on every run; the comment thread
//! itself is the only memory the reviewer has.

pub mod markers;

use std::collections::HashSet;

use serde::Serialize;

use crate::constants::SUMMARY_TITLE;
use crate::models::comment::{RawComment, location_key};

pub use markers::{append_bot_marker, base_commit_marker, extract_base_commits};

/// Bolded section headings of a generated summary.
const SUMMARY_SECTIONS: &[&str] = &[
    "**new features**",
    "**bug fixes**",
    "**documentation**",
    "**refactor**",
    "**performance**",
    "**tests**",
    "**chores**",
];

/// What the pull request's comment thread says about earlier runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReviewState {
    pub has_summary: bool,
    /// `path:line` of every inline comment the bot already posted.
    pub existing_inline_keys: HashSet<String>,
    pub last_reviewed_commit: Option<String>,
    /// A human asked the bot to stop (an "LGTM" comment).
    pub pause_requested: bool,
    /// Comments of either kind carrying the bot marker.
    pub bot_comment_count: usize,
}

impl ReviewState {
    /// Whether `head` was already reviewed.
    pub fn is_current(&self, head: Option<&str>) -> bool {
        match (self.last_reviewed_commit.as_deref(), head) {
            (Some(last), Some(head)) => !head.is_empty() && last == head,
            _ => false,
        }
    }
}

/// Scan `comments` in order and derive the review state.
pub fn derive_state(
    comments: &[RawComment],
    bot_marker: &str,
    marker_prefix: &str,
    marker_suffix: &str,
) -> ReviewState {
    let mut state = ReviewState::default();
    let summary_title = SUMMARY_TITLE.to_lowercase();

    for comment in comments {
        let is_bot = !bot_marker.is_empty() && comment.body.contains(bot_marker);
        if is_bot {
            state.bot_comment_count += 1;
        }

        if comment.is_inline {
            if is_bot {
                if let (Some(path), Some(line)) = (comment.path.as_deref(), comment.to_line) {
                    state.existing_inline_keys.insert(location_key(path, line));
                }
            }
            continue;
        }

        let lowered = comment.body.trim().to_lowercase();
        if lowered.is_empty() {
            continue;
        }

        if is_summary(&lowered, &summary_title) {
            state.has_summary = true;
        }

        if let Some(commit) = extract_base_commits(&comment.body, marker_prefix, marker_suffix)
            .into_iter()
            .last()
        {
            state.last_reviewed_commit = Some(commit);
        }

        if !is_bot && lowered.contains("lgtm") {
            state.pause_requested = true;
        }
    }

    state
}

fn is_summary(lowered: &str, summary_title: &str) -> bool {
    lowered.starts_with(summary_title)
        || lowered.starts_with("## summary")
        || lowered.starts_with("**summary")
        || SUMMARY_SECTIONS.iter().any(|s| lowered.contains(s))
}
