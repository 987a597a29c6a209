//! Diff-related types: file diffs, hunks, diff lines, and line mappings.

use serde::{Deserialize, Serialize};

/// Sentinel line number for a side of the diff that does not exist.
pub const NO_LINE: i64 = -1;

/// Classification of a single diff line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    /// Present only in the new revision (`+`).
    Added,
    /// Present only in the old revision (`-`).
    Deleted,
    /// Unchanged, present on both sides.
    Context,
}

impl LineKind {
    /// Classify a raw diff line by its leading character.
    pub fn of(raw: &str) -> Self {
        match raw.as_bytes().first() {
            Some(b'+') => LineKind::Added,
            Some(b'-') => LineKind::Deleted,
            _ => LineKind::Context,
        }
    }
}

/// A single line in a hunk, kept verbatim including its `+`/`-`/space prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    pub raw: String,
    pub kind: LineKind,
}

impl DiffLine {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let kind = LineKind::of(&raw);
        Self { raw, kind }
    }
}

/// A contiguous block of a file diff introduced by an `@@` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hunk {
    /// The full `@@ -a,b +c,d @@ ...` header line.
    pub header: String,
    /// First line number on the old side (`a`), `0` when unparsable.
    pub source_start: u32,
    /// First line number on the new side (`c`), `0` when unparsable.
    pub dest_start: u32,
    pub lines: Vec<DiffLine>,
}

/// All hunks of one changed file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiff {
    /// Destination path from the `+++ b/` marker. Empty for deleted files
    /// or when the marker is missing.
    pub path: String,
    pub hunks: Vec<Hunk>,
}

impl FileDiff {
    /// Total number of lines across all hunks.
    pub fn line_count(&self) -> usize {
        self.hunks.iter().map(|h| h.lines.len()).sum()
    }

    /// Whether comments can be placed on this file at all.
    pub fn is_reviewable(&self) -> bool {
        !self.path.is_empty() && self.line_count() > 0
    }
}

/// Old/new file line numbers for one flattened diff position.
///
/// `from_line` is [`NO_LINE`] for added lines and `to_line` is
/// [`NO_LINE`] for deleted lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineMapping {
    pub from_line: i64,
    pub to_line: i64,
}

impl LineMapping {
    pub fn new(from_line: i64, to_line: i64) -> Self {
        Self { from_line, to_line }
    }

    /// Line number in the old revision, if the line exists there.
    pub fn source(&self) -> Option<u32> {
        u32::try_from(self.from_line).ok().filter(|&n| n > 0)
    }

    /// Line number in the new revision, if the line exists there.
    pub fn dest(&self) -> Option<u32> {
        u32::try_from(self.to_line).ok().filter(|&n| n > 0)
    }
}
