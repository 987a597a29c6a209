//! Turning AI-reported positions into commentable destination lines.
//!
//! The model reports a 1-based flattened position and, optionally, the text
//! of the line it meant. Models miscount, so the anchor text wins when it can
//! be found near the reported position.

use serde::Serialize;
use strum::{Display, EnumString};

use super::index::LineIndex;
use crate::models::comment::{AiFeedback, Candidate};

/// Why an AI feedback item could not become a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Discard {
    /// Position outside `1..=len`.
    OutOfRange,
    /// The line only exists in the old revision.
    DeletedLine,
    /// No file path to attach the comment to.
    MissingLocation,
}

/// Discard counts by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiscardCounts {
    pub out_of_range: usize,
    pub deleted_line: usize,
    pub missing_location: usize,
}

impl DiscardCounts {
    pub fn record(&mut self, reason: Discard) {
        match reason {
            Discard::OutOfRange => self.out_of_range += 1,
            Discard::DeletedLine => self.deleted_line += 1,
            Discard::MissingLocation => self.missing_location += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.out_of_range + self.deleted_line + self.missing_location
    }
}

/// Every AI item of one file, resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileResolution {
    pub candidates: Vec<Candidate>,
    pub discarded: DiscardCounts,
}

/// Strip whitespace and one leading diff marker.
fn normalize(line: &str) -> &str {
    let line = line.trim();
    line.strip_prefix(['+', '-']).unwrap_or(line).trim()
}

/// Index of the line nearest to `hint` whose normalized text contains the
/// normalized `anchor`.
///
/// The hint is clamped into range, then checked first; the search then
/// widens one step at a time, left before right.
pub fn nearest_matching_line(lines: &[String], anchor: &str, hint: i64) -> Option<usize> {
    let needle = normalize(anchor);
    if needle.is_empty() || lines.is_empty() {
        return None;
    }

    let last = lines.len() - 1;
    let hint = usize::try_from(hint.max(0)).unwrap_or(usize::MAX).min(last);
    let matches = |i: usize| normalize(&lines[i]).contains(needle);

    if matches(hint) {
        return Some(hint);
    }
    for radius in 1..lines.len() {
        if let Some(left) = hint.checked_sub(radius) {
            if matches(left) {
                return Some(left);
            }
        }
        let right = hint + radius;
        if right <= last && matches(right) {
            return Some(right);
        }
        if radius > hint && right >= last {
            break;
        }
    }
    None
}

/// Resolve one feedback item for the file at `path`.
pub fn resolve(path: &str, index: &LineIndex, feedback: &AiFeedback) -> Result<Candidate, Discard> {
    if path.is_empty() {
        return Err(Discard::MissingLocation);
    }

    let position = feedback
        .anchor_text
        .as_deref()
        .and_then(|anchor| nearest_matching_line(&index.flat_lines, anchor, feedback.position - 1))
        .map_or(feedback.position, |found| found as i64 + 1);

    let mapping = index.at(position).ok_or(Discard::OutOfRange)?;
    if mapping.to_line <= 0 {
        return Err(Discard::DeletedLine);
    }

    Ok(Candidate {
        path: path.to_string(),
        position: mapping.to_line,
        body: feedback.body.clone(),
        from_line: mapping.from_line,
    })
}

/// Resolve all feedback for one file, keeping AI order.
pub fn resolve_file(path: &str, index: &LineIndex, feedback: &[AiFeedback]) -> FileResolution {
    let mut out = FileResolution::default();
    for item in feedback {
        match resolve(path, index, item) {
            Ok(candidate) => out.candidates.push(candidate),
            Err(reason) => {
                tracing::debug!(file = path, position = item.position, %reason, "feedback discarded");
                out.discarded.record(reason);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::index::build_index;
    use crate::diff::parser::parse_unified_diff;
    use crate::models::diff::NO_LINE;

    /// Ten lines: positions 1-10, two of them deleted.
    const DIFF: &str = "diff --git a/src/app.rs b/src/app.rs\n--- a/src/app.rs\n+++ b/src/app.rs\n\
@@ -1,8 +1,8 @@\n use std::io;\n fn main() {\n-    let x = 1;\n+    let x = compute();\n     println!(\"{x}\");\n-    old();\n+    new_call();\n+    another();\n     done();\n }\n";

    fn index() -> LineIndex {
        let files = parse_unified_diff(DIFF);
        build_index(&files[0].hunks)
    }

    fn feedback(position: i64, anchor: Option<&str>) -> AiFeedback {
        AiFeedback {
            position,
            body: "consider this".into(),
            anchor_text: anchor.map(String::from),
        }
    }

    #[test]
    fn position_without_anchor_uses_mapping() {
        let c = resolve("src/app.rs", &index(), &feedback(4, None)).unwrap();
        assert_eq!(c.position, 3);
        assert_eq!(c.from_line, NO_LINE);
        assert_eq!(c.path, "src/app.rs");
        assert_eq!(c.body, "consider this");
    }

    #[test]
    fn context_line_keeps_both_sides() {
        let c = resolve("src/app.rs", &index(), &feedback(2, None)).unwrap();
        assert_eq!(c.position, 2);
        assert_eq!(c.from_line, 2);
    }

    #[test]
    fn anchor_overrides_position() {
        // Reported at 2 but the text lives at flattened position 8.
        let c = resolve("src/app.rs", &index(), &feedback(2, Some("another();"))).unwrap();
        assert_eq!(c.position, 6);
    }

    #[test]
    fn anchor_with_diff_marker_is_normalized() {
        let c = resolve("src/app.rs", &index(), &feedback(1, Some("+  new_call();  "))).unwrap();
        assert_eq!(c.position, 5);
    }

    #[test]
    fn anchor_not_found_falls_back_to_position() {
        let c = resolve("src/app.rs", &index(), &feedback(9, Some("nothing like this"))).unwrap();
        assert_eq!(c.position, 7);
    }

    #[test]
    fn deleted_line_is_discarded() {
        assert_eq!(
            resolve("src/app.rs", &index(), &feedback(3, None)),
            Err(Discard::DeletedLine)
        );
        // Anchoring onto a deleted line is discarded too.
        assert_eq!(
            resolve("src/app.rs", &index(), &feedback(1, Some("old();"))),
            Err(Discard::DeletedLine)
        );
    }

    #[test]
    fn out_of_range_positions() {
        let idx = index();
        for position in [0, -1, 11, 1000] {
            assert_eq!(
                resolve("src/app.rs", &idx, &feedback(position, None)),
                Err(Discard::OutOfRange),
                "position {position}"
            );
        }
    }

    #[test]
    fn missing_path_is_discarded() {
        assert_eq!(
            resolve("", &index(), &feedback(2, None)),
            Err(Discard::MissingLocation)
        );
    }

    #[test]
    fn empty_anchor_is_ignored() {
        let c = resolve("src/app.rs", &index(), &feedback(4, Some("  + "))).unwrap();
        assert_eq!(c.position, 3);
    }

    #[test]
    fn nearest_prefers_left_on_tie() {
        let lines: Vec<String> = ["x", "dup", "y", "dup", "z"].iter().map(|s| s.to_string()).collect();
        assert_eq!(nearest_matching_line(&lines, "dup", 2), Some(1));
        assert_eq!(nearest_matching_line(&lines, "dup", 3), Some(3));
    }

    #[test]
    fn nearest_clamps_hint() {
        let lines: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        assert_eq!(nearest_matching_line(&lines, "a", 99), Some(0));
        assert_eq!(nearest_matching_line(&lines, "c", -5), Some(2));
        assert_eq!(nearest_matching_line(&lines, "q", 1), None);
        assert_eq!(nearest_matching_line(&[], "a", 0), None);
    }

    #[test]
    fn resolve_file_counts_discards() {
        let items = vec![
            feedback(4, None),
            feedback(3, None),
            feedback(42, None),
            feedback(8, None),
        ];
        let out = resolve_file("src/app.rs", &index(), &items);
        let lines: Vec<i64> = out.candidates.iter().map(|c| c.position).collect();
        assert_eq!(lines, vec![3, 6]);
        assert_eq!(out.discarded.deleted_line, 1);
        assert_eq!(out.discarded.out_of_range, 1);
        assert_eq!(out.discarded.total(), 2);
    }

    #[test]
    fn discard_display_is_snake_case() {
        assert_eq!(Discard::OutOfRange.to_string(), "out_of_range");
        assert_eq!(Discard::MissingLocation.to_string(), "missing_location");
    }
}
