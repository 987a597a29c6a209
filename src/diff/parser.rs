//! Unified diff format parser.
//!
//! Parses the text returned by a forge's pull-request diff endpoint into
//! `Vec<FileDiff>`. Malformed input never fails: unparsable hunk headers
//! yield zero start lines and stray lines are classified as context.

use crate::models::diff::{DiffLine, FileDiff, Hunk};

/// Parse a unified diff string into a list of file diffs.
pub fn parse_unified_diff(input: &str) -> Vec<FileDiff> {
    let mut files: Vec<FileDiff> = Vec::new();
    let mut current: Option<FileDiff> = None;
    // Whether lines are currently being collected into the last hunk.
    let mut in_hunk = false;

    for line in input.lines() {
        if line.starts_with("diff --git") {
            if let Some(done) = current.take() {
                files.push(done);
            }
            current = Some(FileDiff::default());
            in_hunk = false;
            continue;
        }

        let Some(file) = current.as_mut() else {
            continue;
        };

        if line.starts_with("@@") {
            let (source_start, dest_start) = parse_hunk_header(line);
            file.hunks.push(Hunk {
                header: line.to_string(),
                source_start,
                dest_start,
                lines: Vec::new(),
            });
            in_hunk = true;
            continue;
        }

        if !in_hunk {
            // Extended headers: only the destination marker matters.
            if let Some(path) = line.strip_prefix("+++ ") {
                file.path = destination_path(path);
            }
            continue;
        }

        // "\ No newline at end of file" annotates the previous line.
        if line.starts_with('\\') {
            continue;
        }

        if let Some(hunk) = file.hunks.last_mut() {
            hunk.lines.push(DiffLine::new(line));
        }
    }

    if let Some(done) = current {
        files.push(done);
    }

    files
}

/// Extract the repository path from the text after `+++ `.
///
/// `b/src/x.rs` becomes `src/x.rs`; `/dev/null` (a deleted file) has no
/// destination and yields an empty path.
fn destination_path(marker: &str) -> String {
    let marker = marker.trim_end();
    // Some tools append a tab and a timestamp after the path.
    let marker = marker.split('\t').next().unwrap_or(marker);
    if marker == "/dev/null" {
        return String::new();
    }
    marker.strip_prefix("b/").unwrap_or(marker).to_string()
}

/// Parse the start lines out of `@@ -a,b +c,d @@ section`.
///
/// Each side that cannot be parsed defaults to `0`.
pub fn parse_hunk_header(header: &str) -> (u32, u32) {
    (
        start_after(header, '-').unwrap_or(0),
        start_after(header, '+').unwrap_or(0),
    )
}

/// Read the number following the first `marker`, cut at `,`, ` ` or `@`.
fn start_after(header: &str, marker: char) -> Option<u32> {
    let rest = &header[header.find(marker)? + 1..];
    let end = rest.find([',', ' ', '@']).unwrap_or(rest.len());
    rest[..end].trim().parse().ok()
}
