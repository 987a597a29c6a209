//! Flattened line index over a file's hunks.
//!
//! The AI sees every hunk line of a file concatenated and numbered from 1.
//! The index keeps that flattened view together with the old/new file line
//! numbers of each position so a reported position can be turned back into
//! a real file line.

use serde::Serialize;

use crate::models::diff::{Hunk, LineKind, LineMapping, NO_LINE};

/// Flattened diff lines of one file and their line mapping.
///
/// `flat_lines` and `mapping` always have the same length.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LineIndex {
    pub flat_lines: Vec<String>,
    pub mapping: Vec<LineMapping>,
}

impl LineIndex {
    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// Mapping for a 1-based flattened position.
    pub fn at(&self, position: i64) -> Option<&LineMapping> {
        let idx = usize::try_from(position).ok()?.checked_sub(1)?;
        self.mapping.get(idx)
    }
}

/// Flatten `hunks` in order and compute the mapping of every line.
pub fn build_index(hunks: &[Hunk]) -> LineIndex {
    let total = hunks.iter().map(|h| h.lines.len()).sum();
    let mut index = LineIndex {
        flat_lines: Vec::with_capacity(total),
        mapping: Vec::with_capacity(total),
    };

    for hunk in hunks {
        let mut src = i64::from(hunk.source_start);
        let mut dst = i64::from(hunk.dest_start);

        for line in &hunk.lines {
            let mapping = match line.kind {
                LineKind::Added => {
                    let m = LineMapping::new(NO_LINE, dst);
                    dst += 1;
                    m
                }
                LineKind::Deleted => {
                    let m = LineMapping::new(src, NO_LINE);
                    src += 1;
                    m
                }
                LineKind::Context => {
                    let m = LineMapping::new(src, dst);
                    src += 1;
                    dst += 1;
                    m
                }
            };
            index.flat_lines.push(line.raw.clone());
            index.mapping.push(mapping);
        }
    }

    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::diff::DiffLine;

    fn hunk(source_start: u32, dest_start: u32, lines: &[&str]) -> Hunk {
        Hunk {
            header: format!("@@ -{source_start} +{dest_start} @@"),
            source_start,
            dest_start,
            lines: lines.iter().map(|l| DiffLine::new(*l)).collect(),
        }
    }

    #[test]
    fn context_lines_advance_both_sides() {
        let index = build_index(&[hunk(10, 20, &[" a", " b", " c"])]);
        assert_eq!(
            index.mapping,
            vec![
                LineMapping::new(10, 20),
                LineMapping::new(11, 21),
                LineMapping::new(12, 22),
            ]
        );
        assert_eq!(index.flat_lines, vec![" a", " b", " c"]);
    }

    #[test]
    fn deleted_then_added() {
        let index = build_index(&[hunk(5, 5, &["-old", "+new"])]);
        assert_eq!(
            index.mapping,
            vec![LineMapping::new(5, NO_LINE), LineMapping::new(NO_LINE, 5)]
        );
    }

    #[test]
    fn hunks_restart_counters() {
        let index = build_index(&[
            hunk(1, 1, &[" a", "+b"]),
            hunk(30, 31, &[" c", "-d", " e"]),
        ]);
        assert_eq!(index.len(), 5);
        assert_eq!(index.mapping[2], LineMapping::new(30, 31));
        assert_eq!(index.mapping[3], LineMapping::new(31, NO_LINE));
        assert_eq!(index.mapping[4], LineMapping::new(32, 32));
    }

    #[test]
    fn no_hunks_is_empty() {
        let index = build_index(&[]);
        assert!(index.is_empty());
        assert!(index.flat_lines.is_empty());
    }

    #[test]
    fn lengths_always_match() {
        let index = build_index(&[hunk(0, 0, &["", "+x", "-y", "garbage", "+"])]);
        assert_eq!(index.flat_lines.len(), index.mapping.len());
    }

    #[test]
    fn at_is_one_based() {
        let index = build_index(&[hunk(3, 4, &[" a", "+b"])]);
        assert_eq!(index.at(1), Some(&LineMapping::new(3, 4)));
        assert_eq!(index.at(2), Some(&LineMapping::new(NO_LINE, 5)));
        assert_eq!(index.at(0), None);
        assert_eq!(index.at(-3), None);
        assert_eq!(index.at(3), None);
    }
}
