//! Final filter between resolved candidates and the host.
//!
//! Enforces per-pull-request caps, drops bodies that are empty or look like
//! shell commands, and skips locations the bot already commented on.

use std::collections::HashSet;

use serde::Serialize;

use crate::models::comment::Candidate;

/// Body prefixes that mark a comment as a pasted shell command.
const COMMAND_PREFIXES: &[&str] = &[
    "$",
    "#!/bin/",
    "sudo ",
    "rm ",
    "ls ",
    "cd ",
    "echo ",
    "cat ",
    "touch ",
    "mkdir ",
    "curl ",
    "wget ",
    "python ",
    "go run",
    "npm ",
    "yarn ",
    "git ",
    "exit",
    "shutdown",
    "reboot",
];

/// Whether `body` reads like a shell command rather than a review comment.
pub fn looks_like_command(body: &str) -> bool {
    let body = body.trim_start();
    COMMAND_PREFIXES.iter().any(|p| body.starts_with(p))
}

/// Candidates skipped by the gate, by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SkipCounts {
    pub empty_body: usize,
    pub command_like: usize,
    pub duplicate: usize,
    /// Candidates left over once the cap was hit.
    pub cap_reached: usize,
}

impl SkipCounts {
    pub fn total(&self) -> usize {
        self.empty_body + self.command_like + self.duplicate + self.cap_reached
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GateOutcome {
    pub accepted: Vec<Candidate>,
    pub skipped: SkipCounts,
}

/// Filter `candidates` in arrival order.
///
/// `existing_keys` is extended with every accepted location so later calls
/// within the same run see them as duplicates.
pub fn gate(
    candidates: Vec<Candidate>,
    existing_keys: &mut HashSet<String>,
    max_inline: usize,
    max_total: usize,
    total_already_posted: usize,
) -> GateOutcome {
    let remaining = max_inline
        .saturating_sub(existing_keys.len())
        .min(max_total.saturating_sub(total_already_posted));

    let mut outcome = GateOutcome::default();
    if remaining == 0 {
        outcome.skipped.cap_reached = candidates.len();
        return outcome;
    }

    let mut iter = candidates.into_iter();
    for candidate in iter.by_ref() {
        if candidate.body.trim().is_empty() {
            outcome.skipped.empty_body += 1;
            continue;
        }
        if looks_like_command(&candidate.body) {
            outcome.skipped.command_like += 1;
            continue;
        }
        if !existing_keys.insert(candidate.key()) {
            outcome.skipped.duplicate += 1;
            continue;
        }
        outcome.accepted.push(candidate);
        if outcome.accepted.len() >= remaining {
            break;
        }
    }
    outcome.skipped.cap_reached = iter.count();

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(path: &str, position: i64, body: &str) -> Candidate {
        Candidate {
            path: path.into(),
            position,
            body: body.into(),
            from_line: -1,
        }
    }

    fn keys(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn inline_cap_already_exhausted() {
        let mut existing = keys(&["a.rs:1", "a.rs:2"]);
        let out = gate(vec![candidate("a.rs", 5, "hm")], &mut existing, 2, 200, 0);
        assert!(out.accepted.is_empty());
        assert_eq!(out.skipped.cap_reached, 1);
    }

    #[test]
    fn duplicate_within_run_is_skipped() {
        let mut existing = HashSet::new();
        let out = gate(
            vec![
                candidate("a.rs", 1, "first"),
                candidate("a.rs", 1, "second"),
                candidate("a.rs", 3, "third"),
            ],
            &mut existing,
            5,
            200,
            0,
        );
        let bodies: Vec<&str> = out.accepted.iter().map(|c| c.body.as_str()).collect();
        assert_eq!(bodies, vec!["first", "third"]);
        assert_eq!(out.skipped.duplicate, 1);
        assert_eq!(existing, keys(&["a.rs:1", "a.rs:3"]));
    }

    #[test]
    fn existing_keys_are_skipped() {
        let mut existing = keys(&["b.rs:9"]);
        let out = gate(
            vec![candidate("b.rs", 9, "again"), candidate("b.rs", 10, "new")],
            &mut existing,
            5,
            200,
            1,
        );
        assert_eq!(out.accepted.len(), 1);
        assert_eq!(out.accepted[0].position, 10);
    }

    #[test]
    fn total_cap_limits_acceptances() {
        let mut existing = HashSet::new();
        let out = gate(
            vec![
                candidate("a.rs", 1, "x"),
                candidate("a.rs", 2, "y"),
                candidate("a.rs", 3, "z"),
            ],
            &mut existing,
            100,
            10,
            8,
        );
        assert_eq!(out.accepted.len(), 2);
        assert_eq!(out.skipped.cap_reached, 1);
        assert_eq!(existing.len(), 2);
    }

    #[test]
    fn total_already_over_cap() {
        let mut existing = HashSet::new();
        let out = gate(vec![candidate("a.rs", 1, "x")], &mut existing, 100, 5, 9);
        assert!(out.accepted.is_empty());
        assert!(existing.is_empty());
    }

    #[test]
    fn empty_and_command_bodies_are_dropped() {
        let mut existing = HashSet::new();
        let out = gate(
            vec![
                candidate("a.rs", 1, "   "),
                candidate("a.rs", 2, "$ cargo build"),
                candidate("a.rs", 3, "  rm -rf target"),
                candidate("a.rs", 4, "Rename this variable."),
            ],
            &mut existing,
            5,
            200,
            0,
        );
        assert_eq!(out.accepted.len(), 1);
        assert_eq!(out.skipped.empty_body, 1);
        assert_eq!(out.skipped.command_like, 2);
        // Dropped candidates do not claim their location.
        assert_eq!(existing, keys(&["a.rs:4"]));
    }

    #[test]
    fn command_prefixes() {
        assert!(looks_like_command("git push --force"));
        assert!(looks_like_command("#!/bin/sh\necho"));
        assert!(looks_like_command("exit 1"));
        assert!(looks_like_command("go run ./cmd"));
        assert!(!looks_like_command("Consider using git2 instead of shelling out"));
        assert!(!looks_like_command("This `rm` call is unchecked."));
        // Leading whitespace does not hide a command.
        assert!(looks_like_command("  \n$ cargo fmt"));
    }
}
