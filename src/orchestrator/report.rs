//! Per-pass results handed to the output renderers.

use indexmap::IndexMap;
use serde::Serialize;

use super::gate::SkipCounts;
use crate::diff::DiscardCounts;

/// What happened to one pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum PullRequestOutcome {
    /// Files were sent to the model.
    Reviewed,
    /// The author is on the repository's ignore list.
    IgnoredAuthor,
    /// Someone asked the bot to stop.
    Paused,
    /// The head commit was already reviewed.
    UpToDate,
    /// Fetching comments or the diff failed.
    Failed(String),
}

impl PullRequestOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            PullRequestOutcome::Reviewed => "reviewed",
            PullRequestOutcome::IgnoredAuthor => "ignored author",
            PullRequestOutcome::Paused => "paused",
            PullRequestOutcome::UpToDate => "up to date",
            PullRequestOutcome::Failed(_) => "failed",
        }
    }
}

/// Result for one reviewed file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileReport {
    /// Items returned by the model.
    pub feedback: usize,
    /// Items that resolved to a destination line.
    pub resolved: usize,
    pub discarded: DiscardCounts,
    /// Provider error, when the file could not be reviewed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequestReport {
    pub id: u64,
    pub title: String,
    pub outcome: PullRequestOutcome,
    pub summary_posted: bool,
    pub files: IndexMap<String, FileReport>,
    pub gate: SkipCounts,
    /// Candidates that passed the gate.
    pub accepted: usize,
    pub posted: usize,
    pub failed_posts: usize,
}

impl PullRequestReport {
    pub fn new(id: u64, title: impl Into<String>, outcome: PullRequestOutcome) -> Self {
        Self {
            id,
            title: title.into(),
            outcome,
            summary_posted: false,
            files: IndexMap::new(),
            gate: SkipCounts::default(),
            accepted: 0,
            posted: 0,
            failed_posts: 0,
        }
    }

    /// Discards across all files.
    pub fn discarded(&self) -> DiscardCounts {
        let mut total = DiscardCounts::default();
        for file in self.files.values() {
            total.out_of_range += file.discarded.out_of_range;
            total.deleted_line += file.discarded.deleted_line;
            total.missing_location += file.discarded.missing_location;
        }
        total
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryReport {
    pub name: String,
    pub pull_requests: Vec<PullRequestReport>,
}

impl RepositoryReport {
    pub fn total_posted(&self) -> usize {
        self.pull_requests.iter().map(|pr| pr.posted).sum()
    }

    pub fn total_failed_posts(&self) -> usize {
        self.pull_requests.iter().map(|pr| pr.failed_posts).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_serializes_tagged() {
        let json = serde_json::to_value(PullRequestOutcome::Failed("boom".into())).unwrap();
        assert_eq!(json, serde_json::json!({"status": "failed", "detail": "boom"}));
        let json = serde_json::to_value(PullRequestOutcome::UpToDate).unwrap();
        assert_eq!(json, serde_json::json!({"status": "up_to_date"}));
    }

    #[test]
    fn discarded_sums_files() {
        let mut report = PullRequestReport::new(1, "t", PullRequestOutcome::Reviewed);
        for (path, n) in [("a.rs", 1), ("b.rs", 2)] {
            report.files.insert(
                path.into(),
                FileReport {
                    discarded: DiscardCounts {
                        deleted_line: n,
                        ..Default::default()
                    },
                    ..Default::default()
                },
            );
        }
        assert_eq!(report.discarded().deleted_line, 3);
        assert_eq!(report.discarded().total(), 3);
    }
}
