//! Review orchestrator: one pass over a repository's open pull requests.
//!
//! For each pull request the comment thread is re-read to derive the review
//! state, the diff is sent to the model file by file, the resulting feedback
//! is resolved onto destination lines, gated, and posted.

pub mod format;
pub mod gate;
pub mod report;
pub mod run;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::{RepositoryConfig, ReviewConfig};
use crate::constants::{BASE_MARKER_PREFIX, BASE_MARKER_SUFFIX, BOT_MARKER, SUMMARY_TITLE};
use crate::diff::{build_index, parse_unified_diff, resolve_file};
use crate::host::{HostError, ReviewHost};
use crate::models::{Candidate, FileDiff, PullRequest};
use crate::prompt::{build_file_prompt, build_summary_prompt};
use crate::providers::ReviewProvider;
use crate::state::{ReviewState, append_bot_marker, base_commit_marker, derive_state};

use format::{format_review_body, format_summary_body};
use gate::gate;
pub use report::{FileReport, PullRequestOutcome, PullRequestReport, RepositoryReport};
pub use run::{RunRegistry, RunToken};

/// Errors from the orchestrator.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("host error: {0}")]
    Host(#[from] HostError),

    #[error("run token for '{held}' cannot review '{requested}'")]
    TokenMismatch { held: String, requested: String },
}

/// Knobs for one pass, taken from `[review]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewSettings {
    pub max_inline_comments: usize,
    pub max_total_comments: usize,
    pub request_delay: Duration,
    pub pull_request_delay: Duration,
    pub dry_run: bool,
}

impl From<&ReviewConfig> for ReviewSettings {
    fn from(config: &ReviewConfig) -> Self {
        Self {
            max_inline_comments: config.max_inline_comments,
            max_total_comments: config.max_total_comments,
            request_delay: config.request_delay(),
            pull_request_delay: config.pull_request_delay(),
            dry_run: config.dry_run,
        }
    }
}

impl Default for ReviewSettings {
    fn default() -> Self {
        Self::from(&ReviewConfig::default())
    }
}

/// Candidates collected from every file of one pull request.
#[derive(Default)]
struct FilePass {
    candidates: Vec<Candidate>,
    rate_limited: bool,
    /// Files whose review call failed.
    failed: usize,
}

impl FilePass {
    /// Every reviewable file got an answer from the model.
    fn is_complete(&self) -> bool {
        !self.rate_limited && self.failed == 0
    }
}

/// Drives review passes against one host with one provider.
pub struct ReviewOrchestrator {
    host: Arc<dyn ReviewHost>,
    provider: Arc<dyn ReviewProvider>,
    settings: ReviewSettings,
}

impl ReviewOrchestrator {
    pub fn new(
        host: Arc<dyn ReviewHost>,
        provider: Arc<dyn ReviewProvider>,
        settings: ReviewSettings,
    ) -> Self {
        Self {
            host,
            provider,
            settings,
        }
    }

    /// Review every open pull request of `repo`.
    ///
    /// Requires the repository's run token. Per-pull-request failures are
    /// recorded in the report; only listing pull requests is fatal.
    pub async fn review_repository(
        &self,
        token: &RunToken,
        repo: &RepositoryConfig,
    ) -> Result<RepositoryReport, OrchestratorError> {
        let key = repo.key();
        if token.repo_key() != key {
            return Err(OrchestratorError::TokenMismatch {
                held: token.repo_key().to_string(),
                requested: key,
            });
        }

        let name = repo.display_name();
        let pull_requests = self.host.list_pull_requests().await?;
        info!(repo = %name, run = %token.id(), count = pull_requests.len(), "starting review pass");

        let mut reports = Vec::with_capacity(pull_requests.len());
        for (i, pr) in pull_requests.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.settings.pull_request_delay).await;
            }
            let report = self.review_pull_request(repo, pr).await;
            info!(
                repo = %name,
                pr = pr.id,
                outcome = report.outcome.label(),
                posted = report.posted,
                "pull request done"
            );
            reports.push(report);
        }

        Ok(RepositoryReport {
            name,
            pull_requests: reports,
        })
    }

    /// Run the full pass for one pull request.
    pub async fn review_pull_request(
        &self,
        repo: &RepositoryConfig,
        pr: &PullRequest,
    ) -> PullRequestReport {
        let mut report = PullRequestReport::new(pr.id, &pr.title, PullRequestOutcome::Reviewed);

        if repo.ignores_author(&pr.author) {
            info!(pr = pr.id, author = %pr.author, "author is on the ignore list");
            report.outcome = PullRequestOutcome::IgnoredAuthor;
            return report;
        }

        let comments = match self.host.list_comments(pr).await {
            Ok(c) => c,
            Err(e) => {
                error!(pr = pr.id, error = %e, "failed to fetch comments");
                report.outcome = PullRequestOutcome::Failed(e.to_string());
                return report;
            }
        };
        let state = derive_state(&comments, BOT_MARKER, BASE_MARKER_PREFIX, BASE_MARKER_SUFFIX);
        debug!(
            pr = pr.id,
            has_summary = state.has_summary,
            existing = state.existing_inline_keys.len(),
            last_reviewed = ?state.last_reviewed_commit,
            "derived review state"
        );

        if state.pause_requested {
            info!(pr = pr.id, "review paused by LGTM comment");
            report.outcome = PullRequestOutcome::Paused;
            return report;
        }
        if state.is_current(pr.head_commit.as_deref()) {
            info!(pr = pr.id, "head commit already reviewed");
            report.outcome = PullRequestOutcome::UpToDate;
            return report;
        }

        let diff = match self.host.fetch_diff(pr).await {
            Ok(d) => d,
            Err(e) => {
                error!(pr = pr.id, error = %e, "failed to fetch diff");
                report.outcome = PullRequestOutcome::Failed(e.to_string());
                return report;
            }
        };
        let files = parse_unified_diff(&diff);

        let mut summary = None;
        let mut rate_limited = false;
        if !state.has_summary {
            match self.generate_summary(pr, &diff).await {
                Ok(text) => summary = text,
                Err(limited) => rate_limited = limited,
            }
        }

        let pass = if rate_limited {
            warn!(pr = pr.id, "rate limited; skipping file reviews");
            FilePass {
                rate_limited: true,
                ..FilePass::default()
            }
        } else {
            self.review_files(pr, &files, &mut report).await
        };

        // The head is recorded only once every file was reviewed.
        let reviewed_head = pr
            .head_commit
            .as_deref()
            .filter(|_| pass.is_complete());
        if let Some(ref text) = summary {
            report.summary_posted = self.post_summary(pr, text, reviewed_head).await;
        }

        let mut keys = state.existing_inline_keys.clone();
        let already_posted = state.bot_comment_count + usize::from(report.summary_posted);
        let outcome = gate(
            pass.candidates,
            &mut keys,
            self.settings.max_inline_comments,
            self.settings.max_total_comments,
            already_posted,
        );
        report.gate = outcome.skipped;
        report.accepted = outcome.accepted.len();
        debug!(
            pr = pr.id,
            accepted = outcome.accepted.len(),
            skipped = outcome.skipped.total(),
            "gate applied"
        );

        for candidate in &outcome.accepted {
            let body = append_bot_marker(&format_review_body(&candidate.body));
            if self.settings.dry_run {
                info!(pr = pr.id, file = %candidate.path, line = candidate.position, "dry run: would post inline comment");
                continue;
            }
            match self
                .host
                .post_inline_comment(pr, &candidate.path, candidate.position, &body)
                .await
            {
                Ok(()) => {
                    report.posted += 1;
                    debug!(pr = pr.id, file = %candidate.path, line = candidate.position, "posted inline comment");
                }
                Err(e) => {
                    report.failed_posts += 1;
                    warn!(pr = pr.id, file = %candidate.path, line = candidate.position, error = %e, "failed to post inline comment");
                }
            }
        }

        // A summary without a base marker means no earlier pass finished.
        let record_head = report.posted > 0 || state.last_reviewed_commit.is_none();
        if state.has_summary && record_head && !self.settings.dry_run {
            if let Some(head) = reviewed_head {
                self.post_progress_note(pr, &state, head, report.posted).await;
            }
        }

        report
    }

    /// Ask for and format the summary.
    ///
    /// `Ok(None)` when the model had nothing to say; `Err(true)` when the
    /// provider is rate limited and the pass should stop calling it.
    async fn generate_summary(
        &self,
        pr: &PullRequest,
        diff: &str,
    ) -> Result<Option<String>, bool> {
        let prompt = build_summary_prompt(pr, diff);
        let result = self.provider.summarize(&prompt).await;
        tokio::time::sleep(self.settings.request_delay).await;

        match result {
            Ok(text) => {
                let formatted = format_summary_body(&text);
                if formatted.is_empty() {
                    debug!(pr = pr.id, "empty summary; not posting");
                    return Ok(None);
                }
                Ok(Some(formatted))
            }
            Err(e) => {
                warn!(pr = pr.id, error = %e, "summary generation failed");
                Err(e.is_rate_limited())
            }
        }
    }

    /// Post the summary, carrying the base marker for `reviewed_head`.
    ///
    /// Returns whether a comment was posted.
    async fn post_summary(
        &self,
        pr: &PullRequest,
        formatted: &str,
        reviewed_head: Option<&str>,
    ) -> bool {
        let mut body = format!("## {SUMMARY_TITLE}\n\n{formatted}");
        if let Some(head) = reviewed_head {
            body.push_str("\n\n");
            body.push_str(&base_commit_marker(head));
        }
        let body = append_bot_marker(&body);

        if self.settings.dry_run {
            info!(pr = pr.id, "dry run: would post summary");
            return false;
        }
        match self.host.post_comment(pr, &body).await {
            Ok(()) => {
                info!(pr = pr.id, recorded_head = reviewed_head.is_some(), "posted summary");
                true
            }
            Err(e) => {
                warn!(pr = pr.id, error = %e, "failed to post summary");
                false
            }
        }
    }

    /// Send every reviewable file to the model and resolve its feedback.
    async fn review_files(
        &self,
        pr: &PullRequest,
        files: &[FileDiff],
        report: &mut PullRequestReport,
    ) -> FilePass {
        let mut pass = FilePass::default();

        for file in files {
            if !file.is_reviewable() {
                debug!(pr = pr.id, file = %file.path, "skipping file without commentable lines");
                continue;
            }

            let index = build_index(&file.hunks);
            let prompt = build_file_prompt(&file.path, &index.flat_lines, pr);
            let result = self.provider.review_file(&prompt).await;
            tokio::time::sleep(self.settings.request_delay).await;

            let mut file_report = FileReport::default();
            match result {
                Ok(feedback) => {
                    let resolution = resolve_file(&file.path, &index, &feedback);
                    file_report.feedback = feedback.len();
                    file_report.resolved = resolution.candidates.len();
                    file_report.discarded = resolution.discarded;
                    debug!(
                        pr = pr.id,
                        file = %file.path,
                        feedback = feedback.len(),
                        resolved = resolution.candidates.len(),
                        discarded = resolution.discarded.total(),
                        "file reviewed"
                    );
                    pass.candidates.extend(resolution.candidates);
                }
                Err(e) => {
                    warn!(pr = pr.id, file = %file.path, error = %e, "file review failed");
                    file_report.error = Some(e.to_string());
                    pass.failed += 1;
                    if e.is_rate_limited() {
                        report.files.insert(file.path.clone(), file_report);
                        warn!(pr = pr.id, "rate limited; skipping remaining files");
                        pass.rate_limited = true;
                        break;
                    }
                }
            }
            report.files.insert(file.path.clone(), file_report);
        }

        pass
    }

    /// Record the newly reviewed head so the next pass skips it.
    async fn post_progress_note(
        &self,
        pr: &PullRequest,
        state: &ReviewState,
        head: &str,
        posted: usize,
    ) {
        let since = state
            .last_reviewed_commit
            .as_deref()
            .map(|c| format!(" since `{}`", short_hash(c)))
            .unwrap_or_default();
        let outcome = match posted {
            0 => "no new inline comments".to_string(),
            n => format!("{n} new inline comment(s)"),
        };
        let body = format!(
            "Reviewed new changes{since} up to `{}`: {outcome}.\n\n{}",
            short_hash(head),
            base_commit_marker(head)
        );
        if let Err(e) = self.host.post_comment(pr, &append_bot_marker(&body)).await {
            warn!(pr = pr.id, error = %e, "failed to post progress note");
        }
    }
}

fn short_hash(commit: &str) -> String {
    commit.chars().take(12).collect()
}
