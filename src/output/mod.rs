//! Output renderers: terminal and JSON.

pub mod json;
pub mod terminal;

use serde::Serialize;

use crate::diff::{DiscardCounts, LineIndex};
use crate::models::Candidate;
use crate::orchestrator::RepositoryReport;
use crate::orchestrator::gate::SkipCounts;

/// Flattened index of one file, as printed by `map`.
#[derive(Debug, Clone, Serialize)]
pub struct FileMap {
    pub path: String,
    pub index: LineIndex,
}

/// Result of an offline resolve + gate over one file.
#[derive(Debug, Clone, Serialize)]
pub struct ResolveReport {
    pub path: String,
    /// Feedback items read from the input.
    pub feedback: usize,
    pub discarded: DiscardCounts,
    pub skipped: SkipCounts,
    pub accepted: Vec<Candidate>,
}

/// Trait for rendering command results to an output format.
pub trait OutputRenderer {
    /// Render the reports of a `run` pass.
    fn render_run(&self, reports: &[RepositoryReport]) -> String;

    /// Render flattened line indexes.
    fn render_map(&self, files: &[FileMap]) -> String;

    /// Render an offline resolution.
    fn render_resolve(&self, report: &ResolveReport) -> String;
}
