//! Pull request metadata.

use serde::{Deserialize, Serialize};

/// The parts of a pull request the reviewer needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Display name of the author, matched against ignore lists.
    #[serde(default)]
    pub author: String,
    /// Head commit of the source branch, when the host reports it.
    #[serde(default)]
    pub head_commit: Option<String>,
}
