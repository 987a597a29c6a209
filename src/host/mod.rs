//! Source-control host abstraction.
//!
//! The orchestrator talks to the forge only through [`ReviewHost`]; the
//! Bitbucket Cloud implementation lives in [`bitbucket`].

pub mod bitbucket;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{PullRequest, RawComment};

pub use bitbucket::BitbucketHost;

/// Errors from host API calls.
#[derive(Error, Debug)]
pub enum HostError {
    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("unexpected HTTP {status} from {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

/// Read and write access to one repository's pull requests.
#[async_trait]
pub trait ReviewHost: Send + Sync {
    /// Open pull requests.
    async fn list_pull_requests(&self) -> Result<Vec<PullRequest>, HostError>;

    /// Every live comment on `pr`, oldest first.
    async fn list_comments(&self, pr: &PullRequest) -> Result<Vec<RawComment>, HostError>;

    /// The unified diff of `pr`.
    async fn fetch_diff(&self, pr: &PullRequest) -> Result<String, HostError>;

    /// Post a pull-request level comment.
    async fn post_comment(&self, pr: &PullRequest, body: &str) -> Result<(), HostError>;

    /// Post a comment attached to destination line `line` of `path`.
    async fn post_inline_comment(
        &self,
        pr: &PullRequest,
        path: &str,
        line: i64,
        body: &str,
    ) -> Result<(), HostError>;
}
