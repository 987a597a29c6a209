//! Bitbucket Cloud 2.0 REST API host.
//!
//! Authenticates with basic auth (username + app password) using reqwest.

use async_trait::async_trait;
use serde::Deserialize;

use super::{HostError, ReviewHost};
use crate::config::RepositoryConfig;
use crate::models::{PullRequest, RawComment};

/// Public API root.
pub const DEFAULT_API_BASE: &str = "https://api.bitbucket.org/2.0";

// ── Wire types ──────────────────────────────────────────────────────
//
// Bitbucket sends `null` for unset strings, so scalar fields are `Option`s;
// `#[serde(default)]` alone only covers absent keys.

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    values: Vec<T>,
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Account {
    display_name: Option<String>,
    nickname: Option<String>,
}

impl Account {
    fn name(self) -> String {
        self.display_name
            .filter(|n| !n.is_empty())
            .or(self.nickname)
            .unwrap_or_default()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Commit {
    hash: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Endpoint {
    commit: Option<Commit>,
}

#[derive(Debug, Deserialize)]
struct ApiPullRequest {
    id: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    author: Option<Account>,
    #[serde(default)]
    source: Option<Endpoint>,
}

impl From<ApiPullRequest> for PullRequest {
    fn from(api: ApiPullRequest) -> Self {
        let head_commit = api
            .source
            .and_then(|s| s.commit)
            .and_then(|c| c.hash)
            .filter(|h| !h.is_empty());
        PullRequest {
            id: api.id,
            title: api.title.unwrap_or_default(),
            description: api.description.unwrap_or_default(),
            author: api.author.map(Account::name).unwrap_or_default(),
            head_commit,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Content {
    raw: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Inline {
    path: Option<String>,
    to: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiComment {
    content: Option<Content>,
    inline: Option<Inline>,
    user: Option<Account>,
    deleted: Option<bool>,
}

impl From<ApiComment> for RawComment {
    fn from(api: ApiComment) -> Self {
        let author_id = api.user.map(Account::name).unwrap_or_default();
        let body = api.content.and_then(|c| c.raw).unwrap_or_default();
        match api.inline {
            Some(inline) => RawComment {
                body,
                is_inline: true,
                path: inline.path,
                to_line: inline.to,
                author_id,
            },
            None => RawComment::general(body, author_id),
        }
    }
}

// ── Client ──────────────────────────────────────────────────────────

/// One repository on Bitbucket Cloud.
pub struct BitbucketHost {
    client: reqwest::Client,
    api_base: String,
    workspace: String,
    repo_slug: String,
    username: String,
    app_password: String,
}

impl BitbucketHost {
    /// Build a host for `repo`, which must carry credentials.
    pub fn new(repo: &RepositoryConfig) -> Result<Self, HostError> {
        let app_password = repo.app_password.clone().ok_or_else(|| {
            HostError::ApiError(format!("no app password configured for {}", repo.key()))
        })?;
        let client = reqwest::Client::builder()
            .user_agent(format!(
                "{}/{}",
                crate::constants::APP_NAME,
                crate::constants::VERSION
            ))
            .build()
            .map_err(|e| HostError::ApiError(e.to_string()))?;
        Ok(Self {
            client,
            api_base: DEFAULT_API_BASE.to_string(),
            workspace: repo.workspace.clone(),
            repo_slug: repo.repo_slug.clone(),
            username: repo.username.clone(),
            app_password,
        })
    }

    /// Point at a different API root (Bitbucket-compatible proxies).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn repo_url(&self) -> String {
        format!(
            "{}/repositories/{}/{}",
            self.api_base, self.workspace, self.repo_slug
        )
    }

    fn pull_requests_url(&self) -> String {
        format!("{}/pullrequests?state=OPEN&pagelen=50", self.repo_url())
    }

    fn comments_url(&self, pr: &PullRequest) -> String {
        // Oldest first, so the last base-commit marker seen is the newest.
        format!(
            "{}/pullrequests/{}/comments?sort=created_on&pagelen=100",
            self.repo_url(),
            pr.id
        )
    }

    fn post_url(&self, pr: &PullRequest) -> String {
        format!("{}/pullrequests/{}/comments", self.repo_url(), pr.id)
    }

    fn diff_url(&self, pr: &PullRequest) -> String {
        format!("{}/pullrequests/{}/diff", self.repo_url(), pr.id)
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, HostError> {
        let response = self
            .client
            .get(url)
            .basic_auth(&self.username, Some(&self.app_password))
            .send()
            .await
            .map_err(|e| HostError::ApiError(e.to_string()))?;
        check_status(response, url).await
    }

    /// Fetch every page starting at `url`, following `next` links.
    async fn get_paged<T: serde::de::DeserializeOwned>(
        &self,
        url: String,
    ) -> Result<Vec<T>, HostError> {
        let mut items = Vec::new();
        let mut next = Some(url);
        while let Some(url) = next.take() {
            let response = self.get(&url).await?;
            let page: Page<T> = response.json().await.map_err(|e| HostError::Decode {
                url: url.clone(),
                message: e.to_string(),
            })?;
            items.extend(page.values);
            next = page.next.filter(|n| !n.is_empty());
        }
        Ok(items)
    }

    async fn post(&self, url: &str, payload: &serde_json::Value) -> Result<(), HostError> {
        let response = self
            .client
            .post(url)
            .basic_auth(&self.username, Some(&self.app_password))
            .json(payload)
            .send()
            .await
            .map_err(|e| HostError::ApiError(e.to_string()))?;
        check_status(response, url).await.map(|_| ())
    }
}

async fn check_status(response: reqwest::Response, url: &str) -> Result<reqwest::Response, HostError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<no body>".to_string());
    Err(HostError::Status {
        status,
        url: url.to_string(),
        body,
    })
}

fn comment_payload(body: &str) -> serde_json::Value {
    serde_json::json!({ "content": { "raw": body } })
}

fn inline_payload(path: &str, line: i64, body: &str) -> serde_json::Value {
    serde_json::json!({
        "content": { "raw": body },
        "inline": { "path": path, "to": line },
    })
}

/// Convert a comments page, dropping deleted comments.
fn live_comments(comments: Vec<ApiComment>) -> Vec<RawComment> {
    comments
        .into_iter()
        .filter(|c| c.deleted != Some(true))
        .map(RawComment::from)
        .collect()
}

#[async_trait]
impl ReviewHost for BitbucketHost {
    async fn list_pull_requests(&self) -> Result<Vec<PullRequest>, HostError> {
        let prs: Vec<ApiPullRequest> = self.get_paged(self.pull_requests_url()).await?;
        tracing::debug!(repo = %self.repo_slug, count = prs.len(), "fetched open pull requests");
        Ok(prs.into_iter().map(PullRequest::from).collect())
    }

    async fn list_comments(&self, pr: &PullRequest) -> Result<Vec<RawComment>, HostError> {
        let comments: Vec<ApiComment> = self.get_paged(self.comments_url(pr)).await?;
        Ok(live_comments(comments))
    }

    async fn fetch_diff(&self, pr: &PullRequest) -> Result<String, HostError> {
        let url = self.diff_url(pr);
        let response = self.get(&url).await?;
        response
            .text()
            .await
            .map_err(|e| HostError::Decode {
                url,
                message: e.to_string(),
            })
    }

    async fn post_comment(&self, pr: &PullRequest, body: &str) -> Result<(), HostError> {
        self.post(&self.post_url(pr), &comment_payload(body)).await
    }

    async fn post_inline_comment(
        &self,
        pr: &PullRequest,
        path: &str,
        line: i64,
        body: &str,
    ) -> Result<(), HostError> {
        self.post(&self.post_url(pr), &inline_payload(path, line, body))
            .await
    }
}
