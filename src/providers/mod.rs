//! ReviewProvider trait and LLM integration.
//!
//! Provides an abstraction layer over rig-core so the orchestrator only
//! deals in prompts, feedback items and summary text.

pub mod response;
pub mod rig;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::comment::AiFeedback;

/// Errors from the review provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("LLM API error: {0}")]
    ApiError(String),

    #[error("failed to parse LLM response: {0}")]
    ParseError(String),

    #[error("provider not configured: {0}")]
    NotConfigured(String),
}

impl ProviderError {
    /// Whether the backend refused the call for quota or rate reasons.
    ///
    /// Further calls in the same pass would fail the same way.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            ProviderError::ApiError(msg) => {
                let msg = msg.to_lowercase();
                msg.contains("429")
                    || msg.contains("rate limit")
                    || msg.contains("too many requests")
                    || msg.contains("resource_exhausted")
                    || msg.contains("quota")
            }
            _ => false,
        }
    }
}

/// LLM-backed reviewer.
#[async_trait]
pub trait ReviewProvider: Send + Sync {
    /// Review one file and return the model's feedback in model order.
    async fn review_file(&self, prompt: &str) -> Result<Vec<AiFeedback>, ProviderError>;

    /// Summarize a pull request as Markdown.
    async fn summarize(&self, prompt: &str) -> Result<String, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_detection() {
        for msg in [
            "Gemini API error: HTTP 429",
            "Rate limit exceeded",
            "RESOURCE_EXHAUSTED: quota",
            "Too Many Requests",
        ] {
            assert!(ProviderError::ApiError(msg.into()).is_rate_limited(), "{msg}");
        }
        assert!(!ProviderError::ApiError("401 unauthorized".into()).is_rate_limited());
        assert!(!ProviderError::ParseError("429".into()).is_rate_limited());
        assert!(!ProviderError::NotConfigured("rate limit".into()).is_rate_limited());
    }
}
