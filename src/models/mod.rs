//! Shared types used across all modules.
//!
//! This module defines the data structures for diffs, comments, and pull
//! requests. Other modules import from here rather than reaching into
//! each other's internals.

pub mod comment;
pub mod diff;
pub mod pull_request;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use comment::{AiFeedback, Candidate, RawComment};
pub use diff::{DiffLine, FileDiff, Hunk, LineKind, LineMapping};
pub use pull_request::PullRequest;

/// Supported LLM provider backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderName {
    #[default]
    Gemini,
    Anthropic,
    #[serde(rename = "openai")]
    OpenAI,
    /// Any OpenAI-compatible API, including self-hosted gateways.
    #[serde(rename = "openai-compatible", alias = "self")]
    OpenAICompatible,
}

impl fmt::Display for ProviderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderName::Gemini => write!(f, "gemini"),
            ProviderName::Anthropic => write!(f, "anthropic"),
            ProviderName::OpenAI => write!(f, "openai"),
            ProviderName::OpenAICompatible => write!(f, "openai-compatible"),
        }
    }
}

impl std::str::FromStr for ProviderName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(ProviderName::Gemini),
            "anthropic" => Ok(ProviderName::Anthropic),
            "openai" => Ok(ProviderName::OpenAI),
            "openai-compatible" | "self" => Ok(ProviderName::OpenAICompatible),
            other => Err(format!(
                "unsupported provider: '{other}'. Supported: gemini, anthropic, openai, openai-compatible"
            )),
        }
    }
}

impl ProviderName {
    /// Provider-specific environment variable holding the API key.
    pub fn api_key_env_var(self) -> &'static str {
        match self {
            ProviderName::Gemini => "GEMINI_API_KEY",
            ProviderName::Anthropic => "ANTHROPIC_API_KEY",
            ProviderName::OpenAI | ProviderName::OpenAICompatible => "OPENAI_API_KEY",
        }
    }

    /// Model used when none is configured.
    pub fn default_model(self) -> &'static str {
        match self {
            ProviderName::Gemini => "gemini-2.5-flash",
            ProviderName::Anthropic => "claude-sonnet-4-20250514",
            ProviderName::OpenAI | ProviderName::OpenAICompatible => "gpt-4o",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_name_display() {
        assert_eq!(ProviderName::Gemini.to_string(), "gemini");
        assert_eq!(ProviderName::Anthropic.to_string(), "anthropic");
        assert_eq!(ProviderName::OpenAI.to_string(), "openai");
        assert_eq!(
            ProviderName::OpenAICompatible.to_string(),
            "openai-compatible"
        );
    }

    #[test]
    fn provider_name_from_str() {
        assert_eq!("GEMINI".parse::<ProviderName>(), Ok(ProviderName::Gemini));
        assert_eq!("openai".parse::<ProviderName>(), Ok(ProviderName::OpenAI));
        assert_eq!(
            "self".parse::<ProviderName>(),
            Ok(ProviderName::OpenAICompatible)
        );
        let err = "bard".parse::<ProviderName>().unwrap_err();
        assert!(err.contains("unsupported provider"));
    }

    #[test]
    fn provider_name_default_is_gemini() {
        assert_eq!(ProviderName::default(), ProviderName::Gemini);
        assert_eq!(ProviderName::default().default_model(), "gemini-2.5-flash");
    }

    #[test]
    fn provider_name_serde_accepts_self_alias() {
        let name: ProviderName = serde_json::from_str("\"self\"").unwrap();
        assert_eq!(name, ProviderName::OpenAICompatible);
        assert_eq!(
            serde_json::to_string(&name).unwrap(),
            "\"openai-compatible\""
        );
    }
}
