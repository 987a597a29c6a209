//! rig-core integration for LLM-backed review.
//!
//! Uses rig-core's provider clients and Agent abstraction. Supports Gemini,
//! Anthropic, OpenAI and any OpenAI-compatible API.

use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers;

use crate::config::ProviderConfig;
use crate::models::ProviderName;
use crate::models::comment::AiFeedback;
use crate::prompt::{REVIEW_SYSTEM_PROMPT, SUMMARY_SYSTEM_PROMPT};

use super::response::{parse_review_response, parse_summary_response};
use super::{ProviderError, ReviewProvider};

/// Maximum tokens per file-review response.
///
/// High enough for thinking models that spend part of the budget on
/// internal reasoning.
const REVIEW_MAX_TOKENS: u64 = 8192;

/// Maximum tokens per summary response.
const SUMMARY_MAX_TOKENS: u64 = 4096;

/// Build an agent from a rig-core client and prompt it once.
///
/// Always sets `max_tokens`; without it some providers (Gemini) default to
/// a low limit that truncates responses.
macro_rules! prompt_simple {
    ($client:expr, $model:expr, $system:expr, $user:expr, $max_tokens:expr, $label:expr) => {{
        let agent = $client
            .agent($model)
            .preamble($system)
            .temperature(0.2)
            .max_tokens($max_tokens)
            .build();
        agent
            .prompt($user)
            .await
            .map_err(|e| ProviderError::ApiError(format!("{} API error: {e}", $label)))
    }};
}

/// rig-core based review provider.
///
/// The provider name in config selects which rig-core client to use.
pub struct RigProvider {
    config: ProviderConfig,
}

impl RigProvider {
    /// Create a new RigProvider with the given configuration.
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        if config.api_key.is_none() {
            return Err(ProviderError::NotConfigured(format!(
                "no API key found for provider '{}'. Set {} or {}.",
                config.name,
                crate::constants::ENV_API_KEY,
                config.name.api_key_env_var()
            )));
        }
        if config.name == ProviderName::OpenAICompatible && config.base_url.is_none() {
            return Err(ProviderError::NotConfigured(
                "openai-compatible provider requires base_url to be set".to_string(),
            ));
        }
        Ok(Self { config })
    }

    /// Model to request, falling back to the provider's default.
    pub fn model(&self) -> &str {
        if self.config.model.trim().is_empty() {
            self.config.name.default_model()
        } else {
            &self.config.model
        }
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::NotConfigured("missing API key".to_string()))
    }

    /// Build an OpenAI-style client, optionally with a custom base URL.
    fn build_openai_client(
        &self,
        api_key: &str,
        label: &str,
    ) -> Result<providers::openai::CompletionsClient, ProviderError> {
        let mut builder = providers::openai::CompletionsClient::builder().api_key(api_key);
        if let Some(ref base_url) = self.config.base_url {
            builder = builder.base_url(base_url);
        }
        let client: providers::openai::CompletionsClient = builder
            .build()
            .map_err(|e| ProviderError::ApiError(format!("failed to create {label} client: {e}")))?;
        Ok(client)
    }

    /// Make a completion call through rig-core and return the raw response text.
    async fn call_rig(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u64,
    ) -> Result<String, ProviderError> {
        let api_key = self.api_key()?;
        let model = self.model();

        match self.config.name {
            ProviderName::Gemini => {
                let client = providers::gemini::Client::new(api_key).map_err(|e| {
                    ProviderError::ApiError(format!("failed to create Gemini client: {e}"))
                })?;
                prompt_simple!(client, model, system_prompt, user_prompt, max_tokens, "Gemini")
            }
            ProviderName::Anthropic => {
                let client: providers::anthropic::Client = providers::anthropic::Client::builder()
                    .api_key(api_key)
                    .build()
                    .map_err(|e| {
                        ProviderError::ApiError(format!("failed to create Anthropic client: {e}"))
                    })?;
                prompt_simple!(client, model, system_prompt, user_prompt, max_tokens, "Anthropic")
            }
            ProviderName::OpenAI => {
                let client = self.build_openai_client(api_key, "OpenAI")?;
                prompt_simple!(client, model, system_prompt, user_prompt, max_tokens, "OpenAI")
            }
            ProviderName::OpenAICompatible => {
                let client = self.build_openai_client(api_key, "OpenAI-compatible")?;
                prompt_simple!(
                    client,
                    model,
                    system_prompt,
                    user_prompt,
                    max_tokens,
                    "OpenAI-compatible"
                )
            }
        }
    }
}

#[async_trait]
impl ReviewProvider for RigProvider {
    async fn review_file(&self, prompt: &str) -> Result<Vec<AiFeedback>, ProviderError> {
        let response = self
            .call_rig(REVIEW_SYSTEM_PROMPT, prompt, REVIEW_MAX_TOKENS)
            .await?;
        tracing::debug!(len = response.len(), model = self.model(), "review response received");
        parse_review_response(&response)
    }

    async fn summarize(&self, prompt: &str) -> Result<String, ProviderError> {
        let response = self
            .call_rig(SUMMARY_SYSTEM_PROMPT, prompt, SUMMARY_MAX_TOKENS)
            .await?;
        Ok(parse_summary_response(&response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(name: ProviderName, key: Option<&str>, base_url: Option<&str>) -> ProviderConfig {
        ProviderConfig {
            name,
            model: String::new(),
            base_url: base_url.map(String::from),
            api_key: key.map(String::from),
        }
    }

    #[test]
    fn new_provider_missing_api_key() {
        let result = RigProvider::new(config(ProviderName::Gemini, None, None));
        let err = result.err().unwrap();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn new_provider_with_api_key() {
        assert!(RigProvider::new(config(ProviderName::Anthropic, Some("k"), None)).is_ok());
    }

    #[test]
    fn openai_compatible_requires_base_url() {
        let result = RigProvider::new(config(ProviderName::OpenAICompatible, Some("k"), None));
        assert!(result.err().unwrap().to_string().contains("base_url"));

        let ok = RigProvider::new(config(
            ProviderName::OpenAICompatible,
            Some("k"),
            Some("http://localhost:8080/v1"),
        ));
        assert!(ok.is_ok());
    }

    #[test]
    fn model_falls_back_to_provider_default() {
        let provider = RigProvider::new(config(ProviderName::Gemini, Some("k"), None)).unwrap();
        assert_eq!(provider.model(), "gemini-2.5-flash");

        let mut cfg = config(ProviderName::OpenAI, Some("k"), None);
        cfg.model = "gpt-4.1-mini".into();
        let provider = RigProvider::new(cfg).unwrap();
        assert_eq!(provider.model(), "gpt-4.1-mini");
    }
}
