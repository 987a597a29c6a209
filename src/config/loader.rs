//! Config struct and loading logic.
//!
//! Priority (highest to lowest):
//! 1. Environment variables
//! 2. Local config (`autoreview.toml`, or the `--config` path)
//! 3. `~/.config/autoreview/config.toml` (global defaults)
//! 4. Built-in defaults
//!
//! Local files ending in `.yaml`/`.yml` are parsed as YAML, everything
//! else as TOML.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::constants::{
    DEFAULT_MAX_INLINE_COMMENTS, DEFAULT_MAX_TOTAL_COMMENTS, ENV_API_KEY, ENV_BASE_URL,
    ENV_BITBUCKET_APP_PASSWORD, ENV_MODEL, ENV_PROVIDER,
};
use crate::env::Env;
use crate::models::ProviderName;

/// Errors during config loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {message}")]
    ParseFile { path: PathBuf, message: String },

    #[error("invalid repository entry '{name}': {reason}")]
    InvalidRepository { name: String, reason: String },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderConfig,
    pub review: ReviewConfig,
    pub schedule: ScheduleConfig,
    pub repositories: Vec<RepositoryConfig>,
}

/// LLM provider configuration.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub name: ProviderName,
    pub model: String,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl ProviderConfig {
    /// Switch to `name`. A model still at the old provider's default moves
    /// to the new provider's default; an explicitly chosen model is kept.
    pub fn switch_to(&mut self, name: ProviderName) {
        if self.model == self.name.default_model() {
            self.model = name.default_model().to_string();
        }
        self.name = name;
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: ProviderName::Gemini,
            model: ProviderName::Gemini.default_model().to_string(),
            base_url: None,
            api_key: None,
        }
    }
}

/// Per-pull-request review behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    pub max_inline_comments: usize,
    pub max_total_comments: usize,
    /// Pause between AI calls, in milliseconds.
    pub request_delay_ms: u64,
    /// Pause between pull requests, in milliseconds.
    pub pull_request_delay_ms: u64,
    /// Do everything except post comments.
    pub dry_run: bool,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            max_inline_comments: DEFAULT_MAX_INLINE_COMMENTS,
            max_total_comments: DEFAULT_MAX_TOTAL_COMMENTS,
            request_delay_ms: 1000,
            pull_request_delay_ms: 2000,
            dry_run: false,
        }
    }
}

impl ReviewConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn pull_request_delay(&self) -> Duration {
        Duration::from_millis(self.pull_request_delay_ms)
    }
}

/// `watch` scheduling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub interval_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self { interval_secs: 300 }
    }
}

impl ScheduleConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

/// One Bitbucket repository to watch.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Label used in logs and reports; defaults to `workspace/repo_slug`.
    pub name: String,
    pub workspace: String,
    pub repo_slug: String,
    pub username: String,
    pub app_password: Option<String>,
    /// Display names whose pull requests are never reviewed.
    pub ignore_authors: Vec<String>,
    /// Seconds between `watch` passes for this repository; `[schedule]`
    /// applies when unset.
    pub interval_secs: Option<u64>,
}

impl std::fmt::Debug for RepositoryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryConfig")
            .field("name", &self.name)
            .field("workspace", &self.workspace)
            .field("repo_slug", &self.repo_slug)
            .field("username", &self.username)
            .field("app_password", &self.app_password.as_ref().map(|_| "[REDACTED]"))
            .field("ignore_authors", &self.ignore_authors)
            .field("interval_secs", &self.interval_secs)
            .finish()
    }
}

impl RepositoryConfig {
    /// Stable key identifying this repository.
    pub fn key(&self) -> String {
        format!("{}/{}", self.workspace, self.repo_slug)
    }

    /// Name for display, falling back to the key.
    pub fn display_name(&self) -> String {
        if self.name.trim().is_empty() {
            self.key()
        } else {
            self.name.clone()
        }
    }

    /// Whether pull requests by `author` should be skipped.
    pub fn ignores_author(&self, author: &str) -> bool {
        let author = author.trim();
        !author.is_empty()
            && self
                .ignore_authors
                .iter()
                .any(|a| a.trim().eq_ignore_ascii_case(author))
    }

    /// Time between `watch` passes, falling back to the global schedule.
    pub fn interval(&self, schedule: &ScheduleConfig) -> Duration {
        match self.interval_secs {
            Some(secs) => Duration::from_secs(secs.max(1)),
            None => schedule.interval(),
        }
    }

    /// Check that the entry can reach the host.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let missing = [
            ("workspace", self.workspace.trim().is_empty()),
            ("repo_slug", self.repo_slug.trim().is_empty()),
            ("username", self.username.trim().is_empty()),
            ("app_password", self.app_password.is_none()),
        ];
        if let Some((field, _)) = missing.iter().find(|(_, empty)| *empty) {
            return Err(ConfigError::InvalidRepository {
                name: self.display_name(),
                reason: format!("missing {field}"),
            });
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration with proper layering.
    ///
    /// `explicit` replaces the local `autoreview.toml` lookup and must exist.
    pub fn load(
        working_dir: Option<&Path>,
        explicit: Option<&Path>,
        env: &Env,
    ) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        // Layer 3: global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global = Self::load_file(&global_path)?;
                config.merge(global);
            }
        }

        // Layer 2: local config
        match explicit {
            Some(path) => config.merge(Self::load_file(path)?),
            None => {
                if let Some(dir) = working_dir {
                    let local_path = dir.join(crate::constants::CONFIG_FILENAME);
                    if local_path.exists() {
                        config.merge(Self::load_file(&local_path)?);
                    }
                }
            }
        }

        // Layer 1: environment variables
        config.apply_env_vars(env);

        Ok(config)
    }

    /// Load a config from a specific file, choosing the format by extension.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

        let parsed = if is_yaml {
            serde_yaml_ng::from_str(&content).map_err(|e| e.to_string())
        } else {
            toml::from_str(&content).map_err(|e| e.to_string())
        };
        parsed.map_err(|message| ConfigError::ParseFile {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Get the global config file path.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(crate::constants::CONFIG_DIR).join("config.toml"))
    }

    /// Merge another config into this one (other takes precedence for non-default values).
    ///
    /// Repositories are not merged field by field: a layer that lists any
    /// repositories replaces the whole list.
    fn merge(&mut self, other: Config) {
        // Provider settings
        let default_provider = ProviderConfig::default();
        if other.provider.name != default_provider.name {
            self.provider.switch_to(other.provider.name);
        }
        if other.provider.model != default_provider.model {
            self.provider.model = other.provider.model;
        }
        if other.provider.base_url.is_some() {
            self.provider.base_url = other.provider.base_url;
        }
        if other.provider.api_key.is_some() {
            self.provider.api_key = other.provider.api_key;
        }

        // Review settings
        let default_review = ReviewConfig::default();
        if other.review.max_inline_comments != default_review.max_inline_comments {
            self.review.max_inline_comments = other.review.max_inline_comments;
        }
        if other.review.max_total_comments != default_review.max_total_comments {
            self.review.max_total_comments = other.review.max_total_comments;
        }
        if other.review.request_delay_ms != default_review.request_delay_ms {
            self.review.request_delay_ms = other.review.request_delay_ms;
        }
        if other.review.pull_request_delay_ms != default_review.pull_request_delay_ms {
            self.review.pull_request_delay_ms = other.review.pull_request_delay_ms;
        }
        if other.review.dry_run {
            self.review.dry_run = true;
        }

        // Schedule
        if other.schedule.interval_secs != ScheduleConfig::default().interval_secs {
            self.schedule.interval_secs = other.schedule.interval_secs;
        }

        if !other.repositories.is_empty() {
            self.repositories = other.repositories;
        }
    }

    /// Apply environment variable overrides.
    fn apply_env_vars(&mut self, env: &Env) {
        if let Some(val) = env.get(ENV_PROVIDER) {
            match val.parse::<ProviderName>() {
                Ok(name) => self.provider.switch_to(name),
                Err(_) => {
                    tracing::warn!(var = ENV_PROVIDER, value = %val, "ignoring invalid provider")
                }
            }
        }
        if let Some(val) = env.get(ENV_MODEL) {
            self.provider.model = val;
        }
        if let Some(val) = env.get(ENV_BASE_URL) {
            self.provider.base_url = Some(val);
        }

        // Provider-specific API key resolution
        let api_key = env
            .get(ENV_API_KEY)
            .or_else(|| env.get(self.provider.name.api_key_env_var()));
        if api_key.is_some() {
            self.provider.api_key = api_key;
        }

        if let Some(password) = env.get(ENV_BITBUCKET_APP_PASSWORD) {
            for repo in self.repositories.iter_mut().filter(|r| r.app_password.is_none()) {
                repo.app_password = Some(password.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env() -> Env {
        Env::mock(Vec::<(&str, &str)>::new())
    }

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.provider.name, ProviderName::Gemini);
        assert_eq!(config.provider.model, "gemini-2.5-flash");
        assert_eq!(config.review.max_inline_comments, 100);
        assert_eq!(config.review.max_total_comments, 200);
        assert_eq!(config.review.request_delay(), Duration::from_secs(1));
        assert_eq!(config.review.pull_request_delay(), Duration::from_secs(2));
        assert!(!config.review.dry_run);
        assert!(config.repositories.is_empty());
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[provider]
name = "anthropic"
model = "claude-sonnet-4-20250514"

[review]
max_inline_comments = 10
dry_run = true

[schedule]
interval_secs = 60

[[repositories]]
name = "backend"
workspace = "acme"
repo_slug = "api"
username = "bot"
app_password = "secret"
ignore_authors = ["Dependabot"]
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.provider.name, ProviderName::Anthropic);
        assert_eq!(config.review.max_inline_comments, 10);
        assert_eq!(config.review.max_total_comments, 200);
        assert!(config.review.dry_run);
        assert_eq!(config.schedule.interval_secs, 60);
        assert_eq!(config.repositories.len(), 1);
        assert_eq!(config.repositories[0].key(), "acme/api");
        assert!(config.repositories[0].ignores_author("dependabot"));
        assert_eq!(config.repositories[0].interval_secs, None);
    }

    #[test]
    fn repository_interval_overrides_schedule() {
        let toml_str = r#"
[schedule]
interval_secs = 600

[[repositories]]
workspace = "acme"
repo_slug = "api"
interval_secs = 30

[[repositories]]
workspace = "acme"
repo_slug = "web"

[[repositories]]
workspace = "acme"
repo_slug = "docs"
interval_secs = 0
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        let intervals: Vec<Duration> = config
            .repositories
            .iter()
            .map(|r| r.interval(&config.schedule))
            .collect();
        assert_eq!(
            intervals,
            vec![
                Duration::from_secs(30),
                Duration::from_secs(600),
                Duration::from_secs(1),
            ]
        );
    }

    #[test]
    fn provider_name_in_file_picks_its_default_model() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("autoreview.toml"),
            "[provider]\nname = \"anthropic\"\n",
        )
        .unwrap();

        let config = Config::load(Some(dir.path()), None, &no_env()).unwrap();
        assert_eq!(config.provider.name, ProviderName::Anthropic);
        assert_eq!(config.provider.model, ProviderName::Anthropic.default_model());
    }

    #[test]
    fn provider_switch_keeps_explicit_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("llm.yaml");
        std::fs::write(
            &path,
            "provider:\n  name: self\n  model: qwen2.5-coder\n  base_url: http://llm.internal/v1\n",
        )
        .unwrap();

        let config = Config::load(None, Some(&path), &no_env()).unwrap();
        assert_eq!(config.provider.name, ProviderName::OpenAICompatible);
        assert_eq!(config.provider.model, "qwen2.5-coder");
    }

    #[test]
    fn load_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repos.yaml");
        std::fs::write(
            &path,
            "provider:\n  name: self\n  base_url: http://llm.internal/v1\nrepositories:\n  - workspace: acme\n    repo_slug: web\n    username: bot\n",
        )
        .unwrap();

        let config = Config::load_file(&path).unwrap();
        assert_eq!(config.provider.name, ProviderName::OpenAICompatible);
        assert_eq!(config.repositories[0].display_name(), "acme/web");
        assert_eq!(config.repositories[0].app_password, None);

        let loaded = Config::load(None, Some(&path), &no_env()).unwrap();
        assert_eq!(
            loaded.provider.model,
            ProviderName::OpenAICompatible.default_model()
        );
    }

    #[test]
    fn merge_overrides_non_default_values() {
        let mut base = Config::default();
        let mut other = Config::default();
        other.provider.name = ProviderName::OpenAI;
        other.provider.model = "gpt-4o".into();
        other.provider.api_key = Some("sk-test".into());
        other.review.max_total_comments = 50;
        other.review.request_delay_ms = 0;
        other.review.dry_run = true;
        other.schedule.interval_secs = 30;
        other.repositories = vec![RepositoryConfig {
            workspace: "w".into(),
            repo_slug: "r".into(),
            ..Default::default()
        }];

        base.merge(other);

        assert_eq!(base.provider.name, ProviderName::OpenAI);
        assert_eq!(base.provider.model, "gpt-4o");
        assert_eq!(base.provider.api_key.as_deref(), Some("sk-test"));
        assert_eq!(base.review.max_total_comments, 50);
        assert_eq!(base.review.request_delay_ms, 0);
        assert!(base.review.dry_run);
        assert_eq!(base.schedule.interval_secs, 30);
        assert_eq!(base.repositories.len(), 1);
    }

    #[test]
    fn merge_keeps_base_when_other_is_default() {
        let mut base = Config::default();
        base.review.max_inline_comments = 5;
        base.repositories = vec![RepositoryConfig::default()];

        base.merge(Config::default());

        assert_eq!(base.review.max_inline_comments, 5);
        assert_eq!(base.repositories.len(), 1);
    }

    #[test]
    fn load_file_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "not valid {{ toml").unwrap();

        let err = Config::load_file(&path).unwrap_err();
        assert!(err.to_string().contains("parse"));
    }

    #[test]
    fn load_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_file(&dir.path().join("missing.toml")).unwrap_err();
        assert!(err.to_string().contains("read"));
    }

    #[test]
    fn load_from_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("autoreview.toml"),
            "[review]\nmax_inline_comments = 7\n",
        )
        .unwrap();

        let config = Config::load(Some(dir.path()), None, &no_env()).unwrap();
        assert_eq!(config.review.max_inline_comments, 7);
    }

    #[test]
    fn explicit_path_replaces_local_lookup() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("autoreview.toml"),
            "[review]\nmax_inline_comments = 7\n",
        )
        .unwrap();
        let explicit = dir.path().join("other.toml");
        std::fs::write(&explicit, "[review]\nmax_total_comments = 9\n").unwrap();

        let config = Config::load(Some(dir.path()), Some(&explicit), &no_env()).unwrap();
        assert_eq!(config.review.max_inline_comments, 100);
        assert_eq!(config.review.max_total_comments, 9);

        let missing = dir.path().join("nope.toml");
        assert!(Config::load(Some(dir.path()), Some(&missing), &no_env()).is_err());
    }

    #[test]
    fn apply_env_vars_provider_and_api_key() {
        let env = Env::mock([
            ("AUTOREVIEW_PROVIDER", "openai"),
            ("AUTOREVIEW_API_KEY", "sk-env-test"),
        ]);
        let mut config = Config::default();
        config.apply_env_vars(&env);
        assert_eq!(config.provider.name, ProviderName::OpenAI);
        assert_eq!(config.provider.model, "gpt-4o");
        assert_eq!(config.provider.api_key.as_deref(), Some("sk-env-test"));
    }

    #[test]
    fn apply_env_vars_model_and_base_url() {
        let env = Env::mock([
            ("AUTOREVIEW_MODEL", "gemini-2.5-pro"),
            ("AUTOREVIEW_BASE_URL", "https://custom.api/v1"),
        ]);
        let mut config = Config::default();
        config.apply_env_vars(&env);
        assert_eq!(config.provider.model, "gemini-2.5-pro");
        assert_eq!(config.provider.base_url.as_deref(), Some("https://custom.api/v1"));
    }

    #[test]
    fn apply_env_vars_invalid_provider_is_ignored() {
        let env = Env::mock([("AUTOREVIEW_PROVIDER", "not-a-provider")]);
        let mut config = Config::default();
        config.apply_env_vars(&env);
        assert_eq!(config.provider.name, ProviderName::Gemini);
    }

    #[test]
    fn apply_env_vars_provider_specific_api_key_fallback() {
        let env = Env::mock([("GEMINI_API_KEY", "g-key")]);
        let mut config = Config::default();
        config.apply_env_vars(&env);
        assert_eq!(config.provider.api_key.as_deref(), Some("g-key"));
    }

    #[test]
    fn app_password_from_env_fills_gaps_only() {
        let env = Env::mock([("AUTOREVIEW_BITBUCKET_APP_PASSWORD", "from-env")]);
        let mut config = Config::default();
        config.repositories = vec![
            RepositoryConfig {
                app_password: Some("own".into()),
                ..Default::default()
            },
            RepositoryConfig::default(),
        ];
        config.apply_env_vars(&env);
        assert_eq!(config.repositories[0].app_password.as_deref(), Some("own"));
        assert_eq!(config.repositories[1].app_password.as_deref(), Some("from-env"));
    }

    #[test]
    fn repository_validation() {
        let mut repo = RepositoryConfig {
            workspace: "acme".into(),
            repo_slug: "api".into(),
            username: "bot".into(),
            ..Default::default()
        };
        let err = repo.validate().unwrap_err();
        assert!(err.to_string().contains("app_password"));

        repo.app_password = Some("pw".into());
        assert!(repo.validate().is_ok());
    }

    #[test]
    fn secrets_are_redacted_in_debug() {
        let config = Config {
            provider: ProviderConfig {
                api_key: Some("sk-very-secret".into()),
                ..Default::default()
            },
            repositories: vec![RepositoryConfig {
                app_password: Some("hunter2".into()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-very-secret"));
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }
}
