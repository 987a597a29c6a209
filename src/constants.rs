//! App-wide constants.
//!
//! Centralises the tool name, config paths, environment variable names,
//! and the comment marker protocol so a rename only requires changing
//! this file.

/// Display name of the tool (lowercase).
pub const APP_NAME: &str = "autoreview";

/// CLI version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Local config filename looked up in the working directory.
pub const CONFIG_FILENAME: &str = "autoreview.toml";

/// Directory name under `~/.config/` for global config.
pub const CONFIG_DIR: &str = "autoreview";

// ── Marker protocol ─────────────────────────────────────────────────

/// Invisible sentinel appended to every comment this tool posts.
///
/// Its presence is the only way a later run can tell its own comments
/// apart from human ones.
pub const BOT_MARKER: &str = "<!-- autoreview:bot -->";

/// Opening half of the base-commit marker embedded in summary comments.
pub const BASE_MARKER_PREFIX: &str = "<!-- auto-review-base:";

/// Closing half of the base-commit marker.
pub const BASE_MARKER_SUFFIX: &str = " -->";

/// First line of every summary comment.
pub const SUMMARY_TITLE: &str = "Summary by autoreview";

// ── Caps ────────────────────────────────────────────────────────────

/// Default per-run cap on inline comments for one pull request.
pub const DEFAULT_MAX_INLINE_COMMENTS: usize = 100;

/// Default per-run cap on all bot comments for one pull request.
pub const DEFAULT_MAX_TOTAL_COMMENTS: usize = 200;

// ── Environment variable names ──────────────────────────────────────

pub const ENV_PROVIDER: &str = "AUTOREVIEW_PROVIDER";
pub const ENV_MODEL: &str = "AUTOREVIEW_MODEL";
pub const ENV_API_KEY: &str = "AUTOREVIEW_API_KEY";
pub const ENV_BASE_URL: &str = "AUTOREVIEW_BASE_URL";
pub const ENV_BITBUCKET_APP_PASSWORD: &str = "AUTOREVIEW_BITBUCKET_APP_PASSWORD";
pub const ENV_LOG: &str = "AUTOREVIEW_LOG";
pub const ENV_CONFIG: &str = "AUTOREVIEW_CONFIG";
