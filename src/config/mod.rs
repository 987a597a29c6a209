//! Configuration loading and layering.
//!
//! Handles `autoreview.toml` (or YAML) loading and environment variable
//! resolution with proper priority ordering.

pub mod loader;

pub use loader::{
    Config, ConfigError, ProviderConfig, RepositoryConfig, ReviewConfig, ScheduleConfig,
};
