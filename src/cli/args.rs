//! Clap argument types.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use autoreview::output::OutputRenderer;
use autoreview::output::json::JsonRenderer;
use autoreview::output::terminal::TerminalRenderer;

/// Incremental AI pull request reviewer.
#[derive(Parser, Debug)]
#[command(
    name = "autoreview",
    version = autoreview::constants::VERSION,
    about = "Reviews open pull requests with an LLM and posts line-anchored comments."
)]
pub struct Cli {
    /// Enable debug logging (overridden by AUTOREVIEW_LOG).
    #[arg(long, short = 'v', global = true, default_value_t = false)]
    pub verbose: bool,

    /// Config file to use instead of ./autoreview.toml.
    #[arg(long, global = true, env = autoreview::constants::ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Output format.
    #[arg(long, global = true, default_value = "terminal")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Review every open pull request of every configured repository once.
    Run(RunArgs),

    /// Repeat `run` on the configured schedule.
    Watch(WatchArgs),

    /// Print the flattened line index of a unified diff.
    Map(MapArgs),

    /// Resolve saved model feedback against a diff and apply the comment gate.
    Resolve(ResolveArgs),

    /// Print version information.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Do everything except posting comments.
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Only review the repository with this name or `workspace/slug` key.
    #[arg(long)]
    pub repo: Option<String>,
}

/// Arguments for the `watch` subcommand.
#[derive(Parser, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Seconds between passes for every repository (overrides
    /// `schedule.interval_secs` and per-repository intervals).
    #[arg(long)]
    pub interval: Option<u64>,
}

/// Arguments for the `map` subcommand.
#[derive(Parser, Debug)]
pub struct MapArgs {
    /// Unified diff file, or `-` for stdin.
    pub diff: PathBuf,
}

/// Arguments for the `resolve` subcommand.
#[derive(Parser, Debug)]
pub struct ResolveArgs {
    /// Unified diff file, or `-` for stdin.
    #[arg(long)]
    pub diff: PathBuf,

    /// Model response for one file (`{"reviews": [...]}` or a bare array).
    #[arg(long)]
    pub feedback: PathBuf,

    /// Destination path of the reviewed file. Defaults to the only
    /// reviewable file in the diff.
    #[arg(long)]
    pub file: Option<String>,

    /// Existing pull request comments as a JSON array.
    #[arg(long)]
    pub comments: Option<PathBuf>,
}

/// Output format options.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Terminal,
    Json,
}

impl OutputFormat {
    /// Renderer for this format.
    pub fn renderer(&self) -> Box<dyn OutputRenderer> {
        match self {
            OutputFormat::Terminal => Box::new(TerminalRenderer),
            OutputFormat::Json => Box::new(JsonRenderer),
        }
    }
}
