//! autoreview: incremental AI pull request reviewer.
//!
//! Entry point and error handling boundary. Uses `anyhow` for
//! ergonomic error propagation and user-facing messages.

mod cli;

use autoreview::config;
use autoreview::constants;
use autoreview::diff;
use autoreview::env;
use autoreview::host;
use autoreview::models;
use autoreview::orchestrator;
use autoreview::output;
use autoreview::providers;
use autoreview::state;

use std::path::Path;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use cli::args::{Cli, Command, MapArgs, OutputFormat, ResolveArgs, RunArgs, WatchArgs};
use config::{Config, RepositoryConfig};
use env::Env;
use host::BitbucketHost;
use orchestrator::{RepositoryReport, ReviewOrchestrator, ReviewSettings, RunRegistry};
use output::{FileMap, ResolveReport};
use providers::ReviewProvider;
use providers::rig::RigProvider;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Run(ref args) => run_once(&cli, args).await,
        Command::Watch(ref args) => run_watch(&cli, args).await,
        Command::Map(ref args) => run_map(args, cli.format).await,
        Command::Resolve(ref args) => run_resolve(&cli, args).await,
        Command::Version => run_version(),
    }
}

/// Log to stderr; `AUTOREVIEW_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env(constants::ENV_LOG).unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_version() -> Result<()> {
    use colored::Colorize;

    println!(
        "{} {}",
        constants::APP_NAME.bold(),
        constants::VERSION.green().bold()
    );
    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    Config::load(Some(&cwd), cli.config.as_deref(), &Env::real())
        .context("failed to load configuration")
}

/// Repositories selected by `--repo`, all of them when unset.
fn select_repositories<'a>(
    config: &'a Config,
    filter: Option<&str>,
) -> Result<Vec<&'a RepositoryConfig>> {
    if config.repositories.is_empty() {
        bail!(
            "no repositories configured; add a [[repositories]] section to {}",
            constants::CONFIG_FILENAME
        );
    }
    let selected: Vec<_> = config
        .repositories
        .iter()
        .filter(|r| filter.is_none_or(|f| r.name == f || r.key() == f))
        .collect();
    if selected.is_empty() {
        bail!("no configured repository matches '{}'", filter.unwrap_or_default());
    }
    for repo in &selected {
        repo.validate()?;
    }
    Ok(selected)
}

fn build_provider(config: &Config) -> Result<Arc<dyn ReviewProvider>> {
    let provider = RigProvider::new(config.provider.clone()).context("failed to set up provider")?;
    info!(provider = %config.provider.name, model = provider.model(), "provider ready");
    Ok(Arc::new(provider))
}

fn review_settings(config: &Config, args: &RunArgs) -> ReviewSettings {
    let mut settings = ReviewSettings::from(&config.review);
    settings.dry_run |= args.dry_run;
    settings
}

/// Run one pass over `repo` if no other pass holds it.
///
/// Returns `Ok(None)` when the repository is busy.
async fn review_one(
    repo: &RepositoryConfig,
    registry: &RunRegistry,
    provider: Arc<dyn ReviewProvider>,
    settings: ReviewSettings,
) -> Result<Option<RepositoryReport>> {
    let Some(token) = registry.try_acquire(&repo.key()) else {
        warn!(repo = %repo.display_name(), "previous pass still running; skipping");
        return Ok(None);
    };
    let host = BitbucketHost::new(repo)
        .with_context(|| format!("failed to set up host for {}", repo.display_name()))?;
    let orchestrator = ReviewOrchestrator::new(Arc::new(host), provider, settings);
    let report = orchestrator
        .review_repository(&token, repo)
        .await
        .with_context(|| format!("review pass failed for {}", repo.display_name()))?;
    Ok(Some(report))
}

async fn run_once(cli: &Cli, args: &RunArgs) -> Result<()> {
    let config = load_config(cli)?;
    let repos = select_repositories(&config, args.repo.as_deref())?;
    let provider = build_provider(&config)?;
    let settings = review_settings(&config, args);
    let registry = RunRegistry::new();

    let mut reports = Vec::with_capacity(repos.len());
    let mut failures = 0;
    for repo in repos {
        match review_one(repo, &registry, Arc::clone(&provider), settings.clone()).await {
            Ok(Some(report)) => reports.push(report),
            Ok(None) => {}
            Err(e) => {
                error!(repo = %repo.display_name(), error = %format!("{e:#}"), "repository skipped");
                failures += 1;
            }
        }
    }

    print!("{}", cli.format.renderer().render_run(&reports));
    if failures > 0 && reports.is_empty() {
        bail!("every repository failed");
    }
    Ok(())
}

/// Repeat passes until interrupted.
///
/// Each repository runs on its own ticker in its own task, so a slow
/// repository only delays itself. On ctrl-c the tasks finish the pass they
/// are in and are awaited before returning.
async fn run_watch(cli: &Cli, args: &WatchArgs) -> Result<()> {
    let config = load_config(cli)?;
    let repos: Vec<RepositoryConfig> = select_repositories(&config, args.run.repo.as_deref())?
        .into_iter()
        .cloned()
        .collect();
    let provider = build_provider(&config)?;
    let settings = review_settings(&config, &args.run);
    let override_interval = args.interval.map(|secs| Duration::from_secs(secs.max(1)));
    let registry = RunRegistry::new();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    info!(repositories = repos.len(), "watching");
    let mut tasks = JoinSet::new();
    for repo in repos {
        let interval = override_interval.unwrap_or_else(|| repo.interval(&config.schedule));
        tasks.spawn(watch_repository(
            repo,
            interval,
            registry.clone(),
            Arc::clone(&provider),
            settings.clone(),
            cli.format,
            shutdown_rx.clone(),
        ));
    }

    let signal = tokio::signal::ctrl_c().await;
    info!(running = tasks.len(), "interrupted; waiting for passes in progress");
    let _ = shutdown_tx.send(true);
    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            error!(error = %e, "watch task panicked");
        }
    }
    signal.context("failed to listen for ctrl-c")?;
    Ok(())
}

/// Review `repo` every `interval` until `shutdown` flips.
async fn watch_repository(
    repo: RepositoryConfig,
    interval: Duration,
    registry: RunRegistry,
    provider: Arc<dyn ReviewProvider>,
    settings: ReviewSettings,
    format: OutputFormat,
    mut shutdown: watch::Receiver<bool>,
) {
    info!(repo = %repo.display_name(), interval_secs = interval.as_secs(), "scheduled");
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => return,
        }
        if *shutdown.borrow() {
            return;
        }

        match review_one(&repo, &registry, Arc::clone(&provider), settings.clone()).await {
            Ok(Some(report)) => print!("{}", format.renderer().render_run(&[report])),
            Ok(None) => {}
            Err(e) => {
                error!(repo = %repo.display_name(), error = %format!("{e:#}"), "pass failed")
            }
        }
    }
}

async fn read_diff(path: &Path) -> Result<Vec<models::FileDiff>> {
    diff::file::load_diff(path)
        .await
        .with_context(|| format!("failed to read diff {}", path.display()))
}

async fn run_map(args: &MapArgs, format: OutputFormat) -> Result<()> {
    let files: Vec<FileMap> = read_diff(&args.diff)
        .await?
        .into_iter()
        .map(|f| FileMap {
            index: diff::build_index(&f.hunks),
            path: f.path,
        })
        .collect();
    print!("{}", format.renderer().render_map(&files));
    Ok(())
}

async fn run_resolve(cli: &Cli, args: &ResolveArgs) -> Result<()> {
    let config = load_config(cli)?;
    let files = read_diff(&args.diff).await?;

    let file = match args.file {
        Some(ref path) => files
            .iter()
            .find(|f| &f.path == path)
            .with_context(|| format!("'{path}' is not in the diff"))?,
        None => {
            let mut reviewable = files.iter().filter(|f| f.is_reviewable());
            match (reviewable.next(), reviewable.next()) {
                (Some(only), None) => only,
                (None, _) => bail!("the diff has no reviewable files"),
                (Some(_), Some(_)) => bail!("the diff has several files; pick one with --file"),
            }
        }
    };

    let response = tokio::fs::read_to_string(&args.feedback)
        .await
        .with_context(|| format!("failed to read {}", args.feedback.display()))?;
    let feedback = providers::response::parse_review_response(&response)
        .context("failed to parse feedback")?;

    let comments: Vec<models::RawComment> = match args.comments {
        Some(ref path) => {
            let text = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("failed to parse comments in {}", path.display()))?
        }
        None => Vec::new(),
    };
    let review_state = state::derive_state(
        &comments,
        constants::BOT_MARKER,
        constants::BASE_MARKER_PREFIX,
        constants::BASE_MARKER_SUFFIX,
    );

    let index = diff::build_index(&file.hunks);
    let resolution = diff::resolve_file(&file.path, &index, &feedback);
    let mut keys = review_state.existing_inline_keys.clone();
    let outcome = orchestrator::gate::gate(
        resolution.candidates,
        &mut keys,
        config.review.max_inline_comments,
        config.review.max_total_comments,
        review_state.bot_comment_count,
    );

    let report = ResolveReport {
        path: file.path.clone(),
        feedback: feedback.len(),
        discarded: resolution.discarded,
        skipped: outcome.skipped,
        accepted: outcome.accepted,
    };
    print!("{}", cli.format.renderer().render_resolve(&report));
    Ok(())
}
