//! git-test-branch - test every commit in a range
//!
//! A CLI tool that checks out each commit of a range into its own
//! worktree and runs a shell command there, several commits at a time,
//! with a live status table.
//!
//! ## Features
//!
//! - Bounded parallel execution (5 workers by default)
//! - Serialized worktree creation and removal
//! - In-place status table redraw, plain output when not on a terminal
//! - Optional verdicts recorded as git notes
//! - JSON and summary reports
//!
//! ## Usage
//!
//! ```bash
//! # Test every commit on the current branch since main
//! git test-branch main..@ 'cargo test'
//!
//! # Two at a time, recording PASS/FAIL in refs/notes/test-branch
//! git test-branch -j 2 --notes main..@ 'make check'
//!
//! # Machine-readable report
//! git test-branch --format json main..@ './ci.sh'
//! ```

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

mod cli;
mod config;
mod executor;
mod git;
mod models;
mod output;
mod utils;
mod workspace;

use cli::Args;
use config::{AppConfig, EnvConfig};
use executor::{Orchestrator, TableDisplay, TestRunner};
use git::{CommitResolver, GitClient, GitHistory, GitNotes};
use models::RunReport;
use output::{DisplayMode, ResultFormatter};
use utils::logger::{init_logger, LogLevel};
use workspace::{GitWorktrees, WorkspaceManager};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let env = EnvConfig::load();

    let level = if args.verbose {
        LogLevel::Debug
    } else {
        env.log_level
            .as_deref()
            .and_then(LogLevel::from_str)
            .unwrap_or(LogLevel::for_verbosity(false))
    };
    init_logger(level);

    let config = load_config(&args, &env)?;
    let started_at = Utc::now();

    let client = GitClient::in_dir(
        std::env::current_dir().context("Failed to read the current directory")?,
    );
    let commits = GitHistory::new(client.clone())
        .resolve(&args.range)
        .await
        .with_context(|| format!("Failed to resolve commit range '{}'", args.range))?;

    let root = client
        .absolute_git_dir()
        .await
        .context("Failed to locate the repository's git directory")?
        .join(&config.workspace_dir);
    info!("Workspaces under {}", root.display());

    let workspaces = Arc::new(WorkspaceManager::new(
        root,
        Arc::new(GitWorktrees::new(client.clone())),
    ));
    let runner = TestRunner::new(workspaces, &args.command).with_shell(&config.shell);

    let mut orchestrator = Orchestrator::new(config.executor(), runner);
    if config.record_notes {
        orchestrator =
            orchestrator.with_annotations(Arc::new(GitNotes::new(client, &config.notes_ref)));
    }

    let display = if !args.format.shows_table() {
        TableDisplay::Hidden
    } else if config.display.resolve(io::stdout().is_terminal()) == DisplayMode::Live {
        TableDisplay::Live(io::stdout())
    } else {
        TableDisplay::Plain(io::stdout())
    };

    let outcome = orchestrator.run(commits, display).await;
    let summary =
        outcome.with_context(|| format!("Test run aborted ({:?})", orchestrator.phase()))?;

    let report = RunReport::new(&args.range, &args.command, started_at, summary);
    if let Some(text) = ResultFormatter::new(args.format)
        .format_report(&report)
        .context("Failed to serialize the run report")?
    {
        println!("{text}");
    }

    Ok(if report.summary.is_all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Defaults, then config file, then environment, then flags
fn load_config(args: &Args, env: &EnvConfig) -> Result<AppConfig> {
    let path = args
        .config
        .clone()
        .or_else(|| env.config_file.as_ref().map(PathBuf::from));

    let mut config = AppConfig::load_or_default(path.as_deref())?.merge_env(env);
    if let Some(jobs) = args.jobs {
        config.max_workers = jobs;
    }
    if let Some(display) = args.display {
        config.display = display;
    }
    if args.notes {
        config.record_notes = true;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}
