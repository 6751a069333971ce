//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::Parser;
use std::path::PathBuf;

use crate::output::{DisplayMode, OutputFormat};

/// Run a command against every commit in a range, each in its own worktree
#[derive(Parser, Debug)]
#[command(name = "git-test-branch")]
#[command(version)]
#[command(about = "Test every commit in a range in parallel worktrees")]
#[command(long_about = None)]
pub struct Args {
    /// Commit range to test, e.g. main..HEAD
    pub range: String,

    /// Shell command run inside each commit's worktree
    pub command: String,

    /// Maximum number of commits tested at once
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// How the status table is drawn
    #[arg(long, value_enum)]
    pub display: Option<DisplayMode>,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Record each verdict as a git note
    #[arg(long)]
    pub notes: bool,

    /// Configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}
