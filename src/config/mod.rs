//! Configuration module
//!
//! Handles loading and layering configuration: defaults, then a config
//! file, then environment variables, then command-line flags.

mod env;

pub use env::EnvConfig;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::executor::{
    ExecutorConfig, DEFAULT_MAX_WORKERS, DEFAULT_QUEUE_CAPACITY, DEFAULT_SHELL,
};
use crate::git::DEFAULT_NOTES_REF;
use crate::output::DisplayMode;

/// Configuration file locations (in order of precedence)
const CONFIG_LOCATIONS: &[&str] = &[
    "./.git-test-branch.yaml",
    "./.git-test-branch.yml",
    "./.git-test-branch.json",
    "~/.config/git-test-branch/config.yaml",
];

/// Application configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Bounds simultaneous test executions
    pub max_workers: usize,

    /// Status changes buffered ahead of the renderer
    pub queue_capacity: usize,

    /// Shell used to run the test command
    pub shell: String,

    /// Workspace root, relative to the repository's git directory
    pub workspace_dir: String,

    /// Record verdicts as git notes
    pub record_notes: bool,

    /// Notes ref used when recording verdicts
    pub notes_ref: String,

    /// Status table display mode
    pub display: DisplayMode,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            shell: DEFAULT_SHELL.to_string(),
            workspace_dir: "git-test-branch".to_string(),
            record_notes: false,
            notes_ref: DEFAULT_NOTES_REF.to_string(),
            display: DisplayMode::Auto,
        }
    }
}

impl AppConfig {
    /// Find configuration file in standard locations
    pub fn find() -> Option<PathBuf> {
        CONFIG_LOCATIONS
            .iter()
            .map(|location| expand_path(location))
            .find(|path| path.exists())
    }

    /// Load `path` if given, else the first standard location, else defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path.map(Path::to_path_buf).or_else(Self::find) {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = if is_yaml_file(path) {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides
    pub fn merge_env(mut self, env: &EnvConfig) -> Self {
        if let Some(jobs) = env.jobs {
            self.max_workers = jobs;
        }
        if let Some(shell) = &env.shell {
            self.shell = shell.clone();
        }
        if let Some(notes) = env.notes {
            self.record_notes = notes;
        }
        if let Some(display) = env.display {
            self.display = display;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_workers == 0 {
            bail!("max_workers must be at least 1");
        }
        if self.queue_capacity == 0 {
            bail!("queue_capacity must be at least 1");
        }
        if self.shell.trim().is_empty() {
            bail!("shell must not be empty");
        }
        if self.workspace_dir.trim().is_empty() {
            bail!("workspace_dir must not be empty");
        }
        Ok(())
    }

    pub fn executor(&self) -> ExecutorConfig {
        ExecutorConfig {
            max_workers: self.max_workers,
            queue_capacity: self.queue_capacity,
        }
    }
}

/// Expand ~ to home directory
fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

/// Check if file is YAML based on extension
fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}
