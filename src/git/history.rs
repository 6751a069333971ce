//! Commit range resolution
//!
//! Resolves a range expression into commits ordered from the oldest
//! ancestor to the youngest descendant.

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use super::{GitClient, GitError};
use crate::models::Commit;

const FIELD_SEPARATOR: char = '\u{1f}';
const LOG_FORMAT: &str = "--format=%H%x1f%h%x1f%s";

/// Keeps user settings such as `log.showSignature` out of the parsed output
const LOG_ARGS: &[&str] = &[
    "log",
    "--reverse",
    "--no-show-signature",
    "--no-color",
    LOG_FORMAT,
];

/// Errors raised while resolving a commit range
#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("invalid commit range '{0}'")]
    InvalidRange(String),

    #[error("cannot walk history for '{range}': {error}")]
    Git { range: String, error: GitError },

    #[error("unexpected log line: {0:?}")]
    MalformedLine(String),
}

/// Source of the ordered commit list for a run
#[async_trait]
pub trait CommitResolver: Send + Sync {
    async fn resolve(&self, range: &str) -> Result<Vec<Commit>, ResolutionError>;
}

/// History walker backed by `git log`
#[derive(Clone, Debug, Default)]
pub struct GitHistory {
    client: GitClient,
}

impl GitHistory {
    pub fn new(client: GitClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CommitResolver for GitHistory {
    async fn resolve(&self, range: &str) -> Result<Vec<Commit>, ResolutionError> {
        if range.trim().is_empty() || range.starts_with('-') {
            return Err(ResolutionError::InvalidRange(range.to_string()));
        }

        let mut args: Vec<&str> = LOG_ARGS.to_vec();
        args.push(range);

        let output = self
            .client
            .output(&args)
            .await
            .map_err(|error| ResolutionError::Git {
                range: range.to_string(),
                error,
            })?;

        let commits = parse_log_output(&output)?;
        debug!("Resolved {} to {} commits", range, commits.len());
        Ok(commits)
    }
}

/// Parse `%H<US>%h<US>%s` lines, skipping blank ones
pub fn parse_log_output(output: &str) -> Result<Vec<Commit>, ResolutionError> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let mut fields = line.splitn(3, FIELD_SEPARATOR);
            match (fields.next(), fields.next(), fields.next()) {
                (Some(full), Some(short), Some(subject)) if !full.is_empty() && !short.is_empty() => {
                    Ok(Commit::new(full, short, subject))
                }
                _ => Err(ResolutionError::MalformedLine(line.to_string())),
            }
        })
        .collect()
}
