//! Git command runner
//!
//! Every repository interaction goes through [`GitClient::output`], which
//! runs `git` with the configured working directory and turns a non-zero
//! exit into a [`GitError`].

use std::path::PathBuf;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Errors raised while running git
#[derive(Error, Debug)]
pub enum GitError {
    #[error("failed to launch git {args}: {error}")]
    Spawn { args: String, error: std::io::Error },

    #[error("git {args} exited with {code}: {stderr}")]
    Failed {
        args: String,
        code: String,
        stderr: String,
    },

    #[error("git {args} produced non UTF-8 output")]
    InvalidOutput { args: String },
}

/// Handle on a repository, driven through the git executable
#[derive(Clone, Debug, Default)]
pub struct GitClient {
    repo_dir: Option<PathBuf>,
}

impl GitClient {
    /// Client operating on the repository at `dir`
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: Some(dir.into()),
        }
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new("git");
        if let Some(dir) = &self.repo_dir {
            cmd.current_dir(dir);
        }
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Run git and return its stdout with surrounding whitespace trimmed
    pub async fn output(&self, args: &[&str]) -> Result<String, GitError> {
        let joined = args.join(" ");
        debug!("git {}", joined);

        let output = self
            .command(args)
            .output()
            .await
            .map_err(|error| GitError::Spawn {
                args: joined.clone(),
                error,
            })?;

        if !output.status.success() {
            return Err(GitError::Failed {
                args: joined,
                code: output
                    .status
                    .code()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string()),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout)
            .map(|s| s.trim().to_string())
            .map_err(|_| GitError::InvalidOutput { args: joined })
    }

    /// Absolute path of the repository's metadata directory
    pub async fn absolute_git_dir(&self) -> Result<PathBuf, GitError> {
        self.output(&["rev-parse", "--absolute-git-dir"])
            .await
            .map(PathBuf::from)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_absolute_git_dir() {
        if !git_available() {
            return;
        }
        let dir = tempdir().unwrap();
        init_repo(dir.path(), &["initial"]);

        let client = GitClient::in_dir(dir.path());
        let git_dir = client.absolute_git_dir().await.unwrap();
        assert!(git_dir.is_absolute());
        assert!(git_dir.ends_with(".git"));
    }

    #[tokio::test]
    async fn test_failed_command_reports_stderr() {
        if !git_available() {
            return;
        }
        let dir = tempdir().unwrap();
        init_repo(dir.path(), &["initial"]);

        let client = GitClient::in_dir(dir.path());
        let err = client
            .output(&["rev-parse", "--verify", "no-such-ref"])
            .await
            .unwrap_err();
        assert!(matches!(err, GitError::Failed { .. }));
    }
}
