//! Per-commit test execution
//!
//! Runs the user command inside one commit's workspace and turns its exit
//! status into a terminal [`Status`].

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, warn};

use super::StatusReporter;
use crate::models::{Commit, CommitResult, Status};
use crate::utils::timer::Timer;
use crate::workspace::{WorkspaceError, WorkspaceManager};

pub const DEFAULT_SHELL: &str = "sh";

/// Test runner for a single commit
pub struct TestRunner {
    workspaces: Arc<WorkspaceManager>,
    command: String,
    shell: String,
}

impl TestRunner {
    pub fn new(workspaces: Arc<WorkspaceManager>, command: impl Into<String>) -> Self {
        Self {
            workspaces,
            command: command.into(),
            shell: DEFAULT_SHELL.to_string(),
        }
    }

    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    pub fn workspaces(&self) -> &WorkspaceManager {
        &self.workspaces
    }

    /// Test `commit`; only workspace failures are errors
    pub async fn run(
        &self,
        commit: Commit,
        reporter: &StatusReporter,
    ) -> Result<CommitResult, WorkspaceError> {
        let previous = reporter.previous(&commit).await;
        reporter.update(&commit, Status::Running).await;

        let path = self.workspaces.prepare(&commit.full_id).await?;

        let timer = Timer::start(format!("{} {}", commit.short_id, self.command));
        let status = self.execute(&path).await;
        let duration_ms = timer.stop();

        reporter.update(&commit, status).await;

        self.workspaces.teardown(&commit.full_id).await?;

        Ok(CommitResult {
            commit,
            status,
            duration_ms,
            previous,
        })
    }

    async fn execute(&self, dir: &Path) -> Status {
        let result = Command::new(&self.shell)
            .arg("-c")
            .arg(&self.command)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await;

        match result {
            Ok(exit) if exit.success() => Status::Pass,
            Ok(exit) => {
                debug!("Command in {} exited with {}", dir.display(), exit);
                Status::Fail
            }
            Err(e) => {
                warn!("Failed to launch {}: {}", self.shell, e);
                Status::Fail
            }
        }
    }
}
