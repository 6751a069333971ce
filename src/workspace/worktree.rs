//! `git worktree` checkout backend

use async_trait::async_trait;
use std::path::Path;

use super::{CheckoutBackend, WorkspaceError};
use crate::git::GitClient;

/// Detached linked worktrees of the current repository
#[derive(Clone, Debug, Default)]
pub struct GitWorktrees {
    client: GitClient,
}

impl GitWorktrees {
    pub fn new(client: GitClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CheckoutBackend for GitWorktrees {
    async fn checkout(&self, path: &Path, commit_id: &str) -> Result<(), WorkspaceError> {
        let target = path.to_string_lossy();
        self.client
            .output(&["worktree", "add", "--force", "--detach", &target, commit_id])
            .await
            .map(|_| ())
            .map_err(|error| WorkspaceError::Checkout {
                commit: commit_id.to_string(),
                path: path.to_path_buf(),
                error,
            })
    }

    async fn remove(&self, path: &Path) -> Result<(), WorkspaceError> {
        let target = path.to_string_lossy();
        self.client
            .output(&["worktree", "remove", "--force", &target])
            .await
            .map(|_| ())
            .map_err(|error| WorkspaceError::Teardown {
                path: path.to_path_buf(),
                error,
            })
    }
}
