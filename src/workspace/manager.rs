//! Workspace lifecycle management

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use crate::git::GitError;

/// Errors raised while creating or removing a workspace
#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("failed to create workspace root {}: {error}", path.display())]
    CreateRoot { path: PathBuf, error: std::io::Error },

    #[error("failed to remove stale workspace {}: {error}", path.display())]
    RemoveStale { path: PathBuf, error: std::io::Error },

    #[error("failed to check out {commit} into {}: {error}", path.display())]
    Checkout {
        commit: String,
        path: PathBuf,
        error: GitError,
    },

    #[error("failed to tear down workspace {}: {error}", path.display())]
    Teardown { path: PathBuf, error: GitError },

    #[error("workspace {} is unusable: {error}", path.display())]
    Io { path: PathBuf, error: std::io::Error },
}

/// Mechanism that materializes and removes a checkout at a path.
///
/// Calls are always made from inside the manager's exclusive section.
#[async_trait]
pub trait CheckoutBackend: Send + Sync {
    async fn checkout(&self, path: &Path, commit_id: &str) -> Result<(), WorkspaceError>;

    async fn remove(&self, path: &Path) -> Result<(), WorkspaceError>;
}

/// Owns the workspace root and serializes checkout/teardown
pub struct WorkspaceManager {
    root: PathBuf,
    backend: Arc<dyn CheckoutBackend>,
    exclusive: Mutex<()>,
}

impl WorkspaceManager {
    pub fn new(root: impl Into<PathBuf>, backend: Arc<dyn CheckoutBackend>) -> Self {
        Self {
            root: root.into(),
            backend,
            exclusive: Mutex::new(()),
        }
    }

    /// Directory used for `commit_id`
    pub fn path_for(&self, commit_id: &str) -> PathBuf {
        self.root.join(commit_id)
    }

    /// Create the workspace root if it does not exist yet
    pub async fn ensure_root(&self) -> Result<(), WorkspaceError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|error| WorkspaceError::CreateRoot {
                path: self.root.clone(),
                error,
            })
    }

    /// Materialize a fresh checkout of `commit_id` and return its path
    pub async fn prepare(&self, commit_id: &str) -> Result<PathBuf, WorkspaceError> {
        self.ensure_root().await?;

        let path = self.path_for(commit_id);
        remove_dir_if_present(&path)
            .await
            .map_err(|error| WorkspaceError::RemoveStale {
                path: path.clone(),
                error,
            })?;

        let _guard = self.exclusive.lock().await;
        debug!("Checking out {} at {}", commit_id, path.display());
        self.backend.checkout(&path, commit_id).await?;

        Ok(path)
    }

    /// Remove the checkout of `commit_id` and whatever is left of its directory
    pub async fn teardown(&self, commit_id: &str) -> Result<(), WorkspaceError> {
        let path = self.path_for(commit_id);

        {
            let _guard = self.exclusive.lock().await;
            debug!("Removing workspace {}", path.display());
            self.backend.remove(&path).await?;
        }

        remove_dir_if_present(&path)
            .await
            .map_err(|error| WorkspaceError::Io { path, error })
    }
}

async fn remove_dir_if_present(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_dir_all(path).await {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Checkout backend that writes plain directories and records how many
    //! callers were inside the exclusive section at once.

    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    pub struct RecordingBackend {
        inside: AtomicUsize,
        pub max_inside: AtomicUsize,
        pub checkouts: AtomicUsize,
        pub removals: AtomicUsize,
        pub delay: Duration,
        /// 1-based checkout call that fails
        pub fail_checkout_at: Option<usize>,
        pub fail_remove: bool,
    }

    impl RecordingBackend {
        pub fn with_delay(delay: Duration) -> Self {
            Self {
                delay,
                ..Default::default()
            }
        }

        pub fn failing_checkout_at(call: usize) -> Self {
            Self {
                fail_checkout_at: Some(call),
                ..Default::default()
            }
        }

        pub fn failing_remove() -> Self {
            Self {
                fail_remove: true,
                ..Default::default()
            }
        }

        fn refused(path: &Path, what: &str) -> WorkspaceError {
            WorkspaceError::Io {
                path: path.to_path_buf(),
                error: std::io::Error::new(ErrorKind::PermissionDenied, what.to_string()),
            }
        }

        async fn enter(&self) {
            let now = self.inside.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_inside.fetch_max(now, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        fn leave(&self) {
            self.inside.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl CheckoutBackend for RecordingBackend {
        async fn checkout(&self, path: &Path, commit_id: &str) -> Result<(), WorkspaceError> {
            self.enter().await;
            let call = self.checkouts.fetch_add(1, Ordering::SeqCst) + 1;
            let result = if self.fail_checkout_at == Some(call) {
                Err(Self::refused(path, "checkout refused"))
            } else {
                std::fs::create_dir_all(path)
                    .and_then(|_| std::fs::write(path.join("COMMIT"), commit_id))
                    .map_err(|error| WorkspaceError::Io {
                        path: path.to_path_buf(),
                        error,
                    })
            };
            self.leave();
            result
        }

        async fn remove(&self, path: &Path) -> Result<(), WorkspaceError> {
            self.enter().await;
            self.removals.fetch_add(1, Ordering::SeqCst);
            self.leave();
            if self.fail_remove {
                return Err(Self::refused(path, "remove refused"));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::RecordingBackend;
    use super::*;
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_prepare_and_teardown() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("workspaces");
        let backend = Arc::new(RecordingBackend::default());
        let manager = WorkspaceManager::new(&root, backend.clone());

        let path = manager.prepare("abc123").await.unwrap();
        assert_eq!(path, root.join("abc123"));
        assert_eq!(std::fs::read_to_string(path.join("COMMIT")).unwrap(), "abc123");

        manager.teardown("abc123").await.unwrap();
        assert!(!path.exists());
        assert_eq!(backend.removals.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_prepare_removes_stale_directory() {
        let dir = tempdir().unwrap();
        let manager = WorkspaceManager::new(dir.path(), Arc::new(RecordingBackend::default()));

        let stale = manager.path_for("abc123");
        std::fs::create_dir_all(&stale).unwrap();
        std::fs::write(stale.join("leftover"), "x").unwrap();

        let path = manager.prepare("abc123").await.unwrap();
        assert!(!path.join("leftover").exists());
        assert!(path.join("COMMIT").exists());
    }

    #[tokio::test]
    async fn test_root_creation_failure() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "not a directory").unwrap();

        let manager = WorkspaceManager::new(
            blocker.join("workspaces"),
            Arc::new(RecordingBackend::default()),
        );

        let err = manager.ensure_root().await.unwrap_err();
        assert!(matches!(err, WorkspaceError::CreateRoot { .. }));
        assert!(manager.prepare("abc123").await.is_err());
    }

    #[test]
    fn test_error_message_carries_cause_once() {
        let err = WorkspaceError::Teardown {
            path: PathBuf::from("/tmp/ws/abc"),
            error: GitError::Failed {
                args: "worktree remove".to_string(),
                code: "128".to_string(),
                stderr: "fatal: not a working tree".to_string(),
            },
        };

        let message = err.to_string();
        assert_eq!(message.matches("not a working tree").count(), 1);
        assert!(std::error::Error::source(&err).is_none());
    }

    #[tokio::test]
    async fn test_teardown_failure_is_reported() {
        let dir = tempdir().unwrap();
        let backend = Arc::new(RecordingBackend::failing_remove());
        let manager = WorkspaceManager::new(dir.path(), backend.clone());

        manager.prepare("abc123").await.unwrap();
        let err = manager.teardown("abc123").await.unwrap_err();
        assert!(matches!(err, WorkspaceError::Io { .. }));
        assert_eq!(backend.removals.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_checkout_is_exclusive() {
        let dir = tempdir().unwrap();
        let backend = Arc::new(RecordingBackend::with_delay(Duration::from_millis(20)));
        let manager = Arc::new(WorkspaceManager::new(dir.path(), backend.clone()));

        let mut handles = Vec::new();
        for i in 0..8 {
            let manager = manager.clone();
            handles.push(tokio::spawn(async move {
                let id = format!("commit{i}");
                manager.prepare(&id).await.unwrap();
                manager.teardown(&id).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(backend.checkouts.load(Ordering::SeqCst), 8);
        assert_eq!(backend.max_inside.load(Ordering::SeqCst), 1);
    }
}
