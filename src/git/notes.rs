//! Verdict annotations stored as git notes
//!
//! Labels live under a dedicated notes ref so later invocations (and
//! `git log --notes=<ref>`) can see the last verdict of every commit.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use super::{GitClient, GitError};

pub const DEFAULT_NOTES_REF: &str = "refs/notes/test-branch";

/// Errors raised by an annotation store
#[derive(Error, Debug)]
pub enum NotesError {
    #[error("failed to write note for {commit}: {error}")]
    Write { commit: String, error: GitError },

    #[error("failed to read note for {commit}: {error}")]
    Read { commit: String, error: GitError },
}

/// Label storage keyed by full commit id
#[async_trait]
pub trait AnnotationStore: Send + Sync {
    async fn set(&self, commit_id: &str, label: &str) -> Result<(), NotesError>;

    async fn get(&self, commit_id: &str) -> Result<Option<String>, NotesError>;
}

/// Annotation store backed by `git notes`
#[derive(Debug)]
pub struct GitNotes {
    client: GitClient,
    notes_ref: String,
    // Every write updates the same notes ref
    write_lock: Mutex<()>,
}

impl GitNotes {
    pub fn new(client: GitClient, notes_ref: impl Into<String>) -> Self {
        Self {
            client,
            notes_ref: notes_ref.into(),
            write_lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl AnnotationStore for GitNotes {
    async fn set(&self, commit_id: &str, label: &str) -> Result<(), NotesError> {
        let _guard = self.write_lock.lock().await;
        debug!("Annotating {} with {}", commit_id, label);

        self.client
            .output(&[
                "notes",
                "--ref",
                &self.notes_ref,
                "add",
                "--force",
                "--message",
                label,
                commit_id,
            ])
            .await
            .map(|_| ())
            .map_err(|error| NotesError::Write {
                commit: commit_id.to_string(),
                error,
            })
    }

    async fn get(&self, commit_id: &str) -> Result<Option<String>, NotesError> {
        match self
            .client
            .output(&["notes", "--ref", &self.notes_ref, "show", commit_id])
            .await
        {
            Ok(label) => Ok(Some(label)),
            Err(GitError::Failed { stderr, .. }) if stderr.contains("no note found") => Ok(None),
            Err(error) => Err(NotesError::Read {
                commit: commit_id.to_string(),
                error,
            }),
        }
    }
}
