//! Shared status tracking
//!
//! The registry is the single source of truth for per-commit status during
//! a run. Workers write through a [`StatusReporter`], which also signals
//! the renderer and mirrors the label into the annotation store.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::git::AnnotationStore;
use crate::models::{Commit, Status};

/// Concurrent map from full commit id to status
#[derive(Debug, Default)]
pub struct StatusRegistry {
    statuses: RwLock<HashMap<String, Status>>,
}

impl StatusRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `status` for `commit_id`, replacing the previous value
    pub fn set(&self, commit_id: &str, status: Status) {
        let mut statuses = self
            .statuses
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let previous = statuses.insert(commit_id.to_string(), status);

        let previous = previous.unwrap_or_default();
        if previous != status && !previous.can_transition_to(status) {
            warn!(
                "Unexpected status transition for {}: {} -> {}",
                commit_id, previous, status
            );
        }
    }

    /// Current status of `commit_id`, `Waiting` if never set
    pub fn get(&self, commit_id: &str) -> Status {
        self.statuses
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(commit_id)
            .copied()
            .unwrap_or_default()
    }
}

/// Signal sent to the renderer after every status update
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusChange {
    pub commit_id: String,
    pub status: Status,
}

/// Write handle given to each worker
#[derive(Clone)]
pub struct StatusReporter {
    registry: Arc<StatusRegistry>,
    changes: mpsc::Sender<StatusChange>,
    annotations: Option<Arc<dyn AnnotationStore>>,
}

impl StatusReporter {
    pub fn new(
        registry: Arc<StatusRegistry>,
        changes: mpsc::Sender<StatusChange>,
        annotations: Option<Arc<dyn AnnotationStore>>,
    ) -> Self {
        Self {
            registry,
            changes,
            annotations,
        }
    }

    /// Verdict an earlier run left in the annotation store, if any
    pub async fn previous(&self, commit: &Commit) -> Option<Status> {
        let store = self.annotations.as_ref()?;
        match store.get(&commit.full_id).await {
            Ok(label) => label.as_deref().and_then(Status::from_label),
            Err(e) => {
                warn!("Could not read previous verdict of {}: {}", commit.short_id, e);
                None
            }
        }
    }

    /// Record a transition and notify whoever draws the table
    pub async fn update(&self, commit: &Commit, status: Status) {
        self.registry.set(&commit.full_id, status);

        if let Some(store) = &self.annotations {
            if let Err(e) = store.set(&commit.full_id, status.label()).await {
                warn!("Could not record {} for {}: {}", status, commit.short_id, e);
            }
        }

        let change = StatusChange {
            commit_id: commit.full_id.clone(),
            status,
        };
        if self.changes.send(change).await.is_err() {
            debug!("Status renderer has stopped; {} not drawn", commit.short_id);
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use crate::git::{AnnotationStore, NotesError};

    /// Annotation store keeping every label written, per commit
    #[derive(Default)]
    pub struct RecordingStore {
        pub history: Mutex<HashMap<String, Vec<String>>>,
    }

    impl RecordingStore {
        pub fn labels(&self, commit_id: &str) -> Vec<String> {
            self.history
                .lock()
                .unwrap()
                .get(commit_id)
                .cloned()
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl AnnotationStore for RecordingStore {
        async fn set(&self, commit_id: &str, label: &str) -> Result<(), NotesError> {
            self.history
                .lock()
                .unwrap()
                .entry(commit_id.to_string())
                .or_default()
                .push(label.to_string());
            Ok(())
        }

        async fn get(&self, commit_id: &str) -> Result<Option<String>, NotesError> {
            Ok(self.labels(commit_id).last().cloned())
        }
    }
}
