//! Git plumbing
//!
//! Thin async wrappers around the `git` executable: history resolution,
//! notes-backed annotations and repository discovery.

mod client;
mod history;
mod notes;

pub use client::{GitClient, GitError};
pub use history::{CommitResolver, GitHistory};
pub use notes::{AnnotationStore, GitNotes, DEFAULT_NOTES_REF};

#[cfg(test)]
pub(crate) use client::test_support;
#[cfg(test)]
pub(crate) use notes::NotesError;
