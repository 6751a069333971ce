//! Commit model

use serde::{Deserialize, Serialize};
use std::fmt;

/// A resolved commit, immutable for the duration of a run
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Commit {
    /// Full object id
    pub full_id: String,

    /// Abbreviated object id
    pub short_id: String,

    /// First line of the commit message
    pub subject: String,
}

impl Commit {
    pub fn new(
        full_id: impl Into<String>,
        short_id: impl Into<String>,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            full_id: full_id.into(),
            short_id: short_id.into(),
            subject: subject.into(),
        }
    }
}

impl fmt::Display for Commit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.short_id, self.subject)
    }
}
