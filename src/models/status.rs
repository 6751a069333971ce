//! Status models for commit testing
//!
//! Defines per-commit status values, per-commit results and the run summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Commit;

/// Test status of a single commit
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Waiting,
    Running,
    Pass,
    Fail,
}

impl Status {
    /// Label used in the status table and in persisted annotations
    pub fn label(&self) -> &'static str {
        match self {
            Status::Waiting => "WAITING",
            Status::Running => "RUNNING",
            Status::Pass => "PASS",
            Status::Fail => "FAIL",
        }
    }

    /// Parse an annotation label back into a status
    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim() {
            "WAITING" => Some(Status::Waiting),
            "RUNNING" => Some(Status::Running),
            "PASS" => Some(Status::Pass),
            "FAIL" => Some(Status::Fail),
            _ => None,
        }
    }

    /// Whether `next` is a legal successor of `self` within one run
    pub fn can_transition_to(&self, next: Status) -> bool {
        matches!(
            (self, next),
            (Status::Waiting, Status::Running)
                | (Status::Running, Status::Pass)
                | (Status::Running, Status::Fail)
        )
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of testing one commit
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommitResult {
    pub commit: Commit,
    pub status: Status,
    pub duration_ms: u64,
    /// Verdict recorded by an earlier run, when annotations are enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<Status>,
}

impl fmt::Display for CommitResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {} [{}ms]",
            self.commit.short_id, self.status, self.commit.subject, self.duration_ms
        )
    }
}

/// Aggregated results of one run, in resolved commit order
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub results: Vec<CommitResult>,
}

impl RunSummary {
    pub fn new(results: Vec<CommitResult>, duration_ms: u64) -> Self {
        let total = results.len();
        let passed = results
            .iter()
            .filter(|r| r.status == Status::Pass)
            .count();
        let failed = results
            .iter()
            .filter(|r| r.status == Status::Fail)
            .count();

        Self {
            total,
            passed,
            failed,
            duration_ms,
            results,
        }
    }

    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.passed as f64 / self.total as f64) * 100.0
        }
    }

    /// True when no commit failed; an empty run counts as passing
    pub fn is_all_passed(&self) -> bool {
        self.failed == 0 && self.passed == self.total
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} commits: {} passed, {} failed in {}ms",
            self.total, self.passed, self.failed, self.duration_ms
        )
    }
}

/// Serializable report of a whole run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunReport {
    pub range: String,
    pub command: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub summary: RunSummary,
}

impl RunReport {
    pub fn new(
        range: impl Into<String>,
        command: impl Into<String>,
        started_at: DateTime<Utc>,
        summary: RunSummary,
    ) -> Self {
        Self {
            range: range.into(),
            command: command.into(),
            started_at,
            completed_at: Utc::now(),
            summary,
        }
    }
}
