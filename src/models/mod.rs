//! Data models for commit testing
//!
//! This module contains the data structures shared by the resolver,
//! the executor and the output layer.

mod commit;
mod status;

pub use commit::Commit;
pub use status::{CommitResult, RunReport, RunSummary, Status};
