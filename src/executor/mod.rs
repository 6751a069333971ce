//! Test execution engine
//!
//! Status tracking, per-commit test runs and the bounded worker pool that
//! drives them.

mod parallel;
mod registry;
mod runner;

pub use parallel::{
    ExecutorConfig, Orchestrator, TableDisplay, DEFAULT_MAX_WORKERS, DEFAULT_QUEUE_CAPACITY,
};
pub use registry::{StatusChange, StatusRegistry, StatusReporter};
pub use runner::{TestRunner, DEFAULT_SHELL};

#[cfg(test)]
pub(crate) use registry::test_support;
