//! Per-commit workspaces
//!
//! Each commit under test gets its own detached checkout below a shared
//! root. Checkout and teardown mutate repository metadata, so they run in
//! a single exclusive section shared by all workers.

mod manager;
mod worktree;

pub use manager::{CheckoutBackend, WorkspaceError, WorkspaceManager};
pub use worktree::GitWorktrees;

#[cfg(test)]
pub(crate) use manager::test_support;
