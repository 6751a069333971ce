//! Parallel commit testing
//!
//! Dispatches one [`TestRunner`] invocation per commit over a bounded pool
//! and funnels every status change through a single renderer task.

use std::io::Write;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, trace};

use super::{StatusChange, StatusRegistry, StatusReporter, TestRunner};
use crate::git::AnnotationStore;
use crate::models::{Commit, CommitResult, RunSummary};
use crate::output::{render_table, ScreenWriter};
use crate::utils::timer::Timer;
use crate::workspace::WorkspaceError;

pub const DEFAULT_MAX_WORKERS: usize = 5;
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

/// Errors that abort a whole run
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error("failed to draw status table: {0}")]
    Render(std::io::Error),

    #[error("worker task failed: {0}")]
    Worker(String),

    #[error("worker pool closed unexpectedly")]
    Pool,
}

/// Pool sizing for a run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Bounds simultaneous test executions
    pub max_workers: usize,
    /// Status changes buffered ahead of the renderer
    pub queue_capacity: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Where the status table goes
pub enum TableDisplay<W> {
    /// Redraw in place after every change
    Live(W),
    /// Write the final table once
    Plain(W),
    /// Draw nothing
    Hidden,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunPhase {
    NotStarted,
    Dispatching,
    AllSubmitted,
    Draining,
    Finished,
}

/// Runs a commit list through the worker pool
pub struct Orchestrator {
    config: ExecutorConfig,
    runner: Arc<TestRunner>,
    annotations: Option<Arc<dyn AnnotationStore>>,
    phase: RunPhase,
}

impl Orchestrator {
    pub fn new(config: ExecutorConfig, runner: TestRunner) -> Self {
        Self {
            config: ExecutorConfig {
                max_workers: config.max_workers.max(1),
                queue_capacity: config.queue_capacity.max(1),
            },
            runner: Arc::new(runner),
            annotations: None,
            phase: RunPhase::NotStarted,
        }
    }

    /// Mirror every status change into `store`
    pub fn with_annotations(mut self, store: Arc<dyn AnnotationStore>) -> Self {
        self.annotations = Some(store);
        self
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    fn enter(&mut self, phase: RunPhase) {
        debug!("Run phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    /// Test every commit and return the results in commit order.
    ///
    /// Returns early, abandoning in-flight workers, on the first workspace
    /// error.
    pub async fn run<W>(
        &mut self,
        commits: Vec<Commit>,
        display: TableDisplay<W>,
    ) -> Result<RunSummary, RunError>
    where
        W: Write + Send + 'static,
    {
        let timer = Timer::start("run");
        info!(
            "Testing {} commits (max {} concurrent)",
            commits.len(),
            self.config.max_workers
        );

        self.runner.workspaces().ensure_root().await?;

        let commits = Arc::new(commits);
        let registry = Arc::new(StatusRegistry::new());
        let (changes_tx, changes_rx) = mpsc::channel(self.config.queue_capacity);
        let renderer = tokio::spawn(render_loop(
            commits.clone(),
            registry.clone(),
            changes_rx,
            display,
        ));
        let reporter = StatusReporter::new(registry, changes_tx, self.annotations.clone());

        self.enter(RunPhase::Dispatching);
        let semaphore = Arc::new(Semaphore::new(self.config.max_workers));
        let mut tasks = JoinSet::new();
        let mut results: Vec<Option<CommitResult>> = vec![None; commits.len()];

        for (index, commit) in commits.iter().cloned().enumerate() {
            let permit = loop {
                tokio::select! {
                    permit = semaphore.clone().acquire_owned() => {
                        break permit.map_err(|_| RunError::Pool)?;
                    }
                    Some(joined) = tasks.join_next() => collect(joined, &mut results)?,
                }
            };

            trace!("Dispatching {}", commit);
            let runner = self.runner.clone();
            let reporter = reporter.clone();
            tasks.spawn(async move {
                let _permit = permit;
                runner
                    .run(commit, &reporter)
                    .await
                    .map(|result| (index, result))
            });
        }
        self.enter(RunPhase::AllSubmitted);

        // The renderer stops once the last worker drops its reporter
        drop(reporter);

        self.enter(RunPhase::Draining);
        while let Some(joined) = tasks.join_next().await {
            collect(joined, &mut results)?;
        }

        renderer
            .await
            .map_err(|e| RunError::Worker(e.to_string()))?
            .map_err(RunError::Render)?;

        self.enter(RunPhase::Finished);

        let summary = RunSummary::new(results.into_iter().flatten().collect(), timer.stop());
        info!(
            "Run finished: {}/{} passed ({:.1}%)",
            summary.passed,
            summary.total,
            summary.pass_rate()
        );
        Ok(summary)
    }
}

type Joined = Result<Result<(usize, CommitResult), WorkspaceError>, JoinError>;

fn collect(joined: Joined, results: &mut [Option<CommitResult>]) -> Result<(), RunError> {
    let outcome = joined
        .map_err(|e| RunError::Worker(e.to_string()))
        .and_then(|finished| finished.map_err(RunError::from));

    match outcome {
        Ok((index, result)) => {
            debug!("{}", result);
            results[index] = Some(result);
            Ok(())
        }
        Err(e) => {
            error!("Aborting run: {}", e);
            Err(e)
        }
    }
}

/// Single consumer of status changes; the only writer to the table output
async fn render_loop<W: Write>(
    commits: Arc<Vec<Commit>>,
    registry: Arc<StatusRegistry>,
    mut changes: mpsc::Receiver<StatusChange>,
    display: TableDisplay<W>,
) -> std::io::Result<()> {
    match display {
        TableDisplay::Live(out) => {
            let mut screen = ScreenWriter::new(out);
            screen.display(&render_table(&commits, &registry))?;
            while let Some(change) = changes.recv().await {
                trace!("{} is now {}", change.commit_id, change.status);
                screen.display(&render_table(&commits, &registry))?;
            }
        }
        TableDisplay::Plain(mut out) => {
            while changes.recv().await.is_some() {}
            out.write_all(render_table(&commits, &registry).as_bytes())?;
            out.flush()?;
        }
        TableDisplay::Hidden => while changes.recv().await.is_some() {},
    }
    Ok(())
}
