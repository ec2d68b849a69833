// src/engine/scheduler.rs

//! Poll-loop scheduler.
//!
//! Every poll interval the scheduler scans the graph, claims each ready task
//! (`NotStarted -> InProgress`) and spawns its dispatch. Readiness is driven
//! only by task status; the spawned handles are kept to reap panics and to
//! bound the final wait.

use std::collections::HashMap;
use std::future::{self, Future};
use std::sync::Arc;

use tokio::task::{Id, JoinError, JoinSet};
use tokio::time::{sleep, sleep_until, timeout, Instant};
use tracing::{debug, error, info, warn};

use crate::config::SchedulerOptions;
use crate::dag::{all_terminal, ready_tasks, status_counts, TaskGraph, TaskId};
use crate::engine::report::{FinalState, RunOutcome, RunReport};
use crate::errors::{DistmakeError, Result};
use crate::exec::{Dispatcher, TaskOutcome};

type Handles = HashMap<Id, TaskId>;

pub struct Scheduler {
    graph: Arc<TaskGraph>,
    dispatcher: Arc<Dispatcher>,
    options: SchedulerOptions,
}

impl Scheduler {
    pub fn new(graph: TaskGraph, dispatcher: Arc<Dispatcher>, options: SchedulerOptions) -> Self {
        Self {
            graph: Arc::new(graph),
            dispatcher,
            options,
        }
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Drive the graph until every task is terminal, nothing can make
    /// progress, or the run timeout expires.
    pub async fn run(&self) -> Result<RunReport> {
        self.run_until(future::pending::<()>()).await
    }

    /// Like [`Scheduler::run`], but stops early when `shutdown` resolves.
    ///
    /// A timed-out or cancelled run still returns its report; the outcome
    /// says how it ended.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<RunReport>
    where
        F: Future<Output = ()>,
    {
        if self.graph.is_empty() {
            return Err(DistmakeError::SchedulingError(
                "no tasks loaded; nothing to schedule".to_string(),
            ));
        }

        let started = Instant::now();
        let deadline = started + self.options.run_timeout;
        let mut in_flight: JoinSet<TaskOutcome> = JoinSet::new();
        let mut handles = Handles::new();
        tokio::pin!(shutdown);

        info!(
            tasks = self.graph.len(),
            nodes = self.dispatcher.pool().len(),
            poll_ms = self.options.poll_interval.as_millis() as u64,
            "scheduler started"
        );

        let outcome = loop {
            while let Some(joined) = in_flight.try_join_next_with_id() {
                self.reap(joined, &mut handles);
            }

            let launched = self.launch_ready(&mut in_flight, &mut handles);

            if all_terminal(&self.graph) {
                break RunOutcome::Completed;
            }
            if launched == 0 && in_flight.is_empty() {
                let counts = status_counts(&self.graph);
                warn!(
                    blocked = counts.not_started,
                    failed = counts.failed,
                    "no task can make progress; remaining tasks are blocked by failed dependencies"
                );
                break RunOutcome::Completed;
            }

            tokio::select! {
                _ = sleep(self.options.poll_interval) => {}
                _ = sleep_until(deadline) => break RunOutcome::TimedOut,
                _ = &mut shutdown => break RunOutcome::Cancelled,
            }
        };

        match outcome {
            RunOutcome::Completed => self.drain(&mut in_flight, &mut handles, deadline).await,
            RunOutcome::TimedOut => {
                error!(
                    timeout = ?self.options.run_timeout,
                    in_flight = in_flight.len(),
                    "run timed out; cancelling outstanding tasks"
                );
                self.cancel_all(&mut in_flight, &mut handles).await;
            }
            RunOutcome::Cancelled => {
                warn!(in_flight = in_flight.len(), "run cancelled; aborting outstanding tasks");
                self.cancel_all(&mut in_flight, &mut handles).await;
            }
        }

        let stats = self.dispatcher.stats().snapshot();
        let report = RunReport::from_graph(&self.graph, outcome, started.elapsed(), stats);
        info!(
            finished = report.count(FinalState::Finished),
            failed = report.count(FinalState::Failed),
            blocked = report.count(FinalState::Blocked),
            acquisitions = stats.acquisitions,
            acquire_retries = stats.acquire_retries,
            remote_commands = stats.remote_commands,
            local_commands = stats.local_commands,
            transfers = stats.transfers,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "run ended"
        );
        Ok(report)
    }

    /// Claim and spawn every ready task. Returns how many were launched.
    fn launch_ready(&self, in_flight: &mut JoinSet<TaskOutcome>, handles: &mut Handles) -> usize {
        let mut launched = 0;
        for id in ready_tasks(&self.graph) {
            let task = self.graph.get(id);
            if !task.begin() {
                continue;
            }
            debug!(task = %task.name(), "task ready; submitting");

            let graph = Arc::clone(&self.graph);
            let dispatcher = Arc::clone(&self.dispatcher);
            let handle = in_flight.spawn(async move { dispatcher.execute(graph.get(id)).await });
            handles.insert(handle.id(), id);
            launched += 1;
        }
        launched
    }

    fn reap(&self, joined: std::result::Result<(Id, TaskOutcome), JoinError>, handles: &mut Handles) {
        match joined {
            Ok((handle, _outcome)) => {
                handles.remove(&handle);
            }
            Err(err) => {
                let Some(id) = handles.remove(&err.id()) else {
                    return;
                };
                let task = self.graph.get(id);
                if err.is_panic() {
                    error!(task = %task.name(), "dispatch panicked; marking task failed");
                    task.complete(false);
                } else {
                    debug!(task = %task.name(), "dispatch aborted");
                }
            }
        }
    }

    /// Wait for stragglers until the deadline, then abort whatever is left.
    async fn drain(&self, in_flight: &mut JoinSet<TaskOutcome>, handles: &mut Handles, deadline: Instant) {
        if in_flight.is_empty() {
            return;
        }
        let grace = deadline.saturating_duration_since(Instant::now());
        let waited = timeout(grace, async {
            while let Some(joined) = in_flight.join_next_with_id().await {
                self.reap(joined, handles);
            }
        })
        .await;

        if waited.is_err() {
            warn!(
                remaining = in_flight.len(),
                "outstanding dispatches did not finish before the deadline; cancelling"
            );
            self.cancel_all(in_flight, handles).await;
        }
    }

    async fn cancel_all(&self, in_flight: &mut JoinSet<TaskOutcome>, handles: &mut Handles) {
        in_flight.abort_all();
        while let Some(joined) = in_flight.join_next_with_id().await {
            self.reap(joined, handles);
        }
    }
}
