// src/engine/report.rs

//! Final per-task report of a run.

use std::fmt;
use std::time::Duration;

use crate::dag::{blocked_by_failure, TaskGraph, TaskStatus};
use crate::exec::StatsSnapshot;
use crate::types::ExecutionSite;

/// Where a task ended up when the run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FinalState {
    Finished,
    Failed,
    /// Never started because a prerequisite failed.
    Blocked,
    /// Never started because the run stopped first.
    Pending,
    /// Was running when the run stopped and got aborted.
    Cancelled,
}

impl fmt::Display for FinalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FinalState::Finished => "FINISHED",
            FinalState::Failed => "FAILED",
            FinalState::Blocked => "BLOCKED",
            FinalState::Pending => "PENDING",
            FinalState::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

/// How the run as a whole stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every task is terminal, or the remaining ones are blocked.
    Completed,
    /// The run timeout expired; outstanding work was aborted.
    TimedOut,
    /// Stopped from outside (Ctrl-C).
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub name: String,
    pub state: FinalState,
    pub site: ExecutionSite,
    pub artifact: bool,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    /// Sorted by task name.
    pub tasks: Vec<TaskReport>,
    pub outcome: RunOutcome,
    pub elapsed: Duration,
    pub stats: StatsSnapshot,
}

impl RunReport {
    pub fn from_graph(
        graph: &TaskGraph,
        outcome: RunOutcome,
        elapsed: Duration,
        stats: StatsSnapshot,
    ) -> Self {
        let mut tasks: Vec<TaskReport> = graph
            .tasks()
            .map(|task| {
                let state = match task.status() {
                    TaskStatus::Finished => FinalState::Finished,
                    TaskStatus::Failed => FinalState::Failed,
                    TaskStatus::InProgress => FinalState::Cancelled,
                    TaskStatus::NotStarted if blocked_by_failure(graph, task.id()) => {
                        FinalState::Blocked
                    }
                    TaskStatus::NotStarted => FinalState::Pending,
                };
                TaskReport {
                    name: task.name().to_string(),
                    state,
                    site: task.site(),
                    artifact: task.is_artifact(),
                }
            })
            .collect();
        tasks.sort_by(|a, b| a.name.cmp(&b.name));

        Self {
            tasks,
            outcome,
            elapsed,
            stats,
        }
    }

    pub fn state_of(&self, name: &str) -> Option<FinalState> {
        self.tasks
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.state)
    }

    pub fn count(&self, state: FinalState) -> usize {
        self.tasks.iter().filter(|t| t.state == state).count()
    }

    /// Run completed and every task finished.
    pub fn is_success(&self) -> bool {
        self.outcome == RunOutcome::Completed
            && self.tasks.iter().all(|t| t.state == FinalState::Finished)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.tasks.iter().map(|t| t.name.len()).max().unwrap_or(0);
        for task in &self.tasks {
            let kind = if task.artifact {
                "artifact".to_string()
            } else {
                task.site.to_string()
            };
            writeln!(f, "{:<width$}  {:<9}  {}", task.name, task.state.to_string(), kind)?;
        }

        let outcome = match self.outcome {
            RunOutcome::Completed => "completed",
            RunOutcome::TimedOut => "timed out",
            RunOutcome::Cancelled => "cancelled",
        };
        write!(
            f,
            "{}/{} finished, {} failed, {} blocked ({outcome} in {:.1}s)",
            self.count(FinalState::Finished),
            self.tasks.len(),
            self.count(FinalState::Failed),
            self.count(FinalState::Blocked),
            self.elapsed.as_secs_f64()
        )
    }
}
