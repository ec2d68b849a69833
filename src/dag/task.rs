// src/dag/task.rs

//! Tasks and their lifecycle state.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU8, Ordering};

use crate::types::ExecutionSite;

/// Index of a task inside its [`crate::dag::TaskGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub(crate) usize);

impl TaskId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Lifecycle of a task.
///
/// `NotStarted -> InProgress -> {Finished, Failed}`. Zero-command tasks are
/// created directly as `Finished`. `Finished` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TaskStatus {
    NotStarted = 0,
    InProgress = 1,
    Finished = 2,
    Failed = 3,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Finished | TaskStatus::Failed)
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => TaskStatus::NotStarted,
            1 => TaskStatus::InProgress,
            2 => TaskStatus::Finished,
            _ => TaskStatus::Failed,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::NotStarted => "NOT_STARTED",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Finished => "FINISHED",
            TaskStatus::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Atomic task status shared between the polling loop and dispatch workers.
///
/// Every write is a release and every read an acquire, so a dependent that
/// observes `Finished` also observes everything its dependency did before
/// finishing. Transitions are compare-and-swap, which makes a second
/// dispatch of the same task impossible and keeps terminal states terminal.
#[derive(Debug)]
pub struct StatusCell(AtomicU8);

impl StatusCell {
    pub fn new(initial: TaskStatus) -> Self {
        Self(AtomicU8::new(initial as u8))
    }

    pub fn get(&self) -> TaskStatus {
        TaskStatus::from_u8(self.0.load(Ordering::Acquire))
    }

    /// `NotStarted -> InProgress`. Returns `false` if the task was not
    /// `NotStarted`.
    pub fn begin(&self) -> bool {
        self.transition(TaskStatus::NotStarted, TaskStatus::InProgress)
    }

    /// `InProgress -> Finished | Failed`. Returns `false` if the task was not
    /// `InProgress`.
    pub fn complete(&self, success: bool) -> bool {
        let to = if success {
            TaskStatus::Finished
        } else {
            TaskStatus::Failed
        };
        self.transition(TaskStatus::InProgress, to)
    }

    fn transition(&self, from: TaskStatus, to: TaskStatus) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// A named unit of work: an ordered list of shell commands.
///
/// Equality and hashing go by name; within a graph, a name maps to exactly
/// one `Task`.
#[derive(Debug)]
pub struct Task {
    id: TaskId,
    name: String,
    commands: Vec<String>,
    site: ExecutionSite,
    status: StatusCell,
}

impl Task {
    pub(crate) fn new(id: TaskId, name: String, commands: Vec<String>, site: ExecutionSite) -> Self {
        let initial = if commands.is_empty() {
            TaskStatus::Finished
        } else {
            TaskStatus::NotStarted
        };

        Self {
            id,
            name,
            commands,
            site,
            status: StatusCell::new(initial),
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    pub fn site(&self) -> ExecutionSite {
        self.site
    }

    pub fn status(&self) -> TaskStatus {
        self.status.get()
    }

    /// A pre-existing artifact (e.g. a source file): no commands to run.
    pub fn is_artifact(&self) -> bool {
        self.commands.is_empty()
    }

    /// The file this task produces, if its name looks like one.
    pub fn output_file(&self) -> Option<&str> {
        self.name.contains('.').then_some(self.name.as_str())
    }

    /// Claim the task for dispatch. Only the scheduler calls this.
    pub fn begin(&self) -> bool {
        self.status.begin()
    }

    /// Record the result of a dispatch.
    pub fn complete(&self, success: bool) -> bool {
        self.status.complete(success)
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Task {}

impl Hash for Task {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {} command(s), {})",
            self.name,
            self.status(),
            self.commands.len(),
            self.site
        )
    }
}
