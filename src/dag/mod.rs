// src/dag/mod.rs

//! Task graph and its construction.
//!
//! - [`task`] defines `Task`, its status and the atomic status cell.
//! - [`graph`] holds the arena-backed dependency graph.
//! - [`makefile`] reads the Makefile subset into rules.
//! - [`builder`] interns rules into a `TaskGraph` and rejects cycles.
//! - [`classify`] decides whether a task runs locally or remotely.
//! - [`readiness`] contains the pure predicates the scheduler polls.

pub mod builder;
pub mod classify;
pub mod graph;
pub mod makefile;
pub mod readiness;
pub mod task;

pub use builder::GraphBuilder;
pub use classify::{MarkerClassifier, TaskClassifier};
pub use graph::TaskGraph;
pub use makefile::{parse_rules, Rule};
pub use readiness::{
    all_terminal, blocked_by_failure, is_ready, ready_tasks, status_counts, StatusCounts,
};
pub use task::{StatusCell, Task, TaskId, TaskStatus};
