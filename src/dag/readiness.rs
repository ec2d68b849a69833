// src/dag/readiness.rs

//! Pure readiness predicates over a [`TaskGraph`].
//!
//! Nothing here mutates state; the scheduler calls these on every poll and
//! the report builder calls them once at the end.

use std::collections::HashSet;

use crate::dag::graph::TaskGraph;
use crate::dag::task::{TaskId, TaskStatus};

/// `NotStarted` and every direct dependency `Finished`.
pub fn is_ready(graph: &TaskGraph, id: TaskId) -> bool {
    graph.get(id).status() == TaskStatus::NotStarted
        && graph
            .dependencies_of(id)
            .iter()
            .all(|d| graph.get(*d).status() == TaskStatus::Finished)
}

/// All tasks that are ready right now, in arena order.
pub fn ready_tasks(graph: &TaskGraph) -> Vec<TaskId> {
    graph.ids().filter(|id| is_ready(graph, *id)).collect()
}

pub fn all_terminal(graph: &TaskGraph) -> bool {
    graph.tasks().all(|t| t.status().is_terminal())
}

/// Whether some transitive prerequisite of `id` has failed.
///
/// Such a task can never become ready.
pub fn blocked_by_failure(graph: &TaskGraph, id: TaskId) -> bool {
    let mut seen = HashSet::new();
    let mut stack: Vec<TaskId> = graph.dependencies_of(id).to_vec();

    while let Some(dep) = stack.pop() {
        if !seen.insert(dep) {
            continue;
        }
        if graph.get(dep).status() == TaskStatus::Failed {
            return true;
        }
        stack.extend_from_slice(graph.dependencies_of(dep));
    }
    false
}

/// Number of tasks per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub not_started: usize,
    pub in_progress: usize,
    pub finished: usize,
    pub failed: usize,
}

pub fn status_counts(graph: &TaskGraph) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for task in graph.tasks() {
        match task.status() {
            TaskStatus::NotStarted => counts.not_started += 1,
            TaskStatus::InProgress => counts.in_progress += 1,
            TaskStatus::Finished => counts.finished += 1,
            TaskStatus::Failed => counts.failed += 1,
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::GraphBuilder;

    fn chain() -> TaskGraph {
        let mut b = GraphBuilder::new();
        b.parse("c: b\n\techo c\nb: a\n\techo b\na:\n\techo a\n")
            .unwrap();
        b.build().unwrap()
    }

    #[test]
    fn only_roots_are_ready_initially() {
        let g = chain();
        let names: Vec<_> = ready_tasks(&g)
            .into_iter()
            .map(|id| g.get(id).name().to_string())
            .collect();
        assert_eq!(names, vec!["a"]);
        assert!(!all_terminal(&g));
    }

    #[test]
    fn finishing_a_dependency_unlocks_the_next() {
        let g = chain();
        let a = g.task("a").unwrap();
        assert!(a.begin());
        assert!(!is_ready(&g, a.id()), "in-progress tasks are not ready");
        assert!(a.complete(true));

        assert!(is_ready(&g, g.id_of("b").unwrap()));
        assert!(!is_ready(&g, g.id_of("c").unwrap()));
    }

    #[test]
    fn failure_poisons_transitive_dependents() {
        let g = chain();
        let a = g.task("a").unwrap();
        a.begin();
        a.complete(false);

        let c = g.id_of("c").unwrap();
        assert!(ready_tasks(&g).is_empty());
        assert!(blocked_by_failure(&g, c));
        assert!(!blocked_by_failure(&g, a.id()));

        let counts = status_counts(&g);
        assert_eq!(counts.failed, 1);
        assert_eq!(counts.not_started, 2);
    }
}
