// src/dag/graph.rs

use std::collections::HashMap;

use crate::dag::task::{Task, TaskId, TaskStatus};

/// Dependency graph of tasks, stored as an arena.
///
/// The graph owns every `Task`; dependencies are indices into the arena, so a
/// name is never represented by two objects and a status written through one
/// path is seen through every other. The structure is fixed once built; only
/// per-task status cells change during a run.
#[derive(Debug)]
pub struct TaskGraph {
    tasks: Vec<Task>,
    deps: Vec<Vec<TaskId>>,
    dependents: Vec<Vec<TaskId>>,
    index: HashMap<String, TaskId>,
}

impl TaskGraph {
    /// Assemble a graph from tasks (whose ids equal their positions) and
    /// per-task dependency lists.
    pub(crate) fn from_parts(tasks: Vec<Task>, deps: Vec<Vec<TaskId>>) -> Self {
        debug_assert_eq!(tasks.len(), deps.len());

        let mut dependents = vec![Vec::new(); tasks.len()];
        for (task_idx, task_deps) in deps.iter().enumerate() {
            for dep in task_deps {
                dependents[dep.0].push(TaskId(task_idx));
            }
        }

        let index = tasks
            .iter()
            .map(|t| (t.name().to_string(), t.id()))
            .collect();

        Self {
            tasks,
            deps,
            dependents,
            index,
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: TaskId) -> &Task {
        &self.tasks[id.0]
    }

    pub fn id_of(&self, name: &str) -> Option<TaskId> {
        self.index.get(name).copied()
    }

    pub fn task(&self, name: &str) -> Option<&Task> {
        self.id_of(name).map(|id| self.get(id))
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.tasks.iter().map(Task::id)
    }

    /// Direct prerequisites of `id`, in the order they were declared.
    pub fn dependencies_of(&self, id: TaskId) -> &[TaskId] {
        &self.deps[id.0]
    }

    /// Tasks that list `id` as a direct prerequisite.
    pub fn dependents_of(&self, id: TaskId) -> &[TaskId] {
        &self.dependents[id.0]
    }

    /// Names of the direct prerequisites of `id`.
    pub fn dependency_names(&self, id: TaskId) -> Vec<&str> {
        self.dependencies_of(id)
            .iter()
            .map(|d| self.get(*d).name())
            .collect()
    }

    pub fn status_of(&self, name: &str) -> Option<TaskStatus> {
        self.task(name).map(Task::status)
    }
}
