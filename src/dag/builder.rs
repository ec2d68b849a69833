// src/dag/builder.rs

//! Builds a [`TaskGraph`] from Makefile text.
//!
//! Names are interned in one pass: the first time a name shows up, as a
//! target or as a dependency, it gets an arena slot; later references reuse
//! that slot. Names that only ever appear as dependencies become artifact
//! tasks (no commands, `Finished` at load).

use std::collections::HashMap;
use std::path::Path;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::{debug, info, warn};

use crate::dag::classify::{MarkerClassifier, TaskClassifier};
use crate::dag::graph::TaskGraph;
use crate::dag::makefile::parse_rules;
use crate::dag::task::{Task, TaskId};
use crate::errors::{DistmakeError, Result};
use crate::fs::FileSystem;

#[derive(Debug, Default)]
struct Entry {
    name: String,
    deps: Vec<TaskId>,
    commands: Vec<String>,
    declared: bool,
}

pub struct GraphBuilder {
    entries: Vec<Entry>,
    index: HashMap<String, TaskId>,
    classifier: Box<dyn TaskClassifier>,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            classifier: Box::new(MarkerClassifier::default()),
        }
    }

    /// Replace the default local/remote classifier.
    pub fn with_classifier(mut self, classifier: impl TaskClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    fn intern(&mut self, name: &str) -> TaskId {
        if let Some(id) = self.index.get(name) {
            return *id;
        }
        let id = TaskId(self.entries.len());
        self.entries.push(Entry {
            name: name.to_string(),
            ..Entry::default()
        });
        self.index.insert(name.to_string(), id);
        id
    }

    /// Declare `target: deps` with its commands.
    ///
    /// Declaring the same target twice merges dependencies (first-seen
    /// order, no duplicates) and appends the new commands.
    pub fn add_rule<S: AsRef<str>>(
        &mut self,
        target: &str,
        deps: &[S],
        commands: Vec<String>,
    ) -> &mut Self {
        let target_id = self.intern(target);
        let dep_ids: Vec<TaskId> = deps.iter().map(|d| self.intern(d.as_ref())).collect();

        let entry = &mut self.entries[target_id.0];
        if entry.declared {
            warn!(task = %target, "target declared more than once; merging rules");
        }
        entry.declared = true;

        for dep in dep_ids {
            if !entry.deps.contains(&dep) {
                entry.deps.push(dep);
            }
        }
        entry.commands.extend(commands);
        self
    }

    /// Feed Makefile text into the builder.
    pub fn parse(&mut self, text: &str) -> Result<&mut Self> {
        for rule in parse_rules(text)? {
            debug!(
                task = %rule.target,
                line = rule.line,
                deps = rule.deps.len(),
                commands = rule.commands.len(),
                "parsed rule"
            );
            self.add_rule(&rule.target, &rule.deps, rule.commands);
        }
        Ok(self)
    }

    /// Read and parse the Makefile at `path`.
    pub fn load(&mut self, fs: &dyn FileSystem, path: &Path) -> Result<&mut Self> {
        let text = fs.read_to_string(path).map_err(|e| {
            DistmakeError::ParseError(format!("cannot read {}: {e:#}", path.display()))
        })?;
        self.parse(&text)
    }

    /// Classify every task, reject cycles, and freeze the graph.
    pub fn build(self) -> Result<TaskGraph> {
        check_acyclic(&self.entries)?;

        let mut tasks = Vec::with_capacity(self.entries.len());
        let mut deps = Vec::with_capacity(self.entries.len());

        for (idx, entry) in self.entries.into_iter().enumerate() {
            let site = self.classifier.classify(&entry.name, &entry.commands);
            tasks.push(Task::new(TaskId(idx), entry.name, entry.commands, site));
            deps.push(entry.deps);
        }

        let graph = TaskGraph::from_parts(tasks, deps);
        if graph.is_empty() {
            warn!("dependency graph is empty");
        } else {
            let artifacts = graph.tasks().filter(|t| t.is_artifact()).count();
            info!(
                tasks = graph.len(),
                artifacts,
                "dependency graph built"
            );
        }
        Ok(graph)
    }
}

fn check_acyclic(entries: &[Entry]) -> Result<()> {
    let mut g = DiGraphMap::<usize, ()>::new();
    for (idx, entry) in entries.iter().enumerate() {
        g.add_node(idx);
        for dep in &entry.deps {
            g.add_edge(dep.0, idx, ());
        }
    }

    toposort(&g, None).map(|_| ()).map_err(|cycle| {
        let name = &entries[cycle.node_id()].name;
        DistmakeError::DependencyCycle(format!("task '{name}' is part of a dependency cycle"))
    })
}
