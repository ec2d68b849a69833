// tests/scheduler_properties.rs

mod common;
use crate::common::{fast_settings, pool_of, scheduler_for, FakeRemote, MakefileBuilder};

use std::collections::{BTreeSet, HashSet};
use std::time::Duration;

use proptest::prelude::*;

use distmake::engine::{FinalState, RunOutcome};

/// Task `i` may only depend on tasks `0..i`, which keeps the graph acyclic.
#[derive(Debug, Clone)]
struct DagCase {
    deps: Vec<BTreeSet<usize>>,
    failing: BTreeSet<usize>,
}

fn dag_case_strategy(max_tasks: usize) -> impl Strategy<Value = DagCase> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        let deps = proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..3),
            num_tasks,
        );
        let failing = proptest::collection::vec(any::<usize>(), 0..3);
        (deps, failing).prop_map(move |(raw, failing)| {
            let failing = failing.into_iter().map(|f| f % num_tasks).collect();
            let deps = raw
                .into_iter()
                .enumerate()
                .map(|(i, candidates)| {
                    if i == 0 {
                        BTreeSet::new()
                    } else {
                        candidates.into_iter().map(|d| d % i).collect()
                    }
                })
                .collect();
            DagCase { deps, failing }
        })
    })
}

fn name(i: usize) -> String {
    format!("task_{i}")
}

fn command(i: usize) -> String {
    format!("run <{}>", name(i))
}

fn makefile_for(case: &DagCase) -> String {
    let mut builder = MakefileBuilder::new();
    for (i, deps) in case.deps.iter().enumerate() {
        let dep_names: Vec<String> = deps.iter().map(|d| name(*d)).collect();
        let dep_refs: Vec<&str> = dep_names.iter().map(String::as_str).collect();
        let cmd = command(i);
        builder = builder.rule(&name(i), &dep_refs, &[cmd.as_str()]);
    }
    builder.build()
}

/// Tasks that can never run: failing ones and everything downstream.
fn poisoned(case: &DagCase) -> HashSet<usize> {
    let mut bad: HashSet<usize> = HashSet::new();
    for (i, deps) in case.deps.iter().enumerate() {
        if deps.iter().any(|d| case.failing.contains(d) || bad.contains(d)) {
            bad.insert(i);
        }
    }
    bad
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn runs_terminate_respect_order_and_contain_failures(case in dag_case_strategy(8)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();

        let mut settings = fast_settings();
        settings.scheduler.poll_interval = Duration::from_millis(2);
        settings.dispatch.retry_base = Duration::from_millis(1);
        settings.dispatch.retry_jitter = Duration::from_millis(1);

        let mut remote = FakeRemote::new().with_delay(Duration::from_millis(3));
        for i in &case.failing {
            remote = remote.exit_code_for(&format!("<{}>", name(*i)), 1);
        }
        let remote = remote.into_arc();

        let scheduler = scheduler_for(
            &makefile_for(&case),
            pool_of("[n1,n2]"),
            remote.clone(),
            &settings,
        );
        let report = runtime.block_on(scheduler.run()).unwrap();

        prop_assert_eq!(report.outcome, RunOutcome::Completed);
        prop_assert_eq!(remote.node_overlaps(), 0);

        let started = remote.commands();
        let unique: HashSet<&String> = started.iter().collect();
        prop_assert_eq!(unique.len(), started.len(), "a task was dispatched twice");

        let blocked = poisoned(&case);
        for (i, deps) in case.deps.iter().enumerate() {
            let state = report.state_of(&name(i)).unwrap();
            let position = started.iter().position(|c| *c == command(i));

            if blocked.contains(&i) {
                prop_assert_eq!(state, FinalState::Blocked);
                prop_assert!(position.is_none(), "{} ran behind a failure", name(i));
            } else if case.failing.contains(&i) {
                prop_assert_eq!(state, FinalState::Failed);
            } else {
                prop_assert_eq!(state, FinalState::Finished);
            }

            if let Some(pos) = position {
                for dep in deps {
                    let dep_pos = started.iter().position(|c| *c == command(*dep));
                    prop_assert!(
                        dep_pos.is_some_and(|p| p < pos),
                        "{} started before its dependency {}",
                        name(i),
                        name(*dep)
                    );
                }
            }
        }
    }
}
