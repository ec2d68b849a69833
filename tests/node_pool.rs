// tests/node_pool.rs

mod common;
use crate::common::init_tracing;

use std::collections::HashMap;
use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use proptest::prelude::*;
use tokio::time::{timeout, Duration};

use distmake::cluster::{NodePool, NodeStatus};
use distmake::config::{defaults, PoolLimits};
use distmake::errors::DistmakeError;

type TestResult = Result<(), Box<dyn Error>>;

fn limits(min_nodes: usize, max_nodes: usize) -> PoolLimits {
    PoolLimits {
        min_nodes,
        max_nodes,
        default_port: defaults::DEFAULT_PORT,
    }
}

fn host_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,15}"
}

fn entry_strategy() -> impl Strategy<Value = (String, Option<u16>)> {
    (host_strategy(), proptest::option::of(1024u16..=65535))
}

fn render(entries: &[(String, Option<u16>)]) -> String {
    let body: Vec<String> = entries
        .iter()
        .map(|(host, port)| match port {
            Some(p) => format!("{host}:{p}"),
            None => host.clone(),
        })
        .collect();
    format!("[{}]", body.join(", "))
}

proptest! {
    #[test]
    fn valid_lists_build_and_the_first_entry_is_master(
        entries in proptest::collection::vec(entry_strategy(), 1..20)
    ) {
        let pool = NodePool::from_spec(&render(&entries), &limits(1, 20)).unwrap();

        prop_assert_eq!(pool.len(), entries.len());
        let (host, port) = &entries[0];
        prop_assert_eq!(pool.master().host(), host.as_str());
        prop_assert_eq!(pool.master().port(), port.unwrap_or(defaults::DEFAULT_PORT));
        prop_assert_eq!(pool.free_count(), entries.len());
    }

    #[test]
    fn lists_longer_than_the_maximum_are_rejected(
        entries in proptest::collection::vec(entry_strategy(), 6..12)
    ) {
        let result = NodePool::from_spec(&render(&entries), &limits(1, 5));
        prop_assert!(matches!(result, Err(DistmakeError::InvalidConfig(_))));
    }

    #[test]
    fn out_of_range_ports_are_rejected(
        host in host_strategy(),
        port in prop_oneof![0u32..1024, 65536u32..200_000],
    ) {
        let result = NodePool::from_spec(&format!("{host}:{port}"), &limits(1, 10));
        prop_assert!(matches!(result, Err(DistmakeError::InvalidConfig(_))));
    }
}

#[test]
fn lists_with_no_nodes_are_rejected() {
    for spec in ["", "[]", "[ , ]", "''"] {
        let result = NodePool::from_spec(spec, &limits(1, 10));
        assert!(
            matches!(result, Err(DistmakeError::InvalidConfig(_))),
            "{spec:?} should be rejected"
        );
    }
}

#[test]
fn bracketed_ipv6_entries_keep_their_port() {
    let pool = NodePool::from_spec("[::1]:3001", &limits(1, 10)).unwrap();
    assert_eq!(pool.master().host(), "::1");
    assert_eq!(pool.master().port(), 3001);
    assert_eq!(pool.master().address(), "[::1]:3001");

    let pool = NodePool::from_spec("[[::1]:3001, localhost]", &limits(1, 10)).unwrap();
    assert_eq!(pool.len(), 2);
    assert_eq!(pool.master().port(), 3001);

    let result = NodePool::from_spec("[::1]:99", &limits(1, 10));
    assert!(matches!(result, Err(DistmakeError::InvalidConfig(_))));
}

#[test]
fn acquire_hands_out_nodes_in_order_and_reports_exhaustion() {
    let pool = NodePool::from_spec("[a,b:4000]", &limits(1, 10)).unwrap();

    let first = pool.acquire_available().unwrap();
    let second = pool.acquire_available().unwrap();
    assert_eq!(first.to_string(), "a:3000");
    assert_eq!(second.to_string(), "b:4000");
    assert!(pool.acquire_available().is_none());

    pool.release(&first);
    pool.release(&first);
    assert_eq!(pool.free_count(), 1);
    assert_eq!(
        pool.snapshot(),
        vec![
            ("a:3000".to_string(), NodeStatus::Free),
            ("b:4000".to_string(), NodeStatus::Occupied)
        ]
    );

    let again = pool.acquire_available().unwrap();
    assert!(Arc::ptr_eq(&again, &first));
}

#[test]
fn releasing_a_foreign_node_is_ignored() {
    let pool = NodePool::from_spec("[a]", &limits(1, 10)).unwrap();
    let other = NodePool::from_spec("[a]", &limits(1, 10)).unwrap();

    let held = pool.acquire_available().unwrap();
    other.release(&held);
    assert_eq!(held.status(), NodeStatus::Occupied);
    assert_eq!(pool.free_count(), 0);
}

#[test]
fn leases_release_on_drop() {
    let pool = Arc::new(NodePool::from_spec("[a,b]", &limits(1, 10)).unwrap());
    {
        let lease = pool.lease().unwrap();
        assert_eq!(lease.host(), "a");
        assert_eq!(pool.free_count(), 1);
    }
    assert_eq!(pool.free_count(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn no_node_is_held_by_two_callers_at_once() -> TestResult {
    init_tracing();

    let pool = Arc::new(NodePool::from_spec("[n1,n2,n3]", &limits(1, 10))?);
    let holders: Arc<HashMap<String, AtomicUsize>> = Arc::new(
        pool.nodes()
            .iter()
            .map(|n| (n.to_string(), AtomicUsize::new(0)))
            .collect(),
    );
    let violations = Arc::new(AtomicUsize::new(0));
    let acquired = Arc::new(AtomicUsize::new(0));

    let mut workers = tokio::task::JoinSet::new();
    for _ in 0..32 {
        let pool = Arc::clone(&pool);
        let holders = Arc::clone(&holders);
        let violations = Arc::clone(&violations);
        let acquired = Arc::clone(&acquired);
        workers.spawn(async move {
            for _ in 0..50 {
                let Some(lease) = pool.lease() else {
                    tokio::task::yield_now().await;
                    continue;
                };
                let slot = &holders[&lease.to_string()];
                if slot.fetch_add(1, Ordering::SeqCst) != 0 {
                    violations.fetch_add(1, Ordering::SeqCst);
                }
                acquired.fetch_add(1, Ordering::SeqCst);
                tokio::task::yield_now().await;
                slot.fetch_sub(1, Ordering::SeqCst);
                drop(lease);
            }
        });
    }

    timeout(Duration::from_secs(10), async {
        while let Some(res) = workers.join_next().await {
            res.expect("worker task panicked");
        }
    })
    .await?;

    assert_eq!(violations.load(Ordering::SeqCst), 0);
    assert!(acquired.load(Ordering::SeqCst) > 0);
    assert_eq!(pool.free_count(), 3);
    Ok(())
}
