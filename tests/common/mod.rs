// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::Arc;

use distmake::cluster::NodePool;
use distmake::config::Settings;
use distmake::dag::{GraphBuilder, TaskGraph};
use distmake::engine::Scheduler;
use distmake::exec::{Dispatcher, NoopTransfer, RemoteExecutor, ResultTransfer};

pub use distmake_test_utils::{
    fast_settings, init_tracing, pool_of, with_timeout, FakeRemote, FakeTransfer, MakefileBuilder,
};

pub fn graph_from(text: &str) -> TaskGraph {
    let mut builder = GraphBuilder::new();
    builder.parse(text).expect("makefile parses");
    builder.build().expect("graph builds")
}

/// Scheduler over `text` using the given pool and remote, with no result
/// transfer.
pub fn scheduler_for(
    text: &str,
    pool: Arc<NodePool>,
    remote: Arc<dyn RemoteExecutor>,
    settings: &Settings,
) -> Scheduler {
    scheduler_with_transfer(text, pool, remote, Arc::new(NoopTransfer), settings)
}

pub fn scheduler_with_transfer(
    text: &str,
    pool: Arc<NodePool>,
    remote: Arc<dyn RemoteExecutor>,
    transfer: Arc<dyn ResultTransfer>,
    settings: &Settings,
) -> Scheduler {
    let dispatcher = Dispatcher::new(pool, remote, transfer, settings.dispatch.clone());
    Scheduler::new(graph_from(text), Arc::new(dispatcher), settings.scheduler)
}
