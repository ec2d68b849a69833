// crates/test-utils/src/fake_remote.rs

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use distmake::cluster::ComputeNode;
use distmake::exec::{BoxFuture, RemoteExecutor, ResultTransfer};

/// A fake remote executor that:
/// - records every `(node, command)` it receives, in order
/// - sleeps for a configurable delay to simulate work
/// - returns exit code 0 unless a rule says otherwise
/// - tracks how many commands run at once, in total and per node.
#[derive(Debug, Default)]
pub struct FakeRemote {
    delay: Duration,
    exit_codes: Vec<(String, i32)>,
    unreachable: Vec<String>,
    calls: Mutex<Vec<(String, String)>>,
    running: AtomicUsize,
    max_running: AtomicUsize,
    per_node: Mutex<HashMap<usize, usize>>,
    node_overlaps: AtomicUsize,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Commands containing `needle` exit with `code`.
    pub fn exit_code_for(mut self, needle: &str, code: i32) -> Self {
        self.exit_codes.push((needle.to_string(), code));
        self
    }

    /// Commands containing `needle` fail at the transport level.
    pub fn unreachable_for(mut self, needle: &str) -> Self {
        self.unreachable.push(needle.to_string());
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls().into_iter().map(|(_, c)| c).collect()
    }

    /// Highest number of commands that were running at the same time.
    pub fn max_concurrency(&self) -> usize {
        self.max_running.load(Ordering::SeqCst)
    }

    /// Times a command started on a node that was already running one.
    pub fn node_overlaps(&self) -> usize {
        self.node_overlaps.load(Ordering::SeqCst)
    }

    async fn run(&self, node: &ComputeNode, command: &str) -> anyhow::Result<i32> {
        let node_key = node as *const ComputeNode as usize;
        {
            let mut per_node = self.per_node.lock().unwrap();
            let slot = per_node.entry(node_key).or_insert(0);
            if *slot > 0 {
                self.node_overlaps.fetch_add(1, Ordering::SeqCst);
            }
            *slot += 1;
        }
        self.calls
            .lock()
            .unwrap()
            .push((node.to_string(), command.to_string()));

        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.running.fetch_sub(1, Ordering::SeqCst);
        if let Some(slot) = self.per_node.lock().unwrap().get_mut(&node_key) {
            *slot -= 1;
        }

        if self.unreachable.iter().any(|n| command.contains(n.as_str())) {
            return Err(anyhow!("connection refused by {node}"));
        }
        let code = self
            .exit_codes
            .iter()
            .find(|(needle, _)| command.contains(needle.as_str()))
            .map(|(_, code)| *code)
            .unwrap_or(0);
        Ok(code)
    }
}

impl RemoteExecutor for FakeRemote {
    fn execute<'a>(
        &'a self,
        node: &'a ComputeNode,
        command: &'a str,
        _workdir: Option<&'a Path>,
    ) -> BoxFuture<'a, anyhow::Result<i32>> {
        Box::pin(self.run(node, command))
    }
}

/// Records every fetch; can be told to fail.
#[derive(Debug, Default)]
pub struct FakeTransfer {
    fail: bool,
    fetched: Mutex<Vec<(String, String)>>,
}

impl FakeTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// `(source node, file)` pairs, in order.
    pub fn fetched(&self) -> Vec<(String, String)> {
        self.fetched.lock().unwrap().clone()
    }
}

impl ResultTransfer for FakeTransfer {
    fn fetch<'a>(
        &'a self,
        source: &'a ComputeNode,
        _destination: &'a ComputeNode,
        file: &'a str,
    ) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            self.fetched
                .lock()
                .unwrap()
                .push((source.to_string(), file.to_string()));
            if self.fail {
                Err(anyhow!("scp: {file}: No such file or directory"))
            } else {
                Ok(())
            }
        })
    }
}
