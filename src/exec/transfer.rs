// src/exec/transfer.rs

//! Fetching task outputs from workers back to the coordinator.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tokio::process::Command;
use tracing::debug;

use crate::cluster::ComputeNode;
use crate::exec::remote::BoxFuture;

/// Best-effort copy of `file` from `source` to `destination`.
pub trait ResultTransfer: Send + Sync {
    fn fetch<'a>(
        &'a self,
        source: &'a ComputeNode,
        destination: &'a ComputeNode,
        file: &'a str,
    ) -> BoxFuture<'a, Result<()>>;
}

/// Copies with `scp host:<remote_dir>/<file> <local_dir>/`.
#[derive(Debug, Clone)]
pub struct ScpTransfer {
    remote_dir: String,
    local_dir: PathBuf,
}

impl ScpTransfer {
    pub fn new(remote_dir: impl Into<String>) -> Self {
        Self {
            remote_dir: remote_dir.into(),
            local_dir: PathBuf::from("."),
        }
    }

    pub fn with_local_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.local_dir = dir.into();
        self
    }

    fn source_spec(&self, source: &ComputeNode, file: &str) -> String {
        let dir = self.remote_dir.trim_end_matches('/');
        if dir.is_empty() {
            format!("{}:/{file}", source.host())
        } else {
            format!("{}:{dir}/{file}", source.host())
        }
    }

    async fn copy(&self, source: &ComputeNode, file: &str) -> Result<()> {
        let from = self.source_spec(source, file);
        debug!(%from, to = %self.local_dir.display(), "scp");

        let output = Command::new("scp")
            .arg("-q")
            .arg(&from)
            .arg(&self.local_dir)
            .kill_on_drop(true)
            .output()
            .await
            .context("spawning scp")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "scp exited with {}: {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            );
        }
        Ok(())
    }
}

impl ResultTransfer for ScpTransfer {
    fn fetch<'a>(
        &'a self,
        source: &'a ComputeNode,
        _destination: &'a ComputeNode,
        file: &'a str,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.copy(source, file))
    }
}

/// Does nothing. Used in shared-directory mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTransfer;

impl ResultTransfer for NoopTransfer {
    fn fetch<'a>(
        &'a self,
        _source: &'a ComputeNode,
        _destination: &'a ComputeNode,
        _file: &'a str,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_spec_uses_remote_dir() {
        let node = ComputeNode::new("worker-1", 3000);
        assert_eq!(
            ScpTransfer::new("~").source_spec(&node, "count1.txt"),
            "worker-1:~/count1.txt"
        );
        assert_eq!(
            ScpTransfer::new("/srv/out/").source_spec(&node, "count1.txt"),
            "worker-1:/srv/out/count1.txt"
        );
    }

    #[test]
    fn local_dir_defaults_to_cwd() {
        assert_eq!(ScpTransfer::new("~").local_dir, PathBuf::from("."));
        let moved = ScpTransfer::new("~").with_local_dir("/tmp/results");
        assert_eq!(moved.local_dir, PathBuf::from("/tmp/results"));
    }
}
