// src/exec/remote.rs

//! Remote execution contract and its TCP client.
//!
//! The dispatcher only needs "submit a command to a node, receive an exit
//! code". [`RemoteExecutor`] is that contract; [`TcpRemoteExecutor`] talks
//! to a [`crate::worker::WorkerServer`]. Tests swap in fakes.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tracing::{debug, warn};

use crate::cluster::ComputeNode;
use crate::worker::codec::ClientCodec;
use crate::worker::protocol::{WorkerRequest, WorkerResponse};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Runs one command on a compute node.
pub trait RemoteExecutor: Send + Sync {
    /// Returns the command's exit code. `Err` means the node could not be
    /// reached or the exchange broke down, not that the command failed.
    fn execute<'a>(
        &'a self,
        node: &'a ComputeNode,
        command: &'a str,
        workdir: Option<&'a Path>,
    ) -> BoxFuture<'a, Result<i32>>;
}

/// Client for the distmake worker protocol.
#[derive(Debug, Clone)]
pub struct TcpRemoteExecutor {
    connect_timeout: Duration,
}

impl TcpRemoteExecutor {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    async fn connect(&self, node: &ComputeNode) -> Result<Framed<TcpStream, ClientCodec>> {
        let address = node.address();
        let stream = timeout(self.connect_timeout, TcpStream::connect(&address))
            .await
            .map_err(|_| anyhow!("connecting to {address} timed out after {:?}", self.connect_timeout))?
            .with_context(|| format!("connecting to {address}"))?;
        Ok(Framed::new(stream, ClientCodec::new()))
    }

    async fn roundtrip(&self, node: &ComputeNode, request: WorkerRequest) -> Result<WorkerResponse> {
        let mut framed = self.connect(node).await?;
        framed.send(request).await.context("sending request")?;
        match framed.next().await {
            Some(response) => response.context("decoding response"),
            None => bail!("worker {node} closed the connection without answering"),
        }
    }

    /// Check that a worker is up.
    pub async fn ping(&self, node: &ComputeNode) -> Result<()> {
        match self.roundtrip(node, WorkerRequest::Ping).await? {
            WorkerResponse::Pong => Ok(()),
            other => bail!("unexpected answer to ping from {node}: {other:?}"),
        }
    }

    async fn run(&self, node: &ComputeNode, command: &str, workdir: Option<&Path>) -> Result<i32> {
        let request = WorkerRequest::Execute {
            command: command.to_string(),
            workdir: workdir.map(|d| d.to_string_lossy().into_owned()),
        };
        match self.roundtrip(node, request).await? {
            WorkerResponse::Completed {
                exit_code,
                stderr_tail,
            } => {
                if exit_code != 0 {
                    for line in stderr_tail.lines().filter(|l| !l.trim().is_empty()) {
                        warn!(node = %node, exit_code, "remote stderr: {}", line);
                    }
                } else {
                    debug!(node = %node, "remote command succeeded");
                }
                Ok(exit_code)
            }
            WorkerResponse::Pong => bail!("worker {node} answered an execute request with pong"),
        }
    }
}

impl RemoteExecutor for TcpRemoteExecutor {
    fn execute<'a>(
        &'a self,
        node: &'a ComputeNode,
        command: &'a str,
        workdir: Option<&'a Path>,
    ) -> BoxFuture<'a, Result<i32>> {
        Box::pin(self.run(node, command, workdir))
    }
}
