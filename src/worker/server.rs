// src/worker/server.rs

//! TCP worker service: runs commands it receives and answers with the exit
//! code.

use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

use crate::exec::local::run_shell;
use crate::worker::codec::ServerCodec;
use crate::worker::protocol::{stderr_tail, WorkerRequest, WorkerResponse};

pub struct WorkerServer {
    listener: TcpListener,
}

impl WorkerServer {
    pub async fn bind(addr: impl tokio::net::ToSocketAddrs) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .context("binding worker listener")?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("reading worker listen address")
    }

    /// Accept connections until `shutdown` resolves.
    ///
    /// Each connection is served on its own task. Connections still open at
    /// shutdown are aborted, which kills any command they are running.
    pub async fn serve<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let addr = self.local_addr()?;
        info!(%addr, "worker listening");

        let mut connections = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(in_flight = connections.len(), "worker shutting down");
                    break;
                }
                accepted = self.listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(pair) => pair,
                        Err(e) => {
                            warn!(error = %e, "failed to accept connection");
                            continue;
                        }
                    };
                    debug!(%peer, "connection accepted");
                    connections.spawn(async move {
                        if let Err(err) = handle_connection(stream).await {
                            warn!(%peer, error = %err, "connection ended with an error");
                        }
                    });
                }
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
            }
        }

        connections.abort_all();
        while connections.join_next().await.is_some() {}
        Ok(())
    }
}

async fn handle_connection(stream: TcpStream) -> Result<()> {
    let mut framed = Framed::new(stream, ServerCodec::new());

    while let Some(request) = framed.next().await {
        let request = request.context("decoding request")?;
        let response = answer(request).await;
        framed.send(response).await.context("sending response")?;
    }
    Ok(())
}

async fn answer(request: WorkerRequest) -> WorkerResponse {
    match request {
        WorkerRequest::Ping => WorkerResponse::Pong,
        WorkerRequest::Execute { command, workdir } => {
            info!(cmd = %command, workdir = ?workdir, "executing command");
            match run_shell(&command, workdir.as_deref().map(Path::new)).await {
                Ok(output) => {
                    info!(cmd = %command, exit_code = output.exit_code, "command finished");
                    WorkerResponse::Completed {
                        exit_code: output.exit_code,
                        stderr_tail: stderr_tail(&output.stderr),
                    }
                }
                Err(err) => {
                    warn!(cmd = %command, error = %err, "failed to start command");
                    WorkerResponse::Completed {
                        exit_code: -1,
                        stderr_tail: format!("{err:#}"),
                    }
                }
            }
        }
    }
}
