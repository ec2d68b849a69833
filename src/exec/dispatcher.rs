// src/exec/dispatcher.rs

//! Runs one task's commands to completion.
//!
//! The dispatcher never returns an error to its caller. Whatever happens,
//! the result is written to the task's status cell and described by the
//! returned [`TaskOutcome`]; the scheduler only looks at the status.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, error, info, warn};

use crate::cluster::{same_logical_host, ComputeNode, NodeLease, NodePool};
use crate::config::DispatchSettings;
use crate::dag::Task;
use crate::errors::DispatchError;
use crate::exec::local::run_shell;
use crate::exec::remote::{RemoteExecutor, TcpRemoteExecutor};
use crate::exec::stats::DispatchStats;
use crate::exec::transfer::{NoopTransfer, ResultTransfer, ScpTransfer};
use crate::types::{ExecutionSite, TransferMode};

/// How a dispatch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Finished,
    Failed(DispatchError),
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Finished)
    }
}

pub struct Dispatcher {
    pool: Arc<NodePool>,
    remote: Arc<dyn RemoteExecutor>,
    transfer: Arc<dyn ResultTransfer>,
    settings: DispatchSettings,
    stats: Arc<DispatchStats>,
}

impl Dispatcher {
    pub fn new(
        pool: Arc<NodePool>,
        remote: Arc<dyn RemoteExecutor>,
        transfer: Arc<dyn ResultTransfer>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            pool,
            remote,
            transfer,
            settings,
            stats: Arc::new(DispatchStats::default()),
        }
    }

    /// Production wiring: TCP workers, plus `scp` in copy mode.
    pub fn from_settings(pool: Arc<NodePool>, settings: DispatchSettings) -> Self {
        let remote = Arc::new(TcpRemoteExecutor::new(settings.connect_timeout));
        let transfer: Arc<dyn ResultTransfer> = match settings.transfer_mode {
            TransferMode::Copy => Arc::new(ScpTransfer::new(settings.remote_dir.clone())),
            TransferMode::Shared => Arc::new(NoopTransfer),
        };
        Self::new(pool, remote, transfer, settings)
    }

    pub fn pool(&self) -> &Arc<NodePool> {
        &self.pool
    }

    pub fn stats(&self) -> &Arc<DispatchStats> {
        &self.stats
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    /// Execute every command of `task` in order, stopping at the first
    /// failure, and record the result in the task's status.
    ///
    /// The task is expected to be `InProgress` already. Tasks without
    /// commands finish immediately.
    pub async fn execute(&self, task: &Task) -> TaskOutcome {
        if task.is_artifact() {
            debug!(task = %task.name(), "no commands; nothing to dispatch");
            return TaskOutcome::Finished;
        }

        info!(
            task = %task.name(),
            site = %task.site(),
            commands = task.commands().len(),
            "dispatching task"
        );

        let outcome = match self.run_commands(task).await {
            Ok(()) => TaskOutcome::Finished,
            Err(err) => TaskOutcome::Failed(err),
        };

        if !task.complete(outcome.is_success()) {
            warn!(
                task = %task.name(),
                status = %task.status(),
                "task was not in progress when its dispatch ended; status left unchanged"
            );
        }

        match &outcome {
            TaskOutcome::Finished => info!(task = %task.name(), "task finished"),
            TaskOutcome::Failed(err) => error!(task = %task.name(), error = %err, "task failed"),
        }
        outcome
    }

    async fn run_commands(&self, task: &Task) -> Result<(), DispatchError> {
        let workdir = self.workdir();
        for (idx, command) in task.commands().iter().enumerate() {
            debug!(task = %task.name(), step = idx + 1, cmd = %command, "running command");
            match task.site() {
                ExecutionSite::LocalAggregate => self.run_local(task, command, workdir).await?,
                ExecutionSite::Remote => self.run_remote(task, command, workdir).await?,
            }
        }
        Ok(())
    }

    fn workdir(&self) -> Option<&Path> {
        match self.settings.transfer_mode {
            TransferMode::Shared => self.settings.shared_dir.as_deref(),
            TransferMode::Copy => None,
        }
    }

    async fn run_local(
        &self,
        task: &Task,
        command: &str,
        workdir: Option<&Path>,
    ) -> Result<(), DispatchError> {
        self.stats.record_local_command();

        let output = run_shell(command, workdir)
            .await
            .map_err(|e| DispatchError::LocalSpawn {
                reason: format!("{e:#}"),
            })?;

        if output.success() {
            return Ok(());
        }
        for line in output.stderr_lines() {
            warn!(task = %task.name(), exit_code = output.exit_code, "stderr: {}", line);
        }
        Err(DispatchError::LocalExecutionFailure {
            exit_code: output.exit_code,
        })
    }

    async fn run_remote(
        &self,
        task: &Task,
        command: &str,
        workdir: Option<&Path>,
    ) -> Result<(), DispatchError> {
        let lease = self.acquire(task).await?;
        let node = lease.shared_node();
        self.stats.record_remote_command();
        debug!(task = %task.name(), node = %node, "node acquired");

        let result = self.remote.execute(&node, command, workdir).await;
        drop(lease);

        match result {
            Ok(0) => {
                self.retrieve_output(task, &node).await;
                Ok(())
            }
            Ok(exit_code) => Err(DispatchError::RemoteExecutionFailure {
                node: node.to_string(),
                exit_code,
            }),
            Err(err) => Err(DispatchError::RemoteUnreachable {
                node: node.to_string(),
                reason: format!("{err:#}"),
            }),
        }
    }

    /// Acquire a node, sleeping a jittered backoff between attempts.
    ///
    /// Gives up after `max_acquire_retries` attempts.
    async fn acquire(&self, task: &Task) -> Result<NodeLease, DispatchError> {
        let ceiling = self.settings.max_acquire_retries;
        let log_every = self.settings.contention_log_every.max(1);

        for attempt in 1..=ceiling {
            if let Some(lease) = self.pool.lease() {
                self.stats.record_acquisition();
                return Ok(lease);
            }
            if attempt == ceiling {
                break;
            }

            self.stats.record_retry();
            if attempt % log_every == 0 {
                info!(
                    task = %task.name(),
                    attempt,
                    max_attempts = ceiling,
                    "all nodes busy; still waiting for a free node"
                );
            }
            tokio::time::sleep(self.backoff()).await;
        }

        Err(DispatchError::AcquisitionExhausted { attempts: ceiling })
    }

    fn backoff(&self) -> Duration {
        let jitter_ms = self.settings.retry_jitter.as_millis() as u64;
        let extra = if jitter_ms == 0 {
            0
        } else {
            rand::rng().random_range(0..=jitter_ms)
        };
        self.settings.retry_base + Duration::from_millis(extra)
    }

    /// Best-effort copy of the task's output file back to the master.
    async fn retrieve_output(&self, task: &Task, source: &ComputeNode) {
        if self.settings.transfer_mode == TransferMode::Shared {
            return;
        }
        let Some(file) = task.output_file() else {
            return;
        };
        let master = self.pool.master();
        if same_logical_host(source.host(), master.host()) {
            debug!(task = %task.name(), file, "output already on the master host");
            return;
        }

        let result = self.transfer.fetch(source, master, file).await;
        self.stats.record_transfer(result.is_ok());
        match result {
            Ok(()) => info!(task = %task.name(), file, from = %source, "retrieved output"),
            Err(err) => {
                let failure = DispatchError::TransferFailure {
                    file: file.to_string(),
                    reason: format!("{err:#}"),
                };
                warn!(task = %task.name(), error = %failure, "result retrieval failed; continuing");
            }
        }
    }
}
