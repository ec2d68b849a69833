// src/exec/mod.rs

//! Task dispatch.
//!
//! - [`dispatcher`] routes a task's commands locally or to a node, with
//!   acquire-with-retry and fail-fast per task.
//! - [`local`] runs shell commands on this machine.
//! - [`remote`] defines the remote execution contract and its TCP client.
//! - [`transfer`] copies task outputs back to the master.
//! - [`stats`] holds the dispatcher's counters.

pub mod dispatcher;
pub mod local;
pub mod remote;
pub mod stats;
pub mod transfer;

pub use dispatcher::{Dispatcher, TaskOutcome};
pub use local::{run_shell, ShellOutput};
pub use remote::{BoxFuture, RemoteExecutor, TcpRemoteExecutor};
pub use stats::{DispatchStats, StatsSnapshot};
pub use transfer::{NoopTransfer, ResultTransfer, ScpTransfer};
