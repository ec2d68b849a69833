// src/errors.rs

//! Crate-wide error types.
//!
//! [`DistmakeError`] covers everything that aborts a run (bad node list, bad
//! Makefile, empty graph, timeout). [`DispatchError`] describes why a single
//! task failed; it is logged and folded into the task's status, never
//! propagated to the scheduler.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DistmakeError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Dependency cycle detected: {0}")]
    DependencyCycle(String),

    #[error("Scheduling error: {0}")]
    SchedulingError(String),

    #[error("Run exceeded the timeout of {0:?}; outstanding tasks were cancelled")]
    SchedulingTimeout(Duration),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Reason a single task ended FAILED.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("no node became available after {attempts} attempts")]
    AcquisitionExhausted { attempts: u32 },

    #[error("command exited with code {exit_code} on {node}")]
    RemoteExecutionFailure { node: String, exit_code: i32 },

    #[error("could not reach worker {node}: {reason}")]
    RemoteUnreachable { node: String, reason: String },

    #[error("local command exited with code {exit_code}")]
    LocalExecutionFailure { exit_code: i32 },

    #[error("could not spawn local command: {reason}")]
    LocalSpawn { reason: String },

    #[error("retrieving '{file}' failed: {reason}")]
    TransferFailure { file: String, reason: String },
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DistmakeError>;
