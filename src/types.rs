// src/types.rs

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// How task outputs produced on a worker reach the coordinator.
///
/// - `Copy`: the worker writes into its own working directory and the
///   coordinator fetches the file back with `scp` (default).
/// - `Shared`: every node mounts the same directory (e.g. NFS), so nothing is
///   copied and commands run inside that directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    #[default]
    Copy,
    Shared,
}

impl FromStr for TransferMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "copy" => Ok(TransferMode::Copy),
            "shared" => Ok(TransferMode::Shared),
            other => Err(format!(
                "invalid transfer mode: {other} (expected \"copy\" or \"shared\")"
            )),
        }
    }
}

/// Where a task's commands run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionSite {
    /// On the coordinating process, because the task needs every
    /// intermediate result at once.
    LocalAggregate,
    /// On whichever pool node is acquired for each command.
    Remote,
}

impl fmt::Display for ExecutionSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionSite::LocalAggregate => f.write_str("local"),
            ExecutionSite::Remote => f.write_str("remote"),
        }
    }
}
