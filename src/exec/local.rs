// src/exec/local.rs

//! Shell execution on this machine.
//!
//! Used by the dispatcher for aggregation tasks and by the worker service
//! for every command it receives.

use std::path::Path;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::debug;

/// Exit status and captured stderr of one shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellOutput {
    /// Process exit code; -1 when the process was terminated by a signal.
    pub exit_code: i32,
    pub stderr: Vec<u8>,
}

impl ShellOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn stderr_lines(&self) -> impl Iterator<Item = &str> {
        std::str::from_utf8(&self.stderr)
            .unwrap_or_default()
            .lines()
            .filter(|l| !l.trim().is_empty())
    }
}

/// Run `command` with `sh -c`, optionally in `workdir`, and wait for it.
///
/// `Err` means the process could not be started at all. The child is killed
/// if the returned future is dropped.
pub async fn run_shell(command: &str, workdir: Option<&Path>) -> Result<ShellOutput> {
    let mut cmd = Command::new("sh");
    cmd.arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(dir) = workdir {
        cmd.current_dir(dir);
    }

    let output = cmd
        .output()
        .await
        .with_context(|| format!("spawning shell for '{command}'"))?;

    for line in String::from_utf8_lossy(&output.stdout).lines() {
        debug!(cmd = %command, "stdout: {}", line);
    }

    Ok(ShellOutput {
        exit_code: output.status.code().unwrap_or(-1),
        stderr: output.stderr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_exit_code_and_stderr() {
        let out = run_shell("echo oops >&2; exit 3", None).await.unwrap();
        assert_eq!(out.exit_code, 3);
        assert!(!out.success());
        assert_eq!(out.stderr_lines().collect::<Vec<_>>(), vec!["oops"]);
    }

    #[tokio::test]
    async fn runs_in_the_given_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = run_shell("echo 42 > here.txt", Some(dir.path())).await.unwrap();
        assert!(out.success());
        let written = std::fs::read_to_string(dir.path().join("here.txt")).unwrap();
        assert_eq!(written.trim(), "42");
    }

    #[tokio::test]
    async fn missing_workdir_fails_to_spawn() {
        let err = run_shell("true", Some(Path::new("/definitely/not/here")))
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("spawning shell"));
    }
}
