// src/worker/protocol.rs

//! Messages exchanged between the coordinator and a worker.
//!
//! One request per connection, one response back.

use serde::{Deserialize, Serialize};

/// Maximum number of stderr bytes a worker sends back with a result.
pub const STDERR_TAIL_BYTES: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerRequest {
    /// Run `command` with `sh -c`, optionally inside `workdir`.
    Execute {
        command: String,
        workdir: Option<String>,
    },
    Ping,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerResponse {
    /// Exit code of the command; -1 when it could not be started or was
    /// killed by a signal.
    Completed { exit_code: i32, stderr_tail: String },
    Pong,
}

/// Keep the last `STDERR_TAIL_BYTES` of `stderr`, cut on a char boundary.
pub fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    if text.len() <= STDERR_TAIL_BYTES {
        return text.into_owned();
    }
    let mut start = text.len() - STDERR_TAIL_BYTES;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    text[start..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_stderr_is_kept_whole() {
        assert_eq!(stderr_tail(b"boom\n"), "boom\n");
    }

    #[test]
    fn long_stderr_keeps_the_end() {
        let mut data = vec![b'a'; STDERR_TAIL_BYTES];
        data.extend_from_slice(b"last line");
        let tail = stderr_tail(&data);
        assert_eq!(tail.len(), STDERR_TAIL_BYTES);
        assert!(tail.ends_with("last line"));
    }
}
