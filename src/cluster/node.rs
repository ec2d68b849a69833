// src/cluster/node.rs

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Availability of a compute node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    Free,
    Occupied,
}

/// An addressable worker that runs one command at a time.
///
/// The status is an atomic cell so that snapshots can be read without the
/// pool lock. Writes only happen through [`crate::cluster::NodePool`], which
/// serialises the scan-and-flip in `acquire_available`.
#[derive(Debug)]
pub struct ComputeNode {
    host: String,
    port: u16,
    occupied: AtomicBool,
}

impl ComputeNode {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            occupied: AtomicBool::new(false),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port`, suitable for `TcpStream::connect`. IPv6 hosts are
    /// bracketed.
    pub fn address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    pub fn status(&self) -> NodeStatus {
        if self.occupied.load(Ordering::Acquire) {
            NodeStatus::Occupied
        } else {
            NodeStatus::Free
        }
    }

    pub fn is_loopback(&self) -> bool {
        is_loopback_host(&self.host)
    }

    pub(crate) fn set_status(&self, status: NodeStatus) {
        self.occupied
            .store(status == NodeStatus::Occupied, Ordering::Release);
    }
}

impl fmt::Display for ComputeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address())
    }
}

/// Whether `host` names the local machine.
pub fn is_loopback_host(host: &str) -> bool {
    matches!(
        host.trim().to_lowercase().as_str(),
        "localhost" | "127.0.0.1" | "::1" | "0.0.0.0"
    )
}

/// Whether two hosts denote the same machine, treating every loopback alias
/// as one identity.
pub fn same_logical_host(a: &str, b: &str) -> bool {
    (is_loopback_host(a) && is_loopback_host(b)) || a.trim().eq_ignore_ascii_case(b.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loopback_aliases_are_one_host() {
        assert!(same_logical_host("localhost", "127.0.0.1"));
        assert!(same_logical_host("LOCALHOST", "::1"));
        assert!(same_logical_host("node-3.grid", "node-3.grid"));
        assert!(!same_logical_host("localhost", "node-3.grid"));
    }

    #[test]
    fn new_nodes_start_free() {
        let node = ComputeNode::new("localhost", 3001);
        assert_eq!(node.status(), NodeStatus::Free);
        assert_eq!(node.address(), "localhost:3001");
        node.set_status(NodeStatus::Occupied);
        assert_eq!(node.status(), NodeStatus::Occupied);
    }
}
