// src/cluster/mod.rs

//! The fixed pool of compute nodes.
//!
//! - [`node`] holds `ComputeNode` and its atomic status cell.
//! - [`spec`] parses node lists like `"[localhost,localhost:3001]"`.
//! - [`pool`] owns the nodes and serialises acquire/release.
//! - [`lease`] is the RAII guard handed out by `NodePool::lease`.

pub mod lease;
pub mod node;
pub mod pool;
pub mod spec;

pub use lease::NodeLease;
pub use node::{is_loopback_host, same_logical_host, ComputeNode, NodeStatus};
pub use pool::NodePool;
pub use spec::{parse_node_list, NodeAddress};
