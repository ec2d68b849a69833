// src/cluster/pool.rs

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info};

use crate::cluster::lease::NodeLease;
use crate::cluster::node::{ComputeNode, NodeStatus};
use crate::cluster::spec::{parse_node_list, NodeAddress};
use crate::config::PoolLimits;
use crate::errors::{DistmakeError, Result};

/// Fixed set of compute nodes; the first one is the master.
///
/// Membership never changes after construction. Acquire and release both
/// run inside one critical section so that no node can be handed to two
/// callers between releases.
#[derive(Debug)]
pub struct NodePool {
    nodes: Vec<Arc<ComputeNode>>,
    guard: Mutex<()>,
}

impl NodePool {
    /// Build a pool from a node list such as `"[localhost,localhost:3001]"`.
    pub fn from_spec(spec: &str, limits: &PoolLimits) -> Result<Self> {
        let addresses = parse_node_list(spec, limits.default_port)?;
        Self::from_addresses(addresses, limits)
    }

    pub fn from_addresses(addresses: Vec<NodeAddress>, limits: &PoolLimits) -> Result<Self> {
        if addresses.is_empty() {
            return Err(DistmakeError::InvalidConfig(
                "no valid nodes found in the node list".to_string(),
            ));
        }
        if addresses.len() < limits.min_nodes {
            return Err(DistmakeError::InvalidConfig(format!(
                "at least {} node(s) required, got {}",
                limits.min_nodes,
                addresses.len()
            )));
        }
        if addresses.len() > limits.max_nodes {
            return Err(DistmakeError::InvalidConfig(format!(
                "at most {} nodes allowed, got {}",
                limits.max_nodes,
                addresses.len()
            )));
        }

        let nodes: Vec<Arc<ComputeNode>> = addresses
            .into_iter()
            .map(|a| Arc::new(ComputeNode::new(a.host, a.port)))
            .collect();

        for node in &nodes {
            debug!(node = %node, "registered compute node");
        }
        info!(
            nodes = nodes.len(),
            master = %nodes[0],
            "node pool initialised"
        );

        Ok(Self {
            nodes,
            guard: Mutex::new(()),
        })
    }

    /// The coordinator's node (first entry of the list).
    pub fn master(&self) -> &ComputeNode {
        &self.nodes[0]
    }

    pub fn nodes(&self) -> &[Arc<ComputeNode>] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Flip the first free node (in list order) to occupied and return it.
    ///
    /// Never waits: `None` means every node is occupied right now.
    pub fn acquire_available(&self) -> Option<Arc<ComputeNode>> {
        let _scan = self.guard.lock().unwrap_or_else(PoisonError::into_inner);

        let node = self
            .nodes
            .iter()
            .find(|node| node.status() == NodeStatus::Free)?;
        node.set_status(NodeStatus::Occupied);
        Some(Arc::clone(node))
    }

    /// Acquire a node wrapped in a guard that releases it on drop.
    pub fn lease(self: &Arc<Self>) -> Option<NodeLease> {
        self.acquire_available()
            .map(|node| NodeLease::new(Arc::clone(self), node))
    }

    /// Return `node` to the free set.
    ///
    /// Idempotent; a node that is not a member of this pool is ignored.
    pub fn release(&self, node: &ComputeNode) {
        let _scan = self.guard.lock().unwrap_or_else(PoisonError::into_inner);

        match self.nodes.iter().find(|n| std::ptr::eq(n.as_ref(), node)) {
            Some(member) => member.set_status(NodeStatus::Free),
            None => debug!(node = %node, "release of a node outside this pool; ignoring"),
        }
    }

    pub fn free_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.status() == NodeStatus::Free)
            .count()
    }

    /// Point-in-time view of every node and its status, in list order.
    pub fn snapshot(&self) -> Vec<(String, NodeStatus)> {
        self.nodes
            .iter()
            .map(|n| (n.to_string(), n.status()))
            .collect()
    }
}
