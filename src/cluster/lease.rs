// src/cluster/lease.rs

use std::ops::Deref;
use std::sync::Arc;

use tracing::trace;

use crate::cluster::node::ComputeNode;
use crate::cluster::pool::NodePool;

/// An acquired node that goes back to its pool when dropped.
///
/// Dropping covers every exit path of a dispatch, including errors and
/// cancellation of the future holding the lease.
#[derive(Debug)]
pub struct NodeLease {
    pool: Arc<NodePool>,
    node: Arc<ComputeNode>,
}

impl NodeLease {
    pub(crate) fn new(pool: Arc<NodePool>, node: Arc<ComputeNode>) -> Self {
        Self { pool, node }
    }

    pub fn node(&self) -> &ComputeNode {
        &self.node
    }

    /// A handle to the node that outlives the lease.
    pub fn shared_node(&self) -> Arc<ComputeNode> {
        Arc::clone(&self.node)
    }
}

impl Deref for NodeLease {
    type Target = ComputeNode;

    fn deref(&self) -> &ComputeNode {
        &self.node
    }
}

impl Drop for NodeLease {
    fn drop(&mut self) {
        trace!(node = %self.node, "releasing node lease");
        self.pool.release(&self.node);
    }
}
