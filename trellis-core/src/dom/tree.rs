//! Rendered-Tree Handles
//!
//! The core never manipulates real output nodes directly. It deals in opaque
//! [`NodeId`] handles and calls out to a [`TreeMutator`] capability when
//! nodes need to be removed. Insertion happens inside branch factories,
//! which are opaque to this crate.

use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::SmallVec;

/// Opaque handle to a node in the rendered output tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

impl NodeId {
    /// Allocate a new unique node handle.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw handle value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// An ordered collection of node handles owned by a single effect.
///
/// Most effects produce a handful of top-level nodes, so the list is
/// inline-allocated for the common case.
pub type NodeList = SmallVec<[NodeId; 4]>;

/// Capability for mutating the rendered output tree.
///
/// Implemented by the rendering backend. The core only ever removes nodes;
/// it never inserts them itself.
pub trait TreeMutator: Send + Sync {
    /// Remove the given nodes from the tree.
    ///
    /// Called with the exact ordered set of nodes an effect produced.
    /// Removing a node that is already gone must be tolerated.
    fn remove_nodes(&self, nodes: &[NodeId]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_ids_are_unique() {
        let a = NodeId::new();
        let b = NodeId::new();
        let c = NodeId::new();

        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
    }
}
