//! Hydration Marker Stream
//!
//! During hydration, the client walks markup a server render produced and
//! attaches reactive state to it instead of rebuilding from scratch. The
//! server leaves a marker ahead of each conditional region recording which
//! branch it rendered; the client compares that against the freshly
//! computed condition and either adopts the markup or discards it.
//!
//! The stream holds an ordered fragment of entries: markers and the node
//! handles of server-produced markup. Hydration is in progress exactly
//! while a fragment is present. After a mismatch the fragment is replaced
//! with an empty one so descendants keep running their hydration
//! bookkeeping; mismatches are local, not global.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::dom::tree::{NodeId, NodeList};

/// One entry in a server-produced fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydratedEntry {
    /// A conditional marker: the condition value the server observed.
    Marker(bool),
    /// A node the server rendered.
    Node(NodeId),
}

/// Shared handle to the hydration state for one render pass.
///
/// Cloning produces another handle to the same stream.
#[derive(Clone)]
pub struct HydrationStream {
    inner: Arc<RwLock<StreamState>>,
}

struct StreamState {
    /// Pending fragment. `Some` while hydrating, `None` otherwise.
    fragment: Option<VecDeque<HydratedEntry>>,
}

impl HydrationStream {
    /// A stream with nothing to hydrate. Rendering proceeds client-side.
    pub fn inert() -> Self {
        Self {
            inner: Arc::new(RwLock::new(StreamState { fragment: None })),
        }
    }

    /// A stream over markup a server render produced.
    pub fn from_server(entries: Vec<HydratedEntry>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(StreamState {
                fragment: Some(entries.into()),
            })),
        }
    }

    /// Whether hydration is currently in progress.
    pub fn is_hydrating(&self) -> bool {
        self.inner.read().fragment.is_some()
    }

    /// The pending marker, if the next entry is one.
    pub fn peek_marker(&self) -> Option<bool> {
        match self.inner.read().fragment.as_ref()?.front()? {
            HydratedEntry::Marker(value) => Some(*value),
            HydratedEntry::Node(_) => None,
        }
    }

    /// Consume the pending marker.
    ///
    /// A consumed marker must not be left for downstream regions; callers
    /// consume exactly the marker they matched against.
    pub fn consume_marker(&self) {
        let mut state = self.inner.write();
        if let Some(fragment) = state.fragment.as_mut() {
            if matches!(fragment.front(), Some(HydratedEntry::Marker(_))) {
                fragment.pop_front();
            }
        }
    }

    /// Discard the fragment, ending hydration for this region.
    ///
    /// Returns the node handles of the server markup so the caller can
    /// remove them from the tree. Markers in the fragment are dropped.
    pub fn discard(&self) -> NodeList {
        let fragment = self.inner.write().fragment.take();
        let mut nodes = NodeList::new();
        if let Some(fragment) = fragment {
            for entry in fragment {
                if let HydratedEntry::Node(node) = entry {
                    nodes.push(node);
                }
            }
        }
        nodes
    }

    /// Replace the fragment with an empty one.
    ///
    /// Used after a mismatch has been handled: descendants stay in
    /// hydration mode without any real markers to match against.
    pub fn resume_empty(&self) {
        self.inner.write().fragment = Some(VecDeque::new());
    }

    /// End the hydration pass.
    pub fn finish(&self) {
        self.inner.write().fragment = None;
    }

    /// Number of pending entries. Zero when not hydrating.
    pub fn len(&self) -> usize {
        self.inner.read().fragment.as_ref().map_or(0, VecDeque::len)
    }

    /// Whether the fragment is absent or exhausted.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for HydrationStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HydrationStream")
            .field("hydrating", &self.is_hydrating())
            .field("pending", &self.len())
            .finish()
    }
}
