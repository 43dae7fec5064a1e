//! Block Ownership Scopes
//!
//! A Block is an ownership node for a subtree of rendered output and the
//! effects that produced it. Blocks form a tree mirroring nested
//! control-flow constructs; every effect is constructed against an explicit
//! block, never against ambient state.
//!
//! A block's controlling effect owns the block's output: destroying the
//! block destroys the effect, which cascades through child effects and
//! removes every node they produced. Nodes and effects are always torn
//! down together.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::reactive::Effect;

/// Counter for generating unique block ids.
static BLOCK_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// An ownership scope for rendered output and the effects that produced it.
///
/// Cloning a `Block` produces another handle to the same block.
pub struct Block {
    inner: Arc<BlockInner>,
}

struct BlockInner {
    /// Unique identifier for this block.
    id: u64,

    /// Parent block. Root blocks have none.
    parent: Option<Block>,

    /// Nesting depth: 0 for roots, parent depth + 1 otherwise. Used by the
    /// scheduler to settle ancestors before descendants.
    depth: u32,

    /// The controlling effect, once set.
    effect: RwLock<Option<Effect>>,

    /// Set once the block has been destroyed.
    destroyed: AtomicBool,
}

/// Weak handle to a block, held by effects as a back-reference.
pub(crate) struct WeakBlock(Weak<BlockInner>);

impl WeakBlock {
    pub(crate) fn upgrade(&self) -> Option<Block> {
        self.0.upgrade().map(|inner| Block { inner })
    }
}

impl Block {
    /// Create a root block with no parent.
    pub fn root() -> Self {
        Self::with_parent(None)
    }

    /// Create a block nested under `parent`.
    pub fn child(parent: &Block) -> Self {
        Self::with_parent(Some(parent.clone()))
    }

    fn with_parent(parent: Option<Block>) -> Self {
        let depth = parent.as_ref().map_or(0, |p| p.depth() + 1);
        Self {
            inner: Arc::new(BlockInner {
                id: BLOCK_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
                parent,
                depth,
                effect: RwLock::new(None),
                destroyed: AtomicBool::new(false),
            }),
        }
    }

    /// Get the block's unique id.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Get the block's nesting depth.
    pub fn depth(&self) -> u32 {
        self.inner.depth
    }

    /// Get the parent block, if any.
    pub fn parent(&self) -> Option<Block> {
        self.inner.parent.clone()
    }

    /// Get the controlling effect, if set.
    pub fn effect(&self) -> Option<Effect> {
        self.inner.effect.read().clone()
    }

    /// Set the controlling effect.
    pub fn set_effect(&self, effect: Effect) {
        *self.inner.effect.write() = Some(effect);
    }

    /// The nearest controlling effect: this block's own, or the closest
    /// ancestor's.
    pub(crate) fn nearest_effect(&self) -> Option<Effect> {
        self.effect()
            .or_else(|| self.parent().and_then(|parent| parent.nearest_effect()))
    }

    /// Check if the block has been destroyed.
    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::SeqCst)
    }

    /// Destroy the block and everything it owns.
    ///
    /// Destroys the controlling effect, which cascades children-first and
    /// removes every node the block produced. Idempotent.
    pub fn destroy(&self) {
        if self.inner.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }

        let effect = self.inner.effect.write().take();
        if let Some(effect) = effect {
            effect.destroy();
        }
    }

    pub(crate) fn downgrade(&self) -> WeakBlock {
        WeakBlock(Arc::downgrade(&self.inner))
    }
}

impl Clone for Block {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl std::fmt::Debug for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Block")
            .field("id", &self.inner.id)
            .field("depth", &self.inner.depth)
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}
