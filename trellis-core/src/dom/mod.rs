//! DOM-Facing Layer
//!
//! This module hosts everything that sits between the reactive core and a
//! concrete node tree: block ownership, hydration bookkeeping, two-way
//! bindings, and the structural block controllers.
//!
//! # Concepts
//!
//! ## Blocks
//!
//! A Block is an ownership scope for a region of output. Blocks nest, and
//! destroying one cascades through its effect and that effect's children,
//! so tearing down a region is a single call on its block.
//!
//! ## Trees
//!
//! The core never touches a real DOM. It manipulates opaque [`NodeId`]s
//! through the [`TreeMutator`] trait, which the embedding renderer
//! implements. This keeps the reactive machinery testable with a recording
//! mock.
//!
//! ## Hydration
//!
//! When output was rendered ahead of time, a [`HydrationStream`] carries
//! the serialized fragment. Controllers consume it entry by entry, and a
//! disagreement between recorded and computed state is recovered from
//! locally rather than aborting the whole pass.

mod bindings;
mod block;
pub mod blocks;
mod hydration;
mod tree;

pub use bindings::{bind_checked, bind_value, Binding, EditSource};
pub use block::Block;
pub(crate) use block::WeakBlock;
pub use hydration::{HydratedEntry, HydrationStream};
pub use tree::{NodeId, NodeList, TreeMutator};
