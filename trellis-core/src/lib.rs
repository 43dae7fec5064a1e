//! Trellis Core
//!
//! This crate provides the client-side runtime for the Trellis UI
//! framework. It implements:
//!
//! - Reactive primitives (signals, effects, dependency tracking)
//! - Effect lifecycle management (pause, resume, destroy) with transition
//!   settlement
//! - Block ownership scopes over an abstract node tree
//! - Conditional block control with hydration-mismatch recovery
//! - Two-way input bindings
//!
//! The crate never touches a concrete DOM. Renderers implement
//! [`dom::TreeMutator`] over their own node store and drive the runtime
//! through blocks and effects.
//!
//! # Architecture
//!
//! The crate is organized into two main modules:
//!
//! - `reactive`: signals, effects, the tracking scope, and the scheduler
//! - `dom`: blocks, tree abstraction, hydration, bindings, and the
//!   structural block controllers
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use trellis_core::dom::blocks::{if_block, DomEnv};
//! use trellis_core::dom::Block;
//! use trellis_core::reactive::Signal;
//!
//! let root = Block::root();
//! let env = DomEnv::client_only(renderer.tree());
//! let open = Signal::new(false);
//!
//! let probe = open.clone();
//! let block = if_block(
//!     anchor,
//!     move || probe.get(),
//!     Arc::new(|anchor| renderer.panel(anchor)),
//!     None,
//!     false,
//!     &root,
//!     &env,
//! )?;
//!
//! open.set(true); // panel is built; set back to false and it is removed
//! ```

pub mod dom;
pub mod error;
pub mod reactive;
