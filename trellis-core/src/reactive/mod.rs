//! Reactive Primitives
//!
//! This module implements the core reactive system: signals, effects, the
//! tracking scope that links them, the runtime that fans out invalidation,
//! and the scheduler that batches re-runs.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a container for mutable state. When a signal is read during
//! an effect's run, the effect is registered as a dependent. When the
//! signal changes, all dependents are invalidated.
//!
//! ## Effects
//!
//! An Effect is a re-runnable unit of work with an optional teardown
//! action. Effects own the output they produce, can be paused and resumed
//! around exit transitions, and are destroyed exactly once.
//!
//! # Implementation Notes
//!
//! Dependency detection is automatic: a thread-local scope stack records
//! which effect is running, and signal reads register against it. The
//! stack is managed by RAII guards so it stays balanced on every exit
//! path. This approach ("transparent reactivity") is the one used by
//! SolidJS, Vue 3, and Leptos.

mod context;
mod effect;
mod runtime;
mod signal;

pub mod scheduler;

pub use context::{claim_nodes, TrackingScope};
pub use effect::{Effect, EffectFlags, EffectId, EffectState, Teardown, Transition};
pub use runtime::Runtime;
pub use signal::Signal;
