//! Tracking Scopes
//!
//! A tracking scope records which reactive state a running effect reads.
//! This enables automatic dependency tracking: when a signal is read, the
//! effect at the top of the scope stack is registered as a dependent.
//!
//! # Implementation
//!
//! Each thread keeps a stack of scope entries. Entering a scope pushes an
//! entry; the returned guard pops it on drop, so the stack stays balanced
//! on every exit path, including panics. Nested scopes are supported (an
//! effect that creates another effect during its run).
//!
//! Scopes also collect the output nodes a render effect claims during its
//! run, so node ownership can be attributed to exactly one effect.

use std::cell::RefCell;

use smallvec::SmallVec;

use crate::dom::{NodeId, NodeList};
use crate::error::ReactiveError;
use crate::reactive::effect::EffectId;

thread_local! {
    static SCOPE_STACK: RefCell<Vec<ScopeEntry>> = const { RefCell::new(Vec::new()) };
}

/// An entry in the tracking scope stack.
#[derive(Debug)]
struct ScopeEntry {
    /// The effect whose run is being tracked.
    effect_id: EffectId,
    /// Signal ids read during this run.
    dependencies: SmallVec<[u64; 8]>,
    /// Output nodes claimed during this run.
    nodes: NodeList,
}

/// Guard that pops the scope when dropped.
#[derive(Debug)]
pub struct TrackingScope {
    effect_id: EffectId,
}

impl TrackingScope {
    /// Enter a new tracking scope for the given effect.
    ///
    /// While the scope is active, signal reads register the effect as a
    /// dependent. The scope is exited when the guard is dropped.
    pub(crate) fn enter(effect_id: EffectId) -> Self {
        SCOPE_STACK.with(|stack| {
            stack.borrow_mut().push(ScopeEntry {
                effect_id,
                dependencies: SmallVec::new(),
                nodes: NodeList::new(),
            });
        });

        Self { effect_id }
    }

    /// Check if any tracking scope is active on this thread.
    pub fn is_active() -> bool {
        SCOPE_STACK.with(|stack| !stack.borrow().is_empty())
    }

    /// Get the effect currently being tracked, if any.
    pub fn current_effect() -> Option<EffectId> {
        SCOPE_STACK.with(|stack| stack.borrow().last().map(|entry| entry.effect_id))
    }

    /// Record a dependency on the given signal.
    ///
    /// Called by signals when they are read.
    pub fn track_dependency(signal_id: u64) {
        SCOPE_STACK.with(|stack| {
            if let Some(entry) = stack.borrow_mut().last_mut() {
                entry.dependencies.push(signal_id);
            }
        });
    }

    /// Signal ids read so far in this scope.
    pub(crate) fn dependencies(&self) -> SmallVec<[u64; 8]> {
        SCOPE_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .map(|entry| entry.dependencies.clone())
                .unwrap_or_default()
        })
    }

    /// Output nodes claimed so far in this scope.
    pub(crate) fn claimed_nodes(&self) -> NodeList {
        SCOPE_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .map(|entry| entry.nodes.clone())
                .unwrap_or_default()
        })
    }
}

impl Drop for TrackingScope {
    fn drop(&mut self) {
        SCOPE_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();

            // Catch mismatched push/pop pairs early in debug builds.
            if let Some(entry) = popped {
                debug_assert_eq!(
                    entry.effect_id, self.effect_id,
                    "TrackingScope mismatch: expected {:?}, got {:?}",
                    self.effect_id, entry.effect_id
                );
            }
        });
    }
}

/// Attribute output nodes to the effect currently running.
///
/// Render code calls this after inserting nodes into the tree; the running
/// effect becomes their owner and removes them on teardown.
///
/// # Errors
///
/// Returns [`ReactiveError::OutsideReactiveContext`] when no effect is
/// running on this thread. Node ownership cannot be established without a
/// running effect, so this is surfaced rather than silently dropped.
pub fn claim_nodes(nodes: &[NodeId]) -> Result<(), ReactiveError> {
    SCOPE_STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        match stack.last_mut() {
            Some(entry) => {
                entry.nodes.extend_from_slice(nodes);
                Ok(())
            }
            None => Err(ReactiveError::OutsideReactiveContext),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_tracks_current_effect() {
        let id = EffectId::next();

        assert!(!TrackingScope::is_active());
        assert!(TrackingScope::current_effect().is_none());

        {
            let _scope = TrackingScope::enter(id);

            assert!(TrackingScope::is_active());
            assert_eq!(TrackingScope::current_effect(), Some(id));
        }

        assert!(!TrackingScope::is_active());
        assert!(TrackingScope::current_effect().is_none());
    }

    #[test]
    fn scope_collects_dependencies() {
        let scope = TrackingScope::enter(EffectId::next());

        TrackingScope::track_dependency(1);
        TrackingScope::track_dependency(2);
        TrackingScope::track_dependency(3);

        let deps = scope.dependencies();
        assert_eq!(deps.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn nested_scopes_are_isolated() {
        let outer_id = EffectId::next();
        let inner_id = EffectId::next();

        let outer = TrackingScope::enter(outer_id);
        TrackingScope::track_dependency(1);

        {
            let inner = TrackingScope::enter(inner_id);
            TrackingScope::track_dependency(2);

            assert_eq!(TrackingScope::current_effect(), Some(inner_id));
            assert_eq!(inner.dependencies().as_slice(), &[2]);
        }

        assert_eq!(TrackingScope::current_effect(), Some(outer_id));
        assert_eq!(outer.dependencies().as_slice(), &[1]);
    }

    #[test]
    fn claim_nodes_requires_active_scope() {
        let node = NodeId::new();
        assert_eq!(
            claim_nodes(&[node]),
            Err(ReactiveError::OutsideReactiveContext)
        );

        let scope = TrackingScope::enter(EffectId::next());
        claim_nodes(&[node]).unwrap();
        assert_eq!(scope.claimed_nodes().as_slice(), &[node]);
    }
}
