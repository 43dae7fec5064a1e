//! Reactive Runtime
//!
//! The runtime is the central coordinator between signals and effects. It
//! owns the dependency table and fans invalidation out to subscribers when
//! a signal changes.
//!
//! # How It Works
//!
//! 1. When an effect's body reads a signal, the runtime records the
//!    dependency.
//!
//! 2. When a signal's value changes, the runtime invalidates every
//!    recorded subscriber and asks the scheduler to flush.
//!
//! 3. Before an effect re-runs, its recorded dependencies are cleared so
//!    the new run re-captures them from scratch. Dependencies not re-read
//!    are therefore dropped, never diffed.
//!
//! The registry holds weak references so it never keeps a destroyed effect
//! alive. Subscriber sets are insertion-ordered, which makes invalidation
//! fan-out deterministic.

use std::collections::HashMap;
use std::sync::OnceLock;

use indexmap::IndexSet;
use parking_lot::RwLock;

use crate::reactive::effect::{Effect, EffectId, WeakEffect};
use crate::reactive::scheduler;

static REGISTRY: OnceLock<RwLock<HashMap<EffectId, WeakEffect>>> = OnceLock::new();
static SIGNAL_SUBSCRIBERS: OnceLock<RwLock<HashMap<u64, IndexSet<EffectId>>>> = OnceLock::new();

fn registry() -> &'static RwLock<HashMap<EffectId, WeakEffect>> {
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

fn signal_subscribers() -> &'static RwLock<HashMap<u64, IndexSet<EffectId>>> {
    SIGNAL_SUBSCRIBERS.get_or_init(|| RwLock::new(HashMap::new()))
}

/// The global reactive runtime.
pub struct Runtime;

impl Runtime {
    /// Register an effect with the runtime.
    pub(crate) fn register_effect(effect: &Effect) {
        registry().write().insert(effect.id(), effect.downgrade());
    }

    /// Unregister an effect and drop all of its subscriptions.
    pub(crate) fn unregister_effect(id: EffectId) {
        registry().write().remove(&id);
        Self::clear_dependencies(id);
    }

    /// Look up a live effect by id.
    pub(crate) fn effect(id: EffectId) -> Option<Effect> {
        registry().read().get(&id).and_then(WeakEffect::upgrade)
    }

    /// Record that an effect depends on a signal.
    ///
    /// Called automatically when a signal is read during an effect run.
    pub fn add_dependency(signal_id: u64, effect_id: EffectId) {
        signal_subscribers()
            .write()
            .entry(signal_id)
            .or_default()
            .insert(effect_id);
    }

    /// Remove every subscription held by an effect.
    ///
    /// Called before a re-run so the new run re-captures dependencies.
    pub fn clear_dependencies(effect_id: EffectId) {
        let mut subscribers = signal_subscribers().write();
        for set in subscribers.values_mut() {
            set.shift_remove(&effect_id);
        }
    }

    /// Invalidate every subscriber of a signal, then flush the scheduler.
    ///
    /// This is the core update propagation mechanism. Invalidation honors
    /// effect lifecycle: paused effects remember their staleness, destroyed
    /// effects ignore it.
    pub fn notify_signal_change(signal_id: u64) {
        let subscriber_ids: Vec<EffectId> = {
            let subscribers = signal_subscribers().read();
            subscribers
                .get(&signal_id)
                .map(|set| set.iter().copied().collect())
                .unwrap_or_default()
        };

        if subscriber_ids.is_empty() {
            return;
        }

        for id in subscriber_ids {
            if let Some(effect) = Self::effect(id) {
                effect.invalidate();
            }
        }

        scheduler::flush();
    }

    /// Number of effects subscribed to a signal.
    pub fn subscriber_count(signal_id: u64) -> usize {
        signal_subscribers()
            .read()
            .get(&signal_id)
            .map(IndexSet::len)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Block;
    use crate::reactive::signal::Signal;
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Arc;

    #[test]
    fn dependencies_are_recorded_and_cleared() {
        let id = EffectId::next();

        Runtime::add_dependency(9_000_001, id);
        assert_eq!(Runtime::subscriber_count(9_000_001), 1);

        Runtime::clear_dependencies(id);
        assert_eq!(Runtime::subscriber_count(9_000_001), 0);
    }

    #[test]
    fn rerun_drops_dependencies_not_reread() {
        let block = Block::root();
        let gate = Signal::new(true);
        let tracked = Signal::new(0);
        let runs = Arc::new(AtomicI32::new(0));

        let gate_probe = gate.clone();
        let tracked_probe = tracked.clone();
        let probe = runs.clone();
        let _effect = crate::reactive::effect::Effect::user(
            move || {
                probe.fetch_add(1, Ordering::SeqCst);
                if gate_probe.get() {
                    let _ = tracked_probe.get();
                }
                None
            },
            &block,
        )
        .unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(tracked.subscriber_count(), 1);

        // Flip the gate: the new run no longer reads `tracked`, so its
        // subscription is gone and further writes to it are ignored.
        gate.set(false);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        assert_eq!(tracked.subscriber_count(), 0);

        tracked.set(99);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn destroyed_effect_is_unregistered() {
        let block = Block::root();
        let signal = Signal::new(0);

        let signal_probe = signal.clone();
        let effect = crate::reactive::effect::Effect::user(
            move || {
                let _ = signal_probe.get();
                None
            },
            &block,
        )
        .unwrap();

        let id = effect.id();
        assert!(Runtime::effect(id).is_some());
        assert_eq!(signal.subscriber_count(), 1);

        effect.destroy();
        assert!(Runtime::effect(id).is_none());
        assert_eq!(signal.subscriber_count(), 0);
    }
}
