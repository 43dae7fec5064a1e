//! Signal Implementation
//!
//! A Signal is the fundamental reactive primitive. It holds a value and
//! tracks which effects depend on it.
//!
//! # How Signals Work
//!
//! 1. When a signal is read during an effect's run, the signal registers
//!    that effect as a subscriber through the runtime.
//!
//! 2. When a signal's value changes, every subscriber is invalidated and
//!    handed to the scheduler.
//!
//! 3. The scheduler batches and re-runs invalidated effects, which read the
//!    signal again and re-establish their subscriptions from scratch.
//!
//! Reads outside of any effect run are untracked and establish no
//! dependency.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::reactive::context::TrackingScope;
use crate::reactive::runtime::Runtime;

/// Counter for generating unique signal ids.
static SIGNAL_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a new unique signal id.
fn next_signal_id() -> u64 {
    SIGNAL_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// A reactive cell holding a value of type `T`.
///
/// # Example
///
/// ```rust,ignore
/// let count = Signal::new(0);
///
/// // Read the value (registers a dependency inside an effect run)
/// let value = count.get();
///
/// // Update the value (invalidates dependent effects)
/// count.set(5);
/// ```
pub struct Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Unique identifier for this signal.
    id: u64,

    /// The current value.
    value: Arc<RwLock<T>>,
}

impl<T> Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a new signal with the given initial value.
    pub fn new(value: T) -> Self {
        Self {
            id: next_signal_id(),
            value: Arc::new(RwLock::new(value)),
        }
    }

    /// Get the signal's unique id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Get the current value.
    ///
    /// If called during an effect's run, registers that effect as a
    /// subscriber of this signal.
    pub fn get(&self) -> T {
        if let Some(effect_id) = TrackingScope::current_effect() {
            TrackingScope::track_dependency(self.id);
            Runtime::add_dependency(self.id, effect_id);
        }

        self.value.read().clone()
    }

    /// Get the current value without establishing a dependency.
    pub fn get_untracked(&self) -> T {
        self.value.read().clone()
    }

    /// Set a new value and invalidate subscribers.
    ///
    /// Stale effects are re-run before this call returns, unless a run is
    /// already in progress on this thread, in which case they are deferred
    /// until the running effect completes.
    pub fn set(&self, value: T) {
        {
            let mut guard = self.value.write();
            *guard = value;
        }

        Runtime::notify_signal_change(self.id);
    }

    /// Update the value using a function of the current value.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let new_value = {
            let guard = self.value.read();
            f(&guard)
        };
        self.set(new_value);
    }

    /// Number of effects currently subscribed to this signal.
    pub fn subscriber_count(&self) -> usize {
        Runtime::subscriber_count(self.id)
    }
}

impl<T> Clone for Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            value: Arc::clone(&self.value),
        }
    }
}

impl<T> Debug for Signal<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.id)
            .field("value", &self.get_untracked())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
