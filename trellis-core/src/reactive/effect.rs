//! Effect Implementation
//!
//! An Effect is a re-runnable unit of reactive work with an optional
//! teardown action, owned by a block in the rendered-output tree.
//!
//! # How Effects Work
//!
//! 1. When created, the effect runs its body immediately to establish
//!    initial dependencies and produce initial output.
//!
//! 2. When any dependency changes, the effect is marked stale and handed to
//!    the scheduler.
//!
//! 3. Before the body re-runs, the previous run's teardown action is
//!    invoked and the effect's owned nodes are removed; dependencies are
//!    re-captured from scratch during the new run.
//!
//! # Lifecycle
//!
//! ```text
//! uninitialized -> active <-> paused -> destroyed
//! ```
//!
//! `destroyed` is terminal; every operation on a destroyed effect is a
//! no-op. Pausing suspends re-runs without releasing resources, so output
//! can stay visible during an exit transition; staleness accumulated while
//! paused is applied on resume.
//!
//! # Teardown
//!
//! The body returns `Option<Teardown>`. A returned teardown corresponds to
//! exactly one run and is invoked exactly once: before the next run, or on
//! destruction, whichever comes first. Nodes claimed during a run are owned
//! by the effect and removed through the tree capability right after the
//! teardown action, so node bookkeeping has a single source of truth.

use std::mem;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use bitflags::bitflags;
use parking_lot::{Mutex, RwLock};
use smallvec::SmallVec;
use tracing::trace;

use crate::dom::{Block, NodeList, TreeMutator, WeakBlock};
use crate::error::ReactiveError;
use crate::reactive::context::TrackingScope;
use crate::reactive::runtime::Runtime;
use crate::reactive::scheduler;

/// Counter for generating unique effect ids.
static EFFECT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique identifier for an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EffectId(u64);

impl EffectId {
    /// Generate a new unique effect id.
    pub(crate) fn next() -> Self {
        Self(EFFECT_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw id value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// A teardown action produced by an effect run.
pub type Teardown = Box<dyn FnOnce() + Send>;

bitflags! {
    /// Per-effect flag bitset.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EffectFlags: u8 {
        /// The effect renders output and registers with the effect that was
        /// running at creation time (or the owning block's controlling
        /// effect), so destruction cascades through it.
        const RENDER = 1 << 0;
        /// The effect controls an `else if` arm. Only affects how an
        /// enclosing transition system classifies this block's transitions
        /// as local; never affects branch selection.
        const ELSE_IF = 1 << 1;
    }
}

/// Lifecycle state of an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectState {
    /// Created but the first run has not started.
    Uninitialized,
    /// Eligible for re-runs.
    Active,
    /// Re-runs suspended; resources and output retained.
    Paused,
    /// Terminal. All further operations are no-ops.
    Destroyed,
}

/// An exit transition associated with an effect's output.
///
/// Registered by the transition subsystem. When the effect is paused, each
/// transition's exit phase runs; the pause settles once every `done`
/// callback has fired. Destruction never waits for transitions.
pub trait Transition: Send + Sync {
    /// Run the exit phase, invoking `done` when it completes.
    fn run_exit(&self, done: Box<dyn FnOnce() + Send>);
}

/// Tracks outstanding exit transitions for one pause operation.
struct Settlement {
    remaining: Mutex<usize>,
    on_settled: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl Settlement {
    fn complete_one(&self) {
        let callback = {
            let mut remaining = self.remaining.lock();
            *remaining -= 1;
            if *remaining == 0 {
                self.on_settled.lock().take()
            } else {
                None
            }
        };
        if let Some(callback) = callback {
            callback();
        }
    }
}

/// A re-runnable unit of reactive work.
///
/// Cloning an `Effect` produces another handle to the same effect.
pub struct Effect {
    inner: Arc<EffectInner>,
}

struct EffectInner {
    /// Unique identifier for this effect.
    id: EffectId,

    /// Flag bitset. `ELSE_IF` may be set after construction.
    flags: RwLock<EffectFlags>,

    /// Current lifecycle state.
    state: RwLock<EffectState>,

    /// Set when a dependency changed since the last completed run.
    stale: AtomicBool,

    /// Number of completed body runs.
    run_count: AtomicUsize,

    /// Owning block's depth, used for scheduler ordering.
    depth: u32,

    /// The effect body. Runs under a tracking scope; may return a teardown.
    body: Box<dyn Fn() -> Option<Teardown> + Send + Sync>,

    /// Teardown produced by the most recent run, if any.
    teardown: Mutex<Option<Teardown>>,

    /// Signal ids read during the last run. Recomputed every run.
    dependencies: RwLock<SmallVec<[u64; 8]>>,

    /// Output nodes produced by the last run. The sole record of what this
    /// effect put in the tree.
    nodes: Mutex<NodeList>,

    /// Effects created under this one while it ran. Destroyed first.
    children: Mutex<Vec<Effect>>,

    /// The effect this one registered with, if any.
    parent: Mutex<Option<Weak<EffectInner>>>,

    /// Owning block. Back-reference, not ownership.
    block: WeakBlock,

    /// Tree capability used to remove owned nodes. Render effects only.
    tree: Option<Arc<dyn TreeMutator>>,

    /// Exit transitions registered against this effect's output.
    transitions: Mutex<Vec<Arc<dyn Transition>>>,
}

/// Weak handle to an effect, held by the runtime registry.
pub(crate) struct WeakEffect(Weak<EffectInner>);

impl WeakEffect {
    pub(crate) fn upgrade(&self) -> Option<Effect> {
        self.0.upgrade().map(|inner| Effect { inner })
    }
}

impl Effect {
    /// Create a render effect: runs the body once immediately, owns the
    /// nodes the body claims, and registers with the enclosing effect so
    /// destruction cascades.
    ///
    /// # Errors
    ///
    /// Returns [`ReactiveError::OwnerDestroyed`] if `block` has already been
    /// destroyed. Creating an effect against a dead owner would corrupt the
    /// ownership graph, so it fails fast.
    pub fn render<F>(
        body: F,
        block: &Block,
        tree: Arc<dyn TreeMutator>,
    ) -> Result<Self, ReactiveError>
    where
        F: Fn() -> Option<Teardown> + Send + Sync + 'static,
    {
        Self::create(Box::new(body), block, Some(tree), EffectFlags::RENDER)
    }

    /// Create a user effect: runs the body once immediately, owns no
    /// output nodes.
    ///
    /// # Errors
    ///
    /// Returns [`ReactiveError::OwnerDestroyed`] if `block` has already been
    /// destroyed.
    pub fn user<F>(body: F, block: &Block) -> Result<Self, ReactiveError>
    where
        F: Fn() -> Option<Teardown> + Send + Sync + 'static,
    {
        Self::create(Box::new(body), block, None, EffectFlags::empty())
    }

    fn create(
        body: Box<dyn Fn() -> Option<Teardown> + Send + Sync>,
        block: &Block,
        tree: Option<Arc<dyn TreeMutator>>,
        flags: EffectFlags,
    ) -> Result<Self, ReactiveError> {
        if block.is_destroyed() {
            return Err(ReactiveError::OwnerDestroyed);
        }

        let effect = Effect {
            inner: Arc::new(EffectInner {
                id: EffectId::next(),
                flags: RwLock::new(flags),
                state: RwLock::new(EffectState::Uninitialized),
                stale: AtomicBool::new(false),
                run_count: AtomicUsize::new(0),
                depth: block.depth(),
                body,
                teardown: Mutex::new(None),
                dependencies: RwLock::new(SmallVec::new()),
                nodes: Mutex::new(NodeList::new()),
                children: Mutex::new(Vec::new()),
                parent: Mutex::new(None),
                block: block.downgrade(),
                tree,
                transitions: Mutex::new(Vec::new()),
            }),
        };

        Runtime::register_effect(&effect);

        if flags.contains(EffectFlags::RENDER) {
            // Register with the effect running right now, falling back to
            // the block's controlling effect. Ownership is explicit: the
            // parent destroys this effect when it is destroyed.
            let parent = TrackingScope::current_effect()
                .and_then(Runtime::effect)
                .or_else(|| block.nearest_effect());
            if let Some(parent) = parent {
                *effect.inner.parent.lock() = Some(Arc::downgrade(&parent.inner));
                parent.inner.children.lock().push(effect.clone());
            }
        }

        *effect.inner.state.write() = EffectState::Active;
        trace!(effect = effect.inner.id.raw(), "effect created");

        effect.run_body();

        Ok(effect)
    }

    /// Get the effect's unique id.
    pub fn id(&self) -> EffectId {
        self.inner.id
    }

    /// Get the current lifecycle state.
    pub fn state(&self) -> EffectState {
        *self.inner.state.read()
    }

    /// Get the current flag bitset.
    pub fn flags(&self) -> EffectFlags {
        *self.inner.flags.read()
    }

    /// Add flags to the bitset.
    pub fn insert_flags(&self, flags: EffectFlags) {
        self.inner.flags.write().insert(flags);
    }

    /// Check if the effect has been destroyed.
    pub fn is_destroyed(&self) -> bool {
        self.state() == EffectState::Destroyed
    }

    /// Number of completed body runs.
    pub fn run_count(&self) -> usize {
        self.inner.run_count.load(Ordering::Relaxed)
    }

    /// Number of dependencies captured by the last run.
    pub fn dependency_count(&self) -> usize {
        self.inner.dependencies.read().len()
    }

    /// Owning block's depth.
    pub fn depth(&self) -> u32 {
        self.inner.depth
    }

    /// The owning block, if it is still alive.
    pub fn block(&self) -> Option<Block> {
        self.inner.block.upgrade()
    }

    /// Nodes currently owned by this effect, in production order.
    pub fn owned_nodes(&self) -> NodeList {
        self.inner.nodes.lock().clone()
    }

    /// Effects registered under this one.
    pub fn children(&self) -> Vec<Effect> {
        self.inner.children.lock().clone()
    }

    /// Register an exit transition against this effect's output.
    pub fn add_transition(&self, transition: Arc<dyn Transition>) {
        self.inner.transitions.lock().push(transition);
    }

    /// Mark the effect stale and hand it to the scheduler.
    ///
    /// Called when a dependency changes. Staleness is remembered while the
    /// effect is paused and applied on resume; invalidating a destroyed
    /// effect is a no-op.
    pub fn invalidate(&self) {
        match self.state() {
            EffectState::Active => {
                if !self.inner.stale.swap(true, Ordering::SeqCst) {
                    scheduler::schedule(self.clone());
                }
            }
            EffectState::Paused => {
                self.inner.stale.store(true, Ordering::SeqCst);
            }
            EffectState::Uninitialized | EffectState::Destroyed => {}
        }
    }

    /// Re-run a stale, active effect.
    ///
    /// Invoked by the scheduler. Runs the prior teardown and removes owned
    /// nodes before the body runs again; dependencies are re-captured from
    /// scratch during the new run.
    pub(crate) fn rerun(&self) {
        if self.state() != EffectState::Active {
            return;
        }
        if !self.inner.stale.swap(false, Ordering::SeqCst) {
            return;
        }

        trace!(effect = self.inner.id.raw(), "effect rerun");
        self.run_teardown();
        Runtime::clear_dependencies(self.inner.id);
        self.run_body();
    }

    /// Pause the effect and its children.
    ///
    /// Output stays in place so it can remain visible during an exit
    /// transition. `on_settled` fires once every exit transition in the
    /// paused subtree has completed; synchronously if there are none. If
    /// the effect is not active, `on_settled` fires immediately.
    pub fn pause<F>(&self, on_settled: F)
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let mut state = self.inner.state.write();
            if *state != EffectState::Active {
                drop(state);
                on_settled();
                return;
            }
            *state = EffectState::Paused;
        }
        trace!(effect = self.inner.id.raw(), "effect paused");

        let children = self.children();
        for child in &children {
            child.pause_subtree();
        }

        let mut transitions = Vec::new();
        self.collect_transitions(&mut transitions);

        if transitions.is_empty() {
            on_settled();
            return;
        }

        let settlement = Arc::new(Settlement {
            remaining: Mutex::new(transitions.len()),
            on_settled: Mutex::new(Some(Box::new(on_settled))),
        });
        for transition in transitions {
            let settlement = Arc::clone(&settlement);
            transition.run_exit(Box::new(move || settlement.complete_one()));
        }
    }

    fn pause_subtree(&self) {
        {
            let mut state = self.inner.state.write();
            if *state != EffectState::Active {
                return;
            }
            *state = EffectState::Paused;
        }
        for child in self.children() {
            child.pause_subtree();
        }
    }

    /// Resume a paused effect and its children.
    ///
    /// Effects marked stale while paused re-run immediately.
    pub fn resume(&self) {
        self.mark_resumed();
        scheduler::flush();
    }

    fn mark_resumed(&self) {
        {
            let mut state = self.inner.state.write();
            if *state != EffectState::Paused {
                return;
            }
            *state = EffectState::Active;
        }
        trace!(effect = self.inner.id.raw(), "effect resumed");

        if self.inner.stale.load(Ordering::SeqCst) {
            scheduler::schedule(self.clone());
        }
        for child in self.children() {
            child.mark_resumed();
        }
    }

    /// Destroy the effect, releasing all resources.
    ///
    /// Children are destroyed first, then the teardown action runs and
    /// owned nodes are removed. Legal from any state; never waits on a
    /// pending transition settle. Idempotent.
    pub fn destroy(&self) {
        {
            let mut state = self.inner.state.write();
            if *state == EffectState::Destroyed {
                return;
            }
            *state = EffectState::Destroyed;
        }

        let children = mem::take(&mut *self.inner.children.lock());
        for child in children {
            child.destroy();
        }

        self.run_teardown();
        Runtime::unregister_effect(self.inner.id);

        let parent = self.inner.parent.lock().take();
        if let Some(parent) = parent.and_then(|weak| weak.upgrade()) {
            Effect { inner: parent }.unlink_child(self.inner.id);
        }

        trace!(effect = self.inner.id.raw(), "effect destroyed");
    }

    fn unlink_child(&self, id: EffectId) {
        self.inner.children.lock().retain(|child| child.inner.id != id);
    }

    /// Run the body under a fresh tracking scope, capturing dependencies,
    /// claimed nodes and the returned teardown.
    fn run_body(&self) {
        scheduler::with_run_guard(|| {
            let scope = TrackingScope::enter(self.inner.id);
            let teardown = (self.inner.body)();
            let dependencies = scope.dependencies();
            let claimed = scope.claimed_nodes();
            drop(scope);

            *self.inner.dependencies.write() = dependencies;
            self.inner.nodes.lock().extend(claimed);
            *self.inner.teardown.lock() = teardown;
            self.inner.run_count.fetch_add(1, Ordering::Relaxed);
        });
    }

    /// Invoke the pending teardown, then remove owned nodes.
    fn run_teardown(&self) {
        let teardown = self.inner.teardown.lock().take();
        if let Some(teardown) = teardown {
            teardown();
        }

        let nodes = mem::take(&mut *self.inner.nodes.lock());
        if !nodes.is_empty() {
            if let Some(tree) = &self.inner.tree {
                tree.remove_nodes(&nodes);
            }
        }
    }

    fn collect_transitions(&self, out: &mut Vec<Arc<dyn Transition>>) {
        out.extend(self.inner.transitions.lock().iter().cloned());
        for child in self.children() {
            child.collect_transitions(out);
        }
    }

    pub(crate) fn downgrade(&self) -> WeakEffect {
        WeakEffect(Arc::downgrade(&self.inner))
    }
}

impl Clone for Effect {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl PartialEq for Effect {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Effect {}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.inner.id)
            .field("state", &self.state())
            .field("run_count", &self.run_count())
            .field("dependency_count", &self.dependency_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::NodeId;
    use crate::reactive::context;
    use crate::reactive::signal::Signal;
    use std::sync::atomic::AtomicI32;

    struct NullTree;

    impl TreeMutator for NullTree {
        fn remove_nodes(&self, _nodes: &[NodeId]) {}
    }

    struct RecordingTree {
        removed: Mutex<Vec<NodeId>>,
    }

    impl RecordingTree {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                removed: Mutex::new(Vec::new()),
            })
        }

        fn removed(&self) -> Vec<NodeId> {
            self.removed.lock().clone()
        }
    }

    impl TreeMutator for RecordingTree {
        fn remove_nodes(&self, nodes: &[NodeId]) {
            self.removed.lock().extend_from_slice(nodes);
        }
    }

    /// A transition whose exit completion is driven manually.
    struct ManualTransition {
        done: Mutex<Option<Box<dyn FnOnce() + Send>>>,
    }

    impl ManualTransition {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                done: Mutex::new(None),
            })
        }

        fn settle(&self) {
            if let Some(done) = self.done.lock().take() {
                done();
            }
        }
    }

    impl Transition for ManualTransition {
        fn run_exit(&self, done: Box<dyn FnOnce() + Send>) {
            *self.done.lock() = Some(done);
        }
    }

    #[test]
    fn effect_runs_on_creation() {
        let block = Block::root();
        let run_count = Arc::new(AtomicI32::new(0));
        let probe = run_count.clone();

        let _effect = Effect::user(
            move || {
                probe.fetch_add(1, Ordering::SeqCst);
                None
            },
            &block,
        )
        .unwrap();

        assert_eq!(run_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn creation_against_destroyed_block_fails() {
        let block = Block::root();
        block.destroy();

        let result = Effect::user(|| None, &block);
        assert_eq!(result.unwrap_err(), ReactiveError::OwnerDestroyed);
    }

    #[test]
    fn effect_reruns_when_dependency_changes() {
        let block = Block::root();
        let signal = Signal::new(0);
        let observed = Arc::new(AtomicI32::new(-1));

        let signal_probe = signal.clone();
        let observed_probe = observed.clone();
        let effect = Effect::user(
            move || {
                observed_probe.store(signal_probe.get(), Ordering::SeqCst);
                None
            },
            &block,
        )
        .unwrap();

        assert_eq!(observed.load(Ordering::SeqCst), 0);
        assert_eq!(effect.dependency_count(), 1);

        signal.set(42);
        assert_eq!(observed.load(Ordering::SeqCst), 42);
        assert_eq!(effect.run_count(), 2);
    }

    #[test]
    fn teardown_runs_before_every_rerun_and_on_destroy() {
        let block = Block::root();
        let signal = Signal::new(0);
        let torn_down = Arc::new(AtomicI32::new(0));

        let signal_probe = signal.clone();
        let teardown_probe = torn_down.clone();
        let effect = Effect::user(
            move || {
                let _ = signal_probe.get();
                let probe = teardown_probe.clone();
                Some(Box::new(move || {
                    probe.fetch_add(1, Ordering::SeqCst);
                }) as Teardown)
            },
            &block,
        )
        .unwrap();

        assert_eq!(torn_down.load(Ordering::SeqCst), 0);

        signal.set(1);
        assert_eq!(torn_down.load(Ordering::SeqCst), 1);

        signal.set(2);
        assert_eq!(torn_down.load(Ordering::SeqCst), 2);

        effect.destroy();
        assert_eq!(torn_down.load(Ordering::SeqCst), 3);

        // Destroy is idempotent; the teardown never runs twice for one run.
        effect.destroy();
        assert_eq!(torn_down.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn render_effect_removes_claimed_nodes_on_rerun() {
        let block = Block::root();
        let tree = RecordingTree::new();
        let signal = Signal::new(0);
        let node = Arc::new(Mutex::new(None::<NodeId>));

        let signal_probe = signal.clone();
        let node_probe = node.clone();
        let effect = Effect::render(
            move || {
                let _ = signal_probe.get();
                let fresh = NodeId::new();
                *node_probe.lock() = Some(fresh);
                context::claim_nodes(&[fresh]).unwrap();
                None
            },
            &block,
            tree.clone(),
        )
        .unwrap();

        let first = node.lock().unwrap();
        assert_eq!(effect.owned_nodes().as_slice(), &[first]);
        assert!(tree.removed().is_empty());

        signal.set(1);
        let second = node.lock().unwrap();
        assert_eq!(tree.removed(), vec![first]);
        assert_eq!(effect.owned_nodes().as_slice(), &[second]);

        effect.destroy();
        assert_eq!(tree.removed(), vec![first, second]);
        assert!(effect.owned_nodes().is_empty());
    }

    #[test]
    fn paused_effect_defers_reruns_until_resume() {
        let block = Block::root();
        let signal = Signal::new(0);
        let runs = Arc::new(AtomicI32::new(0));

        let signal_probe = signal.clone();
        let runs_probe = runs.clone();
        let effect = Effect::user(
            move || {
                let _ = signal_probe.get();
                runs_probe.fetch_add(1, Ordering::SeqCst);
                None
            },
            &block,
        )
        .unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 1);

        effect.pause(|| {});
        assert_eq!(effect.state(), EffectState::Paused);

        // Invalidations while paused are remembered, not executed.
        signal.set(1);
        signal.set(2);
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        // Resume applies the accumulated staleness exactly once.
        effect.resume();
        assert_eq!(effect.state(), EffectState::Active);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn pause_settles_synchronously_without_transitions() {
        let block = Block::root();
        let effect = Effect::user(|| None, &block).unwrap();

        let settled = Arc::new(AtomicBool::new(false));
        let probe = settled.clone();
        effect.pause(move || probe.store(true, Ordering::SeqCst));

        assert!(settled.load(Ordering::SeqCst));
    }

    #[test]
    fn pause_waits_for_exit_transitions() {
        let block = Block::root();
        let effect = Effect::user(|| None, &block).unwrap();

        let transition = ManualTransition::new();
        effect.add_transition(transition.clone());

        let settled = Arc::new(AtomicBool::new(false));
        let probe = settled.clone();
        effect.pause(move || probe.store(true, Ordering::SeqCst));

        assert!(!settled.load(Ordering::SeqCst));
        transition.settle();
        assert!(settled.load(Ordering::SeqCst));
    }

    #[test]
    fn destroy_does_not_wait_for_pending_settle() {
        let block = Block::root();
        let tree = RecordingTree::new();
        let node = NodeId::new();

        let effect = Effect::render(
            move || {
                context::claim_nodes(&[node]).unwrap();
                None
            },
            &block,
            tree.clone(),
        )
        .unwrap();

        let transition = ManualTransition::new();
        effect.add_transition(transition.clone());
        effect.pause(|| {});

        // Transition never settles; destruction must still tear down.
        effect.destroy();
        assert!(effect.is_destroyed());
        assert_eq!(tree.removed(), vec![node]);

        // A late settle finds a destroyed effect and has nothing to do.
        transition.settle();
        assert!(effect.is_destroyed());
    }

    #[test]
    fn destroy_cascades_to_children_first() {
        let block = Block::root();
        let tree: Arc<NullTree> = Arc::new(NullTree);
        let order = Arc::new(Mutex::new(Vec::new()));

        let parent_order = order.clone();
        let child_order = order.clone();
        let block_inner = block.clone();
        let tree_inner = tree.clone();
        let child_slot: Arc<Mutex<Option<Effect>>> = Arc::new(Mutex::new(None));
        let child_slot_probe = child_slot.clone();

        let parent = Effect::render(
            move || {
                let order = child_order.clone();
                let child = Effect::render(
                    move || {
                        let order = order.clone();
                        Some(Box::new(move || order.lock().push("child")) as Teardown)
                    },
                    &block_inner,
                    tree_inner.clone(),
                )
                .unwrap();
                *child_slot_probe.lock() = Some(child);

                let order = parent_order.clone();
                Some(Box::new(move || order.lock().push("parent")) as Teardown)
            },
            &block,
            tree,
        )
        .unwrap();

        assert_eq!(parent.children().len(), 1);

        parent.destroy();
        assert_eq!(order.lock().as_slice(), &["child", "parent"]);

        let child = child_slot.lock().clone().unwrap();
        assert!(child.is_destroyed());
    }

    #[test]
    fn invalidate_on_destroyed_effect_is_noop() {
        let block = Block::root();
        let runs = Arc::new(AtomicI32::new(0));
        let signal = Signal::new(0);

        let signal_probe = signal.clone();
        let probe = runs.clone();
        let effect = Effect::user(
            move || {
                let _ = signal_probe.get();
                probe.fetch_add(1, Ordering::SeqCst);
                None
            },
            &block,
        )
        .unwrap();

        effect.destroy();
        signal.set(9);

        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reentrant_write_defers_until_run_completes() {
        let block = Block::root();
        let signal = Signal::new(0);
        let runs = Arc::new(AtomicI32::new(0));

        // The body writes a signal it also reads; the write must not
        // re-enter the body mid-run. One deferred rerun follows instead.
        let signal_probe = signal.clone();
        let probe = runs.clone();
        let _effect = Effect::user(
            move || {
                let value = signal_probe.get();
                probe.fetch_add(1, Ordering::SeqCst);
                if value == 0 {
                    signal_probe.set(1);
                }
                None
            },
            &block,
        )
        .unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 2);
        assert_eq!(signal.get_untracked(), 1);
    }

    #[test]
    fn else_if_flag_is_just_classification() {
        let block = Block::root();
        let effect = Effect::user(|| None, &block).unwrap();

        assert!(!effect.flags().contains(EffectFlags::ELSE_IF));
        effect.insert_flags(EffectFlags::ELSE_IF);
        assert!(effect.flags().contains(EffectFlags::ELSE_IF));
    }
}
