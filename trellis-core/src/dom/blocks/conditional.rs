//! Conditional Block Controller
//!
//! Implements if/else semantics over the effect primitive: a controlling
//! effect evaluates a boolean condition, owns at most one active consequent
//! effect and at most one active alternate effect, and swaps branches when
//! the condition flips.
//!
//! # Branch Swapping
//!
//! On a flip, the newly active branch is created (or resumed, if a paused
//! instance exists) before the previously active branch is paused, so
//! output is never absent mid-swap; both branches may be present during a
//! transition window. Once the paused branch settles, it is destroyed and
//! its nodes are removed.
//!
//! # Hydration
//!
//! While hydrating, the controller compares the pending server marker
//! against the freshly computed condition. Agreement consumes the marker
//! and hydration continues. A missing or disagreeing marker is a mismatch,
//! not an error: the server markup under the anchor is removed exactly
//! once, and the branch is built client-side with hydration bookkeeping
//! kept alive for its descendants.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::dom::block::Block;
use crate::dom::hydration::HydrationStream;
use crate::dom::tree::{NodeId, NodeList, TreeMutator};
use crate::error::ReactiveError;
use crate::reactive::{claim_nodes, Effect, EffectFlags, EffectState};

/// A branch factory: given the anchor, builds the branch's content and
/// returns the nodes it produced, in order.
pub type BranchFn = Arc<dyn Fn(NodeId) -> NodeList + Send + Sync>;

/// Capabilities the renderer hands to block controllers.
#[derive(Clone)]
pub struct DomEnv {
    /// Tree mutation capability.
    pub tree: Arc<dyn TreeMutator>,
    /// Hydration state for the current render pass.
    pub hydration: HydrationStream,
}

impl DomEnv {
    /// An environment with no hydration in progress.
    pub fn client_only(tree: Arc<dyn TreeMutator>) -> Self {
        Self {
            tree,
            hydration: HydrationStream::inert(),
        }
    }
}

/// Mutable controller state, shared between controlling-effect runs and
/// settle callbacks.
struct IfState {
    /// Last observed condition. `None` before the first evaluation.
    condition: Option<bool>,
    consequent: Option<Effect>,
    alternate: Option<Effect>,
}

/// Which branch slot an operation addresses.
#[derive(Clone, Copy)]
enum Branch {
    Consequent,
    Alternate,
}

impl IfState {
    fn slot(&mut self, branch: Branch) -> &mut Option<Effect> {
        match branch {
            Branch::Consequent => &mut self.consequent,
            Branch::Alternate => &mut self.alternate,
        }
    }
}

/// Create a conditional block at `anchor`.
///
/// `condition_fn` is evaluated inside the controlling effect; every
/// reactive value it reads becomes a dependency, so any change re-runs the
/// controller. `alternate_fn` may be `None`: a missing else branch is legal
/// and produces no nodes. `else_if` only affects how an enclosing
/// transition system classifies this block's transitions; it never changes
/// branch selection.
///
/// The returned block owns the controlling effect and, through it, both
/// branch effects and every node they produced. Destroying it tears all of
/// that down, children before parent.
///
/// # Errors
///
/// Returns [`ReactiveError::OwnerDestroyed`] if `parent` has already been
/// destroyed.
pub fn if_block<C>(
    anchor: NodeId,
    condition_fn: C,
    consequent_fn: BranchFn,
    alternate_fn: Option<BranchFn>,
    else_if: bool,
    parent: &Block,
    env: &DomEnv,
) -> Result<Block, ReactiveError>
where
    C: Fn() -> bool + Send + Sync + 'static,
{
    let block = Block::child(parent);
    let state = Arc::new(Mutex::new(IfState {
        condition: None,
        consequent: None,
        alternate: None,
    }));

    let env = env.clone();
    let tree = env.tree.clone();
    let branch_block = block.clone();

    let controlling = Effect::render(
        move || {
            let fresh = condition_fn();

            {
                let mut state = state.lock();
                if state.condition == Some(fresh) {
                    return None;
                }
                state.condition = Some(fresh);
            }

            let mut mismatch = false;
            if env.hydration.is_hydrating() {
                match env.hydration.peek_marker() {
                    Some(recorded) if recorded == fresh => {
                        env.hydration.consume_marker();
                    }
                    _ => {
                        // The server rendered a different branch than the
                        // client computes (or left no marker). Drop its
                        // markup and rebuild this region client-side.
                        let stale_nodes = env.hydration.discard();
                        debug!(
                            anchor = anchor.raw(),
                            discarded = stale_nodes.len(),
                            "hydration mismatch, rebuilding branch"
                        );
                        if !stale_nodes.is_empty() {
                            env.tree.remove_nodes(&stale_nodes);
                        }
                        mismatch = true;
                    }
                }
            }

            let (activate, factory, retire) = if fresh {
                (Branch::Consequent, Some(&consequent_fn), Branch::Alternate)
            } else {
                (Branch::Alternate, alternate_fn.as_ref(), Branch::Consequent)
            };

            // Bring up the new branch before retiring the old one, so the
            // anchor is never left without content mid-swap.
            let existing = state.lock().slot(activate).clone();
            match existing {
                Some(effect) => effect.resume(),
                None => {
                    if let Some(factory) = factory {
                        let effect = create_branch(
                            anchor,
                            Arc::clone(factory),
                            mismatch,
                            &branch_block,
                            &env,
                        );
                        *state.lock().slot(activate) = Some(effect);
                    }
                }
            }

            let outgoing = state.lock().slot(retire).clone();
            if let Some(effect) = outgoing {
                let state = Arc::clone(&state);
                let retired = effect.clone();
                effect.pause(move || {
                    // The settle may arrive after the condition flipped
                    // back (branch resumed) or after the whole controller
                    // was destroyed; only a still-paused branch is retired.
                    if retired.state() != EffectState::Paused {
                        return;
                    }
                    let mut state = state.lock();
                    if state
                        .slot(retire)
                        .as_ref()
                        .is_some_and(|slot| slot.id() == retired.id())
                    {
                        *state.slot(retire) = None;
                    }
                    drop(state);
                    retired.destroy();
                });
            }

            None
        },
        parent,
        tree,
    )?;

    if else_if {
        controlling.insert_flags(EffectFlags::ELSE_IF);
    }
    block.set_effect(controlling);

    Ok(block)
}

/// Build one branch: a render effect that runs the factory at the anchor
/// and owns the nodes it produces. Node removal rides on the effect's own
/// teardown path.
fn create_branch(
    anchor: NodeId,
    factory: BranchFn,
    mismatch: bool,
    block: &Block,
    env: &DomEnv,
) -> Effect {
    let hydration = env.hydration.clone();
    Effect::render(
        move || {
            let nodes = factory(anchor);
            claim_nodes(&nodes)
                .expect("branch factory ran outside a tracking scope");

            if mismatch {
                // Keep descendants in hydration mode even though this
                // region was rebuilt; mismatches are local.
                hydration.resume_empty();
            }

            None
        },
        block,
        env.tree.clone(),
    )
    .expect("owning block destroyed during branch creation")
}
