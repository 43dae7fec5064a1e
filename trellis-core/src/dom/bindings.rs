//! Two-Way Binding Helpers
//!
//! These helpers synchronize reactive state with an editable input in both
//! directions: user edits push into reactive state, and reactive changes
//! push back into the input. They are plain consumers of the effect
//! primitive and carry no control-flow logic of their own.

use std::sync::Arc;

use crate::dom::block::Block;
use crate::dom::tree::TreeMutator;
use crate::error::ReactiveError;
use crate::reactive::{Effect, Teardown};

/// An editable input the renderer exposes for binding.
///
/// `on_edit` subscriptions fire after the user changes the value; the
/// returned token removes the subscription.
pub trait EditSource<V>: Send + Sync {
    /// Read the input's current value.
    fn read(&self) -> V;

    /// Write a value into the input.
    fn write(&self, value: V);

    /// Subscribe to user edits. Returns a token for removal.
    fn on_edit(&self, listener: Box<dyn Fn() + Send + Sync>) -> usize;

    /// Remove an edit subscription.
    fn remove_listener(&self, token: usize);
}

/// A live two-way binding.
///
/// Holds the effects that keep the binding alive; destroying it stops both
/// directions and drops the edit subscription.
#[derive(Debug)]
pub struct Binding {
    sync: Effect,
    release: Effect,
}

impl Binding {
    /// Tear the binding down.
    pub fn destroy(&self) {
        self.sync.destroy();
        self.release.destroy();
    }
}

/// Bind a value-carrying input to reactive state.
///
/// `get_value` runs inside a render effect, so every reactive value it
/// reads becomes a dependency; when any of them change, the new value is
/// pushed into the input. Edits flow the other way through `update`.
/// Writing is skipped when the input already holds an equal value, so an
/// edit reflected back through state does not clobber the input mid-edit.
///
/// # Errors
///
/// Returns [`ReactiveError::OwnerDestroyed`] if `block` has already been
/// destroyed.
pub fn bind_value<V, G, U>(
    input: Arc<dyn EditSource<V>>,
    get_value: G,
    update: U,
    block: &Block,
    tree: Arc<dyn TreeMutator>,
) -> Result<Binding, ReactiveError>
where
    V: Clone + Send + Sync + PartialEq + 'static,
    G: Fn() -> V + Send + Sync + 'static,
    U: Fn(V) + Send + Sync + 'static,
{
    let edit_input = Arc::clone(&input);
    let token = input.on_edit(Box::new(move || update(edit_input.read())));

    let sync_input = Arc::clone(&input);
    let sync = Effect::render(
        move || {
            let value = get_value();
            if sync_input.read() != value {
                sync_input.write(value);
            }
            None
        },
        block,
        Arc::clone(&tree),
    )?;

    // The subscription outlives individual sync runs, so its removal lives
    // on a separate effect that reads nothing and therefore never re-runs:
    // its teardown fires exactly once, at destruction.
    let release_input = Arc::clone(&input);
    let release = Effect::render(
        move || {
            let release_input = Arc::clone(&release_input);
            Some(Box::new(move || release_input.remove_listener(token)) as Teardown)
        },
        block,
        tree,
    )?;

    Ok(Binding { sync, release })
}

/// Bind a checked/unchecked input to reactive boolean state.
///
/// # Errors
///
/// Returns [`ReactiveError::OwnerDestroyed`] if `block` has already been
/// destroyed.
pub fn bind_checked<G, U>(
    input: Arc<dyn EditSource<bool>>,
    get_checked: G,
    update: U,
    block: &Block,
    tree: Arc<dyn TreeMutator>,
) -> Result<Binding, ReactiveError>
where
    G: Fn() -> bool + Send + Sync + 'static,
    U: Fn(bool) + Send + Sync + 'static,
{
    bind_value(input, get_checked, update, block, tree)
}
