//! Error Types
//!
//! The runtime distinguishes two kinds of failure:
//!
//! - Programmer misuse (constructing reactive machinery in an invalid
//!   context). These are surfaced immediately as [`ReactiveError`] values so
//!   the caller fails fast instead of silently corrupting the dependency
//!   graph.
//!
//! - Recoverable runtime conditions (hydration mismatches, operations on
//!   already-destroyed effects). These are *not* errors: they have defined
//!   recovery paths or are absorbed as no-ops, and never appear here.

use thiserror::Error;

/// Errors raised by the reactive runtime.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReactiveError {
    /// An operation that requires a running effect was invoked while no
    /// tracking scope was active.
    #[error("operation requires a running effect, but no tracking scope is active")]
    OutsideReactiveContext,

    /// An effect or block was constructed against an owner that has already
    /// been destroyed.
    #[error("owning block has already been destroyed")]
    OwnerDestroyed,
}
