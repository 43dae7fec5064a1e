//! Structural Block Controllers
//!
//! Each controller pairs a controlling render effect with the branch
//! effects it manages, built on the same primitives user code gets.

mod conditional;

pub use conditional::{if_block, BranchFn, DomEnv};
