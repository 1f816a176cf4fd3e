//! Hyperparameter search space
//!
//! Defines the fixed axis set of the sweep and its exhaustive, deterministic
//! enumeration. Enumeration order is the resume contract: nested-loop order
//! with the last axis varying fastest, identical on every invocation.

mod combination;
mod grid;

pub use combination::Combination;
pub use grid::{Combinations, SweepGrid};
