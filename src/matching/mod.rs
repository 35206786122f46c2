//! Matching module: pairs records that describe the same transaction.
//!
//! This module provides:
//! - `group`: the `Group` output unit and its primary/supporting members
//! - `engine`: the two-phase matcher and its scoring function

mod engine;
mod group;

pub use engine::*;
pub use group::*;
