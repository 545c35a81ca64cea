//! Core deterministic primitives.
//!
//! Integer grid coordinates and state hashing. Nothing in here knows
//! about players, flags or bombs.

pub mod grid;
pub mod hash;

// Re-export core types
pub use grid::{GridPos, Direction};
pub use hash::{StateHash, StateHasher, compute_state_hash};
