//! # Blast CTF
//!
//! Deterministic capture-the-flag simulation core for a two-player,
//! tile-grid bomber arena.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        BLAST CTF                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── grid.rs     - Tile coordinates and directions           │
//! │  └── hash.rs     - State hashing for verification            │
//! │                                                              │
//! │  game/           - Game logic (deterministic)                │
//! │  ├── entity.rs   - Entity / ObjectiveObject traits           │
//! │  ├── state.rs    - Players, teams, world state               │
//! │  ├── board.rs    - Tiles and items                           │
//! │  ├── flag.rs     - Team flags                                │
//! │  ├── bomb.rs     - Bombs                                     │
//! │  ├── powerup.rs  - Power-ups                                 │
//! │  ├── tick.rs     - Base world update                         │
//! │  ├── collision.rs- Blasts and chain reactions                │
//! │  ├── ctf.rs      - Capture-the-flag controller               │
//! │  ├── input.rs    - Input frames and recording                │
//! │  ├── config.rs   - Match tunables                            │
//! │  ├── snapshot.rs - Render snapshots                          │
//! │  └── events.rs   - Game events                               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules are **100% deterministic**:
//! - Integer tile coordinates only, no floating point
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No system time dependencies
//! - Fixed per-tick evaluation order
//!
//! Given identical inputs, a match produces **identical results** and
//! identical state hashes on every run.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;

// Re-export commonly used types
pub use core::grid::{Direction, GridPos};
pub use game::ctf::{CtfGame, MatchOutcome, TickResult};
pub use game::config::CtfConfig;
pub use game::input::{InputFrame, PlayerInputBuffer};
pub use game::state::{MatchState, PlayerState, PlayerId, Team};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;

/// Captures needed to win unless configured otherwise
pub const DEFAULT_SCORE_TO_WIN: u32 = 3;
