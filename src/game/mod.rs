//! Game Logic Module
//!
//! All game simulation code. 100% deterministic.
//!
//! ## Module Structure
//!
//! - `entity`: Entity capability traits (`Entity`, `ObjectiveObject`)
//! - `state`: Players, teams and the world state
//! - `board`: Tile grid and the items lying on it
//! - `flag`: Team flags and their lifecycle
//! - `bomb` / `powerup`: The bomber-arena entities
//! - `input`: Input frames and replay recording
//! - `tick`: Base world update (movement, bombs, power-ups)
//! - `collision`: Blast shapes and blast resolution
//! - `ctf`: Capture-the-flag controller
//! - `config`: Match tunables
//! - `snapshot`: Read-only frames for the renderer
//! - `events`: Game events for replay/verification

pub mod entity;
pub mod state;
pub mod board;
pub mod flag;
pub mod bomb;
pub mod powerup;
pub mod input;
pub mod tick;
pub mod collision;
pub mod ctf;
pub mod config;
pub mod snapshot;
pub mod events;

// Re-export key types
pub use entity::{Entity, EntityKind, ObjectiveObject, RenderView};
pub use state::{MatchState, PlayerState, PlayerId, Team, MatchPhase};
pub use board::{Board, BoardError, Item, ItemId, Tile};
pub use flag::{Flag, FlagError, FlagStatus};
pub use input::{InputFrame, InputDelta, PlayerInputBuffer};
pub use ctf::{CtfGame, CtfError, MatchOutcome, TickResult, replay_match};
pub use config::{CtfConfig, ConfigError};
pub use snapshot::{RenderSnapshot, SnapshotError};
pub use events::{GameEvent, GameEventData};
