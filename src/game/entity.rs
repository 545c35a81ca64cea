//! Entity Model
//!
//! Capability traits shared by everything that lives on the board.
//! The set of kinds is closed (`EntityKind`); each kind implements
//! `Entity`, and objective objects (flags) additionally implement
//! `ObjectiveObject`.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use crate::core::grid::GridPos;
use crate::game::state::{PlayerId, PlayerState, Team};

/// Closed set of entity kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EntityKind {
    /// Hot-seat player
    Player = 0,
    /// Ticking bomb
    Bomb = 1,
    /// Collectible upgrade
    PowerUp = 2,
    /// Capturable team flag
    Flag = 3,
}

/// Read-only view handed to entities during their per-tick update.
///
/// Carrier handles are resolved through `players`, so no entity ever
/// holds a reference into another entity's storage.
pub struct UpdateContext<'a> {
    /// Tick being simulated
    pub tick: u32,
    /// All players (BTreeMap for deterministic iteration)
    pub players: &'a BTreeMap<PlayerId, PlayerState>,
}

/// What the renderer needs to draw one entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderView {
    /// Entity kind (selects the sprite)
    pub kind: EntityKind,
    /// Tile to draw at
    pub position: GridPos,
    /// Team tint, if the entity has one
    pub team: Option<Team>,
    /// Drawn attached to a carrier instead of on the floor
    pub carried: bool,
}

/// Capability set every board entity provides.
pub trait Entity {
    /// Which kind of entity this is.
    fn kind(&self) -> EntityKind;

    /// Current tile.
    fn position(&self) -> GridPos;

    /// Advance one tick.
    fn update(&mut self, _ctx: &UpdateContext<'_>) {}

    /// Pure read of the entity's visible state; `None` when hidden.
    fn render(&self) -> Option<RenderView>;

    /// Whether the world should drop this entity at the end of the tick.
    fn should_remove(&self) -> bool {
        false
    }
}

/// Capture-game semantics on top of `Entity`.
///
/// Transitions trust the controller's check ordering for positional
/// preconditions, but refuse transitions that would break the
/// carrier/destroyed invariants.
pub trait ObjectiveObject: Entity {
    /// Error type for refused transitions.
    type Error;

    /// Team this objective belongs to.
    fn team(&self) -> Team;

    /// Attach to `player`.
    fn pick_up(&mut self, player: &PlayerState) -> Result<(), Self::Error>;

    /// Detach from the carrier, leaving the object where it is.
    /// Returns the previous carrier, if any.
    fn drop(&mut self) -> Option<PlayerId>;

    /// Unconditional reset to the base tile.
    fn return_to_base(&mut self);

    /// Destroy the object. Returns the player to eliminate, if any;
    /// applying the elimination is the caller's job.
    fn destroy(&mut self) -> Option<PlayerId>;
}
