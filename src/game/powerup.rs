//! Power-ups
//!
//! Floor pickups that upgrade a player's bomb capacity or blast range.
//! Collected power-ups flag themselves for removal; the board sweeps
//! them at the end of the tick.

use serde::{Serialize, Deserialize};

use crate::core::grid::GridPos;
use crate::game::entity::{Entity, EntityKind, RenderView};
use crate::game::state::PlayerState;

/// Type of power-up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PowerUpKind {
    /// +1 simultaneous bomb
    ExtraBomb = 0,
    /// +1 blast tile in each direction
    BlastRange = 1,
}

/// State of a power-up on the board.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PowerUp {
    /// Type of power-up
    pub kind: PowerUpKind,

    /// Tile it lies on
    pub position: GridPos,

    /// Has this power-up been collected?
    pub collected: bool,
}

impl PowerUp {
    /// Create a new power-up.
    pub fn new(kind: PowerUpKind, position: GridPos) -> Self {
        Self {
            kind,
            position,
            collected: false,
        }
    }

    /// Apply to `player` and mark collected.
    ///
    /// Stats are capped at `max_bombs` / `max_range`; the power-up is
    /// consumed even when the player is already capped.
    pub fn collect(&mut self, player: &mut PlayerState, max_bombs: u32, max_range: u32) {
        match self.kind {
            PowerUpKind::ExtraBomb => {
                player.bomb_capacity = (player.bomb_capacity + 1).min(max_bombs);
            }
            PowerUpKind::BlastRange => {
                player.blast_range = (player.blast_range + 1).min(max_range);
            }
        }
        self.collected = true;
    }
}

impl Entity for PowerUp {
    fn kind(&self) -> EntityKind {
        EntityKind::PowerUp
    }

    fn position(&self) -> GridPos {
        self.position
    }

    fn render(&self) -> Option<RenderView> {
        if self.collected {
            return None;
        }
        Some(RenderView {
            kind: EntityKind::PowerUp,
            position: self.position,
            team: None,
            carried: false,
        })
    }

    fn should_remove(&self) -> bool {
        self.collected
    }
}
