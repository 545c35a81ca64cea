//! Bombs
//!
//! A bomb sits on one tile and counts its fuse down once per tick.
//! Detonation itself is resolved in `collision`.

use serde::{Serialize, Deserialize};

use crate::core::grid::GridPos;
use crate::game::entity::{Entity, EntityKind, RenderView, UpdateContext};
use crate::game::state::PlayerId;

/// State of a placed bomb.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Bomb {
    /// Unique bomb ID (monotonic counter)
    pub id: u32,

    /// Player who placed it (credited for blast eliminations)
    pub owner: PlayerId,

    /// Tile the bomb sits on
    pub position: GridPos,

    /// Ticks left before detonation
    pub fuse: u32,

    /// Blast reach in tiles
    pub range: u32,

    /// Set once the bomb has gone off
    pub detonated: bool,
}

impl Bomb {
    /// Create a new bomb.
    pub fn new(id: u32, owner: PlayerId, position: GridPos, fuse: u32, range: u32) -> Self {
        Self {
            id,
            owner,
            position,
            fuse,
            range,
            detonated: false,
        }
    }

    /// Fuse has run out but the blast has not been resolved yet.
    #[inline]
    pub fn is_ready(&self) -> bool {
        !self.detonated && self.fuse == 0
    }
}

impl Entity for Bomb {
    fn kind(&self) -> EntityKind {
        EntityKind::Bomb
    }

    fn position(&self) -> GridPos {
        self.position
    }

    fn update(&mut self, _ctx: &UpdateContext<'_>) {
        if !self.detonated {
            self.fuse = self.fuse.saturating_sub(1);
        }
    }

    fn render(&self) -> Option<RenderView> {
        if self.detonated {
            return None;
        }
        Some(RenderView {
            kind: EntityKind::Bomb,
            position: self.position,
            team: None,
            carried: false,
        })
    }

    fn should_remove(&self) -> bool {
        self.detonated
    }
}
