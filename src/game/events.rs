//! Game Events
//!
//! Events generated during simulation, consumed by the presentation layer
//! and by replay verification.

use serde::{Serialize, Deserialize};
use crate::core::grid::GridPos;
use crate::game::powerup::PowerUpKind;
use crate::game::state::{PlayerId, Team};

/// Priority for event processing order.
///
/// Lower value = processed first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventPriority {
    /// Player deaths first
    PlayerElimination = 0,
    /// Then blasts
    Explosion = 1,
    /// Then flag state changes
    FlagTransition = 2,
    /// Then scoring
    Capture = 3,
    /// Then pickups of any kind
    Pickup = 4,
    /// Lowest priority
    Other = 255,
}

/// Why a player left the match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EliminationCause {
    /// Standing in a blast
    Blast,
    /// Owner of a flag that was destroyed
    FlagDestroyed,
}

/// Game event data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEventData {
    /// Player was eliminated
    PlayerEliminated {
        victim_id: PlayerId,
        killer_id: Option<PlayerId>,
        cause: EliminationCause,
    },

    /// Bomb placed
    BombPlaced {
        player_id: PlayerId,
        bomb_id: u32,
        position: GridPos,
    },

    /// Bomb went off
    BombExploded {
        owner: PlayerId,
        bomb_id: u32,
        position: GridPos,
        tiles: u32,
    },

    /// Player collected a power-up
    PowerUpCollected {
        player_id: PlayerId,
        kind: PowerUpKind,
    },

    /// Player picked up a flag
    FlagPickedUp {
        player_id: PlayerId,
        team: Team,
        position: GridPos,
    },

    /// Carrier died; flag left on the floor
    FlagDropped {
        player_id: PlayerId,
        team: Team,
        position: GridPos,
    },

    /// Opponent flag brought home
    FlagCaptured {
        player_id: PlayerId,
        flag_team: Team,
        scoring_team: Team,
        new_score: u32,
    },

    /// Flag blown up
    FlagDestroyed {
        team: Team,
        owner: Option<PlayerId>,
        position: GridPos,
    },

    /// Destroyed flag reappeared at base
    FlagRespawned {
        team: Team,
        position: GridPos,
    },

    /// Match ended
    MatchEnded {
        winner_id: Option<PlayerId>,
        winning_team: Team,
        duration_ticks: u32,
    },
}

/// A game event with timing and priority.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameEvent {
    /// Tick when event occurred
    pub tick: u32,

    /// Processing priority
    pub priority: EventPriority,

    /// Player involved (for tie-breaking)
    pub player_id: Option<PlayerId>,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(tick: u32, priority: EventPriority, data: GameEventData) -> Self {
        let player_id = match &data {
            GameEventData::PlayerEliminated { victim_id, .. } => Some(*victim_id),
            GameEventData::BombPlaced { player_id, .. } => Some(*player_id),
            GameEventData::BombExploded { owner, .. } => Some(*owner),
            GameEventData::PowerUpCollected { player_id, .. } => Some(*player_id),
            GameEventData::FlagPickedUp { player_id, .. } => Some(*player_id),
            GameEventData::FlagDropped { player_id, .. } => Some(*player_id),
            GameEventData::FlagCaptured { player_id, .. } => Some(*player_id),
            GameEventData::FlagDestroyed { owner, .. } => *owner,
            GameEventData::MatchEnded { winner_id, .. } => *winner_id,
            GameEventData::FlagRespawned { .. } => None,
        };

        Self {
            tick,
            priority,
            player_id,
            data,
        }
    }

    /// Create player eliminated event.
    pub fn player_eliminated(
        tick: u32,
        victim_id: PlayerId,
        killer_id: Option<PlayerId>,
        cause: EliminationCause,
    ) -> Self {
        Self::new(
            tick,
            EventPriority::PlayerElimination,
            GameEventData::PlayerEliminated { victim_id, killer_id, cause },
        )
    }

    /// Create bomb placed event.
    pub fn bomb_placed(tick: u32, player_id: PlayerId, bomb_id: u32, position: GridPos) -> Self {
        Self::new(
            tick,
            EventPriority::Other,
            GameEventData::BombPlaced { player_id, bomb_id, position },
        )
    }

    /// Create bomb exploded event.
    pub fn bomb_exploded(tick: u32, owner: PlayerId, bomb_id: u32, position: GridPos, tiles: u32) -> Self {
        Self::new(
            tick,
            EventPriority::Explosion,
            GameEventData::BombExploded { owner, bomb_id, position, tiles },
        )
    }

    /// Create power-up collected event.
    pub fn power_up_collected(tick: u32, player_id: PlayerId, kind: PowerUpKind) -> Self {
        Self::new(
            tick,
            EventPriority::Pickup,
            GameEventData::PowerUpCollected { player_id, kind },
        )
    }

    /// Create flag picked up event.
    pub fn flag_picked_up(tick: u32, player_id: PlayerId, team: Team, position: GridPos) -> Self {
        Self::new(
            tick,
            EventPriority::Pickup,
            GameEventData::FlagPickedUp { player_id, team, position },
        )
    }

    /// Create flag dropped event.
    pub fn flag_dropped(tick: u32, player_id: PlayerId, team: Team, position: GridPos) -> Self {
        Self::new(
            tick,
            EventPriority::FlagTransition,
            GameEventData::FlagDropped { player_id, team, position },
        )
    }

    /// Create flag captured event.
    pub fn flag_captured(tick: u32, player_id: PlayerId, flag_team: Team, scoring_team: Team, new_score: u32) -> Self {
        Self::new(
            tick,
            EventPriority::Capture,
            GameEventData::FlagCaptured { player_id, flag_team, scoring_team, new_score },
        )
    }

    /// Create flag destroyed event.
    pub fn flag_destroyed(tick: u32, team: Team, owner: Option<PlayerId>, position: GridPos) -> Self {
        Self::new(
            tick,
            EventPriority::FlagTransition,
            GameEventData::FlagDestroyed { team, owner, position },
        )
    }

    /// Create flag respawned event.
    pub fn flag_respawned(tick: u32, team: Team, position: GridPos) -> Self {
        Self::new(
            tick,
            EventPriority::FlagTransition,
            GameEventData::FlagRespawned { team, position },
        )
    }

    /// Create match ended event.
    pub fn match_ended(tick: u32, winner_id: Option<PlayerId>, winning_team: Team) -> Self {
        Self::new(
            tick,
            EventPriority::Other,
            GameEventData::MatchEnded {
                winner_id,
                winning_team,
                duration_ticks: tick,
            },
        )
    }
}

impl PartialEq for GameEvent {
    fn eq(&self, other: &Self) -> bool {
        self.tick == other.tick
            && self.priority == other.priority
            && self.player_id == other.player_id
    }
}

impl Eq for GameEvent {}

impl PartialOrd for GameEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GameEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Sort by: tick, then priority, then player_id
        self.tick
            .cmp(&other.tick)
            .then(self.priority.cmp(&other.priority))
            .then(self.player_id.cmp(&other.player_id))
    }
}
