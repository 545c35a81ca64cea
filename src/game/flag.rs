//! Team Flags
//!
//! The capturable objective. A flag is always in exactly one of four
//! states:
//!
//! ```text
//!            pick_up              drop
//!   AtBase ──────────▶ Carried ──────────▶ Dropped
//!     ▲                 │  │  ◀──────────    │
//!     │  return_to_base │  │    pick_up      │
//!     ├─────────────────┘  │ destroy         │ destroy
//!     │                    ▼                 │
//!     └───────────────  Destroyed ◀──────────┘
//!       return_to_base
//! ```
//!
//! The carrier is stored as a `PlayerId` handle and resolved through the
//! player table every tick, so a flag never keeps a player alive.
//! Flags are never removed from the board.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::grid::GridPos;
use crate::core::hash::StateHasher;
use crate::game::entity::{Entity, EntityKind, ObjectiveObject, RenderView, UpdateContext};
use crate::game::state::{PlayerId, PlayerState, Team};

/// Where a flag currently is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlagStatus {
    /// Sitting on its base tile
    AtBase,
    /// Following a player
    Carried {
        /// Player holding the flag
        carrier: PlayerId,
    },
    /// Lying where its carrier died
    Dropped,
    /// Blown up; inert until returned to base
    Destroyed,
}

/// Refused flag transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlagError {
    /// Someone already holds the flag.
    #[error("flag already carried by {carrier}")]
    AlreadyCarried {
        /// Current holder
        carrier: PlayerId,
    },

    /// Destroyed flags cannot be picked up.
    #[error("flag is destroyed")]
    Destroyed,

    /// Dead players cannot carry.
    #[error("player {0} is not alive")]
    CarrierNotAlive(PlayerId),

    /// The player is not standing on the flag.
    #[error("player at {player} is not on flag tile {flag}")]
    NotOnFlagTile {
        /// Player tile
        player: GridPos,
        /// Flag tile
        flag: GridPos,
    },
}

/// A team flag.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Flag {
    team: Team,
    base: GridPos,
    position: GridPos,
    status: FlagStatus,
    owner: Option<PlayerId>,
}

impl Flag {
    /// Create a flag sitting on its base.
    pub fn new(team: Team, base: GridPos) -> Self {
        Self {
            team,
            base,
            position: base,
            status: FlagStatus::AtBase,
            owner: None,
        }
    }

    /// Base tile (where it respawns and where its team scores).
    pub fn base(&self) -> GridPos {
        self.base
    }

    /// Lifecycle state.
    pub fn status(&self) -> FlagStatus {
        self.status
    }

    /// Is someone holding the flag?
    pub fn is_picked_up(&self) -> bool {
        matches!(self.status, FlagStatus::Carried { .. })
    }

    /// Current holder, if any.
    pub fn carrier(&self) -> Option<PlayerId> {
        match self.status {
            FlagStatus::Carried { carrier } => Some(carrier),
            _ => None,
        }
    }

    /// Has the flag been blown up?
    pub fn is_destroyed(&self) -> bool {
        self.status == FlagStatus::Destroyed
    }

    /// Sitting untouched on its base?
    pub fn is_at_base(&self) -> bool {
        self.status == FlagStatus::AtBase
    }

    /// Player eliminated when this flag is destroyed.
    pub fn owner(&self) -> Option<PlayerId> {
        self.owner
    }

    /// Bind (or clear) the player eliminated on destruction.
    pub fn set_owner(&mut self, owner: Option<PlayerId>) {
        self.owner = owner;
    }

    /// Snap to the carrier's tile. No-op unless carried.
    ///
    /// A carrier missing from `players` leaves the flag where it is;
    /// the controller's carrier-death check drops it.
    pub fn update_position(&mut self, players: &BTreeMap<PlayerId, PlayerState>) {
        if let Some(carrier) = self.carrier() {
            if let Some(player) = players.get(&carrier) {
                self.position = player.position;
            }
        }
    }

    /// Hash this flag's state for verification.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u8(self.team as u8);
        hasher.update_pos(self.base);
        hasher.update_pos(self.position);
        let (tag, carrier) = match self.status {
            FlagStatus::AtBase => (0, None),
            FlagStatus::Carried { carrier } => (1, Some(carrier.0)),
            FlagStatus::Dropped => (2, None),
            FlagStatus::Destroyed => (3, None),
        };
        hasher.update_u8(tag);
        hasher.update_opt_u8(carrier);
        hasher.update_opt_u8(self.owner.map(|o| o.0));
    }
}

impl Entity for Flag {
    fn kind(&self) -> EntityKind {
        EntityKind::Flag
    }

    fn position(&self) -> GridPos {
        self.position
    }

    fn update(&mut self, ctx: &UpdateContext<'_>) {
        self.update_position(ctx.players);
    }

    fn render(&self) -> Option<RenderView> {
        if self.is_destroyed() {
            return None;
        }
        Some(RenderView {
            kind: EntityKind::Flag,
            position: self.position,
            team: Some(self.team),
            carried: self.is_picked_up(),
        })
    }
}

impl ObjectiveObject for Flag {
    type Error = FlagError;

    fn team(&self) -> Team {
        self.team
    }

    fn pick_up(&mut self, player: &PlayerState) -> Result<(), FlagError> {
        match self.status {
            FlagStatus::Destroyed => return Err(FlagError::Destroyed),
            FlagStatus::Carried { carrier } => return Err(FlagError::AlreadyCarried { carrier }),
            FlagStatus::AtBase | FlagStatus::Dropped => {}
        }
        if !player.alive {
            return Err(FlagError::CarrierNotAlive(player.id));
        }
        if player.position != self.position {
            return Err(FlagError::NotOnFlagTile {
                player: player.position,
                flag: self.position,
            });
        }

        self.status = FlagStatus::Carried { carrier: player.id };
        self.position = player.position;
        Ok(())
    }

    fn drop(&mut self) -> Option<PlayerId> {
        let carrier = self.carrier()?;
        // Position was synced to the carrier every tick; freeze it here.
        self.status = FlagStatus::Dropped;
        Some(carrier)
    }

    fn return_to_base(&mut self) {
        self.position = self.base;
        self.status = FlagStatus::AtBase;
    }

    fn destroy(&mut self) -> Option<PlayerId> {
        if self.is_destroyed() {
            return None;
        }
        self.status = FlagStatus::Destroyed;
        self.owner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn player_at(id: u8, x: u32, y: u32) -> PlayerState {
        PlayerState::new(PlayerId::new(id), Team::Blue, GridPos::new(x, y))
    }

    fn table(players: &[PlayerState]) -> BTreeMap<PlayerId, PlayerState> {
        players.iter().map(|p| (p.id, p.clone())).collect()
    }

    #[test]
    fn test_new_flag_at_base() {
        let flag = Flag::new(Team::Red, GridPos::new(1, 1));
        assert!(flag.is_at_base());
        assert!(!flag.is_picked_up());
        assert!(!flag.is_destroyed());
        assert_eq!(flag.position(), GridPos::new(1, 1));
        assert!(!flag.should_remove());
    }

    #[test]
    fn test_pick_up_sets_carrier() {
        let mut flag = Flag::new(Team::Red, GridPos::new(1, 1));
        let player = player_at(1, 1, 1);

        flag.pick_up(&player).unwrap();
        assert!(flag.is_picked_up());
        assert_eq!(flag.carrier(), Some(player.id));
    }

    #[test]
    fn test_pick_up_refuses_second_carrier() {
        let mut flag = Flag::new(Team::Red, GridPos::new(1, 1));
        flag.pick_up(&player_at(1, 1, 1)).unwrap();

        let err = flag.pick_up(&player_at(2, 1, 1)).unwrap_err();
        assert_eq!(err, FlagError::AlreadyCarried { carrier: PlayerId::new(1) });
        assert_eq!(flag.carrier(), Some(PlayerId::new(1)));
    }

    #[test]
    fn test_pick_up_refuses_destroyed_dead_or_distant() {
        let mut flag = Flag::new(Team::Red, GridPos::new(1, 1));

        let mut dead = player_at(1, 1, 1);
        dead.alive = false;
        assert_eq!(flag.pick_up(&dead), Err(FlagError::CarrierNotAlive(PlayerId::new(1))));

        assert!(matches!(
            flag.pick_up(&player_at(1, 2, 1)),
            Err(FlagError::NotOnFlagTile { .. })
        ));

        flag.destroy();
        assert_eq!(flag.pick_up(&player_at(1, 1, 1)), Err(FlagError::Destroyed));
        assert!(!flag.is_picked_up());
    }

    #[test]
    fn test_follows_carrier() {
        let mut flag = Flag::new(Team::Red, GridPos::new(1, 1));
        let mut player = player_at(1, 1, 1);
        flag.pick_up(&player).unwrap();

        player.position = GridPos::new(3, 1);
        flag.update_position(&table(&[player.clone()]));
        assert_eq!(flag.position(), GridPos::new(3, 1));
    }

    #[test]
    fn test_drop_freezes_position() {
        let mut flag = Flag::new(Team::Red, GridPos::new(1, 1));
        let mut player = player_at(1, 1, 1);
        flag.pick_up(&player).unwrap();
        player.position = GridPos::new(2, 1);
        flag.update_position(&table(&[player.clone()]));

        assert_eq!(flag.drop(), Some(player.id));
        assert_eq!(flag.status(), FlagStatus::Dropped);
        assert_eq!(flag.carrier(), None);

        // Carrier keeps moving, flag stays put
        player.position = GridPos::new(3, 1);
        flag.update_position(&table(&[player]));
        assert_eq!(flag.position(), GridPos::new(2, 1));

        // Idempotent
        assert_eq!(flag.drop(), None);
        assert_eq!(flag.position(), GridPos::new(2, 1));
    }

    #[test]
    fn test_return_to_base_resets_everything() {
        let mut flag = Flag::new(Team::Blue, GridPos::new(1, 1));
        let mut player = player_at(2, 1, 1);
        flag.pick_up(&player).unwrap();
        player.position = GridPos::new(4, 4);
        flag.update_position(&table(&[player]));

        flag.return_to_base();
        assert!(flag.is_at_base());
        assert_eq!(flag.position(), GridPos::new(1, 1));
        assert_eq!(flag.carrier(), None);
    }

    #[test]
    fn test_destroy_reports_owner_once() {
        let mut flag = Flag::new(Team::Blue, GridPos::new(1, 1));
        let owner = PlayerId::new(1);
        flag.set_owner(Some(owner));

        assert_eq!(flag.destroy(), Some(owner));
        assert!(flag.is_destroyed());
        assert_eq!(flag.destroy(), None, "Already destroyed");
        assert!(flag.render().is_none());

        flag.return_to_base();
        assert!(!flag.is_destroyed());
        assert_eq!(flag.destroy(), Some(owner), "Respawned flag can be destroyed again");
    }

    #[test]
    fn test_destroy_without_owner() {
        let mut flag = Flag::new(Team::Blue, GridPos::new(1, 1));
        assert_eq!(flag.destroy(), None);
        assert!(flag.is_destroyed());
    }

    #[test]
    fn test_destroy_clears_carrier() {
        let mut flag = Flag::new(Team::Blue, GridPos::new(1, 1));
        flag.pick_up(&player_at(2, 1, 1)).unwrap();
        flag.destroy();
        assert!(!flag.is_picked_up());
        assert_eq!(flag.carrier(), None);
    }

    #[test]
    fn test_render_marks_carried() {
        let mut flag = Flag::new(Team::Red, GridPos::new(1, 1));
        assert!(!flag.render().unwrap().carried);
        flag.pick_up(&player_at(1, 1, 1)).unwrap();
        let view = flag.render().unwrap();
        assert!(view.carried);
        assert_eq!(view.team, Some(Team::Red));
    }

    #[derive(Clone, Debug)]
    enum Op {
        PickUp(u8, u32),
        Drop,
        Return,
        Destroy,
        Move(u8, u32),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (1u8..=2, 0u32..3).prop_map(|(p, x)| Op::PickUp(p, x)),
            Just(Op::Drop),
            Just(Op::Return),
            Just(Op::Destroy),
            (1u8..=2, 0u32..3).prop_map(|(p, x)| Op::Move(p, x)),
        ]
    }

    proptest! {
        #[test]
        fn prop_flag_invariants_hold(ops in proptest::collection::vec(op_strategy(), 0..64)) {
            let mut flag = Flag::new(Team::Red, GridPos::new(0, 0));
            let mut players = table(&[player_at(1, 0, 0), player_at(2, 1, 0)]);

            for op in ops {
                match op {
                    Op::PickUp(id, x) => {
                        let mut p = players[&PlayerId::new(id)].clone();
                        p.position = GridPos::new(x, 0);
                        let _ = flag.pick_up(&p);
                    }
                    Op::Drop => { flag.drop(); }
                    Op::Return => flag.return_to_base(),
                    Op::Destroy => { flag.destroy(); }
                    Op::Move(id, x) => {
                        if let Some(p) = players.get_mut(&PlayerId::new(id)) {
                            p.position = GridPos::new(x, 0);
                        }
                    }
                }
                flag.update_position(&players);

                // carrier present <=> picked up
                prop_assert_eq!(flag.is_picked_up(), flag.carrier().is_some());
                // never destroyed and carried
                prop_assert!(!(flag.is_destroyed() && flag.is_picked_up()));
                // follows carrier
                if let Some(carrier) = flag.carrier() {
                    prop_assert_eq!(flag.position(), players[&carrier].position);
                }
                if flag.is_at_base() {
                    prop_assert_eq!(flag.position(), flag.base());
                }
            }
        }

        #[test]
        fn prop_return_to_base_idempotent(ops in proptest::collection::vec(op_strategy(), 0..32)) {
            let mut flag = Flag::new(Team::Blue, GridPos::new(2, 0));
            let players = table(&[player_at(1, 2, 0)]);
            for op in ops {
                match op {
                    Op::PickUp(_, _) => { let _ = flag.pick_up(&players[&PlayerId::new(1)]); }
                    Op::Drop => { flag.drop(); }
                    Op::Destroy => { flag.destroy(); }
                    _ => {}
                }
            }

            flag.return_to_base();
            let once = (flag.status(), flag.position());
            flag.return_to_base();
            prop_assert_eq!(once, (flag.status(), flag.position()));
            prop_assert_eq!(flag.position(), flag.base());
            prop_assert!(!flag.is_picked_up());
            prop_assert!(!flag.is_destroyed());
        }
    }
}
