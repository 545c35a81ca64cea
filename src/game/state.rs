//! Game State Definitions
//!
//! Player and match state for the arena.
//! Uses BTreeMap for deterministic iteration order.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use crate::core::grid::GridPos;
use crate::core::hash::{StateHash, StateHasher, compute_state_hash};
use crate::game::board::{Board, BoardError, Item};
use crate::game::bomb::Bomb;
use crate::game::entity::{Entity, EntityKind, RenderView};
use crate::game::events::GameEvent;

// =============================================================================
// PLAYER ID / TEAM
// =============================================================================

/// Hot-seat player slot.
///
/// Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl PlayerId {
    /// Create from a raw slot number.
    pub const fn new(slot: u8) -> Self {
        Self(slot)
    }

    /// Raw slot number.
    pub fn slot(&self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Team colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Team {
    /// Player 1's side
    Blue = 0,
    /// Player 2's side
    Red = 1,
}

impl Team {
    /// Both teams, in evaluation order.
    pub const ALL: [Team; 2] = [Team::Blue, Team::Red];

    /// The other team.
    #[inline]
    pub fn opponent(self) -> Team {
        match self {
            Team::Blue => Team::Red,
            Team::Red => Team::Blue,
        }
    }

    /// Player slot that plays for this team (Blue = 1, Red = 2).
    #[inline]
    pub fn player_slot(self) -> PlayerId {
        match self {
            Team::Blue => PlayerId(1),
            Team::Red => PlayerId(2),
        }
    }
}

// =============================================================================
// PLAYER STATE
// =============================================================================

/// State of a single player in the match.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerState {
    /// Player slot
    pub id: PlayerId,

    /// Team the player scores for
    pub team: Team,

    /// Current tile
    pub position: GridPos,

    /// Is player still alive?
    pub alive: bool,

    /// Tick when player was eliminated
    pub eliminated_tick: Option<u32>,

    /// Player whose bomb eliminated this player
    pub eliminated_by: Option<PlayerId>,

    /// Maximum bombs on the board at once
    pub bomb_capacity: u32,

    /// Blast reach in tiles
    pub blast_range: u32,

    /// Total bombs placed
    pub bombs_placed: u32,

    /// Flags captured by this player
    pub captures: u32,
}

impl PlayerState {
    /// Create a new player at a spawn tile.
    pub fn new(id: PlayerId, team: Team, position: GridPos) -> Self {
        Self {
            id,
            team,
            position,
            alive: true,
            eliminated_tick: None,
            eliminated_by: None,
            bomb_capacity: 1,
            blast_range: 2,
            bombs_placed: 0,
            captures: 0,
        }
    }

    /// Hash this player's state for verification.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u8(self.id.0);
        hasher.update_u8(self.team as u8);
        hasher.update_pos(self.position);
        hasher.update_bool(self.alive);
        hasher.update_u32(self.bomb_capacity);
        hasher.update_u32(self.blast_range);
        hasher.update_u32(self.captures);
    }
}

impl Entity for PlayerState {
    fn kind(&self) -> EntityKind {
        EntityKind::Player
    }

    fn position(&self) -> GridPos {
        self.position
    }

    fn render(&self) -> Option<RenderView> {
        if !self.alive {
            return None;
        }
        Some(RenderView {
            kind: EntityKind::Player,
            position: self.position,
            team: Some(self.team),
            carried: false,
        })
    }
}

// =============================================================================
// MATCH PHASE
// =============================================================================

/// Current phase of the match.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPhase {
    /// Board set up, not started yet
    #[default]
    Waiting,
    /// Active gameplay
    Playing,
    /// A team reached the score limit
    Ended,
}

// =============================================================================
// MATCH STATE
// =============================================================================

/// Complete world state of a match (everything below the objective layer).
///
/// Uses BTreeMap for deterministic iteration order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchState {
    /// Match identifier
    pub match_id: [u8; 16],

    /// Current tick
    pub tick: u32,

    /// Current match phase
    pub phase: MatchPhase,

    /// Tiles and items
    pub board: Board,

    /// All players (BTreeMap for deterministic iteration)
    pub players: BTreeMap<PlayerId, PlayerState>,

    /// Live bombs (BTreeMap for deterministic iteration)
    pub bombs: BTreeMap<u32, Bomb>,

    /// Next bomb ID (monotonic counter)
    pub next_bomb_id: u32,

    /// Events generated this tick (cleared each tick)
    #[serde(skip)]
    pub pending_events: Vec<GameEvent>,
}

impl MatchState {
    /// Create a new match state on `board`.
    pub fn new(match_id: [u8; 16], board: Board) -> Self {
        Self {
            match_id,
            tick: 0,
            phase: MatchPhase::Waiting,
            board,
            players: BTreeMap::new(),
            bombs: BTreeMap::new(),
            next_bomb_id: 0,
            pending_events: Vec::new(),
        }
    }

    /// Add a player on a walkable tile.
    pub fn add_player(&mut self, player: PlayerState) -> Result<(), BoardError> {
        if !self.board.is_walkable(player.position) {
            return Err(BoardError::Blocked { pos: player.position });
        }
        self.players.insert(player.id, player);
        Ok(())
    }

    /// Get a player by ID.
    pub fn get_player(&self, id: &PlayerId) -> Option<&PlayerState> {
        self.players.get(id)
    }

    /// Get a player mutably by ID.
    pub fn get_player_mut(&mut self, id: &PlayerId) -> Option<&mut PlayerState> {
        self.players.get_mut(id)
    }

    /// Whether the player exists and is alive.
    pub fn is_alive(&self, id: &PlayerId) -> bool {
        self.players.get(id).is_some_and(|p| p.alive)
    }

    /// Place a bomb. Returns the new bomb ID.
    pub fn spawn_bomb(&mut self, owner: PlayerId, position: GridPos, fuse: u32, range: u32) -> u32 {
        let id = self.next_bomb_id;
        self.next_bomb_id += 1;
        self.bombs.insert(id, Bomb::new(id, owner, position, fuse, range));
        id
    }

    /// Whether a live bomb sits on `pos`.
    pub fn bomb_at(&self, pos: GridPos) -> bool {
        self.bombs.values().any(|b| !b.detonated && b.position == pos)
    }

    /// Live bombs owned by `owner`.
    pub fn active_bombs_of(&self, owner: PlayerId) -> u32 {
        self.bombs
            .values()
            .filter(|b| !b.detonated && b.owner == owner)
            .count() as u32
    }

    /// Eliminate a player.
    ///
    /// Returns `false` if the player was missing or already dead, so a
    /// player is eliminated at most once.
    pub fn eliminate_player(&mut self, victim_id: &PlayerId, killer_id: Option<PlayerId>) -> bool {
        let tick = self.tick;
        match self.players.get_mut(victim_id) {
            Some(victim) if victim.alive => {
                victim.alive = false;
                victim.eliminated_tick = Some(tick);
                victim.eliminated_by = killer_id;
                true
            }
            _ => false,
        }
    }

    /// Get count of alive players.
    pub fn alive_player_count(&self) -> u32 {
        self.players.values().filter(|p| p.alive).count() as u32
    }

    /// Compute hash of current state for verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.tick, &self.match_id, |hasher| self.hash_into(hasher))
    }

    /// Feed world state into an existing hasher.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        for player in self.players.values() {
            player.hash_into(hasher);
        }

        for (bomb_id, bomb) in &self.bombs {
            hasher.update_u32(*bomb_id);
            hasher.update_pos(bomb.position);
            hasher.update_u32(bomb.fuse);
            hasher.update_bool(bomb.detonated);
        }

        for (item_id, item) in self.board.items() {
            hasher.update_u32(*item_id);
            hasher.update_u8(item.kind() as u8);
            hasher.update_pos(item.position());
            if let Item::Flag(flag) = item {
                flag.hash_into(hasher);
            }
        }
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Push a game event.
    pub fn push_event(&mut self, event: GameEvent) {
        self.pending_events.push(event);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn open_board() -> Board {
        Board::new(5, 5).unwrap()
    }

    #[test]
    fn test_team_opponent() {
        assert_eq!(Team::Blue.opponent(), Team::Red);
        assert_eq!(Team::Red.opponent(), Team::Blue);
        assert_eq!(Team::Blue.player_slot(), PlayerId(1));
        assert_eq!(Team::Red.player_slot(), PlayerId(2));
    }

    #[test]
    fn test_eliminate_exactly_once() {
        let mut state = MatchState::new([0; 16], open_board());
        let id = PlayerId::new(1);
        state.add_player(PlayerState::new(id, Team::Blue, GridPos::new(1, 1))).unwrap();
        state.tick = 7;

        assert!(state.eliminate_player(&id, None));
        assert!(!state.eliminate_player(&id, Some(PlayerId::new(2))));

        let player = state.get_player(&id).unwrap();
        assert!(!player.alive);
        assert_eq!(player.eliminated_tick, Some(7));
        assert_eq!(player.eliminated_by, None, "Second call must not overwrite");
    }

    #[test]
    fn test_eliminate_missing_player_is_noop() {
        let mut state = MatchState::new([0; 16], open_board());
        assert!(!state.eliminate_player(&PlayerId::new(9), None));
    }

    #[test]
    fn test_add_player_rejects_out_of_bounds() {
        let mut state = MatchState::new([0; 16], open_board());
        let player = PlayerState::new(PlayerId::new(1), Team::Blue, GridPos::new(9, 9));
        assert!(matches!(state.add_player(player), Err(BoardError::Blocked { .. })));
    }

    #[test]
    fn test_bomb_bookkeeping() {
        let mut state = MatchState::new([0; 16], open_board());
        let owner = PlayerId::new(1);
        let a = state.spawn_bomb(owner, GridPos::new(1, 1), 10, 2);
        let b = state.spawn_bomb(owner, GridPos::new(2, 1), 10, 2);
        assert_eq!((a, b), (0, 1));
        assert_eq!(state.active_bombs_of(owner), 2);
        assert!(state.bomb_at(GridPos::new(2, 1)));
        assert!(!state.bomb_at(GridPos::new(3, 1)));
    }

    #[test]
    fn test_hash_tracks_player_position() {
        let mut state1 = MatchState::new([0; 16], open_board());
        let mut state2 = MatchState::new([0; 16], open_board());
        let id = PlayerId::new(1);
        state1.add_player(PlayerState::new(id, Team::Blue, GridPos::new(1, 1))).unwrap();
        state2.add_player(PlayerState::new(id, Team::Blue, GridPos::new(1, 1))).unwrap();
        assert_eq!(state1.compute_hash(), state2.compute_hash());

        state2.get_player_mut(&id).unwrap().position = GridPos::new(2, 1);
        assert_ne!(state1.compute_hash(), state2.compute_hash());
    }

    #[test]
    fn test_dead_player_not_rendered() {
        let mut player = PlayerState::new(PlayerId::new(1), Team::Red, GridPos::new(1, 1));
        let view = player.render().unwrap();
        assert_eq!(view.team, Some(Team::Red));
        player.alive = false;
        assert!(player.render().is_none());
    }
}
