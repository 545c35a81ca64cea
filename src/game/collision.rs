//! Blast Collision
//!
//! Deterministic explosion resolution: blast shapes, chain reactions, and
//! what a blast does to the players and flags it overlaps.
//!
//! This is the only place outside the objective controller that writes
//! into a flag, and it does so solely through `ObjectiveObject::destroy`.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tracing::{debug, info};

use crate::core::grid::{Direction, GridPos};
use crate::game::board::{Board, Item, ItemId};
use crate::game::entity::{Entity, ObjectiveObject};
use crate::game::events::{EliminationCause, GameEvent};
use crate::game::state::{MatchState, PlayerId};

/// Tiles covered by one or more explosions in a tick.
///
/// Each tile remembers the first bomb owner to reach it (bomb-id order),
/// which is who gets credit for eliminations there.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Blast {
    /// Covered tile -> credited player (`None` for sourceless blasts)
    pub tiles: BTreeMap<GridPos, Option<PlayerId>>,
}

impl Blast {
    /// Blast covering `tiles`, all credited to `source`.
    pub fn from_tiles<I>(tiles: I, source: Option<PlayerId>) -> Self
    where
        I: IntoIterator<Item = GridPos>,
    {
        Self {
            tiles: tiles.into_iter().map(|t| (t, source)).collect(),
        }
    }

    /// Add tiles; tiles already covered keep their original credit.
    pub fn extend<I>(&mut self, tiles: I, source: Option<PlayerId>)
    where
        I: IntoIterator<Item = GridPos>,
    {
        for tile in tiles {
            self.tiles.entry(tile).or_insert(source);
        }
    }

    /// Does the blast cover `pos`?
    #[inline]
    pub fn covers(&self, pos: GridPos) -> bool {
        self.tiles.contains_key(&pos)
    }

    /// Nothing covered.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

/// Tiles reached by a bomb at `origin` with reach `range`.
///
/// A cross: the origin plus up to `range` tiles in each direction, each
/// arm stopping before the first wall or the board edge.
pub fn blast_tiles(board: &Board, origin: GridPos, range: u32) -> Vec<GridPos> {
    let mut tiles = vec![origin];

    for dir in Direction::ALL {
        let mut current = origin;
        for _ in 0..range {
            match current.step(dir) {
                Some(next) if board.is_walkable(next) => {
                    tiles.push(next);
                    current = next;
                }
                _ => break,
            }
        }
    }

    tiles
}

/// Detonate every bomb whose fuse has run out, plus any bomb caught in
/// those blasts (chain reaction, same tick).
///
/// Returns the combined blast; it has already been applied to `state`.
pub fn detonate_ready_bombs(state: &mut MatchState) -> Blast {
    let mut blast = Blast::default();

    // BTreeMap keys are sorted, so the queue starts in bomb-id order
    let mut queue: VecDeque<u32> = state
        .bombs
        .iter()
        .filter(|(_, b)| b.is_ready())
        .map(|(id, _)| *id)
        .collect();
    let mut queued: BTreeSet<u32> = queue.iter().copied().collect();

    while let Some(bomb_id) = queue.pop_front() {
        let Some(bomb) = state.bombs.get_mut(&bomb_id) else {
            continue;
        };
        bomb.detonated = true;
        let (owner, origin, range) = (bomb.owner, bomb.position, bomb.range);

        let tiles = blast_tiles(&state.board, origin, range);
        debug!(bomb_id, %origin, tiles = tiles.len(), "bomb exploded");
        let event = GameEvent::bomb_exploded(state.tick, owner, bomb_id, origin, tiles.len() as u32);
        state.push_event(event);

        // Chain: live bombs inside this blast go off too
        for (other_id, other) in &state.bombs {
            if !other.detonated && !queued.contains(other_id) && tiles.contains(&other.position) {
                queue.push_back(*other_id);
                queued.insert(*other_id);
            }
        }

        blast.extend(tiles, Some(owner));
    }

    if !blast.is_empty() {
        apply_blast(state, &blast);
    }

    blast
}

/// Apply a blast to the world.
///
/// Players on covered tiles are eliminated (each at most once). Flags on
/// covered tiles are destroyed, and when a destroy reports an owner that
/// owner is eliminated as well.
pub fn apply_blast(state: &mut MatchState, blast: &Blast) {
    let tick = state.tick;

    // Players in the blast (sorted by ID)
    let caught: Vec<(PlayerId, Option<PlayerId>)> = state
        .players
        .iter()
        .filter(|(_, p)| p.alive)
        .filter_map(|(id, p)| blast.tiles.get(&p.position).map(|credit| (*id, *credit)))
        .collect();

    // Flags in the blast (sorted by item ID)
    let flag_ids: Vec<ItemId> = flags_covered(&state.board, blast);

    for (victim, killer) in caught {
        if state.eliminate_player(&victim, killer) {
            info!(%victim, "player caught in blast");
            state.push_event(GameEvent::player_eliminated(tick, victim, killer, EliminationCause::Blast));
        }
    }

    for item_id in flag_ids {
        let Some(flag) = state.board.flag_mut(item_id) else {
            continue;
        };
        let team = flag.team();
        let position = flag.position();
        let owner = flag.destroy();
        info!(?team, %position, "flag destroyed");
        state.push_event(GameEvent::flag_destroyed(tick, team, owner, position));

        if let Some(owner) = owner {
            if state.eliminate_player(&owner, None) {
                info!(%owner, ?team, "flag owner eliminated");
                state.push_event(GameEvent::player_eliminated(tick, owner, None, EliminationCause::FlagDestroyed));
            }
        }
    }
}

/// Item IDs of intact flags lying on covered tiles.
fn flags_covered(board: &Board, blast: &Blast) -> Vec<ItemId> {
    board
        .items()
        .iter()
        .filter_map(|(id, item)| match item {
            Item::Flag(flag) if !flag.is_destroyed() && blast.covers(flag.position()) => Some(*id),
            _ => None,
        })
        .collect()
}
