//! World Simulation Tick
//!
//! The base world update that runs underneath the objective controller:
//! movement, bombs, blasts and power-ups. Must be 100% deterministic.

use std::collections::BTreeMap;

#[cfg(feature = "debug-tracing")]
use tracing::trace;
use tracing::debug;

use crate::core::grid::GridPos;
use crate::game::board::Item;
use crate::game::collision::detonate_ready_bombs;
use crate::game::config::CtfConfig;
use crate::game::entity::{Entity, UpdateContext};
use crate::game::events::GameEvent;
use crate::game::input::InputFrame;
use crate::game::state::{MatchState, PlayerId};

/// Run one world tick.
///
/// # Order
///
/// 1. Advance tick counter
/// 2. Apply inputs (bomb placement, then one-tile movement)
/// 3. Update entities (bomb fuses, flags follow their carriers)
/// 4. Detonate bombs and resolve blasts
/// 5. Collect power-ups
/// 6. Sweep removed entities
///
/// # Determinism
///
/// Players, bombs and items all live in BTreeMaps, so every loop runs
/// in sorted key order.
pub fn advance_world(
    state: &mut MatchState,
    inputs: &BTreeMap<PlayerId, InputFrame>,
    config: &CtfConfig,
) {
    // 1. Advance tick counter
    state.tick += 1;

    // 2. Apply player inputs
    apply_inputs(state, inputs, config);

    // 3. Update entities
    update_entities(state);

    // 4. Bombs and blasts
    detonate_ready_bombs(state);

    // 5. Power-ups
    collect_power_ups(state, config);

    // 6. Sweep
    state.bombs.retain(|_, bomb| !bomb.should_remove());
    state.board.sweep_removed();

    #[cfg(feature = "debug-tracing")]
    trace!(
        tick = state.tick,
        alive = state.alive_player_count(),
        bombs = state.bombs.len(),
        items = state.board.items().len(),
        "world tick"
    );
}

/// Apply player inputs to their states.
fn apply_inputs(state: &mut MatchState, inputs: &BTreeMap<PlayerId, InputFrame>, config: &CtfConfig) {
    // BTreeMap iterates in sorted key order - DETERMINISTIC
    for (player_id, input) in inputs {
        let Some(player) = state.players.get(player_id) else {
            continue;
        };
        if !player.alive {
            continue;
        }
        let (position, capacity, range) = (player.position, player.bomb_capacity, player.blast_range);

        // Bomb goes on the tile the player is leaving
        if input.bomb_pressed()
            && state.active_bombs_of(*player_id) < capacity
            && !state.bomb_at(position)
        {
            let bomb_id = state.spawn_bomb(*player_id, position, config.bomb_fuse_ticks, range);
            if let Some(player) = state.players.get_mut(player_id) {
                player.bombs_placed += 1;
            }
            debug!(player = %player_id, bomb_id, %position, "bomb placed");
            state.push_event(GameEvent::bomb_placed(state.tick, *player_id, bomb_id, position));
        }

        if let Some(dir) = input.move_direction() {
            if let Some(target) = position.step(dir).filter(|t| can_enter(state, *t)) {
                if let Some(player) = state.players.get_mut(player_id) {
                    player.position = target;
                }
            }
        }
    }
}

/// Walkable and not occupied by a bomb.
fn can_enter(state: &MatchState, pos: GridPos) -> bool {
    state.board.is_walkable(pos) && !state.bomb_at(pos)
}

/// Run per-entity updates: fuses tick down, carried flags follow.
fn update_entities(state: &mut MatchState) {
    let ctx = UpdateContext {
        tick: state.tick,
        players: &state.players,
    };

    for bomb in state.bombs.values_mut() {
        bomb.update(&ctx);
    }
    state.board.update_items(&ctx);
}

/// Living players pick up power-ups on their tile.
fn collect_power_ups(state: &mut MatchState, config: &CtfConfig) {
    let tick = state.tick;
    let mut events = Vec::new();

    let MatchState { players, board, .. } = state;
    for (player_id, player) in players.iter_mut() {
        if !player.alive {
            continue;
        }
        for item_id in board.items_at(player.position) {
            let Some(power_up) = board.item_mut(item_id).and_then(Item::as_power_up_mut) else {
                continue;
            };
            if power_up.collected {
                continue;
            }
            power_up.collect(player, config.max_bomb_capacity, config.max_blast_range);
            events.push(GameEvent::power_up_collected(tick, *player_id, power_up.kind));
        }
    }

    for event in events {
        state.push_event(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grid::Direction;
    use crate::game::board::Board;
    use crate::game::events::GameEventData;
    use crate::game::flag::Flag;
    use crate::game::entity::ObjectiveObject;
    use crate::game::powerup::{PowerUp, PowerUpKind};
    use crate::game::state::{PlayerState, Team};

    fn test_state() -> MatchState {
        let board = Board::from_rows(&[
            "#######",
            "#.....#",
            "#.#.#.#",
            "#.....#",
            "#######",
        ]).unwrap();
        let mut state = MatchState::new([0; 16], board);
        state
            .add_player(PlayerState::new(PlayerId::new(1), Team::Blue, GridPos::new(1, 1)))
            .unwrap();
        state
            .add_player(PlayerState::new(PlayerId::new(2), Team::Red, GridPos::new(5, 3)))
            .unwrap();
        state
    }

    fn input(id: u8, frame: InputFrame) -> BTreeMap<PlayerId, InputFrame> {
        let mut inputs = BTreeMap::new();
        inputs.insert(PlayerId::new(id), frame);
        inputs
    }

    #[test]
    fn test_player_movement() {
        let mut state = test_state();
        let config = CtfConfig::default();

        advance_world(&mut state, &input(1, InputFrame::with_direction(Direction::Right)), &config);
        assert_eq!(state.players[&PlayerId::new(1)].position, GridPos::new(2, 1));
        assert_eq!(state.tick, 1);
    }

    #[test]
    fn test_walls_block_movement() {
        let mut state = test_state();
        let config = CtfConfig::default();

        advance_world(&mut state, &input(1, InputFrame::with_direction(Direction::Up)), &config);
        assert_eq!(state.players[&PlayerId::new(1)].position, GridPos::new(1, 1));
    }

    #[test]
    fn test_dead_players_do_not_move() {
        let mut state = test_state();
        let config = CtfConfig::default();
        state.eliminate_player(&PlayerId::new(1), None);

        advance_world(&mut state, &input(1, InputFrame::with_direction(Direction::Right)), &config);
        assert_eq!(state.players[&PlayerId::new(1)].position, GridPos::new(1, 1));
    }

    #[test]
    fn test_bomb_placement_respects_capacity() {
        let mut state = test_state();
        let config = CtfConfig::default();

        let mut frame = InputFrame::with_direction(Direction::Right);
        frame.set_bomb(true);
        advance_world(&mut state, &input(1, frame), &config);
        advance_world(&mut state, &input(1, frame), &config);

        assert_eq!(state.bombs.len(), 1, "Capacity is one bomb");
        assert_eq!(state.bombs[&0].position, GridPos::new(1, 1));
        assert_eq!(state.players[&PlayerId::new(1)].position, GridPos::new(3, 1));
    }

    #[test]
    fn test_bombs_block_movement() {
        let mut state = test_state();
        let config = CtfConfig::default();
        state.spawn_bomb(PlayerId::new(2), GridPos::new(2, 1), 100, 1);

        advance_world(&mut state, &input(1, InputFrame::with_direction(Direction::Right)), &config);
        assert_eq!(state.players[&PlayerId::new(1)].position, GridPos::new(1, 1));
    }

    #[test]
    fn test_bomb_explodes_after_fuse() {
        let mut state = test_state();
        let config = CtfConfig {
            bomb_fuse_ticks: 3,
            ..CtfConfig::default()
        };

        // Place a bomb and walk away down the left column
        let mut place = InputFrame::with_direction(Direction::Down);
        place.set_bomb(true);
        advance_world(&mut state, &input(1, place), &config);
        advance_world(&mut state, &input(1, InputFrame::with_direction(Direction::Down)), &config);
        assert_eq!(state.bombs.len(), 1);

        advance_world(&mut state, &BTreeMap::new(), &config);
        assert!(state.bombs.is_empty(), "Detonated bombs are swept");

        // (1, 3) is two tiles below the bomb: inside range 2
        assert!(!state.is_alive(&PlayerId::new(1)));
        let events = state.take_events();
        assert!(events.iter().any(|e| matches!(e.data, GameEventData::BombExploded { .. })));
    }

    #[test]
    fn test_carried_flag_follows_after_move() {
        let mut state = test_state();
        let config = CtfConfig::default();
        let flag_id = state
            .board
            .insert_item(Item::Flag(Flag::new(Team::Red, GridPos::new(1, 1))))
            .unwrap();
        let carrier = state.players[&PlayerId::new(1)].clone();
        state.board.flag_mut(flag_id).unwrap().pick_up(&carrier).unwrap();

        advance_world(&mut state, &input(1, InputFrame::with_direction(Direction::Right)), &config);
        assert_eq!(state.board.flag(flag_id).unwrap().position(), GridPos::new(2, 1));
    }

    #[test]
    fn test_power_up_collected_and_swept() {
        let mut state = test_state();
        let config = CtfConfig::default();
        state
            .board
            .insert_item(Item::PowerUp(PowerUp::new(PowerUpKind::ExtraBomb, GridPos::new(2, 1))))
            .unwrap();

        advance_world(&mut state, &input(1, InputFrame::with_direction(Direction::Right)), &config);

        assert_eq!(state.players[&PlayerId::new(1)].bomb_capacity, 2);
        assert!(state.board.items().is_empty());
    }
}
