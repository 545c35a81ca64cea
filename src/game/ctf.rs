//! Capture-the-Flag Controller
//!
//! Per-tick orchestration of the objective mode. Owns the world state,
//! both flags and both scores, and drives every flag transition in a
//! fixed order so same-tick interactions always resolve the same way.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::grid::GridPos;
use crate::core::hash::{StateHash, compute_state_hash};
use crate::game::board::{Board, BoardError, Item, ItemId};
use crate::game::config::{ConfigError, CtfConfig};
use crate::game::entity::{Entity, ObjectiveObject};
use crate::game::events::GameEvent;
use crate::game::flag::{Flag, FlagError};
use crate::game::input::{InputFrame, PlayerInputBuffer};
use crate::game::snapshot::RenderSnapshot;
use crate::game::state::{MatchPhase, MatchState, PlayerId, PlayerState, Team};
use crate::game::tick::advance_world;

/// Controller setup errors.
#[derive(Debug, Error)]
pub enum CtfError {
    /// Bad configuration.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Bad placement on the board.
    #[error("board error: {0}")]
    Board(#[from] BoardError),

    /// Refused flag transition.
    #[error("flag error: {0}")]
    Flag(#[from] FlagError),

    /// The team already has its player.
    #[error("{0:?} already has a player")]
    TeamTaken(Team),

    /// The team already has its flag.
    #[error("{0:?} flag already placed")]
    FlagAlreadyPlaced(Team),

    /// Setup after the match started.
    #[error("match already started")]
    AlreadyStarted,
}

/// Final result of a match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// Team that reached the score limit
    pub winning_team: Team,
    /// That team's player
    pub winner: Option<PlayerId>,
    /// Final blue score
    pub blue_score: u32,
    /// Final red score
    pub red_score: u32,
    /// Tick the limit was reached
    pub tick: u32,
}

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated this tick
    pub events: Vec<GameEvent>,
    /// Whether the match is over
    pub match_ended: bool,
    /// Outcome once the match is over
    pub outcome: Option<MatchOutcome>,
}

/// A capture-the-flag match.
///
/// Player 1 plays Blue, player 2 plays Red. Either player and either flag
/// may be absent; every check treats a missing piece as a no-op.
#[derive(Clone, Debug)]
pub struct CtfGame {
    state: MatchState,
    config: CtfConfig,
    player1: Option<PlayerId>,
    player2: Option<PlayerId>,
    blue_flag: Option<ItemId>,
    red_flag: Option<ItemId>,
    blue_score: u32,
    red_score: u32,
    /// Tick at which each destroyed flag comes back
    respawn_at: BTreeMap<Team, u32>,
    outcome: Option<MatchOutcome>,
}

impl CtfGame {
    /// Create a match on `board`. Players and flags are added afterwards.
    pub fn new(match_id: [u8; 16], board: Board, config: CtfConfig) -> Result<Self, CtfError> {
        config.validate()?;
        Ok(Self {
            state: MatchState::new(match_id, board),
            config,
            player1: None,
            player2: None,
            blue_flag: None,
            red_flag: None,
            blue_score: 0,
            red_score: 0,
            respawn_at: BTreeMap::new(),
            outcome: None,
        })
    }

    // =========================================================================
    // Setup
    // =========================================================================

    /// Spawn the player for `team` on `position`.
    ///
    /// The player becomes the owner of the team's flag if it is already
    /// placed.
    pub fn add_player(&mut self, team: Team, position: GridPos) -> Result<PlayerId, CtfError> {
        self.ensure_waiting()?;
        if self.player_id(team).is_some() {
            return Err(CtfError::TeamTaken(team));
        }

        let id = team.player_slot();
        let mut player = PlayerState::new(id, team, position);
        player.bomb_capacity = self.config.bomb_capacity;
        player.blast_range = self.config.blast_range;
        self.state.add_player(player)?;

        match team {
            Team::Blue => self.player1 = Some(id),
            Team::Red => self.player2 = Some(id),
        }
        if let Some(flag) = self.flag_mut(team) {
            flag.set_owner(Some(id));
        }

        info!(player = %id, ?team, %position, "player added");
        Ok(id)
    }

    /// Place the flag for `team` with its base on `base`.
    pub fn place_flag(&mut self, team: Team, base: GridPos) -> Result<ItemId, CtfError> {
        self.ensure_waiting()?;
        if self.flag_id(team).is_some() {
            return Err(CtfError::FlagAlreadyPlaced(team));
        }

        let mut flag = Flag::new(team, base);
        flag.set_owner(self.player_id(team));
        let id = self.state.board.insert_item(Item::Flag(flag))?;

        match team {
            Team::Blue => self.blue_flag = Some(id),
            Team::Red => self.red_flag = Some(id),
        }

        info!(?team, %base, "flag placed");
        Ok(id)
    }

    /// Begin play.
    pub fn start(&mut self) {
        if self.state.phase == MatchPhase::Waiting {
            self.state.phase = MatchPhase::Playing;
            info!(
                blue = ?self.player1,
                red = ?self.player2,
                score_to_win = self.config.score_to_win,
                "match started"
            );
        }
    }

    fn ensure_waiting(&self) -> Result<(), CtfError> {
        if self.state.phase == MatchPhase::Waiting {
            Ok(())
        } else {
            Err(CtfError::AlreadyStarted)
        }
    }

    // =========================================================================
    // Tick
    // =========================================================================

    /// Run one tick.
    ///
    /// # Order
    ///
    /// 1. Base world update (movement, bombs, blasts, power-ups)
    /// 2. Respawn destroyed flags whose timer ran out
    /// 3. Capture check
    /// 4. Carrier-death check
    /// 5. Pickup check
    /// 6. Win check
    ///
    /// Capture runs before pickup so a new pickup can never overwrite a
    /// carrier that is scoring this tick; carrier death runs before pickup
    /// so a dead carrier's flag is repickable on the same tick.
    pub fn update(&mut self, inputs: &BTreeMap<PlayerId, InputFrame>) -> TickResult {
        let mut result = TickResult::default();

        match self.state.phase {
            MatchPhase::Waiting => return result,
            MatchPhase::Ended => {
                result.match_ended = true;
                result.outcome = self.outcome.clone();
                return result;
            }
            MatchPhase::Playing => {}
        }

        // Flags destroyed between ticks count from the tick they went down
        self.schedule_respawns();

        // 1. Base world update
        advance_world(&mut self.state, inputs, &self.config);

        // 2. Respawns
        self.process_flag_respawns();

        // 3. Captures
        self.check_captures();

        // 4. Carrier deaths
        self.check_carrier_deaths();

        // 5. Pickups
        self.check_pickups();

        // 6. Win condition
        self.check_win(&mut result);

        result.events = self.state.take_events();
        result
    }

    /// Start the respawn timer of every destroyed flag that has none yet.
    ///
    /// The timer counts from the current tick, i.e. the tick the flag was
    /// destroyed on.
    fn schedule_respawns(&mut self) {
        let tick = self.state.tick;
        let Some(delay) = self.config.flag_respawn_ticks else {
            return;
        };

        for team in Team::ALL {
            if self.flag(team).is_some_and(Flag::is_destroyed) {
                self.respawn_at.entry(team).or_insert(tick.saturating_add(delay));
            } else {
                self.respawn_at.remove(&team);
            }
        }
    }

    /// Put destroyed flags back once their timer is up.
    fn process_flag_respawns(&mut self) {
        // Picks up flags destroyed during this tick's world update
        self.schedule_respawns();
        let tick = self.state.tick;

        for team in Team::ALL {
            let Some(&due) = self.respawn_at.get(&team) else {
                continue;
            };
            if tick < due {
                continue;
            }

            self.respawn_at.remove(&team);
            if let Some(flag) = self.flag_mut(team) {
                flag.return_to_base();
                let base = flag.base();
                info!(?team, %base, "flag respawned");
                self.state.push_event(GameEvent::flag_respawned(tick, team, base));
            }
        }
    }

    /// Score for every player carrying the opponent's flag onto their own base.
    fn check_captures(&mut self) {
        let tick = self.state.tick;

        for team in Team::ALL {
            let Some(player_id) = self.player_id(team) else {
                continue;
            };
            // Liveness is not checked: capture runs before carrier death, so a
            // carrier eliminated on their own base this tick still scores.
            let Some(position) = self.state.get_player(&player_id).map(|p| p.position) else {
                continue;
            };

            // Own base comes from the own flag, not the carried one
            let Some(own_base) = self.flag(team).map(Flag::base) else {
                continue;
            };
            let carrying = self
                .flag(team.opponent())
                .is_some_and(|f| f.carrier() == Some(player_id));
            if !carrying || position != own_base {
                continue;
            }

            let new_score = {
                let score = self.score_mut(team);
                *score = score.saturating_add(1);
                *score
            };
            if let Some(flag) = self.flag_mut(team.opponent()) {
                flag.return_to_base();
            }
            if let Some(player) = self.state.get_player_mut(&player_id) {
                player.captures += 1;
            }

            info!(player = %player_id, ?team, new_score, "flag captured");
            self.state.push_event(GameEvent::flag_captured(
                tick,
                player_id,
                team.opponent(),
                team,
                new_score,
            ));
        }
    }

    /// Drop flags whose carrier is dead (or gone).
    fn check_carrier_deaths(&mut self) {
        let tick = self.state.tick;

        for team in Team::ALL {
            let Some(carrier) = self.flag(team).and_then(Flag::carrier) else {
                continue;
            };
            if self.state.is_alive(&carrier) {
                continue;
            }

            let Some(flag) = self.flag_mut(team) else {
                continue;
            };
            flag.drop();
            let position = flag.position();

            info!(player = %carrier, ?team, %position, "flag dropped");
            self.state.push_event(GameEvent::flag_dropped(tick, carrier, team, position));
        }
    }

    /// Hand each loose flag to the first living player standing on it.
    ///
    /// Either team may pick up either flag.
    fn check_pickups(&mut self) {
        let tick = self.state.tick;
        let mut events = Vec::new();

        for team in Team::ALL {
            let Some(flag_id) = self.flag_id(team) else {
                continue;
            };
            let MatchState { players, board, .. } = &mut self.state;
            let Some(flag) = board.flag_mut(flag_id) else {
                continue;
            };
            if flag.is_picked_up() || flag.is_destroyed() {
                continue;
            }

            let position = flag.position();
            let Some(player) = players.values().find(|p| p.alive && p.position == position) else {
                continue;
            };

            match flag.pick_up(player) {
                Ok(()) => {
                    debug!(player = %player.id, ?team, %position, "flag picked up");
                    events.push(GameEvent::flag_picked_up(tick, player.id, team, position));
                }
                Err(err) => warn!(player = %player.id, ?team, %err, "pickup refused"),
            }
        }

        for event in events {
            self.state.push_event(event);
        }
    }

    /// End the match on the tick a score first reaches the limit.
    ///
    /// If both teams reach it on the same tick, Blue is checked first.
    fn check_win(&mut self, result: &mut TickResult) {
        let winning_team = Team::ALL
            .into_iter()
            .find(|team| self.score(*team) >= self.config.score_to_win);
        let Some(winning_team) = winning_team else {
            return;
        };

        let tick = self.state.tick;
        let winner = self.player_id(winning_team);
        let outcome = MatchOutcome {
            winning_team,
            winner,
            blue_score: self.blue_score,
            red_score: self.red_score,
            tick,
        };

        self.state.phase = MatchPhase::Ended;
        self.outcome = Some(outcome.clone());
        self.state.push_event(GameEvent::match_ended(tick, winner, winning_team));

        info!(
            ?winning_team,
            blue = self.blue_score,
            red = self.red_score,
            tick,
            "match ended"
        );

        result.match_ended = true;
        result.outcome = Some(outcome);
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Blue team score.
    pub fn blue_score(&self) -> u32 {
        self.blue_score
    }

    /// Red team score.
    pub fn red_score(&self) -> u32 {
        self.red_score
    }

    /// Score of `team`.
    pub fn score(&self, team: Team) -> u32 {
        match team {
            Team::Blue => self.blue_score,
            Team::Red => self.red_score,
        }
    }

    fn score_mut(&mut self, team: Team) -> &mut u32 {
        match team {
            Team::Blue => &mut self.blue_score,
            Team::Red => &mut self.red_score,
        }
    }

    /// Captures needed to win.
    pub fn score_to_win(&self) -> u32 {
        self.config.score_to_win
    }

    /// Active configuration.
    pub fn config(&self) -> &CtfConfig {
        &self.config
    }

    /// Player slot for `team`, if present.
    pub fn player_id(&self, team: Team) -> Option<PlayerId> {
        match team {
            Team::Blue => self.player1,
            Team::Red => self.player2,
        }
    }

    /// Player state for `team`, if present.
    pub fn player(&self, team: Team) -> Option<&PlayerState> {
        self.player_id(team).and_then(|id| self.state.get_player(&id))
    }

    /// Board item ID of `team`'s flag.
    pub fn flag_id(&self, team: Team) -> Option<ItemId> {
        match team {
            Team::Blue => self.blue_flag,
            Team::Red => self.red_flag,
        }
    }

    /// `team`'s flag, if placed.
    pub fn flag(&self, team: Team) -> Option<&Flag> {
        self.flag_id(team).and_then(|id| self.state.board.flag(id))
    }

    /// `team`'s flag, mutably.
    pub fn flag_mut(&mut self, team: Team) -> Option<&mut Flag> {
        self.flag_id(team).and_then(|id| self.state.board.flag_mut(id))
    }

    /// Has a team reached the score limit?
    pub fn is_game_over(&self) -> bool {
        self.state.phase == MatchPhase::Ended
    }

    /// Outcome once the match is over.
    pub fn outcome(&self) -> Option<&MatchOutcome> {
        self.outcome.as_ref()
    }

    /// Winning player once the match is over.
    pub fn winner(&self) -> Option<PlayerId> {
        self.outcome.as_ref().and_then(|o| o.winner)
    }

    /// Current tick.
    pub fn tick(&self) -> u32 {
        self.state.tick
    }

    /// World state.
    pub fn state(&self) -> &MatchState {
        &self.state
    }

    /// World state, mutably (for the explosion/collision collaborator).
    pub fn state_mut(&mut self) -> &mut MatchState {
        &mut self.state
    }

    /// Hash of world and objective state.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.state.tick, &self.state.match_id, |hasher| {
            self.state.hash_into(hasher);
            hasher.update_u32(self.blue_score);
            hasher.update_u32(self.red_score);
            hasher.update_bool(self.is_game_over());
            for (team, due) in &self.respawn_at {
                hasher.update_u8(*team as u8);
                hasher.update_u32(*due);
            }
        })
    }

    /// Read-only copy for the renderer.
    pub fn snapshot(&self) -> RenderSnapshot {
        let mut entities: Vec<_> = self
            .state
            .players
            .values()
            .filter_map(|p| p.render())
            .collect();
        entities.extend(self.state.bombs.values().filter_map(|b| b.render()));
        entities.extend(self.state.board.items().values().filter_map(|i| i.render()));

        RenderSnapshot {
            tick: self.state.tick,
            phase: self.state.phase,
            width: self.state.board.width(),
            height: self.state.board.height(),
            blue_score: self.blue_score,
            red_score: self.red_score,
            entities,
            outcome: self.outcome.clone(),
            state_hash: self.compute_hash(),
        }
    }
}

/// Replay a match from recorded inputs.
///
/// `initial` must be a freshly set-up game (players and flags placed).
/// Inputs are looked up by the tick the game is at before each update.
pub fn replay_match(
    initial: CtfGame,
    player_inputs: &BTreeMap<PlayerId, PlayerInputBuffer>,
    tick_count: u32,
) -> (CtfGame, Vec<GameEvent>) {
    let mut game = initial;
    let mut all_events = Vec::new();
    game.start();

    for _ in 0..tick_count {
        let tick = game.tick();
        let inputs: BTreeMap<PlayerId, InputFrame> = player_inputs
            .iter()
            .map(|(id, buffer)| (*id, buffer.get_input_at(tick)))
            .collect();

        let result = game.update(&inputs);
        all_events.extend(result.events);

        if result.match_ended {
            break;
        }
    }

    (game, all_events)
}
