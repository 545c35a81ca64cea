//! Blast CTF Demo
//!
//! Runs a scripted hot-seat match on a small arena, then replays the
//! recorded inputs and checks the final state hash matches.
//!
//! Usage: `blast-ctf [config.json]`

use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use blast_ctf::{
    TICK_RATE, VERSION,
    core::grid::{Direction, GridPos},
    game::{
        board::Board,
        config::CtfConfig,
        ctf::{replay_match, CtfGame},
        events::GameEventData,
        input::{InputFrame, PlayerInputBuffer},
        state::{PlayerId, Team},
    },
};

const ARENA: [&str; 5] = [
    "#########",
    "#.......#",
    "#.#.#.#.#",
    "#.......#",
    "#########",
];

const BLUE_SPAWN: GridPos = GridPos::new(1, 1);
const RED_SPAWN: GridPos = GridPos::new(5, 3);
const BLUE_BASE: GridPos = GridPos::new(1, 1);
const RED_BASE: GridPos = GridPos::new(7, 3);

/// Give up on the demo after this many ticks.
const MAX_TICKS: u32 = 10_000;

fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    info!("Blast CTF v{}", VERSION);
    info!("Tick Rate: {} Hz", TICK_RATE);

    let config = match std::env::args().nth(1) {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {path}"))?;
            CtfConfig::from_json_str(&raw).with_context(|| format!("parsing config {path}"))?
        }
        None => CtfConfig::default(),
    };
    info!("Score to win: {}", config.score_to_win);

    demo_match(config)
}

/// Blue's route: out along the top corridor, down to the red base, back home.
fn blue_route(step: u32) -> Direction {
    const ROUTE: [(Direction, u32); 4] = [
        (Direction::Right, 6),
        (Direction::Down, 2),
        (Direction::Up, 2),
        (Direction::Left, 6),
    ];
    let cycle: u32 = ROUTE.iter().map(|(_, n)| n).sum();

    let mut offset = step % cycle;
    for (dir, count) in ROUTE {
        if offset < count {
            return dir;
        }
        offset -= count;
    }
    Direction::Right
}

fn setup(match_id: [u8; 16], config: CtfConfig) -> Result<CtfGame> {
    let board = Board::from_rows(&ARENA)?;
    let mut game = CtfGame::new(match_id, board, config)?;
    game.add_player(Team::Blue, BLUE_SPAWN)?;
    game.add_player(Team::Red, RED_SPAWN)?;
    game.place_flag(Team::Blue, BLUE_BASE)?;
    game.place_flag(Team::Red, RED_BASE)?;
    Ok(game)
}

/// Demo function to exercise the simulation.
fn demo_match(config: CtfConfig) -> Result<()> {
    info!("=== Starting Demo Match ===");

    let match_id = uuid::Uuid::new_v4().into_bytes();
    info!("Match ID: {}", hex::encode(match_id));

    let mut game = setup(match_id, config)?;
    let initial = game.clone();
    game.start();

    let blue = Team::Blue.player_slot();
    let red = Team::Red.player_slot();
    let mut recordings: BTreeMap<PlayerId, PlayerInputBuffer> = [blue, red]
        .into_iter()
        .map(|id| (id, PlayerInputBuffer::new(id, match_id)))
        .collect();

    let mut total_events = 0;
    while !game.is_game_over() {
        let tick = game.tick();
        if tick >= MAX_TICKS {
            bail!("no winner after {MAX_TICKS} ticks");
        }

        let mut inputs = BTreeMap::new();
        inputs.insert(blue, InputFrame::with_direction(blue_route(tick)));
        inputs.insert(red, InputFrame::new());
        for (id, frame) in &inputs {
            if let Some(buffer) = recordings.get_mut(id) {
                buffer.record(tick, *frame);
            }
        }

        let result = game.update(&inputs);
        total_events += result.events.len();

        for event in &result.events {
            match &event.data {
                GameEventData::FlagPickedUp { player_id, team, position } => {
                    info!("Tick {}: {} picked up the {:?} flag at {}", event.tick, player_id, team, position);
                }
                GameEventData::FlagCaptured { player_id, new_score, .. } => {
                    info!("Tick {}: {} captured! Score {}", event.tick, player_id, new_score);
                }
                _ => {}
            }
        }
    }

    // Print final results
    info!("=== Match Results ===");
    if let Some(outcome) = game.outcome() {
        info!(
            "{:?} wins {}-{} at tick {}",
            outcome.winning_team, outcome.blue_score, outcome.red_score, outcome.tick
        );
    }
    let snapshot = game.snapshot();
    info!("Final State Hash: {}", snapshot.hash_hex());
    info!("Snapshot: {} entities, {} bytes", snapshot.entities.len(), snapshot.to_bytes()?.len());
    info!("Total events: {}", total_events);

    let end_tick = game.tick();
    for buffer in recordings.values_mut() {
        buffer.finalize(end_tick);
        info!(
            "{}: {} input deltas over {} ticks, hash {}",
            buffer.player_id,
            buffer.delta_count(),
            end_tick,
            hex::encode(buffer.compute_hash())
        );
    }

    // Verify determinism by replaying
    info!("=== Verifying Determinism ===");
    let (replayed, _) = replay_match(initial, &recordings, end_tick);
    let replay_hash = replayed.compute_hash();
    info!("Replay State Hash: {}", hex::encode(replay_hash));

    if replay_hash != game.compute_hash() {
        bail!("DETERMINISM FAILURE: hashes differ");
    }
    info!("DETERMINISM VERIFIED: Hashes match!");
    Ok(())
}
