//! Tick throughput and replay benchmarks.

use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use blast_ctf::{
    core::grid::{Direction, GridPos},
    game::{
        board::Board,
        config::CtfConfig,
        ctf::{replay_match, CtfGame},
        input::{InputFrame, PlayerInputBuffer},
        state::{PlayerId, Team},
    },
};

fn arena_game() -> CtfGame {
    let board = Board::from_rows(&[
        "#############",
        "#...........#",
        "#.#.#.#.#.#.#",
        "#...........#",
        "#.#.#.#.#.#.#",
        "#...........#",
        "#############",
    ])
    .unwrap();
    let config = CtfConfig {
        score_to_win: u32::MAX,
        ..CtfConfig::default()
    };
    let mut game = CtfGame::new([7; 16], board, config).unwrap();
    game.add_player(Team::Blue, GridPos::new(1, 1)).unwrap();
    game.add_player(Team::Red, GridPos::new(11, 5)).unwrap();
    game.place_flag(Team::Blue, GridPos::new(1, 1)).unwrap();
    game.place_flag(Team::Red, GridPos::new(11, 5)).unwrap();
    game
}

/// Deterministic wandering with the occasional bomb.
fn scripted_input(tick: u32, player: u8) -> InputFrame {
    let mut frame = InputFrame::with_direction(Direction::ALL[((tick / 5 + player as u32) % 4) as usize]);
    frame.set_bomb(tick % 97 == player as u32);
    frame
}

fn recorded_inputs(ticks: u32) -> BTreeMap<PlayerId, PlayerInputBuffer> {
    [Team::Blue, Team::Red]
        .into_iter()
        .map(|team| {
            let id = team.player_slot();
            let mut buffer = PlayerInputBuffer::new(id, [7; 16]);
            for tick in 0..ticks {
                buffer.record(tick, scripted_input(tick, id.slot()));
            }
            buffer.finalize(ticks);
            (id, buffer)
        })
        .collect()
}

fn bench_tick(c: &mut Criterion) {
    c.bench_function("ctf_update_600_ticks", |b| {
        b.iter(|| {
            let mut game = arena_game();
            game.start();
            for tick in 0..600 {
                let inputs: BTreeMap<_, _> = [Team::Blue, Team::Red]
                    .into_iter()
                    .map(|t| (t.player_slot(), scripted_input(tick, t.player_slot().slot())))
                    .collect();
                black_box(game.update(&inputs));
            }
            black_box(game.compute_hash())
        })
    });
}

fn bench_replay(c: &mut Criterion) {
    let recordings = recorded_inputs(600);
    c.bench_function("replay_600_ticks", |b| {
        b.iter(|| {
            let (game, events) = replay_match(arena_game(), &recordings, 600);
            black_box((game.compute_hash(), events.len()))
        })
    });
}

criterion_group!(benches, bench_tick, bench_replay);
criterion_main!(benches);
