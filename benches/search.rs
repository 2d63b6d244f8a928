use criterion::{criterion_group, criterion_main, Criterion};
use search_2048::engine::{self, Board, Direction};
use search_2048::game::GameEngine;
use search_2048::heuristic::Heuristic;
use search_2048::search::{Expectimax, Minimax, RandomTrials, Strategy, DEFAULT_TRIALS};
use search_2048::spawner::TileSpawner;
use std::hint::black_box;

fn corpus() -> Vec<Board> {
    engine::warm();
    let mut spawner = TileSpawner::new(7777);
    let mut boards = Vec::new();
    let mut b = Board::EMPTY;
    for _ in 0..2 {
        let exponent = spawner.random_tile_value();
        b = spawner.add_random_tile(b, exponent);
    }
    boards.push(b);
    for i in 0..64 {
        let dir = Direction::ALL[i % 4];
        let nb = b.shift(dir);
        if nb != b {
            let exponent = spawner.random_tile_value();
            b = spawner.add_random_tile(nb, exponent);
        }
        if b.is_game_over() {
            break;
        }
        boards.push(b);
    }
    boards
}

fn bench_best_move(c: &mut Criterion) {
    let boards = corpus();
    let mut ex = Expectimax::new(3, Heuristic::Corner);
    c.bench_function("expectimax/depth3", |bch| {
        bch.iter(|| {
            let mut acc = 0u8;
            for &bd in &boards {
                acc ^= ex.pick_move(bd).index();
            }
            black_box(acc)
        })
    });

    let mut rt = RandomTrials::new(3, DEFAULT_TRIALS, 7, Heuristic::Corner);
    c.bench_function("random_trials/depth3", |bch| {
        bch.iter(|| {
            let mut acc = 0u8;
            for &bd in &boards {
                acc ^= rt.pick_move(bd).index();
            }
            black_box(acc)
        })
    });

    let mut mm = Minimax::new(3, Heuristic::Corner);
    c.bench_function("minimax/depth3", |bch| {
        bch.iter(|| {
            let mut acc = 0u8;
            for &bd in &boards {
                acc ^= mm.pick_move(bd).index();
            }
            black_box(acc)
        })
    });
}

fn bench_e2e(c: &mut Criterion) {
    let mut group = c.benchmark_group("e2e");
    group.sample_size(10);
    group.bench_function("expectimax_depth2_game", |bch| {
        let mut ex = Expectimax::new(2, Heuristic::Corner);
        bch.iter(|| {
            let outcome = GameEngine::new(13).play_one_game(&mut ex).map(|o| o.score());
            black_box(outcome.ok())
        })
    });
    group.finish();
}

criterion_group!(search, bench_best_move, bench_e2e);
criterion_main!(search);
