//! Sampled search: a move is judged by a few random spawns instead of every one.

use std::sync::Arc;

use super::{from_merit, leaf_merit, Merit, SearchResult, Strategy};
use crate::engine::{self, Board, Direction};
use crate::heuristic::Evaluator;
use crate::spawner::TileSpawner;

/// Spawns sampled per move when none is configured.
pub const DEFAULT_TRIALS: u32 = 5;

/// Depth-limited search that averages `trials` sampled spawns per move.
///
/// Leaves, dead boards and ties are handled as in [`super::Search`]. The
/// samples come from a private seeded [`TileSpawner`], so a strategy built
/// with the same seed replays the same choices.
///
/// ```
/// use search_2048::engine::Board;
/// use search_2048::heuristic::Heuristic;
/// use search_2048::search::{RandomTrials, Strategy};
///
/// let board = Board::EMPTY.with_tile(0, 1).with_tile(1, 1);
/// let mut rt = RandomTrials::new(2, 4, 7, Heuristic::Score);
/// let dir = rt.pick_move(board);
/// assert_ne!(board.shift(dir), board);
/// ```
#[derive(Clone)]
pub struct RandomTrials {
    depth: u32,
    trials: u32,
    evaluator: Arc<dyn Evaluator>,
    spawner: TileSpawner,
    nodes: u64,
}

impl RandomTrials {
    /// `depth` and `trials` are raised to at least 1.
    pub fn new(depth: u32, trials: u32, seed: u64, evaluator: impl Evaluator + 'static) -> Self {
        engine::warm();
        Self {
            depth: depth.max(1),
            trials: trials.max(1),
            evaluator: Arc::new(evaluator),
            spawner: TileSpawner::new(seed),
            nodes: 0,
        }
    }

    #[inline]
    pub fn depth(&self) -> u32 { self.depth }

    #[inline]
    pub fn trials(&self) -> u32 { self.trials }

    /// Sample `board` to `depth` plies.
    pub fn search(&mut self, board: Board, depth: u32) -> SearchResult {
        self.nodes = 0;
        let (merit, best_move) = self.search_node(board, depth);
        SearchResult { evaluation: from_merit(merit), best_move }
    }

    fn search_node(&mut self, board: Board, depth: u32) -> (Merit, Direction) {
        self.nodes += 1;
        if depth == 0 || board.is_game_over() {
            return (leaf_merit(board, self.evaluator.evaluate(board)), Direction::Left);
        }

        let mut best = (0, Direction::Left);
        for dir in Direction::ALL {
            let after = board.shift(dir);
            if after == board {
                continue;
            }
            let mut total: Merit = 0;
            for _ in 0..self.trials {
                let exponent = self.spawner.random_tile_value();
                let child = self.spawner.add_random_tile(after, exponent);
                total += self.search_node(child, depth - 1).0;
            }
            // same number of samples per move, so sums compare like means
            if best.0 <= total {
                best = (total, dir);
            }
        }
        (best.0 / self.trials as Merit, best.1)
    }
}

impl Strategy for RandomTrials {
    fn pick_move(&mut self, board: Board) -> Direction {
        let result = self.search(board, self.depth);
        log::trace!(
            "random-trials depth {} x{}: {} (eval {}, nodes {})",
            self.depth,
            self.trials,
            result.best_move,
            result.evaluation,
            self.nodes
        );
        result.best_move
    }

    fn name(&self) -> &'static str { "random-trials" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameEngine;
    use crate::heuristic::Heuristic;

    #[test]
    fn parameters_are_at_least_one() {
        let rt = RandomTrials::new(0, 0, 1, Heuristic::Score);
        assert_eq!(rt.depth(), 1);
        assert_eq!(rt.trials(), 1);
    }

    #[test]
    fn dead_board_is_penalized() {
        let dead = Board::from_raw(0x1212212112122121);
        let mut rt = RandomTrials::new(2, 3, 1, |_: Board| 160u64);
        assert_eq!(rt.search(dead, 2).evaluation, 150);
    }

    #[test]
    fn ties_go_to_the_later_direction() {
        // Left and Down both leave a single gap, which any spawn fills
        let crowded = Board::from_raw(0x1212_2121_1212_0121);
        let mut rt = RandomTrials::new(1, 4, 3, |b: Board| b.count_empty() as u64);
        assert_eq!(rt.search(crowded, 1), SearchResult { evaluation: 0, best_move: Direction::Down });
    }

    #[test]
    fn sampled_value_lies_between_the_spawn_outcomes() {
        // after any move the board holds the 4 plus a 2 (60) or a 4 (80)
        let board = Board::EMPTY.with_tile(0, 2);
        let mut rt = RandomTrials::new(1, 50, 9, |b: Board| b.tile_sum() * 10);
        let result = rt.search(board, 1);
        assert!((60..=80).contains(&result.evaluation), "{result:?}");
        assert_ne!(board.shift(result.best_move), board);
    }

    #[test]
    fn same_seed_same_choices() {
        let boards = [
            Board::from_raw(0x1234_5612_2100_0000),
            Board::EMPTY.with_tile(0, 1).with_tile(5, 1),
            Board::from_raw(0x0102_3004_0050_6007),
        ];
        let mut a = RandomTrials::new(2, 3, 42, Heuristic::Corner);
        let mut b = RandomTrials::new(2, 3, 42, Heuristic::Corner);
        for board in boards {
            let dir = a.pick_move(board);
            assert_eq!(dir, b.pick_move(board));
            assert_ne!(board.shift(dir), board);
        }
    }

    #[test]
    fn finishes_a_game() {
        let mut engine = GameEngine::new(4);
        let outcome = engine.play_one_game(&mut RandomTrials::new(1, 3, 4, Heuristic::Corner)).unwrap();
        assert!(outcome.board.is_game_over());
        assert!(outcome.moves() > 0);
    }
}
