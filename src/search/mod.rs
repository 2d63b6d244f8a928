//! Move search over the packed board: minimax and expectimax.
//!
//! Both strategies share one recursion, [`Search`], and differ only in how
//! the evaluations of every possible tile spawn are folded into one figure
//! of merit for a move ([`SpawnFold`]).
//!
//! - [`Minimax`]: spawns are adversarial, a move is worth its worst spawn.
//! - [`Expectimax`]: spawns follow the game's 90/10 distribution, a move is
//!   worth its expected spawn.
//!
//! [`RandomTrials`] samples a few spawns per move instead of folding all of them.
//!
//! Search is deterministic; randomness only occurs when a game applies tiles.
//!
//! Quick start
//! ```
//! use search_2048::engine::{Board, Direction};
//! use search_2048::heuristic::Heuristic;
//! use search_2048::search::{Expectimax, Strategy};
//!
//! let board = Board::EMPTY.with_tile(0, 1).with_tile(1, 1);
//! let mut ex = Expectimax::new(2, Heuristic::Score);
//! let dir = ex.pick_move(board);
//! assert_ne!(board.shift(dir), board);
//! ```

use std::marker::PhantomData;
use std::sync::Arc;

use crate::engine::{self, Board, Direction};
use crate::heuristic::Evaluator;

mod cache;
mod expectimax;
mod minimax;
mod trials;

pub use cache::{CacheEntry, CachePolicy, SearchCache};
pub use expectimax::{Expectimax, Expected};
pub use minimax::{Adversarial, Minimax};
pub use trials::{RandomTrials, DEFAULT_TRIALS};

/// Spawn paths holding this many 4s are cut off and evaluated as leaves.
/// A sixth 4 on one path is rare enough to ignore.
pub const MAX_FOURS: u32 = 5;

/// Dead boards keep `1 - 1/2^DEATH_PENALTY_SHIFT` of their evaluation.
pub const DEATH_PENALTY_SHIFT: u32 = 4;

/// Fractional bits carried by a [`Merit`].
pub const MERIT_SHIFT: u32 = 32;

/// An evaluation in fixed point, scaled by `2^MERIT_SHIFT`.
///
/// Chance nodes average in this unit so that evaluators with a small range
/// (a count of empty cells, say) keep their fractions instead of truncating
/// into ties. Results are scaled back down only when leaving [`Search::search`].
pub type Merit = u128;

#[inline]
pub(crate) fn to_merit(evaluation: u64) -> Merit { (evaluation as Merit) << MERIT_SHIFT }

#[inline]
pub(crate) fn from_merit(merit: Merit) -> u64 { (merit >> MERIT_SHIFT) as u64 }

/// Merit of a leaf; dead boards lose `1/2^DEATH_PENALTY_SHIFT` of it.
#[inline]
pub(crate) fn leaf_merit(board: Board, evaluation: u64) -> Merit {
    let merit = to_merit(evaluation);
    if board.is_game_over() { merit - (merit >> DEATH_PENALTY_SHIFT) } else { merit }
}

/// Anything that picks a move for a board.
pub trait Strategy {
    /// Direction to play. Only called on boards that are not game over.
    fn pick_move(&mut self, board: Board) -> Direction;

    /// Forget per-game state before a new game.
    fn reset(&mut self) {}

    fn name(&self) -> &'static str;
}

/// Tunables for [`Search`].
///
/// - `depth`: plies to search; `0` or below selects the depth per board with
///   [`pick_depth`] and searches `-depth` plies deeper than it suggests.
/// - `cache_depth`: nodes with fewer remaining plies are never cached.
/// - `cache_capacity`: entries kept before the oldest is evicted.
/// - `cache_policy`: whether deeper cached results answer shallower requests.
/// - `max_fours`: cutoff on 4-spawns along one path.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub depth: i32,
    pub cache_depth: u32,
    pub cache_capacity: usize,
    pub cache_policy: CachePolicy,
    pub max_fours: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            depth: 0,
            cache_depth: 2,
            cache_capacity: 1 << 20,
            cache_policy: CachePolicy::AtLeast,
            max_fours: MAX_FOURS,
        }
    }
}

/// Best move found for a board and its evaluation, in evaluator units.
///
/// `best_move` is meaningless for leaves and dead boards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchResult {
    pub evaluation: u64,
    pub best_move: Direction,
}

/// Node result inside the recursion.
#[derive(Debug, Clone, Copy)]
struct Node {
    merit: Merit,
    best_move: Direction,
}

impl Node {
    #[inline]
    fn leaf(merit: Merit) -> Self { Self { merit, best_move: Direction::Left } }
}

/// Basic search stats for the last move.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchStats {
    pub nodes: u64,
    pub cache_hits: u64,
    pub peak_nodes: u64,
}

/// Folds the evaluations of every spawn placement on an afterstate.
pub trait SpawnFold: Send + Sync + 'static {
    const NAME: &'static str;

    /// `placements` yields `(with_two, with_four)` merits, one pair per empty cell.
    fn fold(empty_cells: u32, placements: impl Iterator<Item = (Merit, Merit)>) -> Merit;
}

/// Search depth for `board` when none is configured.
///
/// Fuller boards with more distinct tiles are searched deeper; the result lies in `2..=7`.
pub fn pick_depth(board: Board) -> u32 {
    let complexity = board.count_distinct() + board.count_occupied().saturating_sub(6) / 2;
    2 + [7, 10, 13, 14, 16].iter().filter(|&&threshold| complexity > threshold).count() as u32
}

/// Depth-limited tree search with a memo table, parameterized by its spawn fold.
pub struct Search<F: SpawnFold> {
    cfg: SearchConfig,
    evaluator: Arc<dyn Evaluator>,
    cache: SearchCache,
    caching: bool,
    stats: SearchStats,
    _fold: PhantomData<fn() -> F>,
}

impl<F: SpawnFold> Search<F> {
    pub fn new(depth: i32, evaluator: impl Evaluator + 'static) -> Self {
        Self::with_config(SearchConfig { depth, ..SearchConfig::default() }, evaluator)
    }

    pub fn with_config(cfg: SearchConfig, evaluator: impl Evaluator + 'static) -> Self {
        Self::with_shared_evaluator(cfg, Arc::new(evaluator))
    }

    pub fn with_shared_evaluator(cfg: SearchConfig, evaluator: Arc<dyn Evaluator>) -> Self {
        engine::warm();
        let cache = SearchCache::new(cfg.cache_capacity, cfg.cache_policy);
        Self { cfg, evaluator, cache, caching: false, stats: SearchStats::default(), _fold: PhantomData }
    }

    #[inline]
    pub fn config(&self) -> &SearchConfig { &self.cfg }

    #[inline]
    pub fn cache(&self) -> &SearchCache { &self.cache }

    /// Statistics collected by the last [`Search::search`] or `pick_move`.
    #[inline]
    pub fn last_stats(&self) -> SearchStats { self.stats }

    /// Plies this strategy searches for `board`.
    pub fn depth_for(&self, board: Board) -> u32 {
        if self.cfg.depth > 0 {
            self.cfg.depth as u32
        } else {
            (pick_depth(board) as i64 - self.cfg.depth as i64) as u32
        }
    }

    /// Search `board` to `depth` plies.
    ///
    /// Shallow searches skip the cache entirely: below `cache_depth + 2` plies
    /// the bookkeeping costs more than it saves.
    pub fn search(&mut self, board: Board, depth: u32) -> SearchResult {
        self.caching = depth > self.cfg.cache_depth + 1;
        let peak = self.stats.peak_nodes;
        self.stats = SearchStats { peak_nodes: peak, ..SearchStats::default() };
        let node = self.search_node(board, depth, 0);
        self.stats.peak_nodes = self.stats.peak_nodes.max(self.stats.nodes);
        SearchResult { evaluation: from_merit(node.merit), best_move: node.best_move }
    }

    fn search_node(&mut self, board: Board, depth: u32, fours: u32) -> Node {
        self.stats.nodes += 1;
        if depth == 0 || fours >= self.cfg.max_fours || board.is_game_over() {
            return Node::leaf(leaf_merit(board, self.evaluator.evaluate(board)));
        }

        let cacheable = self.caching && depth >= self.cfg.cache_depth;
        if cacheable {
            if let Some(entry) = self.cache.lookup(board, depth) {
                self.stats.cache_hits += 1;
                return Node { merit: entry.evaluation, best_move: entry.best_move };
            }
        }

        let mut best = Node::leaf(0);
        for dir in Direction::ALL {
            let after = board.shift(dir);
            if after == board {
                continue;
            }
            let merit = self.spawn_merit(after, depth, fours);
            // non-strict: on a tie the later direction wins
            if best.merit <= merit {
                best = Node { merit, best_move: dir };
            }
        }

        if cacheable {
            self.cache.insert(board, CacheEntry { evaluation: best.merit, best_move: best.best_move, depth });
        }
        best
    }

    fn spawn_merit(&mut self, after: Board, depth: u32, fours: u32) -> Merit {
        let cells = engine::empty_cells(after.occupancy_mask());
        let placements = cells.iter().map(|&cell| {
            let shift = engine::cell_shift(cell);
            let two = self.search_node(Board::from_raw(after.raw() | (1u64 << shift)), depth - 1, fours);
            let four = self.search_node(Board::from_raw(after.raw() | (2u64 << shift)), depth - 1, fours + 1);
            (two.merit, four.merit)
        });
        F::fold(cells.len() as u32, placements)
    }
}

impl<F: SpawnFold> Strategy for Search<F> {
    fn pick_move(&mut self, board: Board) -> Direction {
        let depth = self.depth_for(board);
        let result = self.search(board, depth);
        log::trace!(
            "{} depth {}: {} (eval {}, nodes {}, cache hits {}, cache size {})",
            F::NAME,
            depth,
            result.best_move,
            result.evaluation,
            self.stats.nodes,
            self.stats.cache_hits,
            self.cache.len()
        );
        result.best_move
    }

    fn reset(&mut self) {
        self.cache.clear();
        self.stats = SearchStats::default();
    }

    fn name(&self) -> &'static str { F::NAME }
}

/// A clone shares the evaluator but starts with its own empty cache.
impl<F: SpawnFold> Clone for Search<F> {
    fn clone(&self) -> Self { Self::with_shared_evaluator(self.cfg.clone(), Arc::clone(&self.evaluator)) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristic::{Evaluator, Heuristic};

    fn constant(_: Board) -> u64 { 7 }

    #[test]
    fn pick_depth_grows_with_complexity() {
        assert_eq!(pick_depth(Board::EMPTY.with_tile(0, 1).with_tile(5, 1)), 2);
        // 15 distinct tiles, 15 occupied: 15 + 4
        assert_eq!(pick_depth(Board::from_raw(0x0123456789abcdef)), 7);
        // 8 distinct tiles, 8 occupied: 8 + 1
        assert_eq!(pick_depth(Board::from_raw(0x1234_5678_0000_0000)), 3);
    }

    #[test]
    fn non_positive_depth_deepens_picked_depth() {
        let board = Board::EMPTY.with_tile(0, 1).with_tile(5, 1);
        assert_eq!(Expectimax::new(0, constant).depth_for(board), 2);
        assert_eq!(Expectimax::new(-2, constant).depth_for(board), 4);
        assert_eq!(Minimax::new(3, constant).depth_for(board), 3);
    }

    #[test]
    fn ties_go_to_the_later_direction() {
        // top-left tile: only Right and Down move
        let top_left = Board::EMPTY.with_tile(0, 1);
        // bottom-right tile: only Left and Up move
        let bottom_right = Board::EMPTY.with_tile(15, 1);
        // centre tile: everything moves
        let centre = Board::EMPTY.with_tile(5, 1);

        let mut ex = Expectimax::new(1, constant);
        let mut mm = Minimax::new(1, constant);
        assert_eq!(ex.pick_move(top_left), Direction::Down);
        assert_eq!(mm.pick_move(top_left), Direction::Down);
        assert_eq!(ex.pick_move(bottom_right), Direction::Up);
        assert_eq!(mm.pick_move(bottom_right), Direction::Up);
        assert_eq!(ex.pick_move(centre), Direction::Down);
        assert_eq!(mm.pick_move(centre), Direction::Down);

        let mut by_score = Expectimax::new(1, Heuristic::Score);
        assert_eq!(by_score.pick_move(top_left), Direction::Down);
    }

    #[test]
    fn dead_board_is_penalized() {
        let dead = Board::from_raw(0x1212212112122121);
        let mut ex = Expectimax::new(3, |_: Board| 160u64);
        assert_eq!(ex.search(dead, 3).evaluation, 150);
    }

    #[test]
    fn depth_zero_is_the_evaluator() {
        let b = Board::EMPTY.with_tile(3, 4).with_tile(7, 4);
        let mut mm = Minimax::new(1, Heuristic::Score);
        assert_eq!(mm.search(b, 0).evaluation, b.score());
    }

    #[test]
    fn no_fours_allowed_makes_the_root_a_leaf() {
        let board = Board::from_raw(0x1234_5612_2100_0000);
        let cfg = SearchConfig { max_fours: 0, ..SearchConfig::default() };
        let mut mm = Minimax::with_config(cfg.clone(), Heuristic::Corner);
        let mut ex = Expectimax::with_config(cfg, Heuristic::Corner);
        assert_eq!(mm.search(board, 3).evaluation, Heuristic::Corner.evaluate(board));
        assert_eq!(ex.search(board, 3).evaluation, Heuristic::Corner.evaluate(board));
        assert_eq!(ex.last_stats().nodes, 1);
    }

    #[test]
    fn four_spawns_past_the_cap_are_leaves() {
        let board = Board::from_raw(0x1234_5612_2100_0000);
        let cfg = SearchConfig { max_fours: 1, ..SearchConfig::default() };
        let mut capped = Minimax::with_config(cfg, Heuristic::Corner);
        let mut full = Minimax::new(2, Heuristic::Corner);
        let mut one_ply = Minimax::new(1, Heuristic::Corner);

        // worst spawn per move, searching one more ply below a 2 and none below a 4
        let mut expected = 0;
        for dir in Direction::ALL {
            let after = board.shift(dir);
            if after == board {
                continue;
            }
            let mut worst = u64::MAX;
            for &cell in engine::empty_cells(after.occupancy_mask()) {
                let shift = engine::cell_shift(cell);
                let two = one_ply.search(Board::from_raw(after.raw() | (1 << shift)), 1).evaluation;
                let four = one_ply.search(Board::from_raw(after.raw() | (2 << shift)), 0).evaluation;
                worst = worst.min(two).min(four);
            }
            expected = expected.max(worst);
        }

        assert_eq!(capped.search(board, 2).evaluation, expected);
        let capped_nodes = capped.last_stats().nodes;
        full.search(board, 2);
        assert!(capped_nodes < full.last_stats().nodes);
    }

    #[test]
    fn repeated_search_is_identical() {
        let board = Board::from_raw(0x1234_5612_2100_0000);
        let mut ex = Expectimax::new(4, Heuristic::Corner);
        let first = ex.search(board, 4);
        assert!(!ex.cache().is_empty());
        let second = ex.search(board, 4);
        assert_eq!(first, second);

        let mut mm = Minimax::new(4, Heuristic::Corner);
        assert_eq!(mm.search(board, 4), mm.search(board, 4));
    }

    #[test]
    fn cached_entry_answers_shallower_requests_only() {
        let board = Board::from_raw(0x1234_5612_2100_0000);
        let cfg = SearchConfig { cache_depth: 1, ..SearchConfig::default() };
        let mut ex = Expectimax::with_config(cfg, Heuristic::Corner);
        let planted = CacheEntry { evaluation: to_merit(12_345), best_move: Direction::Up, depth: 3 };
        ex.cache.insert(board, planted);

        assert_eq!(ex.search(board, 3), SearchResult { evaluation: 12_345, best_move: Direction::Up });
        assert_eq!(ex.search(board, 3).evaluation, 12_345);
        let deeper = ex.search(board, 4);
        assert_ne!(deeper.evaluation, 12_345);
        // the deeper result replaced the planted one
        assert_eq!(ex.cache().lookup(board, 4).map(|e| e.depth), Some(4));
    }

    #[test]
    fn exact_policy_recomputes_shallower_requests() {
        let board = Board::from_raw(0x1234_5612_2100_0000);
        let cfg = SearchConfig { cache_depth: 1, cache_policy: CachePolicy::Exact, ..SearchConfig::default() };
        let mut ex = Expectimax::with_config(cfg, Heuristic::Corner);
        ex.cache.insert(board, CacheEntry { evaluation: to_merit(12_345), best_move: Direction::Up, depth: 4 });
        assert_ne!(ex.search(board, 3).evaluation, 12_345);
    }

    #[test]
    fn shallow_search_leaves_cache_untouched() {
        let board = Board::from_raw(0x1234_5612_2100_0000);
        let mut ex = Expectimax::new(3, Heuristic::Score);
        ex.pick_move(board);
        assert!(ex.cache().is_empty());
        assert!(ex.last_stats().nodes > 0);
    }

    #[test]
    fn clone_starts_with_empty_cache() {
        let board = Board::from_raw(0x1234_5612_2100_0000);
        let mut ex = Expectimax::new(4, Heuristic::Score);
        let mv = ex.pick_move(board);
        assert!(!ex.cache().is_empty());
        let mut copy = ex.clone();
        assert!(copy.cache().is_empty());
        assert_eq!(copy.pick_move(board), mv);
        ex.reset();
        assert!(ex.cache().is_empty());
    }

    #[test]
    fn picks_legal_moves() {
        let board = Board::from_raw(0x1234_5612_2100_0000);
        let strategies: Vec<Box<dyn Strategy>> = vec![
            Box::new(Expectimax::new(2, Heuristic::Monotonicity)),
            Box::new(Minimax::new(2, Heuristic::Monotonicity)),
        ];
        for mut strategy in strategies {
            let dir = strategy.pick_move(board);
            assert_ne!(board.shift(dir), board, "{} picked a no-op", strategy.name());
        }
    }
}
