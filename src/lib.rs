//! search-2048: a packed-board 2048 engine with minimax and expectimax move search
//!
//! This crate provides:
//! - A compact `Board` type (16 cells of 4-bit exponents in one `u64`) with table-driven moves
//! - A seeded `TileSpawner` and a `GameEngine` that plays whole games against any `Strategy`
//! - `Minimax` and `Expectimax` search with a bounded memo cache and adaptive depth
//! - `RandomTrials`, a search that samples spawns instead of enumerating them
//! - A few built-in board evaluators (`heuristic` module)
//!
//! Quick start:
//! ```
//! use search_2048::{Expectimax, GameEngine, Heuristic};
//!
//! let mut engine = GameEngine::new(42);
//! let mut strategy = Expectimax::new(1, Heuristic::Score);
//! let outcome = engine.play_one_game(&mut strategy).unwrap();
//! assert!(outcome.board.is_game_over());
//! assert!(outcome.score() <= outcome.approximate_score());
//! ```
//!
//! Lookup tables are built lazily on first use; call `engine::warm()` to pay
//! that cost up front.
pub mod engine;
pub mod game;
pub mod heuristic;
pub mod search;
pub mod spawner;

pub use engine::{Board, Direction};
pub use game::{GameEngine, GameError, GameOutcome};
pub use heuristic::{Evaluator, Heuristic};
pub use search::{Expectimax, Minimax, RandomTrials, SearchConfig, Strategy};
