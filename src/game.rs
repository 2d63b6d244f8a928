//! One game of 2048 driven by a [`Strategy`].

use crate::engine::Board;
use crate::search::Strategy;
use crate::spawner::{TileSpawner, FOUR};

/// No-op moves tolerated from a strategy for one turn before the game is abandoned.
pub const MAX_ATTEMPTS: u32 = 0x10000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Init,
    AwaitingMove,
    Spawning,
    Terminal,
}

#[derive(thiserror::Error, Debug)]
pub enum GameError {
    #[error("strategy returned no legal move in {attempts} attempts on {board:?}")]
    StuckGame { board: Board, attempts: u32 },
}

/// Final board of a game plus the number of 4s spawned during it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameOutcome {
    pub board: Board,
    pub fours: u32,
}

impl GameOutcome {
    /// Score assuming every tile grew from spawned 2s.
    #[inline]
    pub fn approximate_score(&self) -> u64 { self.board.score() }

    /// Actual game score: each spawned 4 skipped one merge worth 4 points.
    #[inline]
    pub fn score(&self) -> u64 { self.approximate_score().saturating_sub(4 * self.fours as u64) }

    /// Moves played, derived from the tile sum: every move spawns exactly one tile.
    #[inline]
    pub fn moves(&self) -> u64 { (self.board.tile_sum() / 2).saturating_sub(self.fours as u64 + 2) }

    #[inline]
    pub fn highest_tile(&self) -> u32 { self.board.highest_tile() }
}

/// Plays games with a private, seeded tile stream.
///
/// ```
/// use search_2048::game::GameEngine;
/// use search_2048::heuristic::Heuristic;
/// use search_2048::search::Expectimax;
///
/// let mut engine = GameEngine::new(8);
/// let mut strategy = Expectimax::new(1, Heuristic::Corner);
/// let outcome = engine.play_one_game(&mut strategy).unwrap();
/// assert!(outcome.board.is_game_over());
/// ```
#[derive(Debug, Clone)]
pub struct GameEngine {
    spawner: TileSpawner,
    board: Board,
    fours: u32,
    state: GameState,
}

impl GameEngine {
    pub fn new(seed: u64) -> Self { Self::with_spawner(TileSpawner::new(seed)) }

    pub fn from_entropy() -> Self { Self::with_spawner(TileSpawner::from_entropy()) }

    fn with_spawner(spawner: TileSpawner) -> Self {
        crate::engine::warm();
        Self { spawner, board: Board::EMPTY, fours: 0, state: GameState::Init }
    }

    #[inline]
    pub fn board(&self) -> Board { self.board }

    #[inline]
    pub fn fours(&self) -> u32 { self.fours }

    #[inline]
    pub fn state(&self) -> GameState { self.state }

    #[inline]
    pub fn outcome(&self) -> GameOutcome { GameOutcome { board: self.board, fours: self.fours } }

    /// Clear the board and place the two opening tiles.
    pub fn start(&mut self) {
        self.board = Board::EMPTY;
        self.fours = 0;
        self.spawn();
        self.spawn();
        self.state = GameState::AwaitingMove;
    }

    /// Run one transition of the game's state machine and return the new state.
    pub fn advance<S: Strategy + ?Sized>(&mut self, strategy: &mut S) -> Result<GameState, GameError> {
        match self.state {
            GameState::Init => self.start(),
            GameState::AwaitingMove => {
                self.board = self.take_turn(strategy)?;
                self.state = if self.board.is_game_over() { GameState::Terminal } else { GameState::Spawning };
            }
            GameState::Spawning => {
                self.spawn();
                self.state = if self.board.is_game_over() { GameState::Terminal } else { GameState::AwaitingMove };
            }
            GameState::Terminal => {}
        }
        Ok(self.state)
    }

    /// Play a fresh game to the end. The strategy is reset first.
    pub fn play_one_game<S: Strategy + ?Sized>(&mut self, strategy: &mut S) -> Result<GameOutcome, GameError> {
        strategy.reset();
        self.state = GameState::Init;
        while self.advance(strategy)? != GameState::Terminal {}
        let outcome = self.outcome();
        log::debug!(
            "{} game over: score {}, moves {}, highest tile {}",
            strategy.name(),
            outcome.score(),
            outcome.moves(),
            outcome.highest_tile()
        );
        Ok(outcome)
    }

    fn take_turn<S: Strategy + ?Sized>(&mut self, strategy: &mut S) -> Result<Board, GameError> {
        for attempt in 0..MAX_ATTEMPTS {
            let dir = strategy.pick_move(self.board);
            let moved = self.board.shift(dir);
            if moved != self.board {
                return Ok(moved);
            }
            if attempt == 0 {
                log::warn!("{} picked {} which does not move {:?}", strategy.name(), dir, self.board);
            }
        }
        Err(GameError::StuckGame { board: self.board, attempts: MAX_ATTEMPTS })
    }

    fn spawn(&mut self) {
        let exponent = self.spawner.random_tile_value();
        if exponent == FOUR {
            self.fours += 1;
        }
        self.board = self.spawner.add_random_tile(self.board, exponent);
    }
}
