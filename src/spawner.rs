//! Random tile placement driven by a private, seeded RNG.

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::engine::{self, cell_shift, Board, FULL_MASK};

/// lcm(1, 2, ..., 16): a draw modulo any empty-cell count (or 10) stays exactly uniform.
const DRAW_RANGE: u32 = 720_720;

/// Exponent of a spawned "2" tile.
pub const TWO: u8 = 1;
/// Exponent of a spawned "4" tile.
pub const FOUR: u8 = 2;

/// Spawns 2 (90%) or 4 (10%) tiles into uniformly chosen empty cells.
///
/// All draws come from one `Uniform(0..720720)` distribution, so the
/// distribution never has to be rebuilt for a different number of empty cells.
#[derive(Debug, Clone)]
pub struct TileSpawner {
    rng: StdRng,
    draw: Uniform<u32>,
}

impl TileSpawner {
    pub fn new(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed), draw: Uniform::new(0, DRAW_RANGE) }
    }

    pub fn from_entropy() -> Self {
        Self { rng: StdRng::from_entropy(), draw: Uniform::new(0, DRAW_RANGE) }
    }

    /// Exponent of the next tile: [`TWO`] with probability 0.9, else [`FOUR`].
    #[inline]
    pub fn random_tile_value(&mut self) -> u8 {
        if self.draw.sample(&mut self.rng) % 10 == 0 { FOUR } else { TWO }
    }

    /// Place `exponent` into a uniformly chosen empty cell.
    ///
    /// Panics if the board has no empty cell; callers check for a full board first.
    ///
    /// ```
    /// use search_2048::engine::Board;
    /// use search_2048::spawner::TileSpawner;
    /// let mut spawner = TileSpawner::new(7);
    /// let b = spawner.add_random_tile(Board::EMPTY, 1);
    /// assert_eq!(b.count_occupied(), 1);
    /// ```
    #[inline]
    pub fn add_random_tile(&mut self, board: Board, exponent: u8) -> Board {
        let mask = board.occupancy_mask();
        assert!(mask != FULL_MASK, "cannot spawn a tile on a full board: {board:?}");
        let cells = engine::empty_cells(mask);
        let pick = self.draw.sample(&mut self.rng) as usize % cells.len();
        Board::from_raw(board.raw() | ((exponent as u64) << cell_shift(cells[pick])))
    }
}
