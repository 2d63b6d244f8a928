//! Board evaluators plugged into the search strategies.
//!
//! Search never picks a heuristic itself; it is handed one [`Evaluator`] at
//! construction. Evaluations must be deterministic and non-negative.

use std::sync::OnceLock;

use crate::engine::{self, Board};

/// Scores a board; larger is better.
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, board: Board) -> u64;
}

impl<F> Evaluator for F
where
    F: Fn(Board) -> u64 + Send + Sync,
{
    #[inline]
    fn evaluate(&self, board: Board) -> u64 { self(board) }
}

/// Built-in evaluators.
///
/// Every one of them is invariant under rotating or reflecting the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heuristic {
    /// Approximate game score.
    Score,
    /// Number of empty cells.
    Merge,
    /// Large tiles packed into one corner.
    Corner,
    /// Exponents read as one number along a snake over three columns of one wall.
    WallGap,
    /// Exponents read as one number along a snake over a full wall and the row below it.
    FullWall,
    /// [`Heuristic::FullWall`], cut short at the first tile that breaks the ordering.
    StrictWall,
    /// Like [`Heuristic::Corner`] with weights leaning towards one wall.
    SkewedCorner,
    /// Rows and columns ordered by tile size, less scattered duplicate tiles.
    Monotonicity,
}

impl Heuristic {
    pub const ALL: [Heuristic; 8] = [
        Heuristic::Score,
        Heuristic::Merge,
        Heuristic::Corner,
        Heuristic::WallGap,
        Heuristic::FullWall,
        Heuristic::StrictWall,
        Heuristic::SkewedCorner,
        Heuristic::Monotonicity,
    ];
}

impl Evaluator for Heuristic {
    #[inline]
    fn evaluate(&self, board: Board) -> u64 {
        match self {
            Heuristic::Score => board.score(),
            Heuristic::Merge => board.count_empty() as u64,
            Heuristic::Corner => corner(board),
            Heuristic::WallGap => wall(board, &WALL_GAP_PATH),
            Heuristic::FullWall => wall(board, &FULL_WALL_PATH),
            Heuristic::StrictWall => strict_wall(board),
            Heuristic::SkewedCorner => skewed_corner(board),
            Heuristic::Monotonicity => monotonicity(board),
        }
    }
}

// 10 5 2 1
//  5 3 1 0
//  2 1 0 0
//  1 0 0 0
const CORNER_WEIGHTS: [[u64; 4]; 4] = [[10, 5, 2, 1], [5, 3, 1, 0], [2, 1, 0, 0], [1, 0, 0, 0]];

fn corner(board: Board) -> u64 {
    let mut sums = [0u64; 4];
    for row in 0..4 {
        for col in 0..4 {
            let val = board.tile_value(row, col) as u64;
            if val == 0 {
                continue;
            }
            sums[0] += val * CORNER_WEIGHTS[row][col];
            sums[1] += val * CORNER_WEIGHTS[row][3 - col];
            sums[2] += val * CORNER_WEIGHTS[3 - row][col];
            sums[3] += val * CORNER_WEIGHTS[3 - row][3 - col];
        }
    }
    sums.into_iter().max().unwrap_or(0)
}

// Cells in reading order, top-left first. The other walls come from the board's symmetries.
// 0 1 2 x
// 5 4 3 x
// 6 7 8 x
const WALL_GAP_PATH: [usize; 9] = [0, 1, 2, 6, 5, 4, 8, 9, 10];
// 0 1 2 3
// 7 6 5 4
// 8 x x x
const FULL_WALL_PATH: [usize; 9] = [0, 1, 2, 3, 7, 6, 5, 4, 8];

/// Exponents along `path` packed high nibble first, into bits 8..44.
fn snake_key(board: Board, path: &[usize; 9]) -> u64 {
    path.iter().enumerate().fold(0, |key, (k, &cell)| key | (board.exponent_at(cell) as u64) << (40 - 4 * k))
}

/// Best snake over all eight orientations; ties are broken by score.
fn wall(board: Board, path: &[usize; 9]) -> u64 {
    let best = board.symmetries().into_iter().map(|b| snake_key(b, path)).max().unwrap_or(0);
    best + board.score()
}

/// Snake key that stops at the first inversion, losing the inverted tile from the last nibble read.
fn strict_snake_key(board: Board) -> i64 {
    let vals = FULL_WALL_PATH.map(|cell| board.exponent_at(cell) as i64);
    let mut key = vals[0];
    for i in 0..8 {
        if vals[i] != 0 && vals[i + 1] != 0 && vals[i] < vals[i + 1] {
            return (key - vals[i + 1]) << (4 * (10 - i));
        }
        key = (key << 4) | vals[i + 1];
    }
    key << 8
}

fn strict_wall(board: Board) -> u64 {
    let best = board.symmetries().into_iter().map(strict_snake_key).max().unwrap_or(0);
    best.max(0) as u64 + board.score()
}

// 16 10 6 3
// 10  6 3 1
//  4  3 1 0
//  1  1 0 0
const SKEWED_WEIGHTS: [[u64; 4]; 4] = [[16, 10, 6, 3], [10, 6, 3, 1], [4, 3, 1, 0], [1, 1, 0, 0]];

fn skewed_corner(board: Board) -> u64 {
    let weighted = |b: Board| -> u64 {
        (0..16).map(|idx| SKEWED_WEIGHTS[idx / 4][idx % 4] * b.tile_value(idx / 4, idx % 4) as u64).sum()
    };
    board.symmetries().into_iter().map(weighted).max().unwrap_or(0)
}

static MONOTONICITY: OnceLock<Box<[i64]>> = OnceLock::new();

/// Build the lookup tables now instead of on first use.
pub fn warm() {
    let _ = monotonicity_table();
}

fn monotonicity_table() -> &'static [i64] {
    MONOTONICITY
        .get_or_init(|| {
            let raw: Vec<i64> = (0..0x1_0000u32).map(|row| calc_line_monotonicity(row as u16)).collect();
            // a line may be ordered either way round
            (0..0x1_0000u32)
                .map(|row| raw[row as usize].max(raw[engine::reverse_row(row as u16) as usize]))
                .collect::<Vec<_>>()
                .into_boxed_slice()
        })
        .as_ref()
}

fn calc_line_monotonicity(row: u16) -> i64 {
    let r = engine::row_to_array(row);
    let mut score: i64 = r.iter().map(|&e| 1i64 << e).sum();
    for i in 0..3 {
        if r[i] > 0 && r[i] < r[i + 1] {
            score -= 1i64 << (3 * r[i + 1] as u32 - 2 * r[i] as u32);
        }
    }
    score
}

/// Value of each pair of equal tiles that are not neighbours.
fn scattered_duplicates(board: Board) -> i64 {
    let mut penalty = 0;
    for a in 0..16 {
        let e = board.exponent_at(a);
        if e == 0 {
            continue;
        }
        for b in a + 1..16 {
            let neighbours = b == a + 4 || (b == a + 1 && b % 4 != 0);
            if !neighbours && board.exponent_at(b) == e {
                penalty += 1i64 << e;
            }
        }
    }
    penalty
}

fn monotonicity(board: Board) -> u64 {
    let table = monotonicity_table();
    let transposed = board.transpose();
    let lines: i64 = (0..4)
        .map(|idx| {
            table[engine::extract_row(board.raw(), idx) as usize] + table[engine::extract_row(transposed.raw(), idx) as usize]
        })
        .sum();
    (lines - scattered_duplicates(board)).max(0) as u64
}
