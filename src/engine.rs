use std::fmt;
use std::sync::OnceLock;

/// A direction to slide/merge tiles.
///
/// The discriminants are the fixed enumeration order used by search;
/// ties between equally good moves go to the later direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    Left = 0,
    Up = 1,
    Right = 2,
    Down = 3,
}

impl Direction {
    /// All directions in enumeration order.
    pub const ALL: [Direction; 4] = [Direction::Left, Direction::Up, Direction::Right, Direction::Down];

    #[inline]
    pub fn index(self) -> u8 { self as u8 }

    #[inline]
    fn is_vertical(self) -> bool { matches!(self, Direction::Up | Direction::Down) }
}

impl TryFrom<u8> for Direction {
    type Error = EngineError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Direction::Left),
            1 => Ok(Direction::Up),
            2 => Ok(Direction::Right),
            3 => Ok(Direction::Down),
            other => Err(EngineError::InvalidDirection(other)),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::Left => "left",
            Direction::Up => "up",
            Direction::Right => "right",
            Direction::Down => "down",
        };
        f.write_str(s)
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum EngineError {
    #[error("direction index {0} is outside 0..=3")]
    InvalidDirection(u8),
}

const LINE_TABLE_SIZE: usize = 0x1_0000; // 65,536 possible 16-bit rows
const EMPTY_TILE_POSITIONS: usize = 524_288; // 16 * 65,536 / 2 empty cells summed over all masks

/// Occupancy mask of a board with no empty cell.
pub const FULL_MASK: u16 = 0xffff;

type BoardRaw = u64;
type Row = u16;
type Score = u64;

/// Precomputed, immutable lookup tables shared by every board operation.
struct Tables {
    shift_left: Box<[Row]>,
    shift_right: Box<[Row]>,
    score: Box<[Score]>,
    // adjacency-list encoding: cells of mask `m` live in empty_cells[empty_index[m]..empty_index[m + 1]]
    empty_index: Box<[u32]>,
    empty_cells: Box<[u8]>,
}

static TABLES: OnceLock<Tables> = OnceLock::new();

#[inline(always)]
fn tables() -> &'static Tables { TABLES.get_or_init(create_tables) }

/// Build the lookup tables now instead of on first use. Safe to call multiple times.
pub fn warm() {
    let _ = tables();
}

fn create_tables() -> Tables {
    // Allocate on the heap to avoid large stack frames
    let mut shift_left = vec![0 as Row; LINE_TABLE_SIZE];
    let mut shift_right = vec![0 as Row; LINE_TABLE_SIZE];
    let mut score = vec![0 as Score; LINE_TABLE_SIZE];

    for val in 0..LINE_TABLE_SIZE {
        let row = val as Row;
        let left = slide_row_left(row);
        shift_left[val] = left;
        shift_right[reverse_row(row) as usize] = reverse_row(left);
        score[val] = calc_row_score(row);
    }

    let mut empty_index = Vec::with_capacity(LINE_TABLE_SIZE + 1);
    let mut empty_cells = Vec::with_capacity(EMPTY_TILE_POSITIONS);
    for mask in 0..LINE_TABLE_SIZE {
        empty_index.push(empty_cells.len() as u32);
        for cell in 0..16u8 {
            if (mask >> cell) & 1 == 0 {
                empty_cells.push(cell);
            }
        }
    }
    empty_index.push(empty_cells.len() as u32);
    debug_assert_eq!(empty_cells.len(), EMPTY_TILE_POSITIONS);

    Tables {
        shift_left: shift_left.into_boxed_slice(),
        shift_right: shift_right.into_boxed_slice(),
        score: score.into_boxed_slice(),
        empty_index: empty_index.into_boxed_slice(),
        empty_cells: empty_cells.into_boxed_slice(),
    }
}

/// Packed 4x4 2048 board as 16 4-bit tile exponents in a `u64`.
///
/// Cell `i` (row-major from the top-left) lives in the nibble at bit `60 - 4 * i`,
/// so each row is one 16-bit slice with its leftmost cell in the high nibble.
/// Exponent 0 is an empty cell; exponent `e` is a tile of value `2^e`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Board(BoardRaw);

impl Board {
    /// A constant empty board (all zeros).
    pub const EMPTY: Board = Board(0);

    /// Construct a `Board` from its raw packed representation.
    #[inline]
    pub fn from_raw(raw: BoardRaw) -> Self { Board(raw) }

    /// Borrow the raw packed `u64` for this `Board`.
    #[inline]
    pub fn raw(&self) -> BoardRaw { self.0 }

    /// Exponent stored in cell `idx` (0..16, row-major).
    #[inline]
    pub fn exponent_at(self, idx: usize) -> u8 {
        debug_assert!(idx < 16);
        ((self.0 >> (60 - 4 * idx)) & 0xf) as u8
    }

    /// Exponent at `row`, `col`.
    #[inline]
    pub fn exponent(self, row: usize, col: usize) -> u8 { self.exponent_at(row * 4 + col) }

    /// Displayed tile value at `row`, `col`; 0 for an empty cell.
    #[inline]
    pub fn tile_value(self, row: usize, col: usize) -> u32 { exponent_to_value(self.exponent(row, col)) }

    /// Return a copy with cell `idx` overwritten by `exponent`.
    ///
    /// ```
    /// use search_2048::engine::Board;
    /// let b = Board::EMPTY.with_tile(0, 1).with_tile(5, 1);
    /// assert_eq!(b.exponent(1, 1), 1);
    /// assert_eq!(b.count_occupied(), 2);
    /// ```
    #[inline]
    pub fn with_tile(self, idx: usize, exponent: u8) -> Self {
        debug_assert!(idx < 16 && exponent < 16);
        let shift = 60 - 4 * idx;
        Board((self.0 & !(0xf << shift)) | ((exponent as u64 & 0xf) << shift))
    }

    /// Bit `i` is set iff cell `i` holds a tile.
    #[inline]
    pub fn occupancy_mask(self) -> u16 {
        // fold each nibble onto its low bit, then pack the 16 bits together
        let mut x = self.0;
        x |= x >> 1;
        x |= x >> 2;
        x &= 0x1111_1111_1111_1111;
        x = (x | (x >> 3)) & 0x0303_0303_0303_0303;
        x = (x | (x >> 6)) & 0x000f_000f_000f_000f;
        x = (x | (x >> 12)) & 0x0000_00ff_0000_00ff;
        x = (x | (x >> 24)) & 0xffff;
        // bit k now belongs to the nibble at 4k, which is cell 15 - k
        (x as u16).reverse_bits()
    }

    /// Mirror left to right.
    #[inline]
    pub fn mirror(self) -> Self {
        let x = self.0;
        let x = ((x & 0x0f0f_0f0f_0f0f_0f0f) << 4) | ((x >> 4) & 0x0f0f_0f0f_0f0f_0f0f);
        Board(((x & 0x00ff_00ff_00ff_00ff) << 8) | ((x >> 8) & 0x00ff_00ff_00ff_00ff))
    }

    /// Mirror top to bottom.
    #[inline]
    pub fn flip(self) -> Self {
        let x = self.0;
        let x = ((x & 0x0000_ffff_0000_ffff) << 16) | ((x >> 16) & 0x0000_ffff_0000_ffff);
        Board(x.rotate_left(32))
    }

    /// The board under each of the eight rotations and reflections of the grid.
    pub fn symmetries(self) -> [Board; 8] {
        let [a, b, c, d] = [self, self.mirror(), self.flip(), self.mirror().flip()];
        [a, b, c, d, a.transpose(), b.transpose(), c.transpose(), d.transpose()]
    }

    /// Mirror the grid across its main diagonal. Involutive.
    // Credit to Nneonneo
    #[inline]
    pub fn transpose(self) -> Self {
        let x = self.0;
        let a1 = x & 0xF0F00F0FF0F00F0F;
        let a2 = x & 0x0000F0F00000F0F0;
        let a3 = x & 0x0F0F00000F0F0000;
        let a = a1 | (a2 << 12) | (a3 >> 12);
        let b1 = a & 0xFF00FF0000FF00FF;
        let b2 = a & 0x00FF00FF00000000;
        let b3 = a & 0x00000000FF00FF00;
        Board(b1 | (b2 >> 24) | (b3 << 24))
    }

    /// Return the board resulting from sliding/merging tiles in `dir` (no random insert).
    ///
    /// ```
    /// use search_2048::engine::{Board, Direction};
    /// // bottom row [2, 2, 4, _] slides left into [4, 4, _, _]
    /// let b = Board::from_raw(0x1120);
    /// assert_eq!(b.shift(Direction::Left), Board::from_raw(0x2200));
    /// ```
    #[inline]
    pub fn shift(self, dir: Direction) -> Self {
        let t = tables();
        let table: &[Row] = match dir {
            Direction::Left | Direction::Up => &t.shift_left,
            Direction::Right | Direction::Down => &t.shift_right,
        };
        if dir.is_vertical() {
            shift_rows(self.transpose(), table).transpose()
        } else {
            shift_rows(self, table)
        }
    }

    /// True if no move in any direction changes the board.
    #[inline]
    pub fn is_game_over(self) -> bool { Direction::ALL.iter().all(|&dir| self.shift(dir) == self) }

    /// Count the number of empty cells.
    #[inline]
    pub fn count_empty(self) -> u32 { 16 - self.count_occupied() }

    /// Count the number of non-empty cells.
    // https://stackoverflow.com/questions/38225571/count-number-of-zero-nibbles-in-an-unsigned-64-bit-integer
    #[inline]
    pub fn count_occupied(self) -> u32 {
        let mut x = self.0;
        x |= x >> 1;
        x |= x >> 2;
        x &= 0x1111111111111111;
        x.count_ones()
    }

    /// Number of distinct tile values present (empty cells not counted).
    pub fn count_distinct(self) -> u32 {
        let mut seen = 0u16;
        let mut x = self.0;
        while x != 0 {
            seen |= 1 << (x & 0xf);
            x >>= 4;
        }
        (seen & !1).count_ones()
    }

    /// Sum of all displayed tile values.
    pub fn tile_sum(self) -> u64 {
        (0..16).map(|idx| exponent_to_value(self.exponent_at(idx)) as u64).sum()
    }

    /// Highest displayed tile value (0 on an empty board).
    pub fn highest_tile(self) -> u32 {
        (0..16).map(|idx| self.exponent_at(idx)).max().map_or(0, exponent_to_value)
    }

    /// Approximate score, assuming every tile was built from spawned 2s.
    ///
    /// Each cell with exponent `e >= 2` contributes `(e - 1) * 2^e`.
    ///
    /// ```
    /// use search_2048::engine::Board;
    /// assert_eq!(Board::EMPTY.with_tile(0, 3).score(), 16);
    /// ```
    #[inline]
    pub fn score(self) -> Score {
        let score_table = &tables().score;
        (0..4).fold(0, |acc, row_idx| acc + score_table[extract_row(self.0, row_idx) as usize])
    }
}

/// Cells left empty by occupancy mask `mask`, in increasing cell order.
#[inline]
pub fn empty_cells(mask: u16) -> &'static [u8] {
    let t = tables();
    let start = t.empty_index[mask as usize] as usize;
    let end = t.empty_index[mask as usize + 1] as usize;
    &t.empty_cells[start..end]
}

/// Bit offset of cell `idx` inside the packed word.
#[inline]
pub fn cell_shift(idx: u8) -> u32 { 60 - 4 * idx as u32 }

#[inline]
fn exponent_to_value(exponent: u8) -> u32 { if exponent == 0 { 0 } else { 1 << exponent } }

#[inline(always)]
pub(crate) fn extract_row(board: BoardRaw, row_idx: u32) -> Row { ((board >> ((3 - row_idx) * 16)) & 0xffff) as Row }

fn shift_rows(board: Board, table: &[Row]) -> Board {
    let res = (0..4).fold(0u64, |acc, row_idx| {
        let row = extract_row(board.0, row_idx);
        acc | ((table[row as usize] as u64) << ((3 - row_idx) * 16))
    });
    Board(res)
}

pub(crate) fn reverse_row(row: Row) -> Row {
    ((row & 0xf) << 12) | (((row >> 4) & 0xf) << 8) | (((row >> 8) & 0xf) << 4) | ((row >> 12) & 0xf)
}

pub(crate) fn row_to_array(row: Row) -> [u8; 4] {
    [(row >> 12) as u8 & 0xf, (row >> 8) as u8 & 0xf, (row >> 4) as u8 & 0xf, row as u8 & 0xf]
}

fn array_to_row(r: [u8; 4]) -> Row {
    (r[0] as Row) << 12 | (r[1] as Row) << 8 | (r[2] as Row) << 4 | r[3] as Row
}

fn pull_left(r: &mut [u8; 4]) {
    for _ in 0..3 {
        for i in 0..3 {
            if r[i] == 0 && r[i + 1] > 0 {
                r.swap(i, i + 1);
            }
        }
    }
}

/// Pull tiles to the leading edge, merge each equal adjacent pair once, pull again.
fn slide_row_left(row: Row) -> Row {
    let mut r = row_to_array(row);
    pull_left(&mut r);
    for i in 0..3 {
        if r[i] > 0 && r[i] == r[i + 1] {
            // a 65536 tile does not fit in a nibble
            r[i] = (r[i] + 1).min(15);
            r[i + 1] = 0;
        }
    }
    pull_left(&mut r);
    array_to_row(r)
}

// Credit to Nneonneo
fn calc_row_score(row: Row) -> Score {
    row_to_array(row)
        .iter()
        .filter(|&&e| e >= 2)
        // the score is the total sum of the tile and all intermediate merged tiles
        .map(|&e| (e as Score - 1) * (1 << e))
        .sum()
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({:#018x})", self.0)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..4 {
            if row > 0 {
                writeln!(f, "-------------------------------")?;
            }
            let cells: Vec<String> = (0..4).map(|col| format_val(self.tile_value(row, col))).collect();
            writeln!(f, "{}", cells.join("|"))?;
        }
        Ok(())
    }
}

impl From<BoardRaw> for Board { fn from(v: BoardRaw) -> Self { Board::from_raw(v) } }
impl From<Board> for BoardRaw { fn from(b: Board) -> Self { b.raw() } }

fn format_val(val: u32) -> String {
    match val {
        0 => " ".repeat(7),
        x => format!("{:^7}", x),
    }
}
