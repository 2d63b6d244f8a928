use super::{Merit, Search, SpawnFold};

/// Spawns are chosen by an opponent: a move is worth its worst placement.
#[derive(Debug, Clone, Copy, Default)]
pub struct Adversarial;

impl SpawnFold for Adversarial {
    const NAME: &'static str = "minimax";

    #[inline]
    fn fold(_empty_cells: u32, placements: impl Iterator<Item = (Merit, Merit)>) -> Merit {
        placements.fold(Merit::MAX, |worst, (two, four)| worst.min(two).min(four))
    }
}

/// Minimax search: plays for the worst-case spawn.
pub type Minimax = Search<Adversarial>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Board, Direction};
    use crate::search::Strategy;

    #[test]
    fn takes_the_minimum() {
        let pairs = [(9, 4), (7, 8), (12, 30)];
        assert_eq!(Adversarial::fold(3, pairs.into_iter()), 4);
    }

    #[test]
    fn never_more_optimistic_than_expectimax() {
        use crate::heuristic::Heuristic;
        use crate::search::Expectimax;

        let boards = [
            Board::EMPTY.with_tile(0, 1).with_tile(5, 2),
            Board::from_raw(0x1234_5612_2100_0000),
            Board::from_raw(0x1212_2121_1212_0121),
        ];
        for board in boards {
            for depth in 1..=2 {
                let mut mm = Minimax::new(depth, Heuristic::Corner);
                let mut ex = Expectimax::new(depth, Heuristic::Corner);
                let worst = mm.search(board, depth as u32).evaluation;
                let expected = ex.search(board, depth as u32).evaluation;
                assert!(worst <= expected, "{board:?} depth {depth}: {worst} > {expected}");
            }
        }
    }

    #[test]
    fn single_gap_has_no_choice_of_spawn() {
        // only Left and Down move this board; each leaves exactly one gap
        let crowded = Board::from_raw(0x1212_2121_1212_0121);
        assert_eq!(crowded.shift(Direction::Right), crowded);
        assert_eq!(crowded.shift(Direction::Up), crowded);
        let mut mm = Minimax::new(1, |b: Board| b.count_empty() as u64);
        // any spawn fills the only gap
        assert_eq!(mm.search(crowded, 1).evaluation, 0);
        assert_eq!(mm.pick_move(crowded), Direction::Down);
    }
}
