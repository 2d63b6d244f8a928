use super::{Merit, Search, SpawnFold};

/// Weight of a "2" spawn out of [`TOTAL_WEIGHT`].
const TWO_WEIGHT: Merit = 9;
/// Weight of a "4" spawn out of [`TOTAL_WEIGHT`].
const FOUR_WEIGHT: Merit = 1;
const TOTAL_WEIGHT: Merit = TWO_WEIGHT + FOUR_WEIGHT;

/// Spawns follow the game's distribution: a move is worth its expected placement.
#[derive(Debug, Clone, Copy, Default)]
pub struct Expected;

impl SpawnFold for Expected {
    const NAME: &'static str = "expectimax";

    #[inline]
    fn fold(empty_cells: u32, placements: impl Iterator<Item = (Merit, Merit)>) -> Merit {
        let total: Merit = placements.map(|(two, four)| TWO_WEIGHT * two + FOUR_WEIGHT * four).sum();
        total / (empty_cells as Merit * TOTAL_WEIGHT)
    }
}

/// Expectimax search: plays for the expected spawn.
pub type Expectimax = Search<Expected>;
