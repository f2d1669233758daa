//! Move ordering
//!
//! Empty cells are bucketed by what they do to the lines through them:
//! holes in a quad that one side is filling, and holes in a triplet that one
//! side is about to complete, are interesting; every other cell is neutral.
//! Good moves for one side are bad moves for the other, so the same buckets
//! serve both sides, concatenated in opposite orders.
//!
//! Ordering never changes a search result, only how early cutoffs happen.

use crate::board::{Board, Coord, MoveList, Player};
use crate::lines::lines_at;

/// Base scan order: inner-square corners first, the middle cross last
pub const PRIOR_ORDER: [Coord; 25] = [
    Coord { row: 1, col: 1 },
    Coord { row: 1, col: 3 },
    Coord { row: 3, col: 3 },
    Coord { row: 3, col: 1 },
    Coord { row: 0, col: 1 },
    Coord { row: 0, col: 3 },
    Coord { row: 1, col: 4 },
    Coord { row: 3, col: 4 },
    Coord { row: 4, col: 3 },
    Coord { row: 4, col: 1 },
    Coord { row: 3, col: 0 },
    Coord { row: 1, col: 0 },
    Coord { row: 0, col: 0 },
    Coord { row: 0, col: 4 },
    Coord { row: 4, col: 4 },
    Coord { row: 4, col: 0 },
    Coord { row: 2, col: 2 },
    Coord { row: 1, col: 2 },
    Coord { row: 2, col: 3 },
    Coord { row: 3, col: 2 },
    Coord { row: 2, col: 1 },
    Coord { row: 0, col: 2 },
    Coord { row: 2, col: 0 },
    Coord { row: 2, col: 4 },
    Coord { row: 4, col: 2 },
];

/// How to order candidate moves inside the minimax searches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MoveOrder {
    /// Empty cells in row-major order
    Natural,
    /// Favorable cells first for the side to move
    #[default]
    Heuristic,
}

/// Bucket of an empty cell, from [`Player::Max`]'s point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Favorable,
    Neutral,
    Unfavorable,
}

/// Classifies an empty cell.
///
/// The first quad through the cell holding two or three marks of one side
/// decides. Failing that, a triplet holding two marks of one side decides:
/// occupying a hole next to two Min marks is harmless for Max and blocks
/// nothing useful for Min, while two Max marks make the hole a trap for Max.
pub fn classify(board: &Board, cell: Coord) -> Tier {
    let lines = lines_at(cell);
    for quad in &lines.wins {
        match quad.sum(board) {
            2 | 3 => return Tier::Favorable,
            -2 | -3 => return Tier::Unfavorable,
            _ => {}
        }
    }
    for triplet in &lines.losses {
        match triplet.sum(board) {
            -2 => return Tier::Favorable,
            2 => return Tier::Unfavorable,
            _ => {}
        }
    }
    Tier::Neutral
}

/// Empty cells ordered for each side
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderedMoves {
    /// Favorable, then neutral, then unfavorable
    pub for_max: MoveList,
    /// Unfavorable, then neutral, then favorable
    pub for_min: MoveList,
}

impl OrderedMoves {
    pub fn for_player(&self, player: Player) -> &MoveList {
        match player {
            Player::Max => &self.for_max,
            Player::Min => &self.for_min,
        }
    }
}

/// Buckets every empty cell, scanning in [`PRIOR_ORDER`]
pub fn order_moves(board: &Board) -> OrderedMoves {
    let mut favorable = MoveList::new();
    let mut neutral = MoveList::new();
    let mut unfavorable = MoveList::new();

    for &cell in PRIOR_ORDER.iter().filter(|&&c| board.is_empty(c)) {
        match classify(board, cell) {
            Tier::Favorable => favorable.push(cell),
            Tier::Neutral => neutral.push(cell),
            Tier::Unfavorable => unfavorable.push(cell),
        }
    }

    let mut ordered = OrderedMoves::default();
    for bucket in [&favorable, &neutral, &unfavorable] {
        ordered.for_max.extend(bucket.iter());
    }
    for bucket in [&unfavorable, &neutral, &favorable] {
        ordered.for_min.extend(bucket.iter());
    }
    ordered
}

impl MoveOrder {
    /// Candidate moves for `player` on `board`
    pub fn candidates(self, board: &Board, player: Player) -> MoveList {
        match self {
            MoveOrder::Natural => board.empty_cells(),
            MoveOrder::Heuristic => *order_moves(board).for_player(player),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_prior_order_is_a_permutation() {
        let cells: BTreeSet<usize> = PRIOR_ORDER.iter().map(|c| c.index()).collect();
        assert_eq!(cells.len(), 25);
    }

    #[test]
    fn test_empty_board_follows_prior_order() {
        let ordered = order_moves(&Board::new());
        assert_eq!(ordered.for_max.as_slice(), &PRIOR_ORDER[..]);
        assert_eq!(ordered.for_min.as_slice(), &PRIOR_ORDER[..]);
    }

    #[test]
    fn test_orderings_are_mirrors() {
        let board = Board::from_rows(&["XX...", ".....", "..O..", "...O.", "....."]).unwrap();
        let ordered = order_moves(&board);
        assert_eq!(ordered.for_max.len(), 21);
        assert_eq!(ordered.for_min.len(), 21);

        // (0,2) and (0,3) are holes in Max's row quads
        assert_eq!(classify(&board, Coord::new(0, 3)), Tier::Favorable);
        // (1,1) is a hole in Min's diagonal
        assert_eq!(classify(&board, Coord::new(1, 1)), Tier::Unfavorable);

        assert_eq!(ordered.for_max.as_slice()[0], Coord::new(0, 3));
        assert_eq!(ordered.for_min.as_slice()[0], Coord::new(1, 1));
        let max_set: BTreeSet<Coord> = ordered.for_max.iter().collect();
        let min_set: BTreeSet<Coord> = ordered.for_min.iter().collect();
        assert_eq!(max_set, min_set);
    }

    #[test]
    fn test_triplet_holes() {
        // The corner diagonal (0,2), (1,1), (2,0) lies in no quad.
        let board = Board::from_rows(&[".....", ".O...", "O....", ".....", "...XX"]).unwrap();
        assert_eq!(classify(&board, Coord::new(0, 2)), Tier::Favorable);

        let board = Board::from_rows(&[".....", ".X...", "X....", ".....", "...OO"]).unwrap();
        assert_eq!(classify(&board, Coord::new(0, 2)), Tier::Unfavorable);

        // A quad holding two marks decides before any triplet.
        let board = Board::from_rows(&["OO...", ".....", "X....", ".....", "..X.."]).unwrap();
        assert_eq!(classify(&board, Coord::new(0, 2)), Tier::Unfavorable);
    }

    #[test]
    fn test_natural_order_is_row_major() {
        let board = Board::from_rows(&["X....", ".....", ".....", ".....", "....O"]).unwrap();
        let moves = MoveOrder::Natural.candidates(&board, Player::Min);
        assert_eq!(moves.as_slice()[0], Coord::new(0, 1));
        assert_eq!(moves.len(), 23);
    }
}
