//! Position evaluation
//!
//! Evaluators score the effect of the move just placed on a cell, looking
//! only at the lines through that cell. Terminal scores are ply-adjusted
//! (`WIN - ply`) so the search prefers quick wins and slow losses; the
//! heuristic part always stays far below `WIN` so a heuristic lead is never
//! mistaken for a forced result.

use std::fmt::Debug;
use std::ops::ControlFlow;

use rand::Rng;

use crate::board::{Board, Coord, CELLS, SIZE};
use crate::lines::{lines_at, tables, COVERING_CELLS};

/// Score of a won game at ply 0
pub const WIN: i32 = 10_000;

/// Score of a lost game at ply 0
pub const LOSS: i32 = -WIN;

/// Score of a filled board with no line
pub const DRAW: i32 = 0;

/// Weight of a quad holding three marks of one side and a hole
pub const PARTIAL_WEIGHT: i32 = 10;

/// Penalty for creating a shape that can only ever end in a loss
pub const SHAPE_PENALTY: i32 = 100;

/// Outcome of evaluating a single move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    /// The move ended the game; the score is final
    Terminal(i32),
    /// The ply budget is used up; the score includes the carried value
    Horizon(i32),
    /// The game goes on; the score is this move's heuristic delta
    Continue(i32),
}

impl Evaluation {
    /// True if the search must not recurse below this move
    #[inline]
    pub fn stops(self) -> bool {
        !matches!(self, Evaluation::Continue(_))
    }

    #[inline]
    pub fn value(self) -> i32 {
        match self {
            Evaluation::Terminal(v) | Evaluation::Horizon(v) | Evaluation::Continue(v) => v,
        }
    }
}

/// Positional bias per cell, used while every line is beyond the horizon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BiasTable {
    values: [[i32; SIZE]; SIZE],
}

impl BiasTable {
    /// The reference table: corners of the inner square score highest,
    /// the middle row and column score nothing.
    pub const REFERENCE: BiasTable = BiasTable {
        values: [
            [3, 3, 0, 3, 3],
            [3, 4, 1, 4, 3],
            [0, 1, 0, 1, 0],
            [3, 4, 1, 4, 3],
            [3, 3, 0, 3, 3],
        ],
    };

    pub fn new(values: [[i32; SIZE]; SIZE]) -> Self {
        BiasTable { values }
    }

    /// A table of uniformly random values in `-5..=5`
    pub fn randomized<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut values = [[0; SIZE]; SIZE];
        for row in values.iter_mut() {
            for v in row.iter_mut() {
                *v = rng.gen_range(-5..=5);
            }
        }
        BiasTable { values }
    }

    #[inline]
    pub fn at(&self, cell: Coord) -> i32 {
        self.values[cell.row as usize][cell.col as usize]
    }

    /// Sum of `bias * mark` over the whole board
    pub fn board_sum(&self, board: &Board) -> i32 {
        (0..CELLS)
            .map(|idx| {
                let cell = Coord::from_index(idx);
                self.at(cell) * board.get(cell) as i32
            })
            .sum()
    }
}

impl Default for BiasTable {
    fn default() -> Self {
        Self::REFERENCE
    }
}

/// Scores moves for the searches
///
/// Implementations must keep every non-terminal score well inside
/// `(LOSS + max ply, WIN - max ply)`.
pub trait Evaluator: Debug + Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Evaluates the move just placed on `cell` at depth `ply`.
    ///
    /// `carried` is the heuristic value accumulated along the path so far;
    /// it is folded into the result only when `ply` reaches `max_depth`.
    fn delta(&self, board: &Board, ply: u32, cell: Coord, carried: i32, max_depth: u32)
        -> Evaluation;

    /// One-shot estimate of a whole position, without a known last move.
    ///
    /// Returns either [`Evaluation::Terminal`] or [`Evaluation::Continue`].
    fn static_value(&self, board: &Board, ply: u32) -> Evaluation;
}

/// Ply-adjusted score of a decided line with sum `sum` and length `len`
#[inline]
fn terminal_score(sum: i32, len: i32, ply: u32) -> i32 {
    // A full quad of sign s wins for s; a full triplet of sign s loses for s.
    let sign = sum / len;
    let magnitude = WIN - ply as i32;
    if len == 4 {
        sign * magnitude
    } else {
        -sign * magnitude
    }
}

/// Applies the draw and horizon rules to a non-terminal move value
#[inline]
fn settle(board: &Board, ply: u32, max_depth: u32, carried: i32, value: i32) -> Evaluation {
    if board.is_full() {
        Evaluation::Terminal(DRAW)
    } else if ply >= max_depth {
        Evaluation::Horizon(value + carried)
    } else {
        Evaluation::Continue(value)
    }
}

/// The reference evaluator: wins, losses, near-complete quads and bias
#[derive(Debug, Clone)]
pub struct StandardEvaluator {
    bias: BiasTable,
    partial_weight: i32,
}

impl StandardEvaluator {
    pub fn new() -> Self {
        Self::with_bias(BiasTable::REFERENCE)
    }

    pub fn with_bias(bias: BiasTable) -> Self {
        StandardEvaluator {
            bias,
            partial_weight: PARTIAL_WEIGHT,
        }
    }

    pub fn bias(&self) -> &BiasTable {
        &self.bias
    }

    /// Checks the lines through `cell`.
    ///
    /// Breaks with the terminal score if the move decided the game, otherwise
    /// continues with the partial-quad heuristic. Quads go first.
    pub fn scan_lines(&self, board: &Board, ply: u32, cell: Coord) -> ControlFlow<i32, i32> {
        let lines = lines_at(cell);
        let mut partial = 0;
        for quad in &lines.wins {
            let sum = quad.sum(board);
            match sum.abs() {
                4 => return ControlFlow::Break(terminal_score(sum, 4, ply)),
                3 => partial += sum * self.partial_weight,
                _ => {}
            }
        }
        for triplet in &lines.losses {
            let sum = triplet.sum(board);
            if sum.abs() == 3 {
                return ControlFlow::Break(terminal_score(sum, 3, ply));
            }
        }
        ControlFlow::Continue(partial)
    }
}

impl Default for StandardEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator for StandardEvaluator {
    fn name(&self) -> &'static str {
        "standard"
    }

    fn delta(
        &self,
        board: &Board,
        ply: u32,
        cell: Coord,
        carried: i32,
        max_depth: u32,
    ) -> Evaluation {
        let partial = match self.scan_lines(board, ply, cell) {
            ControlFlow::Break(score) => return Evaluation::Terminal(score),
            ControlFlow::Continue(partial) => partial,
        };
        let value = partial + self.bias.at(cell) * board.get(cell) as i32;
        settle(board, ply, max_depth, carried, value)
    }

    fn static_value(&self, board: &Board, ply: u32) -> Evaluation {
        // Lines reach several covering cells; count each one once.
        let mut seen_quads = 0u32;
        let mut value = 0;
        let mut partial_found = false;
        for cell in COVERING_CELLS {
            for quad in &lines_at(cell).wins {
                if seen_quads & (1 << quad.id) != 0 {
                    continue;
                }
                seen_quads |= 1 << quad.id;
                let sum = quad.sum(board);
                match sum.abs() {
                    4 => return Evaluation::Terminal(terminal_score(sum, 4, ply)),
                    3 => {
                        value += sum * self.partial_weight;
                        partial_found = true;
                    }
                    _ => {}
                }
            }
        }

        let mut seen_triplets = 0u64;
        for cell in COVERING_CELLS {
            for triplet in &lines_at(cell).losses {
                if seen_triplets & (1 << triplet.id) != 0 {
                    continue;
                }
                seen_triplets |= 1 << triplet.id;
                let sum = triplet.sum(board);
                if sum.abs() == 3 {
                    return Evaluation::Terminal(terminal_score(sum, 3, ply));
                }
            }
        }

        if board.is_full() {
            return Evaluation::Terminal(DRAW);
        }
        // Partials of both sides may cancel out; the bias is only for
        // positions without any.
        if !partial_found {
            value = self.bias.board_sum(board);
        }
        Evaluation::Continue(value)
    }
}

/// Standard evaluation plus penalties for dead shapes
///
/// Two shapes can never turn into a win:
/// - two marks and a hole on a triplet that lies in no quad, and
/// - both interior cells of a quad that cannot extend past its ends, with
///   both ends still empty.
///
/// Both are penalized for the side that owns them, whether or not the
/// eventual loss is visible within the search horizon.
#[derive(Debug, Clone)]
pub struct AvoidShapesEvaluator {
    base: StandardEvaluator,
    penalty: i32,
}

impl AvoidShapesEvaluator {
    pub fn new() -> Self {
        Self::with_bias(BiasTable::REFERENCE)
    }

    pub fn with_bias(bias: BiasTable) -> Self {
        AvoidShapesEvaluator {
            base: StandardEvaluator::with_bias(bias),
            penalty: SHAPE_PENALTY,
        }
    }

    /// Penalty incurred by the mark on `cell`, signed against its owner
    pub fn shape_penalty(&self, board: &Board, cell: Coord) -> i32 {
        let mover = board.get(cell) as i32;
        if mover == 0 {
            return 0;
        }
        let t = tables();
        let mut value = 0;

        for triplet in t.dead_triplets.iter().filter(|l| l.contains(cell)) {
            if triplet.sum(board) == 2 * mover {
                value -= mover * self.penalty;
            }
        }

        for quad in &t.capped_quads {
            let [outer_a, inner_a, inner_b, outer_b] = quad.cells;
            let interior = (cell == inner_a && board.get(inner_b) as i32 == mover)
                || (cell == inner_b && board.get(inner_a) as i32 == mover);
            if interior && board.is_empty(outer_a) && board.is_empty(outer_b) {
                value -= mover * self.penalty;
            }
        }

        value
    }
}

impl Default for AvoidShapesEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator for AvoidShapesEvaluator {
    fn name(&self) -> &'static str {
        "avoid-shapes"
    }

    fn delta(
        &self,
        board: &Board,
        ply: u32,
        cell: Coord,
        carried: i32,
        max_depth: u32,
    ) -> Evaluation {
        let partial = match self.base.scan_lines(board, ply, cell) {
            ControlFlow::Break(score) => return Evaluation::Terminal(score),
            ControlFlow::Continue(partial) => partial,
        };
        let value = partial
            + self.shape_penalty(board, cell)
            + self.base.bias().at(cell) * board.get(cell) as i32;
        settle(board, ply, max_depth, carried, value)
    }

    fn static_value(&self, board: &Board, ply: u32) -> Evaluation {
        self.base.static_value(board, ply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Player;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    fn play(board: &mut Board, moves: &[(u8, u8, Player)]) {
        for &(r, c, p) in moves {
            board.set(Coord::new(r, c), p);
        }
    }

    #[test]
    fn test_three_in_a_row_loses_for_mover() {
        let eval = StandardEvaluator::new();
        let mut board = Board::new();
        play(
            &mut board,
            &[
                (0, 0, Player::Max),
                (4, 4, Player::Min),
                (1, 0, Player::Max),
                (3, 3, Player::Min),
                (2, 0, Player::Max),
            ],
        );
        let result = eval.delta(&board, 4, Coord::new(2, 0), 0, 10);
        assert_eq!(result, Evaluation::Terminal(-(WIN - 4)));
    }

    #[test]
    fn test_four_in_a_row_wins_for_mover() {
        let eval = StandardEvaluator::new();
        let mut board = Board::new();
        play(
            &mut board,
            &[
                (0, 0, Player::Max),
                (4, 4, Player::Min),
                (1, 0, Player::Max),
                (3, 3, Player::Min),
                (3, 0, Player::Max),
                (4, 2, Player::Min),
            ],
        );
        assert!(!eval.delta(&board, 5, Coord::new(4, 2), 0, 10).stops());
        board.set(Coord::new(2, 0), Player::Max);
        assert_eq!(
            eval.delta(&board, 6, Coord::new(2, 0), 0, 10),
            Evaluation::Terminal(WIN - 6)
        );
    }

    #[test]
    fn test_min_win_and_loss_signs() {
        let eval = StandardEvaluator::new();
        let board = Board::from_rows(&["OOOO.", "XX...", "..X..", ".....", "X...."]).unwrap();
        assert_eq!(
            eval.delta(&board, 2, Coord::new(0, 3), 0, 10),
            Evaluation::Terminal(-(WIN - 2))
        );

        let board = Board::from_rows(&["OOO..", "X.X..", ".....", ".....", "X...."]).unwrap();
        assert_eq!(
            eval.delta(&board, 3, Coord::new(0, 2), 0, 10),
            Evaluation::Terminal(WIN - 3)
        );
    }

    #[test]
    fn test_completed_triplet_beats_partial_quad() {
        let eval = StandardEvaluator::new();
        let board = Board::from_rows(&["XXX..", "OO...", ".....", "....O", "....."]).unwrap();
        assert_eq!(
            eval.delta(&board, 1, Coord::new(0, 2), 0, 10),
            Evaluation::Terminal(-(WIN - 1))
        );
    }

    #[test]
    fn test_partial_quad_and_bias() {
        let eval = StandardEvaluator::new();
        // X holds (1,1), (1,3) and plays (1,4): row quad (1,1)..(1,4) holds three.
        let board = Board::from_rows(&[".....", ".X.XX", "O....", "....O", "....."]).unwrap();
        let cell = Coord::new(1, 4);
        assert_eq!(
            eval.delta(&board, 1, cell, 0, 10),
            Evaluation::Continue(3 * PARTIAL_WEIGHT + BiasTable::REFERENCE.at(cell))
        );
    }

    #[test]
    fn test_horizon_folds_carried_value() {
        let eval = StandardEvaluator::new();
        let mut board = Board::new();
        let cell = Coord::new(1, 1);
        board.set(cell, Player::Min);
        assert_eq!(eval.delta(&board, 3, cell, 0, 4), Evaluation::Continue(-4));
        assert_eq!(eval.delta(&board, 4, cell, 25, 4), Evaluation::Horizon(21));
    }

    #[test]
    fn test_filled_board_is_a_draw() {
        let eval = StandardEvaluator::new();
        let mut board =
            Board::from_rows(&["XXOOX", "OOXXO", "XXOOX", "OOXXO", "XXOO."]).unwrap();
        let cell = Coord::new(4, 4);
        board.set(cell, Player::Max);
        assert_eq!(eval.delta(&board, 0, cell, 40, 10), Evaluation::Terminal(DRAW));
        assert_eq!(eval.static_value(&board, 0), Evaluation::Terminal(DRAW));
    }

    #[test]
    fn test_static_value_detects_results() {
        let eval = StandardEvaluator::new();
        let won = Board::from_rows(&["....X", "...X.", "..X..", ".X...", "OO.O."]).unwrap();
        assert_eq!(eval.static_value(&won, 2), Evaluation::Terminal(WIN - 2));

        let lost = Board::from_rows(&[".....", ".....", "OOO..", "X.X..", "....."]).unwrap();
        assert_eq!(eval.static_value(&lost, 0), Evaluation::Terminal(WIN));
    }

    #[test]
    fn test_static_value_falls_back_to_bias() {
        let eval = StandardEvaluator::new();
        let board = Board::from_rows(&["X....", ".....", ".....", ".O...", "....."]).unwrap();
        // bias (0,0) = 3 for X, bias (3,1) = 4 for O
        assert_eq!(eval.static_value(&board, 0), Evaluation::Continue(3 - 4));
    }

    #[test]
    fn test_static_value_counts_each_partial_once() {
        let eval = StandardEvaluator::new();
        // Quad (2,0)..(2,3) holds three X and passes through four covering cells.
        let board = Board::from_rows(&["O....", ".....", "XX.X.", ".....", "O...O"]).unwrap();
        assert_eq!(eval.static_value(&board, 0), Evaluation::Continue(3 * PARTIAL_WEIGHT));
    }

    #[test]
    fn test_static_value_keeps_cancelling_partials() {
        let eval = StandardEvaluator::new();
        // X threatens the top row, O the right column; the bias sum is 3.
        let board = Board::from_rows(&["XX.X.", "....O", "....O", ".....", "....O"]).unwrap();
        assert_eq!(BiasTable::REFERENCE.board_sum(&board), 3);
        assert_eq!(eval.static_value(&board, 0), Evaluation::Continue(0));
    }

    #[test]
    fn test_every_quad_wins_from_every_cell() {
        let eval = StandardEvaluator::new();
        let ply = 3;
        for quad in &tables().quads {
            for player in [Player::Max, Player::Min] {
                let mut board = Board::new();
                for &cell in &quad.cells {
                    board.set(cell, player);
                }
                for &cell in &quad.cells {
                    assert_eq!(
                        eval.delta(&board, ply, cell, 0, 10),
                        Evaluation::Terminal(player.sign() * (WIN - ply as i32)),
                        "quad {} completed at {} by {:?}",
                        quad.id,
                        cell,
                        player
                    );
                }
            }
        }
    }

    #[test]
    fn test_live_two_on_dead_triplet_is_penalized() {
        let eval = AvoidShapesEvaluator::new();
        let standard = StandardEvaluator::new();
        // (2,0), (1,1), (0,2) can never be part of a four.
        let board = Board::from_rows(&[".....", ".X...", "X....", ".....", "....O"]).unwrap();
        let cell = Coord::new(2, 0);
        let plain = standard.delta(&board, 1, cell, 0, 10).value();
        assert_eq!(
            eval.delta(&board, 1, cell, 0, 10),
            Evaluation::Continue(plain - SHAPE_PENALTY)
        );
    }

    #[test]
    fn test_capped_quad_middle_pair_is_penalized() {
        let eval = AvoidShapesEvaluator::new();
        // (2,1), (3,2) are the interior of the diagonal (1,0)..(4,3).
        let board = Board::from_rows(&[".....", ".....", ".O...", "..O..", "X...X"]).unwrap();
        assert_eq!(eval.shape_penalty(&board, Coord::new(3, 2)), SHAPE_PENALTY);

        let blocked = Board::from_rows(&[".....", "X....", ".O...", "..O..", "X...X"]).unwrap();
        assert_eq!(eval.shape_penalty(&blocked, Coord::new(3, 2)), 0);
    }

    #[test]
    fn test_heuristics_stay_far_below_win() {
        let standard = StandardEvaluator::new();
        let shapes = AvoidShapesEvaluator::new();
        let evaluators: [&dyn Evaluator; 2] = [&standard, &shapes];
        let mut rng = StdRng::seed_from_u64(7);
        for eval in evaluators {
            for _ in 0..200 {
                let mut board = Board::new();
                let mut player = Player::Max;
                let mut cells = board.empty_cells().as_slice().to_vec();
                cells.shuffle(&mut rng);
                for (ply, cell) in cells.into_iter().enumerate() {
                    board.set(cell, player);
                    match eval.delta(&board, ply as u32, cell, 0, 30) {
                        Evaluation::Continue(d) => {
                            assert!(d.abs() < WIN / 10, "{} scored {}", eval.name(), d)
                        }
                        Evaluation::Terminal(_) | Evaluation::Horizon(_) => break,
                    }
                    player = player.opponent();
                }
            }
        }
    }
}
