//! Minimax searches
//!
//! Both searches walk the tree by placing a mark on a single shared board,
//! recursing, and clearing the mark again. A `Session` owns that board for
//! the duration of one search together with the budget and counters, so two
//! searches never share state. Marks are placed through a `Placement`
//! guard that clears the cell when it goes out of scope, whichever way the
//! node is left.
//!
//! Root moves are each searched with the full window. This keeps every root
//! score exact, so the sequential searches and the worker pool agree on the
//! best score and on the set of moves tied for it.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Instant;

use log::debug;
use rand::rngs::StdRng;
use rand::Rng;

use crate::board::{Board, Coord, MoveList, Player};
use crate::config::{make_rng, SearchConfig};
use crate::eval::{Evaluation, Evaluator, WIN};
use crate::ordering::MoveOrder;
use crate::Result;

pub mod alphabeta;
pub mod negascout;

pub use alphabeta::AlphaBeta;
pub use negascout::NegaScout;

/// Bound outside every reachable score
pub const INFINITY: i32 = 2 * WIN;

/// Result of a root search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOutcome {
    /// The chosen move, or `None` when the board has no empty cell
    pub best: Option<Coord>,
    /// Score of the chosen move for the side that plays it
    pub score: i32,
    /// Positions where the search stopped descending
    pub leaves: u64,
}

impl SearchOutcome {
    /// The "no move available" outcome
    pub fn no_move(leaves: u64) -> Self {
        SearchOutcome {
            best: None,
            score: 0,
            leaves,
        }
    }
}

/// A root search over a board
pub trait SearchStrategy: Send {
    fn name(&self) -> &'static str;

    /// Picks a move for `to_move`.
    ///
    /// `board` is left untouched; the search works on its own copy.
    fn search(
        &mut self,
        board: &Board,
        to_move: Player,
        max_depth: u32,
        deterministic: bool,
    ) -> Result<SearchOutcome>;
}

impl<S: SearchStrategy + ?Sized> SearchStrategy for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn search(
        &mut self,
        board: &Board,
        to_move: Player,
        max_depth: u32,
        deterministic: bool,
    ) -> Result<SearchOutcome> {
        (**self).search(board, to_move, max_depth, deterministic)
    }
}

/// Tracks the best root score and every move reaching it
///
/// Offering the same moves in any order leaves the keeper in the same
/// state, so results can be merged as they arrive from worker threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveKeeper {
    best: i32,
    ties: u32,
}

impl MoveKeeper {
    pub fn new() -> Self {
        MoveKeeper {
            best: i32::MIN,
            ties: 0,
        }
    }

    pub fn offer(&mut self, cell: Coord, score: i32) {
        let bit = 1 << cell.index();
        if score > self.best {
            self.best = score;
            self.ties = bit;
        } else if score == self.best {
            self.ties |= bit;
        }
    }

    pub fn merge(&mut self, other: &MoveKeeper) {
        if other.best > self.best {
            *self = *other;
        } else if other.best == self.best {
            self.ties |= other.ties;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ties == 0
    }

    /// Moves sharing the best score, in row-major order
    pub fn tied(&self) -> MoveList {
        (0..32usize)
            .filter(|i| self.ties & (1 << i) != 0)
            .map(Coord::from_index)
            .collect()
    }

    /// Picks among the tied moves: the lowest index when deterministic,
    /// uniformly at random otherwise.
    pub fn choose<R: Rng + ?Sized>(
        &self,
        deterministic: bool,
        rng: &mut R,
    ) -> Option<(Coord, i32)> {
        if self.is_empty() {
            return None;
        }
        let tied = self.tied();
        let pick = if deterministic {
            0
        } else {
            rng.gen_range(0..tied.len())
        };
        Some((tied.as_slice()[pick], self.best))
    }

    /// Converts into an outcome, falling back to the no-move sentinel
    pub fn into_outcome<R: Rng + ?Sized>(
        self,
        deterministic: bool,
        rng: &mut R,
        leaves: u64,
    ) -> SearchOutcome {
        match self.choose(deterministic, rng) {
            Some((cell, score)) => SearchOutcome {
                best: Some(cell),
                score,
                leaves,
            },
            None => SearchOutcome::no_move(leaves),
        }
    }
}

impl Default for MoveKeeper {
    fn default() -> Self {
        Self::new()
    }
}

/// State of one search invocation
pub(crate) struct Session<'a> {
    board: &'a mut Board,
    evaluator: &'a dyn Evaluator,
    max_depth: u32,
    order: MoveOrder,
    pub leaves: u64,
}

impl<'a> Session<'a> {
    pub fn new(
        board: &'a mut Board,
        evaluator: &'a dyn Evaluator,
        max_depth: u32,
        order: MoveOrder,
    ) -> Self {
        Session {
            board,
            evaluator,
            max_depth,
            order,
            leaves: 0,
        }
    }

    /// Marks `cell` for `player` until the returned guard is dropped
    pub fn place(&mut self, cell: Coord, player: Player) -> Placement<'_, 'a> {
        self.board.set(cell, player);
        Placement {
            session: self,
            cell,
        }
    }

    /// Moves to try at a node, best first for `player`
    pub fn candidates(&self, player: Player) -> MoveList {
        self.order.candidates(&*self.board, player)
    }

    /// Evaluates the mark just placed on `cell`, counting a leaf whenever
    /// the search stops there.
    pub fn evaluate(&mut self, ply: u32, cell: Coord, carried: i32) -> Evaluation {
        let evaluation = self
            .evaluator
            .delta(&*self.board, ply, cell, carried, self.max_depth);
        if evaluation.stops() {
            self.leaves += 1;
        }
        evaluation
    }

    /// Called for a node with no empty cell left
    pub fn dead_end(&mut self, carried: i32) -> i32 {
        self.leaves += 1;
        carried
    }
}

/// A mark on the session board, cleared on drop
pub(crate) struct Placement<'s, 'a> {
    session: &'s mut Session<'a>,
    cell: Coord,
}

impl<'a> Deref for Placement<'_, 'a> {
    type Target = Session<'a>;

    fn deref(&self) -> &Self::Target {
        &*self.session
    }
}

impl<'a> DerefMut for Placement<'_, 'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.session
    }
}

impl Drop for Placement<'_, '_> {
    fn drop(&mut self) {
        self.session.board.clear(self.cell);
    }
}

/// Which recursion scores the root moves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Descent {
    AlphaBeta,
    NegaScout,
}

impl Session<'_> {
    /// Scores a root move for `to_move`, from `to_move`'s point of view
    pub fn score_root_move(&mut self, cell: Coord, to_move: Player, descent: Descent) -> i32 {
        let mut node = self.place(cell, to_move);
        match node.evaluate(0, cell, 0) {
            Evaluation::Continue(delta) => match descent {
                Descent::AlphaBeta => {
                    to_move.sign()
                        * node.alpha_beta(1, to_move.opponent(), -INFINITY, INFINITY, delta)
                }
                Descent::NegaScout => {
                    -node.nega_scout(1, to_move.opponent(), -INFINITY, INFINITY, delta)
                }
            },
            stop => to_move.sign() * stop.value(),
        }
    }
}

/// Whole-board estimate taken before a root search.
///
/// Returns the no-move outcome when the game on `board` is already decided
/// or drawn, since no move is left to choose.
pub(crate) fn settled_root(
    evaluator: &dyn Evaluator,
    name: &str,
    board: &Board,
) -> Option<SearchOutcome> {
    match evaluator.static_value(board, 0) {
        Evaluation::Terminal(score) => {
            debug!("{}: position already decided ({}), no move", name, score);
            Some(SearchOutcome::no_move(0))
        }
        estimate => {
            debug!("{}: static estimate {}", name, estimate.value());
            None
        }
    }
}

/// Shared state of the sequential strategies
#[derive(Debug)]
pub(crate) struct Searcher {
    evaluator: Arc<dyn Evaluator>,
    order: MoveOrder,
    rng: StdRng,
}

impl Searcher {
    pub fn new(evaluator: Arc<dyn Evaluator>, order: MoveOrder, seed: Option<u64>) -> Self {
        Searcher {
            evaluator,
            order,
            rng: make_rng(seed),
        }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(config.evaluator(), config.move_order, config.seed)
    }

    pub fn with_move_order(mut self, order: MoveOrder) -> Self {
        self.order = order;
        self
    }

    pub fn run(
        &mut self,
        name: &str,
        descent: Descent,
        board: &Board,
        to_move: Player,
        max_depth: u32,
        deterministic: bool,
    ) -> SearchOutcome {
        let start = Instant::now();
        if let Some(outcome) = settled_root(&*self.evaluator, name, board) {
            return outcome;
        }
        let mut scratch = *board;
        let mut session = Session::new(&mut scratch, &*self.evaluator, max_depth, self.order);
        let mut keeper = MoveKeeper::new();
        for cell in session.candidates(to_move).iter() {
            let score = session.score_root_move(cell, to_move, descent);
            keeper.offer(cell, score);
        }
        let leaves = session.leaves;
        let outcome = keeper.into_outcome(deterministic, &mut self.rng, leaves);
        debug!(
            "{} ({}) chose {:?} for {:?}: score {}, {} leaves in {:?}",
            name,
            self.evaluator.name(),
            outcome.best,
            to_move,
            outcome.score,
            outcome.leaves,
            start.elapsed()
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::StandardEvaluator;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_keeper_is_order_independent() {
        let offers = [(3, 5), (7, 9), (1, 9), (12, -4), (20, 9)];
        let mut forward = MoveKeeper::new();
        for &(i, s) in &offers {
            forward.offer(Coord::from_index(i), s);
        }
        let mut backward = MoveKeeper::new();
        for &(i, s) in offers.iter().rev() {
            backward.offer(Coord::from_index(i), s);
        }
        assert_eq!(forward, backward);

        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            forward.choose(true, &mut rng),
            Some((Coord::from_index(1), 9))
        );
        let tied: Vec<usize> = forward.tied().iter().map(|c| c.index()).collect();
        assert_eq!(tied, vec![1, 7, 20]);
    }

    #[test]
    fn test_keeper_merge_matches_single_keeper() {
        let mut left = MoveKeeper::new();
        left.offer(Coord::from_index(4), 2);
        left.offer(Coord::from_index(8), 6);
        let mut right = MoveKeeper::new();
        right.offer(Coord::from_index(2), 6);
        right.offer(Coord::from_index(9), 1);

        let mut all = MoveKeeper::new();
        for (i, s) in [(4, 2), (8, 6), (2, 6), (9, 1)] {
            all.offer(Coord::from_index(i), s);
        }
        left.merge(&right);
        assert_eq!(left, all);
    }

    #[test]
    fn test_random_choice_stays_among_ties() {
        let mut keeper = MoveKeeper::new();
        keeper.offer(Coord::from_index(0), 1);
        keeper.offer(Coord::from_index(5), 3);
        keeper.offer(Coord::from_index(6), 3);
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..50 {
            let (cell, score) = keeper.choose(false, &mut rng).unwrap();
            assert_eq!(score, 3);
            assert!(cell.index() == 5 || cell.index() == 6);
        }
    }

    #[test]
    fn test_empty_keeper_gives_sentinel() {
        let mut rng = StdRng::seed_from_u64(0);
        let outcome = MoveKeeper::new().into_outcome(true, &mut rng, 0);
        assert_eq!(outcome, SearchOutcome::no_move(0));
    }

    #[test]
    fn test_placement_clears_on_every_exit() {
        let evaluator = StandardEvaluator::new();
        let mut board = Board::from_rows(&["XX...", "OO...", ".....", ".....", "....."]).unwrap();
        let before = board;
        {
            let mut session = Session::new(&mut board, &evaluator, 4, MoveOrder::Natural);
            for cell in session.candidates(Player::Max).iter() {
                let mut node = session.place(cell, Player::Max);
                if node.evaluate(0, cell, 0).stops() {
                    break;
                }
            }
        }
        assert_eq!(board, before);
    }
}
