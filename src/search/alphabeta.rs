//! Minimax with alpha-beta pruning

use std::sync::Arc;

use crate::board::{Board, Player};
use crate::config::SearchConfig;
use crate::eval::{Evaluation, Evaluator};
use crate::ordering::MoveOrder;
use crate::search::{Descent, SearchOutcome, SearchStrategy, Searcher, Session, INFINITY};
use crate::Result;

impl Session<'_> {
    /// Minimax value of the node where `player` is to move.
    ///
    /// Scores are absolute: positive favors [`Player::Max`]. `carried` is the
    /// heuristic total of the moves leading here.
    pub(crate) fn alpha_beta(
        &mut self,
        ply: u32,
        player: Player,
        mut alpha: i32,
        mut beta: i32,
        carried: i32,
    ) -> i32 {
        let moves = self.candidates(player);
        if moves.is_empty() {
            return self.dead_end(carried);
        }

        let mut value = match player {
            Player::Max => -INFINITY,
            Player::Min => INFINITY,
        };
        for cell in moves.iter() {
            let score = {
                let mut node = self.place(cell, player);
                match node.evaluate(ply, cell, carried) {
                    Evaluation::Continue(delta) => node.alpha_beta(
                        ply + 1,
                        player.opponent(),
                        alpha,
                        beta,
                        carried + delta,
                    ),
                    stop => stop.value(),
                }
            };
            match player {
                Player::Max => {
                    value = value.max(score);
                    alpha = alpha.max(value);
                }
                Player::Min => {
                    value = value.min(score);
                    beta = beta.min(value);
                }
            }
            if beta <= alpha {
                break;
            }
        }
        value
    }
}

/// Sequential alpha-beta search
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use squava::{AlphaBeta, Board, Player, SearchStrategy, StandardEvaluator};
///
/// let mut search = AlphaBeta::new(Arc::new(StandardEvaluator::new()));
/// let outcome = search.search(&Board::new(), Player::Max, 2, true).unwrap();
/// assert!(outcome.best.is_some());
/// ```
#[derive(Debug)]
pub struct AlphaBeta {
    searcher: Searcher,
}

impl AlphaBeta {
    pub fn new(evaluator: Arc<dyn Evaluator>) -> Self {
        AlphaBeta {
            searcher: Searcher::new(evaluator, MoveOrder::default(), None),
        }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        AlphaBeta {
            searcher: Searcher::from_config(config),
        }
    }

    pub fn with_move_order(mut self, order: MoveOrder) -> Self {
        self.searcher = self.searcher.with_move_order(order);
        self
    }
}

impl SearchStrategy for AlphaBeta {
    fn name(&self) -> &'static str {
        "alpha-beta"
    }

    fn search(
        &mut self,
        board: &Board,
        to_move: Player,
        max_depth: u32,
        deterministic: bool,
    ) -> Result<SearchOutcome> {
        Ok(self.searcher.run(
            "alpha-beta",
            Descent::AlphaBeta,
            board,
            to_move,
            max_depth,
            deterministic,
        ))
    }
}
