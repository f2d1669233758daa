//! NegaScout (principal variation search)
//!
//! Negamax form of alpha-beta: every node scores from the point of view of
//! the side to move there. After the first candidate, each move is tested
//! with a null window first and only re-searched with the full window when
//! the scout score lands strictly inside it. Good move ordering is what
//! makes the scouts pay off.

use std::sync::Arc;

use crate::board::{Board, Player};
use crate::config::SearchConfig;
use crate::eval::{Evaluation, Evaluator};
use crate::ordering::MoveOrder;
use crate::search::{Descent, SearchOutcome, SearchStrategy, Searcher, Session, INFINITY};
use crate::Result;

impl Session<'_> {
    /// Negamax value of the node where `player` is to move, from `player`'s
    /// point of view.
    pub(crate) fn nega_scout(
        &mut self,
        ply: u32,
        player: Player,
        mut alpha: i32,
        beta: i32,
        carried: i32,
    ) -> i32 {
        let moves = self.candidates(player);
        if moves.is_empty() {
            return player.sign() * self.dead_end(carried);
        }

        let mut best = -INFINITY;
        for (i, cell) in moves.iter().enumerate() {
            let score = {
                let mut node = self.place(cell, player);
                match node.evaluate(ply, cell, carried) {
                    Evaluation::Continue(delta) => {
                        let next = carried + delta;
                        let child = player.opponent();
                        if i == 0 {
                            -node.nega_scout(ply + 1, child, -beta, -alpha, next)
                        } else {
                            let scout = -node.nega_scout(ply + 1, child, -alpha - 1, -alpha, next);
                            if alpha < scout && scout < beta {
                                -node.nega_scout(ply + 1, child, -beta, -alpha, next)
                            } else {
                                scout
                            }
                        }
                    }
                    stop => player.sign() * stop.value(),
                }
            };
            best = best.max(score);
            alpha = alpha.max(score);
            if alpha >= beta {
                break;
            }
        }
        best
    }
}

/// Sequential negascout search
#[derive(Debug)]
pub struct NegaScout {
    searcher: Searcher,
}

impl NegaScout {
    pub fn new(evaluator: Arc<dyn Evaluator>) -> Self {
        NegaScout {
            searcher: Searcher::new(evaluator, MoveOrder::default(), None),
        }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        NegaScout {
            searcher: Searcher::from_config(config),
        }
    }

    pub fn with_move_order(mut self, order: MoveOrder) -> Self {
        self.searcher = self.searcher.with_move_order(order);
        self
    }
}

impl SearchStrategy for NegaScout {
    fn name(&self) -> &'static str {
        "negascout"
    }

    fn search(
        &mut self,
        board: &Board,
        to_move: Player,
        max_depth: u32,
        deterministic: bool,
    ) -> Result<SearchOutcome> {
        Ok(self.searcher.run(
            "negascout",
            Descent::NegaScout,
            board,
            to_move,
            max_depth,
            deterministic,
        ))
    }
}
