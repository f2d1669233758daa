//! Game state used by the UCT searcher
//!
//! Unlike the minimax searches, UCT replays whole games, so its state tracks
//! whose turn it is and whether the game is already decided. The outcome is
//! worked out once per move from the lines through the last cell played and
//! kept, so asking for the result from either side's view never rescans the
//! board.

use rand::seq::SliceRandom;
use rand::RngCore;

use crate::board::{Board, Coord, MoveList, Player};
use crate::lines::{find_winner, winner_at};

/// Outcome of a finished game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    Won(Player),
    Drawn,
}

/// A position plus the side that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SquavaState {
    board: Board,
    player_just_moved: Player,
    result: Option<GameResult>,
}

impl SquavaState {
    /// Empty board with [`Player::Max`] to move
    pub fn new() -> Self {
        Self::from_board(Board::new(), Player::Min)
    }

    /// Wraps an arbitrary position; the result is computed from scratch
    pub fn from_board(board: Board, player_just_moved: Player) -> Self {
        let result = match find_winner(&board) {
            Some(winner) => Some(GameResult::Won(winner)),
            None if board.is_full() => Some(GameResult::Drawn),
            None => None,
        };
        SquavaState {
            board,
            player_just_moved,
            result,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn player_just_moved(&self) -> Player {
        self.player_just_moved
    }

    pub fn to_move(&self) -> Player {
        self.player_just_moved.opponent()
    }

    /// Plays `cell` for the side to move
    pub fn do_move(&mut self, cell: Coord) {
        self.play(cell, self.to_move());
    }

    /// Plays `cell` for an explicit side
    pub fn play(&mut self, cell: Coord, player: Player) {
        self.board.set(cell, player);
        self.player_just_moved = player;
        self.result = match winner_at(&self.board, cell) {
            Some(winner) => Some(GameResult::Won(winner)),
            None if self.board.is_full() => Some(GameResult::Drawn),
            None => None,
        };
    }

    pub fn is_terminal(&self) -> bool {
        self.result.is_some()
    }

    pub fn outcome(&self) -> Option<GameResult> {
        self.result
    }

    /// Empty cells, or nothing once the game is decided
    pub fn legal_moves(&self) -> MoveList {
        if self.is_terminal() {
            MoveList::new()
        } else {
            self.board.empty_cells()
        }
    }

    /// Result for `player`: `1.0` for a win, `0.0` for a loss, `0.5` for a
    /// draw or an undecided game.
    pub fn result_for(&self, player: Player) -> f64 {
        match self.result {
            Some(GameResult::Won(winner)) if winner == player => 1.0,
            Some(GameResult::Won(_)) => 0.0,
            Some(GameResult::Drawn) | None => 0.5,
        }
    }

    /// Plays uniformly random moves until the game is decided
    pub fn random_playout(&mut self, rng: &mut dyn RngCore) {
        while !self.is_terminal() {
            let moves = self.legal_moves();
            match moves.as_slice().choose(&mut *rng) {
                Some(&cell) => self.do_move(cell),
                None => break,
            }
        }
    }
}

impl Default for SquavaState {
    fn default() -> Self {
        Self::new()
    }
}
