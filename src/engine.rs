//! Players that keep their own board
//!
//! An engine is told about every move played, its own and its opponent's,
//! and is asked for a move when it is its turn. Moves coming from outside
//! the engine (an opponent, an opening book, a human) are ordinary
//! [`Engine::make_move`] calls.

use log::info;

use crate::board::{Board, Coord, Player};
use crate::config::{DepthSchedule, SearchConfig};
use crate::lines;
use crate::search::{SearchOutcome, SearchStrategy};
use crate::Result;

/// A player of one side of a game
pub trait Engine {
    fn name(&self) -> String;

    /// Records a move by either side
    fn make_move(&mut self, cell: Coord, player: Player);

    /// Adjusts the search budget for the game's progress
    fn set_depth(&mut self, move_counter: usize);

    /// Searches for the side to move and plays the chosen move.
    ///
    /// Returns the sentinel outcome, leaving the board as it is, when the
    /// game is already over.
    fn choose_move(&mut self) -> Result<SearchOutcome>;

    fn board(&self) -> &Board;

    fn find_winner(&self) -> Option<Player> {
        lines::find_winner(self.board())
    }
}

impl<E: Engine + ?Sized> Engine for Box<E> {
    fn name(&self) -> String {
        (**self).name()
    }

    fn make_move(&mut self, cell: Coord, player: Player) {
        (**self).make_move(cell, player)
    }

    fn set_depth(&mut self, move_counter: usize) {
        (**self).set_depth(move_counter)
    }

    fn choose_move(&mut self) -> Result<SearchOutcome> {
        (**self).choose_move()
    }

    fn board(&self) -> &Board {
        (**self).board()
    }

    fn find_winner(&self) -> Option<Player> {
        (**self).find_winner()
    }
}

/// Engine driving a minimax search
///
/// Works with [`AlphaBeta`](crate::AlphaBeta), [`NegaScout`](crate::NegaScout)
/// or a [`WorkerPool`](crate::WorkerPool).
#[derive(Debug)]
pub struct MinimaxEngine<S: SearchStrategy> {
    strategy: S,
    board: Board,
    last_mover: Player,
    max_depth: u32,
    schedule: DepthSchedule,
    deterministic: bool,
}

impl<S: SearchStrategy> MinimaxEngine<S> {
    /// Engine for a new game, [`Player::Max`] to move
    pub fn new(strategy: S, config: &SearchConfig) -> Self {
        MinimaxEngine {
            strategy,
            board: Board::new(),
            last_mover: Player::Min,
            max_depth: config.max_depth,
            schedule: config.depth_schedule,
            deterministic: config.deterministic,
        }
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn to_move(&self) -> Player {
        self.last_mover.opponent()
    }
}

impl<S: SearchStrategy> Engine for MinimaxEngine<S> {
    fn name(&self) -> String {
        format!("{} (depth {})", self.strategy.name(), self.max_depth)
    }

    fn make_move(&mut self, cell: Coord, player: Player) {
        self.board.set(cell, player);
        self.last_mover = player;
    }

    fn set_depth(&mut self, move_counter: usize) {
        self.max_depth = self.schedule.depth_for(move_counter);
    }

    fn choose_move(&mut self) -> Result<SearchOutcome> {
        if self.find_winner().is_some() {
            return Ok(SearchOutcome::no_move(0));
        }
        let to_move = self.to_move();
        let outcome =
            self.strategy
                .search(&self.board, to_move, self.max_depth, self.deterministic)?;
        if let Some(cell) = outcome.best {
            info!("{} plays {} for {:?}", self.strategy.name(), cell, to_move);
            self.make_move(cell, to_move);
        }
        Ok(outcome)
    }

    fn board(&self) -> &Board {
        &self.board
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::AlphaBeta;

    fn engine(depth: u32) -> MinimaxEngine<AlphaBeta> {
        let config = SearchConfig::default()
            .with_max_depth(depth)
            .with_deterministic(true);
        MinimaxEngine::new(AlphaBeta::from_config(&config), &config)
    }

    #[test]
    fn test_choose_move_plays_for_the_side_to_move() {
        let mut engine = engine(2);
        assert_eq!(engine.to_move(), Player::Max);
        let outcome = engine.choose_move().unwrap();
        let cell = outcome.best.unwrap();
        assert_eq!(engine.board().mark(cell), Some(Player::Max));
        assert_eq!(engine.to_move(), Player::Min);

        engine.make_move(Coord::new(4, 4), Player::Min);
        assert_eq!(engine.to_move(), Player::Max);
        assert_eq!(engine.board().filled(), 2);
    }

    #[test]
    fn test_set_depth_follows_schedule() {
        let mut engine = engine(8);
        engine.set_depth(0);
        assert_eq!(engine.max_depth(), 6);
        engine.set_depth(6);
        assert_eq!(engine.max_depth(), 8);
        engine.set_depth(15);
        assert_eq!(engine.max_depth(), 10);
    }

    #[test]
    fn test_finished_game_gives_sentinel() {
        let mut engine = engine(2);
        for &(r, c) in &[(0, 0), (0, 1), (0, 2), (0, 3)] {
            engine.make_move(Coord::new(r, c), Player::Max);
        }
        assert_eq!(engine.find_winner(), Some(Player::Max));
        assert_eq!(engine.choose_move().unwrap(), SearchOutcome::no_move(0));
        assert_eq!(engine.board().filled(), 4);
    }
}
