//! # squava
//!
//! Game-tree search engines for Squava, a 5×5 placement game where four in a
//! row wins and three in a row loses.
//!
//! The crate provides three searches behind one [`Engine`] interface:
//!
//! - Fixed-depth [`AlphaBeta`] minimax with an incremental evaluator
//! - [`NegaScout`] (principal variation search) over the same evaluator
//! - Monte Carlo Tree Search with UCT ([`Mcts`]) and random playouts
//!
//! Any minimax search can be spread over threads with a [`WorkerPool`], which
//! searches each root move on a worker and merges the results without
//! changing them.
//!
//! ## Basic Usage
//!
//! ```
//! use squava::{AlphaBeta, Board, Coord, Player, SearchConfig, SearchStrategy};
//!
//! // X has three of the top row and the gap at (0, 2) wins outright.
//! let board = Board::from_rows(&["XX.X.", ".....", "..O..", ".....", "O...O"]).unwrap();
//!
//! let config = SearchConfig::default().with_max_depth(4).with_deterministic(true);
//! let mut search = AlphaBeta::from_config(&config);
//! let outcome = search.search(&board, Player::Max, 4, true)?;
//!
//! assert_eq!(outcome.best, Some(Coord::new(0, 2)));
//! # Ok::<(), squava::SquavaError>(())
//! ```
//!
//! ## How It Works
//!
//! Every length-3 and length-4 segment of the board is catalogued once, and
//! each cell knows the lines through it. After a mark is placed, the
//! evaluator scans only those lines: a completed quad wins, a completed
//! triplet loses, and anything else adds a small heuristic score that the
//! search carries down the path. Scores are from [`Player::Max`]'s view with
//! wins and losses adjusted by ply so that faster wins rank higher.
//!
//! Move ordering puts immediate wins first, moves that complete a losing
//! triplet last, and the board centre before the edges in between.
//!
//! ## Playing Games
//!
//! Engines keep their own board and are told about every move:
//!
//! ```
//! use squava::{Engine, MinimaxEngine, NegaScout, SearchConfig};
//!
//! let config = SearchConfig::default().with_max_depth(2).with_seed(7);
//! let mut engine = MinimaxEngine::new(NegaScout::from_config(&config), &config);
//! let first = engine.choose_move()?;
//! assert!(first.best.is_some());
//! assert_eq!(engine.board().filled(), 1);
//! # Ok::<(), squava::SquavaError>(())
//! ```
//!
//! See `demos/self_play.rs` for a full game between two engines:
//!
//! ```bash
//! RUST_LOG=debug cargo run --example self_play
//! ```

pub mod board;
pub mod config;
pub mod engine;
pub mod eval;
pub mod game_state;
pub mod lines;
pub mod mcts;
pub mod ordering;
pub mod parallel;
pub mod policy;
pub mod search;
pub mod stats;
pub mod tree;
pub mod utils;

pub use board::{Board, Coord, MoveList, Player};
pub use config::{BestChildCriteria, DepthSchedule, MctsConfig, SearchConfig};
pub use engine::{Engine, MinimaxEngine};
pub use eval::{AvoidShapesEvaluator, BiasTable, Evaluation, Evaluator, StandardEvaluator};
pub use game_state::{GameResult, SquavaState};
pub use mcts::Mcts;
pub use ordering::{order_moves, MoveOrder, OrderedMoves};
pub use parallel::WorkerPool;
pub use search::{AlphaBeta, MoveKeeper, NegaScout, SearchOutcome, SearchStrategy};
pub use stats::SearchStatistics;
pub use tree::{Node, NodeId, Tree};

/// Error types for the search engines
#[derive(thiserror::Error, Debug)]
pub enum SquavaError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A search was sent to a worker pool that has been shut down
    #[error("Worker pool is closed")]
    PoolClosed,

    /// A worker went away before returning its job
    #[error("Worker thread lost before returning its result")]
    WorkerLost,

    /// A worker thread could not be started
    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Result type for search operations
pub type Result<T> = std::result::Result<T, SquavaError>;
