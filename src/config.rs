//! Configuration for the searches
//!
//! [`SearchConfig`] drives the minimax searches and the worker pool,
//! [`MctsConfig`] drives the UCT searcher. Both are built from their
//! `Default` and adjusted with `with_*` methods.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::board::CELLS;
use crate::eval::{AvoidShapesEvaluator, BiasTable, Evaluator, StandardEvaluator};
use crate::ordering::MoveOrder;
use crate::{Result, SquavaError};

/// Builds a random number generator from an optional seed
pub(crate) fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Ply budget as a function of how far the game has progressed
///
/// Early positions have wide trees and few forcing lines, so they get the
/// shallowest search; the endgame is narrow enough to look much deeper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthSchedule {
    /// Budget while fewer than 4 moves have been played
    pub opening: u32,
    /// Budget from move 4 through move 10
    pub middlegame: u32,
    /// Budget after move 10
    pub endgame: u32,
}

impl DepthSchedule {
    pub fn depth_for(&self, move_counter: usize) -> u32 {
        match move_counter {
            0..=3 => self.opening,
            4..=10 => self.middlegame,
            _ => self.endgame,
        }
    }
}

impl Default for DepthSchedule {
    fn default() -> Self {
        DepthSchedule {
            opening: 6,
            middlegame: 8,
            endgame: 10,
        }
    }
}

/// Configuration for the alpha-beta, negascout and worker-pool searches
///
/// # Example
///
/// ```
/// use squava::config::SearchConfig;
/// use squava::MoveOrder;
///
/// let config = SearchConfig::default()
///     .with_max_depth(6)
///     .with_deterministic(true)
///     .with_workers(2)
///     .with_move_order(MoveOrder::Natural);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Ply budget used until the engine's depth schedule overrides it
    pub max_depth: u32,

    /// Always pick the lowest-index move among equally scored ones
    pub deterministic: bool,

    /// Number of threads in the worker pool
    pub workers: usize,

    /// Candidate ordering inside the tree
    pub move_order: MoveOrder,

    pub depth_schedule: DepthSchedule,

    /// Replace the reference bias table with random values in `-5..=5`
    pub randomize_bias: bool,

    /// Penalize shapes that can only end in a loss
    pub avoid_shapes: bool,

    /// Seed for tie-breaking and bias randomization
    pub seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            max_depth: 8,
            deterministic: false,
            workers: 4,
            move_order: MoveOrder::Heuristic,
            depth_schedule: DepthSchedule::default(),
            randomize_bias: false,
            avoid_shapes: false,
            seed: None,
        }
    }
}

impl SearchConfig {
    pub fn with_max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_deterministic(mut self, deterministic: bool) -> Self {
        self.deterministic = deterministic;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_move_order(mut self, order: MoveOrder) -> Self {
        self.move_order = order;
        self
    }

    pub fn with_depth_schedule(mut self, schedule: DepthSchedule) -> Self {
        self.depth_schedule = schedule;
        self
    }

    pub fn with_randomized_bias(mut self, randomize: bool) -> Self {
        self.randomize_bias = randomize;
        self
    }

    pub fn with_avoid_shapes(mut self, avoid: bool) -> Self {
        self.avoid_shapes = avoid;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Checks that every value is usable
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(SquavaError::InvalidConfiguration(
                "worker pool needs at least one worker".into(),
            ));
        }
        let depths = [
            self.max_depth,
            self.depth_schedule.opening,
            self.depth_schedule.middlegame,
            self.depth_schedule.endgame,
        ];
        if let Some(depth) = depths.iter().find(|&&d| d as usize > CELLS) {
            return Err(SquavaError::InvalidConfiguration(format!(
                "depth {} exceeds the {} cells of the board",
                depth, CELLS
            )));
        }
        Ok(())
    }

    /// Builds the evaluator described by this configuration
    pub fn evaluator(&self) -> Arc<dyn Evaluator> {
        let bias = if self.randomize_bias {
            // Offset the seed so the bias table and tie-breaking draw
            // from different streams.
            BiasTable::randomized(&mut make_rng(self.seed.map(|s| s ^ 0x5eed)))
        } else {
            BiasTable::REFERENCE
        };
        if self.avoid_shapes {
            Arc::new(AvoidShapesEvaluator::with_bias(bias))
        } else {
            Arc::new(StandardEvaluator::with_bias(bias))
        }
    }
}

/// Criteria for selecting the move to play once the UCT search is done
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BestChildCriteria {
    /// The child with the most visits
    ///
    /// Robust: relies on how much the search trusted a move rather than on
    /// a possibly noisy win rate.
    MostVisits,

    /// The child with the highest win rate
    HighestValue,
}

/// Configuration for the UCT searcher
///
/// # Example
///
/// ```
/// use squava::config::{BestChildCriteria, MctsConfig};
/// use std::time::Duration;
///
/// let config = MctsConfig::default()
///     .with_exploration_constant(1.4)
///     .with_max_iterations(20_000)
///     .with_max_time(Duration::from_secs(2))
///     .with_best_child_criteria(BestChildCriteria::MostVisits);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct MctsConfig {
    /// Weight of the exploration term in UCB1
    pub exploration_constant: f64,

    /// Iterations per move (doubled for the very first move of a game when
    /// symmetry pruning applies)
    pub max_iterations: usize,

    /// Optional wall-clock budget per move
    pub max_time: Option<Duration>,

    pub best_child_criteria: BestChildCriteria,

    /// On an empty board, only consider one quadrant of first moves
    pub symmetry_pruning: bool,

    /// Use a fixed quadrant instead of a random one
    pub deterministic: bool,

    pub seed: Option<u64>,
}

impl Default for MctsConfig {
    fn default() -> Self {
        MctsConfig {
            exploration_constant: 1.0,
            max_iterations: 500_000,
            max_time: None,
            best_child_criteria: BestChildCriteria::MostVisits,
            symmetry_pruning: true,
            deterministic: false,
            seed: None,
        }
    }
}

impl MctsConfig {
    pub fn with_exploration_constant(mut self, constant: f64) -> Self {
        self.exploration_constant = constant;
        self
    }

    pub fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations;
        self
    }

    pub fn with_max_time(mut self, duration: Duration) -> Self {
        self.max_time = Some(duration);
        self
    }

    pub fn with_best_child_criteria(mut self, criteria: BestChildCriteria) -> Self {
        self.best_child_criteria = criteria;
        self
    }

    pub fn with_symmetry_pruning(mut self, enabled: bool) -> Self {
        self.symmetry_pruning = enabled;
        self
    }

    pub fn with_deterministic(mut self, deterministic: bool) -> Self {
        self.deterministic = deterministic;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.exploration_constant.is_finite() || self.exploration_constant < 0.0 {
            return Err(SquavaError::InvalidConfiguration(format!(
                "exploration constant must be finite and non-negative, got {}",
                self.exploration_constant
            )));
        }
        if self.max_iterations == 0 {
            return Err(SquavaError::InvalidConfiguration(
                "at least one iteration is required".into(),
            ));
        }
        Ok(())
    }
}
