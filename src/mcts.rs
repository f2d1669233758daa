//! Monte Carlo Tree Search with UCT
//!
//! Each iteration runs the four classic phases:
//!
//! 1. **Selection**: from the root, follow the policy's child choice while
//!    the node is fully expanded and has children.
//! 2. **Expansion**: if the node still has untried moves, play one chosen
//!    uniformly at random and attach the child for it.
//! 3. **Simulation**: play the position out with the simulation policy.
//! 4. **Backpropagation**: walk parent links back to the root, crediting
//!    every node with the result for the side that moved into it.
//!
//! The tree survives between moves. When a move is played, real or chosen by
//! the search, the child for that move becomes the new root and the rest of
//! the tree is dropped.

use std::time::Instant;

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::Rng;

use crate::board::{Board, Coord, MoveList, Player};
use crate::config::{make_rng, BestChildCriteria, MctsConfig};
use crate::engine::Engine;
use crate::game_state::SquavaState;
use crate::policy::{
    BackpropagationPolicy, RandomPlayout, SelectionPolicy, SimulationPolicy, StandardPolicy,
    Ucb1Policy,
};
use crate::search::SearchOutcome;
use crate::stats::SearchStatistics;
use crate::tree::{NodeId, Tree};
use crate::Result;

/// First moves worth considering on an empty board: one quadrant each,
/// every other first move being a rotation or reflection of one of these.
pub const QUADRANTS: [[usize; 9]; 4] = [
    [0, 1, 2, 5, 6, 7, 10, 11, 12],
    [2, 3, 4, 7, 8, 9, 12, 13, 14],
    [10, 11, 12, 15, 16, 17, 20, 21, 22],
    [12, 13, 14, 17, 18, 19, 22, 23, 24],
];

/// UCT searcher and player
///
/// # Example
///
/// ```
/// use squava::{Engine, Mcts, MctsConfig};
///
/// let config = MctsConfig::default().with_max_iterations(200).with_seed(1);
/// let mut mcts = Mcts::new(config).unwrap();
/// let outcome = mcts.choose_move().unwrap();
/// assert!(outcome.best.is_some());
/// println!("{}", mcts.get_statistics().summary());
/// ```
pub struct Mcts {
    state: SquavaState,
    tree: Option<Tree>,
    config: MctsConfig,
    statistics: SearchStatistics,
    rng: StdRng,
    selection_policy: Box<dyn SelectionPolicy>,
    simulation_policy: Box<dyn SimulationPolicy>,
    backpropagation_policy: Box<dyn BackpropagationPolicy>,
}

impl Mcts {
    /// Creates a searcher for a new game, [`Player::Max`] to move
    pub fn new(config: MctsConfig) -> Result<Self> {
        Self::from_state(SquavaState::new(), config)
    }

    /// Creates a searcher for an arbitrary position
    pub fn from_state(state: SquavaState, config: MctsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Mcts {
            state,
            tree: None,
            rng: make_rng(config.seed),
            selection_policy: Box::new(Ucb1Policy::new(config.exploration_constant)),
            simulation_policy: Box::new(RandomPlayout::new()),
            backpropagation_policy: Box::new(StandardPolicy::new()),
            statistics: SearchStatistics::new(),
            config,
        })
    }

    pub fn with_selection_policy<P: SelectionPolicy + 'static>(mut self, policy: P) -> Self {
        self.selection_policy = Box::new(policy);
        self
    }

    pub fn with_simulation_policy<P: SimulationPolicy + 'static>(mut self, policy: P) -> Self {
        self.simulation_policy = Box::new(policy);
        self
    }

    pub fn with_backpropagation_policy<P: BackpropagationPolicy + 'static>(
        mut self,
        policy: P,
    ) -> Self {
        self.backpropagation_policy = Box::new(policy);
        self
    }

    pub fn state(&self) -> &SquavaState {
        &self.state
    }

    /// The tree kept from the last search, if any
    pub fn tree(&self) -> Option<&Tree> {
        self.tree.as_ref()
    }

    pub fn get_statistics(&self) -> &SearchStatistics {
        &self.statistics
    }

    /// Runs a search for the side to move without playing the result.
    ///
    /// `leaves` in the outcome is the number of iterations; `score` is the
    /// chosen move's win rate scaled to `0..=1000`.
    pub fn search(&mut self) -> Result<SearchOutcome> {
        self.statistics = SearchStatistics::new();
        if self.state.is_terminal() {
            return Ok(SearchOutcome::no_move(0));
        }

        let mut iterations = self.config.max_iterations;
        let pjm = self.state.player_just_moved();
        let mut tree = match self.tree.take() {
            Some(tree) if tree.get(tree.root()).player_just_moved == pjm => {
                self.statistics.reused_nodes = tree.len();
                debug!("reusing {} nodes from the previous search", tree.len());
                tree
            }
            _ => {
                let mut untried = self.state.legal_moves();
                if self.config.symmetry_pruning && self.state.board().filled() == 0 {
                    untried = self.first_move_candidates();
                    iterations = iterations.saturating_mul(2);
                }
                Tree::new(untried, pjm)
            }
        };

        let start = Instant::now();
        for i in 0..iterations {
            if let Some(limit) = self.config.max_time {
                if start.elapsed() >= limit {
                    self.statistics.stopped_early = true;
                    warn!(
                        "time budget of {:?} hit after {} of {} iterations",
                        limit, i, iterations
                    );
                    break;
                }
            }
            self.execute_iteration(&mut tree);
            self.statistics.iterations = i + 1;
        }
        self.statistics.total_time = start.elapsed();
        self.statistics.tree_size = tree.len();

        let outcome = self.best_child(&tree);
        self.tree = Some(tree);
        debug!(
            "uct chose {:?} for {:?}: score {}, {} iterations in {:?}",
            outcome.best,
            self.state.to_move(),
            outcome.score,
            outcome.leaves,
            self.statistics.total_time
        );
        Ok(outcome)
    }

    fn first_move_candidates(&mut self) -> MoveList {
        let quadrant = if self.config.deterministic {
            0
        } else {
            self.rng.gen_range(0..QUADRANTS.len())
        };
        QUADRANTS[quadrant].iter().map(|&i| Coord::from_index(i)).collect()
    }

    fn execute_iteration(&mut self, tree: &mut Tree) {
        let mut state = self.state;

        // Selection
        let mut node = tree.root();
        // Terminal positions have nothing untried and no children
        while tree.get(node).is_fully_expanded() && !tree.get(node).is_leaf() {
            let Some(child) = self.selection_policy.select_child(tree, node) else {
                break;
            };
            node = child;
            if let Some(mv) = tree.get(node).mv {
                state.do_move(mv);
            }
        }
        self.statistics.max_depth = self.statistics.max_depth.max(tree.get(node).depth);

        // Expansion
        let untried = tree.get(node).untried.len();
        if untried > 0 {
            let index = self.rng.gen_range(0..untried);
            let mv = tree.get(node).untried.as_slice()[index];
            state.do_move(mv);
            node = tree.expand(node, index, state.legal_moves(), state.player_just_moved());
        }

        // Simulation
        self.simulation_policy.simulate(&mut state, &mut self.rng);

        // Backpropagation
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            let current = tree.get_mut(id);
            let result = state.result_for(current.player_just_moved);
            self.backpropagation_policy.update_stats(current, result);
            cursor = current.parent;
        }
    }

    fn best_child(&self, tree: &Tree) -> SearchOutcome {
        let iterations = self.statistics.iterations as u64;
        let root = tree.get(tree.root());
        let mut best: Option<NodeId> = None;
        for &child in &root.children {
            let better = match best {
                None => true,
                Some(current) => {
                    let (c, b) = (tree.get(child), tree.get(current));
                    match self.config.best_child_criteria {
                        BestChildCriteria::MostVisits => c.visits > b.visits,
                        BestChildCriteria::HighestValue => c.value() > b.value(),
                    }
                }
            };
            if better {
                best = Some(child);
            }
        }

        match best.and_then(|id| tree.get(id).mv.map(|mv| (id, mv))) {
            Some((id, mv)) => SearchOutcome {
                best: Some(mv),
                score: (1000.0 * tree.get(id).value()).round() as i32,
                leaves: iterations,
            },
            // Nothing expanded yet: fall back to the first candidate.
            None => SearchOutcome {
                best: root.untried.iter().next(),
                score: 0,
                leaves: iterations,
            },
        }
    }

    /// Moves the kept tree down to the child for `cell`, or drops it
    fn advance_tree(&mut self, cell: Coord, player: Player) {
        let Some(tree) = self.tree.take() else {
            return;
        };
        let child = tree
            .find_child(tree.root(), cell)
            .filter(|&id| tree.get(id).player_just_moved == player);
        if let Some(id) = child {
            let subtree = tree.reroot(id);
            debug!(
                "kept {} of {} nodes after {:?} played {}",
                subtree.len(),
                tree.len(),
                player,
                cell
            );
            self.tree = Some(subtree);
        }
    }
}

impl Engine for Mcts {
    fn name(&self) -> String {
        format!("MCTS (C = {})", self.config.exploration_constant)
    }

    fn make_move(&mut self, cell: Coord, player: Player) {
        self.state.play(cell, player);
        self.advance_tree(cell, player);
    }

    /// UCT budgets are set in iterations, not plies
    fn set_depth(&mut self, _move_counter: usize) {}

    fn choose_move(&mut self) -> Result<SearchOutcome> {
        let outcome = self.search()?;
        if let Some(cell) = outcome.best {
            let player = self.state.to_move();
            self.make_move(cell, player);
        }
        Ok(outcome)
    }

    fn board(&self) -> &Board {
        self.state.board()
    }
}

impl Clone for Mcts {
    fn clone(&self) -> Self {
        Mcts {
            state: self.state,
            tree: self.tree.clone(),
            config: self.config.clone(),
            statistics: self.statistics.clone(),
            rng: self.rng.clone(),
            selection_policy: self.selection_policy.clone_box(),
            simulation_policy: self.simulation_policy.clone_box(),
            backpropagation_policy: self.backpropagation_policy.clone_box(),
        }
    }
}

impl std::fmt::Debug for Mcts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mcts")
            .field("state", &self.state)
            .field("tree_size", &self.tree.as_ref().map(Tree::len))
            .field("config", &self.config)
            .finish()
    }
}
