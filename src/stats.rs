//! Statistics collection for UCT searches

use std::time::Duration;

/// Statistics collected during one UCT search
#[derive(Debug, Clone)]
pub struct SearchStatistics {
    /// Number of iterations performed
    pub iterations: usize,

    /// Total time spent searching
    pub total_time: Duration,

    /// Nodes in the tree when the search ended
    pub tree_size: usize,

    /// Nodes inherited from the previous move's tree
    pub reused_nodes: usize,

    /// Deepest node reached by selection
    pub max_depth: usize,

    /// Whether the time budget ended the search
    pub stopped_early: bool,
}

impl SearchStatistics {
    pub fn new() -> Self {
        SearchStatistics {
            iterations: 0,
            total_time: Duration::from_secs(0),
            tree_size: 1,
            reused_nodes: 0,
            max_depth: 0,
            stopped_early: false,
        }
    }

    pub fn iterations_per_second(&self) -> f64 {
        if self.total_time.as_secs_f64() <= 0.0 {
            return 0.0;
        }
        self.iterations as f64 / self.total_time.as_secs_f64()
    }

    pub fn summary(&self) -> String {
        format!(
            "UCT search statistics:\n\
             - Iterations: {}\n\
             - Total time: {:.3} seconds\n\
             - Tree size: {} nodes ({} reused)\n\
             - Max depth: {}\n\
             - Iterations per second: {:.1}\n\
             - Stopped early: {}",
            self.iterations,
            self.total_time.as_secs_f64(),
            self.tree_size,
            self.reused_nodes,
            self.max_depth,
            self.iterations_per_second(),
            self.stopped_early
        )
    }
}

impl Default for SearchStatistics {
    fn default() -> Self {
        Self::new()
    }
}
